// ABOUTME: Rollout controller driving a service toward a new artifact.
// ABOUTME: Retries transient failures, polls for convergence, rolls back on timeout.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::backoff::delay_for_attempt;
use super::error::RolloutError;
use super::options::RolloutOptions;
use super::record::{RolloutOutcome, RolloutRecord};
use crate::history::RolloutHistory;
use crate::platform::{PlatformClient, PlatformError, ServiceState};
use crate::types::{ArtifactRef, ServiceId};

/// Drives rollouts to a terminal outcome, one at a time per service.
///
/// The controller owns the active record for the duration of a rollout and
/// finalizes it into [`RolloutHistory`] exactly once. Rollouts for distinct
/// services run concurrently; a second request for a service that already
/// has one in flight is deduplicated (same target) or rejected (different
/// target).
pub struct RolloutController<P: PlatformClient> {
    platform: Arc<P>,
    history: Arc<RolloutHistory>,
    // Pending snapshots, keyed by service. Never locked across an await.
    active: Mutex<HashMap<ServiceId, RolloutRecord>>,
}

impl<P: PlatformClient> RolloutController<P> {
    pub fn new(platform: Arc<P>, history: Arc<RolloutHistory>) -> Self {
        Self {
            platform,
            history,
            active: Mutex::new(HashMap::new()),
        }
    }

    pub fn history(&self) -> &Arc<RolloutHistory> {
        &self.history
    }

    /// Roll `service` out to `target`, blocking until a terminal outcome.
    ///
    /// Returns the finalized record. If another rollout for the same
    /// (service, target) pair is already active, returns that rollout's
    /// Pending record with the same id instead.
    ///
    /// # Errors
    ///
    /// Returns `ServiceNotFound` for an unknown service, `RolloutInProgress`
    /// when the service is mid-rollout toward a different target, and
    /// `History` on an id collision (a bug, not an operational failure).
    pub async fn start(
        &self,
        service: ServiceId,
        target: ArtifactRef,
        opts: RolloutOptions,
    ) -> Result<RolloutRecord, RolloutError> {
        let record = {
            let mut active = self.active.lock();
            if let Some(existing) = active.get(&service) {
                if existing.target == target {
                    debug!(
                        service = %service,
                        rollout = %existing.id,
                        "duplicate request, returning active record"
                    );
                    return Ok(existing.clone());
                }
                return Err(RolloutError::RolloutInProgress {
                    service: service.clone(),
                    active_target: existing.target.clone(),
                });
            }
            let record = RolloutRecord::pending(service.clone(), target.clone());
            active.insert(service.clone(), record.clone());
            record
        };

        info!(
            service = %service,
            rollout = %record.id,
            target = %target,
            "starting rollout"
        );

        let driven = self.drive(record, &opts).await;

        // Release the service slot on every path, error or not.
        self.active.lock().remove(&service);

        let record = driven?;
        info!(
            service = %service,
            rollout = %record.id,
            outcome = %record.outcome,
            attempts = record.attempts,
            "rollout finished"
        );
        self.history.append(record.clone())?;
        Ok(record)
    }

    /// Run the rollout state machine to a terminal outcome.
    async fn drive(
        &self,
        mut record: RolloutRecord,
        opts: &RolloutOptions,
    ) -> Result<RolloutRecord, RolloutError> {
        let service = record.service.clone();
        let target = record.target.clone();

        // The baseline must be captured before any mutation so rollback has
        // an anchor.
        let state = match self.fetch_state(&service, opts).await {
            Ok(state) => state,
            Err(PlatformError::NotFound(_)) => {
                return Err(RolloutError::ServiceNotFound(service));
            }
            Err(err) => {
                warn!(service = %service, error = %err, "could not read service state");
                record.finalize(RolloutOutcome::Failed);
                return Ok(record);
            }
        };
        let stable = state.last_stable_artifact.clone();

        match self
            .update_with_retry(&service, &target, opts, &mut record.attempts)
            .await
        {
            Ok(()) => {}
            Err(PlatformError::InvalidArtifact(reason)) => {
                warn!(service = %service, %reason, "platform rejected artifact");
                record.finalize(RolloutOutcome::Failed);
                return Ok(record);
            }
            Err(err) => {
                warn!(service = %service, error = %err, "update retries exhausted");
                record.finalize(RolloutOutcome::Failed);
                return Ok(record);
            }
        }

        if self.await_convergence(&service, &target, opts).await {
            record.finalize(RolloutOutcome::Succeeded);
            return Ok(record);
        }

        if !opts.auto_rollback {
            warn!(service = %service, "health timeout, auto-rollback disabled");
            record.finalize(RolloutOutcome::Failed);
            return Ok(record);
        }

        // Health timeout: reissue the stable artifact and give it one
        // bounded poll cycle of its own.
        warn!(service = %service, stable = %stable, "health timeout, rolling back");
        let mut rollback_attempts = 0;
        let rolled_back = match self
            .update_with_retry(&service, &stable, opts, &mut rollback_attempts)
            .await
        {
            Ok(()) => self.await_convergence(&service, &stable, opts).await,
            Err(err) => {
                warn!(service = %service, error = %err, "rollback update failed");
                false
            }
        };

        record.finalize(if rolled_back {
            RolloutOutcome::RolledBack
        } else {
            RolloutOutcome::Failed
        });
        Ok(record)
    }

    /// Read service state, retrying transient failures with backoff.
    async fn fetch_state(
        &self,
        service: &ServiceId,
        opts: &RolloutOptions,
    ) -> Result<ServiceState, PlatformError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match call_with_timeout(opts.call_timeout, self.platform.get_service_state(service))
                .await
            {
                Ok(state) => return Ok(state),
                Err(err) if err.is_retryable() && attempt <= opts.max_retries => {
                    let delay = delay_for_attempt(opts.backoff_base, attempt);
                    debug!(
                        service = %service,
                        attempt,
                        ?delay,
                        "transient state read failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Issue the desired-image update, retrying transient failures.
    ///
    /// Each issued call increments `attempts`, so the counter ends at
    /// 1 on a clean update and 1 + max_retries on exhaustion.
    async fn update_with_retry(
        &self,
        service: &ServiceId,
        target: &ArtifactRef,
        opts: &RolloutOptions,
        attempts: &mut u32,
    ) -> Result<(), PlatformError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            *attempts += 1;
            match call_with_timeout(
                opts.call_timeout,
                self.platform.update_desired_image(service, target),
            )
            .await
            {
                Ok(()) => return Ok(()),
                Err(err) if err.is_retryable() && attempt <= opts.max_retries => {
                    let delay = delay_for_attempt(opts.backoff_base, attempt);
                    warn!(
                        service = %service,
                        attempt,
                        ?delay,
                        "transient update failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Poll health until the service converges on `target` or the health
    /// budget runs out. Transient poll errors consume budget like any
    /// non-converged poll.
    async fn await_convergence(
        &self,
        service: &ServiceId,
        target: &ArtifactRef,
        opts: &RolloutOptions,
    ) -> bool {
        let deadline = Instant::now() + opts.health_timeout;
        loop {
            match call_with_timeout(opts.call_timeout, self.platform.poll_health(service)).await {
                Ok(health) => {
                    debug!(
                        service = %service,
                        healthy = health.healthy_count,
                        desired = health.desired_count,
                        current = %health.current_artifact,
                        "health poll"
                    );
                    if health.healthy_count == health.desired_count
                        && health.current_artifact == *target
                    {
                        return true;
                    }
                }
                Err(err) => {
                    debug!(service = %service, error = %err, "health poll failed");
                }
            }

            if Instant::now() + opts.poll_interval > deadline {
                return false;
            }
            tokio::time::sleep(opts.poll_interval).await;
        }
    }
}

/// Bound a platform call so no single call can eat the health budget.
async fn call_with_timeout<T>(
    timeout: Duration,
    fut: impl Future<Output = Result<T, PlatformError>>,
) -> Result<T, PlatformError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(PlatformError::TransientUnavailable(
            "platform call timed out".to_string(),
        )),
    }
}
