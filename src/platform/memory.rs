// ABOUTME: In-memory platform simulation for tests and the simulate command.
// ABOUTME: Convergence is driven by poll counts; faults are injected per call.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

use async_trait::async_trait;

use super::client::{HealthSnapshot, PlatformClient, PlatformError, ServiceState};
use crate::types::{ArtifactRef, ServiceId};

/// A platform that exists only in memory.
///
/// Services converge deterministically: an update installs a pending target,
/// and each health poll advances it by one step until `converge_after` polls
/// have been observed, at which point the target becomes current and all
/// tasks report healthy. Artifacts marked unhealthy never converge, which is
/// how a failing deployment (and a rollback that succeeds where the target
/// did not) is simulated.
pub struct InMemoryPlatform {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    services: HashMap<ServiceId, SimulatedService>,
    /// Artifacts (display form) whose tasks never become healthy.
    unhealthy: HashSet<String>,
    /// Artifacts the platform rejects outright.
    rejected: HashSet<String>,
    update_faults: VecDeque<PlatformError>,
    poll_faults: VecDeque<PlatformError>,
    state_faults: VecDeque<PlatformError>,
    update_instants: Vec<Instant>,
}

struct SimulatedService {
    current: ArtifactRef,
    desired_count: u32,
    converge_after: u32,
    pending: Option<PendingUpdate>,
}

struct PendingUpdate {
    target: ArtifactRef,
    polls: u32,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Register a service that has already converged on `artifact`.
    pub fn register_service(&self, service: ServiceId, artifact: ArtifactRef, desired_count: u32) {
        self.inner.lock().services.insert(
            service,
            SimulatedService {
                current: artifact,
                desired_count,
                converge_after: 1,
                pending: None,
            },
        );
    }

    /// Number of health polls a healthy pending update needs to converge.
    pub fn set_converge_after(&self, service: &ServiceId, polls: u32) {
        if let Some(svc) = self.inner.lock().services.get_mut(service) {
            svc.converge_after = polls;
        }
    }

    /// Mark an artifact as one whose tasks never pass health checks.
    pub fn mark_unhealthy(&self, artifact: &ArtifactRef) {
        self.inner.lock().unhealthy.insert(artifact.to_string());
    }

    /// Make the platform reject an artifact as invalid on update.
    pub fn reject_artifact(&self, artifact: &ArtifactRef) {
        self.inner.lock().rejected.insert(artifact.to_string());
    }

    /// Queue transient failures for the next `count` update calls.
    pub fn fail_next_updates(&self, count: usize) {
        let mut inner = self.inner.lock();
        for _ in 0..count {
            inner
                .update_faults
                .push_back(PlatformError::TransientUnavailable(
                    "injected update fault".to_string(),
                ));
        }
    }

    /// Queue transient failures for the next `count` health polls.
    pub fn fail_next_polls(&self, count: usize) {
        let mut inner = self.inner.lock();
        for _ in 0..count {
            inner
                .poll_faults
                .push_back(PlatformError::TransientUnavailable(
                    "injected poll fault".to_string(),
                ));
        }
    }

    /// Queue transient failures for the next `count` service state reads.
    pub fn fail_next_state_reads(&self, count: usize) {
        let mut inner = self.inner.lock();
        for _ in 0..count {
            inner
                .state_faults
                .push_back(PlatformError::TransientUnavailable(
                    "injected state fault".to_string(),
                ));
        }
    }

    /// Instants at which update calls were received (accepted or not).
    pub fn update_instants(&self) -> Vec<Instant> {
        self.inner.lock().update_instants.clone()
    }

    /// Total update calls received, including faulted ones.
    pub fn update_call_count(&self) -> usize {
        self.inner.lock().update_instants.len()
    }

    /// Artifact the service currently runs, if registered.
    pub fn current_artifact(&self, service: &ServiceId) -> Option<ArtifactRef> {
        self.inner
            .lock()
            .services
            .get(service)
            .map(|svc| svc.current.clone())
    }
}

impl Default for InMemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformClient for InMemoryPlatform {
    async fn get_service_state(
        &self,
        service: &ServiceId,
    ) -> Result<ServiceState, PlatformError> {
        let mut inner = self.inner.lock();

        if let Some(fault) = inner.state_faults.pop_front() {
            return Err(fault);
        }

        let svc = inner
            .services
            .get(service)
            .ok_or_else(|| PlatformError::NotFound(service.to_string()))?;

        // Mid-transition the platform reports churn: one task short of healthy.
        let healthy = if svc.pending.is_some() {
            svc.desired_count.saturating_sub(1)
        } else {
            svc.desired_count
        };

        Ok(ServiceState {
            desired_artifact: svc
                .pending
                .as_ref()
                .map(|p| p.target.clone())
                .unwrap_or_else(|| svc.current.clone()),
            running_task_count: svc.desired_count,
            healthy_task_count: healthy,
            last_stable_artifact: svc.current.clone(),
        })
    }

    async fn update_desired_image(
        &self,
        service: &ServiceId,
        target: &ArtifactRef,
    ) -> Result<(), PlatformError> {
        let mut inner = self.inner.lock();
        inner.update_instants.push(Instant::now());

        if let Some(fault) = inner.update_faults.pop_front() {
            return Err(fault);
        }
        if inner.rejected.contains(&target.to_string()) {
            return Err(PlatformError::InvalidArtifact(target.to_string()));
        }

        let svc = inner
            .services
            .get_mut(service)
            .ok_or_else(|| PlatformError::NotFound(service.to_string()))?;
        svc.pending = Some(PendingUpdate {
            target: target.clone(),
            polls: 0,
        });
        Ok(())
    }

    async fn poll_health(&self, service: &ServiceId) -> Result<HealthSnapshot, PlatformError> {
        let mut inner = self.inner.lock();

        if let Some(fault) = inner.poll_faults.pop_front() {
            return Err(fault);
        }

        let never_converges: HashSet<String> = inner.unhealthy.clone();
        let svc = inner
            .services
            .get_mut(service)
            .ok_or_else(|| PlatformError::NotFound(service.to_string()))?;

        if let Some(pending) = svc.pending.as_mut() {
            pending.polls += 1;
            let healthy_target = !never_converges.contains(&pending.target.to_string());
            if healthy_target && pending.polls >= svc.converge_after {
                svc.current = pending.target.clone();
                svc.pending = None;
            } else {
                return Ok(HealthSnapshot {
                    healthy_count: svc.desired_count.saturating_sub(1),
                    desired_count: svc.desired_count,
                    current_artifact: svc.current.clone(),
                });
            }
        }

        Ok(HealthSnapshot {
            healthy_count: svc.desired_count,
            desired_count: svc.desired_count,
            current_artifact: svc.current.clone(),
        })
    }
}
