// ABOUTME: Synchronous failures of starting a rollout.
// ABOUTME: Everything past input validation resolves into a record outcome instead.

use crate::history::HistoryError;
use crate::types::{ArtifactRef, ServiceId};

/// Errors `RolloutController::start` can return directly.
///
/// Platform trouble mid-rollout is never one of these: it is recorded in the
/// rollout record's outcome. Only invalid input and invariant violations
/// surface as errors.
#[derive(Debug, thiserror::Error)]
pub enum RolloutError {
    /// The platform has no service with this id.
    #[error("service not found: {0}")]
    ServiceNotFound(ServiceId),

    /// A rollout with a different target is already active for this service.
    #[error("rollout already in progress for {service} (target {active_target})")]
    RolloutInProgress {
        service: ServiceId,
        active_target: ArtifactRef,
    },

    /// History rejected the finalized record. Indicates an id collision bug.
    #[error("history rejected record: {0}")]
    History(#[from] HistoryError),
}
