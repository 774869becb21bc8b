// ABOUTME: Rollout record and terminal outcome types.
// ABOUTME: A record is created Pending and finalized exactly once.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::types::{ArtifactRef, RolloutId, ServiceId};

/// Where a rollout ended up. `Pending` is the only non-terminal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RolloutOutcome {
    Pending,
    Succeeded,
    RolledBack,
    Failed,
}

impl RolloutOutcome {
    /// Terminal outcomes admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RolloutOutcome::Pending)
    }
}

impl fmt::Display for RolloutOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RolloutOutcome::Pending => "pending",
            RolloutOutcome::Succeeded => "succeeded",
            RolloutOutcome::RolledBack => "rolled back",
            RolloutOutcome::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Audit record for one logical rollout request.
///
/// Field names in the JSON form follow the export contract used by
/// dashboards (`startedAt`, `finishedAt`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloutRecord {
    pub id: RolloutId,
    pub service: ServiceId,
    pub target: ArtifactRef,
    pub started_at: DateTime<Utc>,
    /// `None` while the rollout is still Pending.
    pub finished_at: Option<DateTime<Utc>>,
    pub outcome: RolloutOutcome,
    /// Update attempts issued for the target artifact (retries included,
    /// rollback updates excluded).
    pub attempts: u32,
}

impl RolloutRecord {
    /// Open a fresh Pending record for a rollout of `target` on `service`.
    pub(crate) fn pending(service: ServiceId, target: ArtifactRef) -> Self {
        Self {
            id: RolloutId::generate(&service),
            service,
            target,
            started_at: Utc::now(),
            finished_at: None,
            outcome: RolloutOutcome::Pending,
            attempts: 0,
        }
    }

    /// Transition into a terminal outcome. Called exactly once per record.
    pub(crate) fn finalize(&mut self, outcome: RolloutOutcome) {
        debug_assert!(outcome.is_terminal());
        debug_assert!(self.finished_at.is_none());
        self.outcome = outcome;
        self.finished_at = Some(Utc::now());
    }
}
