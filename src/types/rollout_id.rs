// ABOUTME: Unique rollout identifier generation.
// ABOUTME: Combines service id, UTC millis, and a process-wide counter.

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::service_id::ServiceId;

static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Token identifying one logical rollout request.
///
/// Ids are unique within a process and sort roughly by creation time, which
/// keeps history listings and log output greppable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RolloutId(String);

impl RolloutId {
    /// Wrap an existing id value (e.g. one read back from an export).
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Generate a fresh id for a rollout of the given service.
    pub fn generate(service: &ServiceId) -> Self {
        let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
        let millis = chrono::Utc::now().timestamp_millis();
        Self(format!("{}-{}-{}", service, millis, seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RolloutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RolloutId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
