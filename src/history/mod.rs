// ABOUTME: Append-only store of finalized rollout records.
// ABOUTME: Keyed by rollout id with a per-service index for listing.

use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

use crate::rollout::RolloutRecord;
use crate::types::{RolloutId, ServiceId};

/// Errors from history operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// An id was appended twice. The controller generates unique ids, so
    /// hitting this means a bug upstream, not bad input.
    #[error("duplicate rollout id: {0}")]
    DuplicateId(RolloutId),

    #[error("rollout record not found: {0}")]
    NotFound(RolloutId),
}

/// Durable collection of finalized rollout records.
///
/// Records are appended once, never mutated. This in-memory form is the seam
/// a persistent backend would implement; the read side (`get`,
/// `list_by_service`) is the export surface for dashboards.
#[derive(Default)]
pub struct RolloutHistory {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    records: HashMap<RolloutId, RolloutRecord>,
    by_service: HashMap<ServiceId, Vec<RolloutId>>,
}

impl RolloutHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized record.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if a record with the same id already exists.
    pub fn append(&self, record: RolloutRecord) -> Result<(), HistoryError> {
        let mut inner = self.inner.write();
        if inner.records.contains_key(&record.id) {
            return Err(HistoryError::DuplicateId(record.id.clone()));
        }
        inner
            .by_service
            .entry(record.service.clone())
            .or_default()
            .push(record.id.clone());
        inner.records.insert(record.id.clone(), record);
        Ok(())
    }

    /// Fetch a record by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record has this id.
    pub fn get(&self, id: &RolloutId) -> Result<RolloutRecord, HistoryError> {
        self.inner
            .read()
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| HistoryError::NotFound(id.clone()))
    }

    /// All records for a service, most recently finished first.
    pub fn list_by_service(&self, service: &ServiceId) -> Vec<RolloutRecord> {
        let inner = self.inner.read();
        let mut records: Vec<RolloutRecord> = inner
            .by_service
            .get(service)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.records.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by(|a, b| b.finished_at.cmp(&a.finished_at));
        records
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }
}
