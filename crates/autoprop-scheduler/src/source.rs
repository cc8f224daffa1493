//! Pending deploy sources.
//!
//! The scheduler only ever reads the full set of pending identifiers; how
//! deploys arrive and leave is up to the owner of the source.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use autoprop_core::WorkItemId;

use crate::error::SchedulerError;

/// Read-only view of the work waiting to be proposed.
///
/// Implementations must be side-effect free. Consecutive reads may differ
/// when other components add or remove work concurrently. An error here is
/// fatal to the scheduler loop.
#[async_trait]
pub trait PendingWorkSource: Send + Sync {
    async fn read_pending_ids(&self) -> Result<HashSet<WorkItemId>, SchedulerError>;
}

/// In-memory pool of pending deploys.
#[derive(Debug, Default)]
pub struct DeployPool {
    pending: Mutex<HashSet<WorkItemId>>,
}

impl DeployPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a deploy. Returns false if it was already pending.
    pub fn add(&self, id: WorkItemId) -> Result<bool, SchedulerError> {
        Ok(self.lock()?.insert(id))
    }

    /// Remove the given deploys, returning how many were actually pending.
    pub fn remove_all<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a WorkItemId>,
    ) -> Result<usize, SchedulerError> {
        let mut pending = self.lock()?;
        Ok(ids.into_iter().filter(|id| pending.remove(*id)).count())
    }

    /// Take every pending deploy, leaving the pool empty.
    pub fn drain(&self) -> Result<HashSet<WorkItemId>, SchedulerError> {
        Ok(std::mem::take(&mut *self.lock()?))
    }

    pub fn len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashSet<WorkItemId>>, SchedulerError> {
        self.pending
            .lock()
            .map_err(|e| SchedulerError::PendingSource(format!("Lock poisoned: {}", e)))
    }
}

#[async_trait]
impl PendingWorkSource for DeployPool {
    async fn read_pending_ids(&self) -> Result<HashSet<WorkItemId>, SchedulerError> {
        Ok(self.lock()?.clone())
    }
}
