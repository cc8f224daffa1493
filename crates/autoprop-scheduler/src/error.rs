//! Error types for the auto-proposer.

/// Errors from a single proposal attempt.
///
/// Every variant is transient from the scheduler's point of view: the loop
/// logs it, records the attempt and keeps running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProposeError {
    #[error("Block proposal failed: {0}")]
    Failed(String),
    #[error("No new deploys to propose")]
    NoNewWork,
    #[error("Propose lock is closed")]
    LockClosed,
}

/// Errors from the scheduler loop and its lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Invalid scheduler config: {0}")]
    InvalidConfig(String),
    #[error("Pending deploy source failed: {0}")]
    PendingSource(String),
    #[error(transparent)]
    Propose(#[from] ProposeError),
    #[error("Scheduler task did not complete: {0}")]
    Join(String),
}
