//! The proposal action and the lock that serializes it.

use std::sync::Arc;

use async_trait::async_trait;
use autoprop_core::BlockHash;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::ProposeError;

/// Creates and broadcasts a block from the currently pending deploys.
///
/// May be slow. Callers must go through [`ProposeLock::propose_with`] so
/// that at most one proposal runs at a time.
#[async_trait]
pub trait Proposer: Send + Sync {
    async fn propose(&self) -> Result<BlockHash, ProposeError>;
}

/// Binary permit shared by every caller of the proposal action.
///
/// Cloning yields another handle to the same permit.
#[derive(Debug, Clone)]
pub struct ProposeLock {
    semaphore: Arc<Semaphore>,
}

/// Proof of holding the [`ProposeLock`]. Dropping it releases the lock.
#[derive(Debug)]
pub struct ProposeGuard {
    _permit: OwnedSemaphorePermit,
}

impl ProposeLock {
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    /// Wait until the lock is free and take it.
    pub async fn acquire(&self) -> Result<ProposeGuard, ProposeError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| ProposeError::LockClosed)?;
        Ok(ProposeGuard { _permit: permit })
    }

    /// True while some caller holds the lock.
    pub fn is_held(&self) -> bool {
        self.semaphore.available_permits() == 0
    }

    /// Run one proposal while holding the lock.
    ///
    /// The guard is dropped on every return path, including when the
    /// proposer errors or the future is dropped mid-call.
    pub async fn propose_with(&self, proposer: &dyn Proposer) -> Result<BlockHash, ProposeError> {
        let _guard = self.acquire().await?;
        proposer.propose().await
    }
}

impl Default for ProposeLock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct SlowProposer {
        active: AtomicUsize,
        max_active: AtomicUsize,
        calls: AtomicUsize,
    }

    impl SlowProposer {
        fn new() -> Self {
            Self {
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Proposer for SlowProposer {
        async fn propose(&self) -> Result<BlockHash, ProposeError> {
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(BlockHash(vec![n as u8]))
        }
    }

    struct FailingProposer;

    #[async_trait]
    impl Proposer for FailingProposer {
        async fn propose(&self) -> Result<BlockHash, ProposeError> {
            Err(ProposeError::Failed("boom".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_propose_with_serializes_callers() {
        let lock = ProposeLock::new();
        let proposer = Arc::new(SlowProposer::new());

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let lock = lock.clone();
            let proposer = Arc::clone(&proposer);
            tasks.push(tokio::spawn(async move {
                lock.propose_with(proposer.as_ref()).await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }

        assert_eq!(proposer.calls.load(Ordering::SeqCst), 4);
        assert_eq!(proposer.max_active.load(Ordering::SeqCst), 1);
        assert!(!lock.is_held());
    }

    #[tokio::test]
    async fn test_lock_released_after_failure() {
        let lock = ProposeLock::new();
        let err = lock.propose_with(&FailingProposer).await.unwrap_err();
        assert_eq!(err, ProposeError::Failed("boom".to_string()));
        assert!(!lock.is_held());
    }

    #[tokio::test]
    async fn test_guard_holds_until_dropped() {
        let lock = ProposeLock::new();
        let guard = lock.acquire().await.unwrap();
        assert!(lock.is_held());
        assert!(lock.clone().is_held());
        drop(guard);
        assert!(!lock.is_held());
    }
}
