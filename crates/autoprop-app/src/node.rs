//! Simulated node used by the binary: a deploy producer feeding the pool and
//! a proposer that turns the pool into blocks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use autoprop_core::config::SimulationConfig;
use autoprop_core::{BlockHash, WorkItemId};
use autoprop_scheduler::{DeployPool, ProposeError, Proposer};

/// Proposer that includes every pending deploy in a new block.
pub struct PoolProposer {
    pool: Arc<DeployPool>,
    latency: Duration,
    fail_every: u64,
    attempts: AtomicU64,
}

impl PoolProposer {
    pub fn new(pool: Arc<DeployPool>, config: &SimulationConfig) -> Self {
        Self {
            pool,
            latency: config.propose_latency(),
            fail_every: config.fail_every,
            attempts: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl Proposer for PoolProposer {
    async fn propose(&self) -> Result<BlockHash, ProposeError> {
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        if self.pool.is_empty() {
            return Err(ProposeError::NoNewWork);
        }

        tokio::time::sleep(self.latency).await;

        if self.fail_every > 0 && attempt % self.fail_every == 0 {
            return Err(ProposeError::Failed(format!(
                "simulated failure on attempt {}",
                attempt
            )));
        }

        let included = self
            .pool
            .drain()
            .map_err(|e| ProposeError::Failed(e.to_string()))?;
        let hash = BlockHash::from(Uuid::new_v4());
        tracing::debug!(deploys = included.len(), block_hash = %hash, "Block created");
        Ok(hash)
    }
}

/// Add one random deploy to `pool` every `interval` until cancelled.
pub fn spawn_deploy_producer(
    pool: Arc<DeployPool>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let period = interval.max(Duration::from_millis(1));
    tokio::spawn(async move {
        tracing::info!(interval_ms = period.as_millis() as u64, "Deploy producer started");
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let id = WorkItemId::from(Uuid::new_v4());
                    match pool.add(id.clone()) {
                        Ok(_) => tracing::debug!(deploy = %id, pending = pool.len(), "Deploy received"),
                        Err(e) => {
                            tracing::warn!(error = %e, "Deploy pool unavailable, producer stopping");
                            break;
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim(latency_ms: u64, fail_every: u64) -> SimulationConfig {
        SimulationConfig {
            deploy_interval_ms: 100,
            propose_latency_ms: latency_ms,
            fail_every,
        }
    }

    #[tokio::test]
    async fn test_pool_proposer_drains_pool() {
        let pool = Arc::new(DeployPool::new());
        pool.add(WorkItemId::from("a")).unwrap();
        pool.add(WorkItemId::from("b")).unwrap();

        let proposer = PoolProposer::new(Arc::clone(&pool), &sim(0, 0));
        let hash = proposer.propose().await.unwrap();
        assert_eq!(hash.0.len(), 16);
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_pool_proposer_empty_pool() {
        let pool = Arc::new(DeployPool::new());
        let proposer = PoolProposer::new(pool, &sim(0, 0));
        assert_eq!(proposer.propose().await.unwrap_err(), ProposeError::NoNewWork);
    }

    #[tokio::test]
    async fn test_pool_proposer_fails_every_nth_attempt() {
        let pool = Arc::new(DeployPool::new());
        let proposer = PoolProposer::new(Arc::clone(&pool), &sim(0, 2));

        pool.add(WorkItemId::from("a")).unwrap();
        assert!(proposer.propose().await.is_ok());

        pool.add(WorkItemId::from("b")).unwrap();
        let err = proposer.propose().await.unwrap_err();
        assert!(matches!(err, ProposeError::Failed(_)));
        // Failed attempts keep the deploys pending.
        assert_eq!(pool.len(), 1);

        assert!(proposer.propose().await.is_ok());
        assert!(pool.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_producer_adds_deploys_until_cancelled() {
        let pool = Arc::new(DeployPool::new());
        let cancel = CancellationToken::new();
        let producer = spawn_deploy_producer(
            Arc::clone(&pool),
            Duration::from_millis(100),
            cancel.clone(),
        );

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(pool.len(), 3);

        cancel.cancel();
        producer.await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(pool.len(), 3);
    }
}
