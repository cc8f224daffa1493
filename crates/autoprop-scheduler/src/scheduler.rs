//! Debounced auto-proposer loop.
//!
//! Polls the pending deploy set every `check_interval` and proposes a block
//! once new deploys have waited `max_interval` or their count reaches
//! `max_count`. The first poll that sees pending work only opens the
//! debounce window, so a burst of deploys is batched instead of proposed
//! one at a time.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use autoprop_core::config::AutoProposeConfig;
use autoprop_core::{PendingSnapshot, WorkItemId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::clock::{Clock, SystemClock};
use crate::error::SchedulerError;
use crate::metrics::SchedulerMetrics;
use crate::propose::{ProposeLock, Proposer};
use crate::source::PendingWorkSource;

/// Validated scheduler limits. All three are required and must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    check_interval: Duration,
    max_interval: Duration,
    max_count: usize,
}

impl SchedulerConfig {
    pub fn new(
        check_interval: Duration,
        max_interval: Duration,
        max_count: usize,
    ) -> Result<Self, SchedulerError> {
        if check_interval.is_zero() {
            return Err(SchedulerError::InvalidConfig(
                "check_interval must be positive".to_string(),
            ));
        }
        if max_interval.is_zero() {
            return Err(SchedulerError::InvalidConfig(
                "max_interval must be positive".to_string(),
            ));
        }
        if max_count == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_count must be positive".to_string(),
            ));
        }
        Ok(Self {
            check_interval,
            max_interval,
            max_count,
        })
    }

    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    fn max_interval_millis(&self) -> i64 {
        i64::try_from(self.max_interval.as_millis()).unwrap_or(i64::MAX)
    }
}

impl TryFrom<&AutoProposeConfig> for SchedulerConfig {
    type Error = SchedulerError;

    fn try_from(config: &AutoProposeConfig) -> Result<Self, Self::Error> {
        Self::new(
            config.check_interval(),
            config.max_interval(),
            config.max_count,
        )
    }
}

/// What one poll decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// New work seen with no open window: open it, don't propose yet.
    StartDebounce,
    /// Limits exceeded for a set that differs from the last attempt.
    Propose { elapsed_millis: i64 },
    /// Nothing to do this round.
    Wait,
}

/// State carried from one poll to the next. Owned by a single loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopState {
    /// Deploys included in the most recent proposal attempt.
    pub last_proposed: HashSet<WorkItemId>,
    /// When the current debounce window opened. `None` when no window is open.
    pub debounce_start_millis: Option<i64>,
}

impl LoopState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a snapshot. Rules are checked in order, first match wins.
    ///
    /// An empty pending set never touches the state, so a window opened for
    /// work that later disappears without a proposal stays open.
    pub fn decide(&self, snapshot: &PendingSnapshot, config: &SchedulerConfig) -> Decision {
        if snapshot.is_empty() {
            return Decision::Wait;
        }
        let Some(start) = self.debounce_start_millis else {
            return Decision::StartDebounce;
        };
        let elapsed_millis = snapshot.observed_at_millis.saturating_sub(start);
        let limit_reached = elapsed_millis >= config.max_interval_millis()
            || snapshot.len() >= config.max_count();
        if limit_reached && snapshot.items != self.last_proposed {
            Decision::Propose { elapsed_millis }
        } else {
            Decision::Wait
        }
    }

    pub fn start_debounce(&mut self, now_millis: i64) {
        self.debounce_start_millis = Some(now_millis);
    }

    /// Record an attempt, successful or not, and close the window.
    pub fn record_proposal(&mut self, items: HashSet<WorkItemId>) {
        self.last_proposed = items;
        self.debounce_start_millis = None;
    }
}

/// Background block proposer driven by pending deploy counts and age.
pub struct AutoProposer {
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    source: Arc<dyn PendingWorkSource>,
    proposer: Arc<dyn Proposer>,
    lock: ProposeLock,
    metrics: Arc<SchedulerMetrics>,
}

impl AutoProposer {
    /// Create an auto-proposer using the system clock.
    ///
    /// `lock` must be the same lock every other caller of `proposer` uses.
    pub fn new(
        config: SchedulerConfig,
        source: Arc<dyn PendingWorkSource>,
        proposer: Arc<dyn Proposer>,
        lock: ProposeLock,
    ) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            source,
            proposer,
            lock,
            metrics: Arc::new(SchedulerMetrics::new()),
        }
    }

    /// Replace the time source (tests use a paused tokio clock).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<SchedulerMetrics> {
        &self.metrics
    }

    pub fn lock(&self) -> &ProposeLock {
        &self.lock
    }

    /// Run the loop until `cancel` fires or the pending source fails.
    ///
    /// Cancellation is only observed while sleeping between polls, so an
    /// iteration (including an in-flight proposal) always completes first.
    /// A source failure is logged once and ends the loop; it is not retried.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), SchedulerError> {
        info!(
            check_interval_ms = self.config.check_interval.as_millis() as u64,
            max_interval_ms = self.config.max_interval.as_millis() as u64,
            max_count = self.config.max_count,
            "Auto-proposer started"
        );

        let mut state = LoopState::new();
        loop {
            if let Err(e) = self.poll_once(&mut state).await {
                error!(error = %e, "Error in auto-proposer, stopping");
                return Err(e);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Auto-proposer cancelled");
                    return Ok(());
                }
                _ = self.clock.sleep(self.config.check_interval) => {}
            }
        }
    }

    async fn poll_once(&self, state: &mut LoopState) -> Result<(), SchedulerError> {
        let snapshot = self.snapshot().await?;
        self.metrics.record_poll();

        match state.decide(&snapshot, &self.config) {
            Decision::StartDebounce => {
                debug!(pending = snapshot.len(), "New deploys seen, debounce window opened");
                self.metrics.record_debounce_started();
                state.start_debounce(snapshot.observed_at_millis);
            }
            Decision::Propose { elapsed_millis } => {
                info!(
                    elapsed_ms = elapsed_millis,
                    pending = snapshot.len(),
                    "Proposing block"
                );
                self.try_propose().await;
                state.record_proposal(snapshot.items);
            }
            Decision::Wait => {}
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<PendingSnapshot, SchedulerError> {
        let now = self.clock.current_millis();
        let items = self.source.read_pending_ids().await?;
        Ok(PendingSnapshot::new(now, items))
    }

    /// Propose under the shared lock. Failures are logged and swallowed.
    async fn try_propose(&self) {
        self.metrics.record_attempt();
        let started = self.clock.current_millis();
        let result = self.lock.propose_with(self.proposer.as_ref()).await;
        let latency_ms = u64::try_from(self.clock.current_millis() - started).unwrap_or(0);
        self.metrics.record_outcome(result.is_ok(), latency_ms);

        match result {
            Ok(hash) => info!(block_hash = %hash, latency_ms, "Proposed block"),
            Err(e) => error!(error = %e, "Could not propose block"),
        }
    }
}
