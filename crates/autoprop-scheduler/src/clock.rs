//! Time source used by the scheduler loop.

use std::time::Duration;

use async_trait::async_trait;

/// Current time in milliseconds plus a sleep that the loop can race against
/// its cancellation token.
#[async_trait]
pub trait Clock: Send + Sync {
    fn current_millis(&self) -> i64;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock (Unix epoch milliseconds) with tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn current_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Milliseconds elapsed on the tokio clock since this value was created.
///
/// Follows `tokio::time::pause`, so tests running with paused time see a
/// fully deterministic schedule.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    epoch: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            epoch: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn current_millis(&self) -> i64 {
        i64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(i64::MAX)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_unix_millis() {
        let before = chrono::Utc::now().timestamp_millis();
        let now = SystemClock.current_millis();
        assert!(now >= before);
        // Sanity: after 2020-01-01.
        assert!(now > 1_577_836_800_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_paused_time() {
        let clock = TokioClock::new();
        assert_eq!(clock.current_millis(), 0);

        clock.sleep(Duration::from_millis(250)).await;
        assert_eq!(clock.current_millis(), 250);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(clock.current_millis(), 1_250);
    }
}
