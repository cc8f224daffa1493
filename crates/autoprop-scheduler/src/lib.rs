//! Automatic block proposal for a node.
//!
//! Watches the pending deploy set and proposes a block once new deploys have
//! waited long enough or piled up, serializing proposals with any other
//! caller through a shared lock.

pub mod clock;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod propose;
pub mod scheduler;
pub mod source;

pub use clock::{Clock, SystemClock, TokioClock};
pub use error::{ProposeError, SchedulerError};
pub use lifecycle::AutoProposerHandle;
pub use metrics::{MetricsSnapshot, SchedulerMetrics};
pub use propose::{ProposeGuard, ProposeLock, Proposer};
pub use scheduler::{AutoProposer, Decision, LoopState, SchedulerConfig};
pub use source::{DeployPool, PendingWorkSource};
