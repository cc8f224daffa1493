//! Starting and stopping the auto-proposer as a background task.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::SchedulerError;
use crate::scheduler::AutoProposer;

/// Owner's handle to a running [`AutoProposer`].
///
/// Dropping the handle cancels the loop; call [`stop`](Self::stop) to also
/// wait for it to finish. Keep the handle alive for as long as the loop
/// should run.
pub struct AutoProposerHandle {
    auto_proposer: Arc<AutoProposer>,
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<(), SchedulerError>>>,
}

impl AutoProposer {
    /// Spawn the loop on the current tokio runtime.
    pub fn start(self) -> AutoProposerHandle {
        let auto_proposer = Arc::new(self);
        let cancel = CancellationToken::new();

        let runner = Arc::clone(&auto_proposer);
        let token = cancel.clone();
        let task = tokio::spawn(async move { runner.run(token).await });

        AutoProposerHandle {
            auto_proposer,
            cancel,
            task: Some(task),
        }
    }
}

impl AutoProposerHandle {
    pub fn auto_proposer(&self) -> &Arc<AutoProposer> {
        &self.auto_proposer
    }

    /// True until the loop has exited, whether by cancellation or failure.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the loop and wait for it to exit.
    ///
    /// An in-flight proposal is allowed to finish; once this returns no
    /// further proposal will be started. Returns the loop's own error if it
    /// had already died. Calling it again is a no-op returning `Ok(())`.
    pub async fn stop(&mut self) -> Result<(), SchedulerError> {
        self.cancel.cancel();
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        let result = task
            .await
            .map_err(|e| SchedulerError::Join(e.to_string()))?;
        info!("Auto-proposer stopped");
        result
    }
}

impl Drop for AutoProposerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
