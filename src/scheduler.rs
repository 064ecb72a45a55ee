use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A delayed task that is aborted when cancelled or dropped.
///
/// Replacing a stored `ScheduledTask` cancels the previous one, which gives
/// last-write-wins debouncing without extra bookkeeping.
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    pub fn after<F>(delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        Self { handle }
    }

    /// Aborts the task now instead of at drop.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
