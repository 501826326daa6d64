use std::time::Duration;

use tokio::runtime::Handle;

use super::{Scheduler, Task, TaskHandle};

/// Runs tasks on a tokio runtime; delays use `tokio::time::sleep`.
#[derive(Debug, Clone)]
pub struct TokioScheduler(pub Handle);

impl TokioScheduler {
  /// Scheduler for the runtime the caller is running in.
  ///
  /// Returns `None` outside of a tokio runtime.
  pub fn current() -> Option<Self> { Handle::try_current().ok().map(Self) }
}

impl Scheduler for TokioScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let c_handle = handle.clone();
    let join = self.0.spawn(async move {
      if let Some(delay) = delay.filter(|d| !d.is_zero()) {
        tokio::time::sleep(delay).await;
      }
      c_handle.run(task);
    });
    handle.on_cancel(move || join.abort());
    handle
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[completable_macro::test(shared)]
  async fn runs_on_runtime() {
    let scheduler = TokioScheduler::current().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel();
    scheduler.schedule(
      Box::new(move || {
        let _ = tx.send(7);
      }),
      Some(Duration::from_millis(5)),
    );
    assert_eq!(rx.await.unwrap(), 7);
  }

  #[completable_macro::test(shared)]
  async fn cancel_aborts_a_pending_delay() {
    let scheduler = TokioScheduler::current().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let handle = scheduler.schedule(Box::new(move || drop(tx)), Some(Duration::from_secs(60)));
    handle.cancel();

    // the sender goes away with the aborted task, long before the delay
    let outcome = tokio::time::timeout(Duration::from_secs(5), rx).await;
    assert!(matches!(outcome, Ok(Err(_))));
  }
}
