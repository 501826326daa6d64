use std::time::Duration;

use super::{Scheduler, Task, TaskHandle};

/// Runs every task synchronously on the calling thread.
///
/// A delay blocks the caller; cancelling the handle from another thread
/// during the delay skips the task.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    if let Some(delay) = delay.filter(|d| !d.is_zero()) {
      if !handle.sleep(delay) {
        return handle;
      }
    }
    handle.run(task);
    handle
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;
  use crate::subscription::Subscription;

  #[completable_macro::test]
  fn runs_before_returning() {
    let hits = Arc::new(AtomicUsize::new(0));
    let c_hits = hits.clone();
    let handle = ImmediateScheduler.schedule(
      Box::new(move || {
        c_hits.fetch_add(1, Ordering::SeqCst);
      }),
      Some(Duration::from_millis(1)),
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(handle.is_closed());
  }
}
