use std::{thread, time::Duration};

use super::{Scheduler, Task, TaskHandle};

/// Runs every task on a newly spawned thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewThreadScheduler;

impl Scheduler for NewThreadScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let c_handle = handle.clone();
    let spawned = thread::Builder::new()
      .name("rx-completable-worker".into())
      .spawn(move || {
        if let Some(delay) = delay.filter(|d| !d.is_zero()) {
          if !c_handle.sleep(delay) {
            return;
          }
        }
        c_handle.run(task);
      });
    if let Err(err) = spawned {
      tracing::error!(%err, "failed to spawn scheduler thread, task dropped");
      handle.cancel();
    }
    handle
  }
}

#[cfg(test)]
mod tests {
  use std::sync::mpsc::channel;

  use super::*;
  use crate::subscription::Subscription;

  #[completable_macro::test]
  fn runs_on_another_thread() {
    let (tx, rx) = channel();
    let caller = thread::current().id();
    NewThreadScheduler.schedule(
      Box::new(move || {
        let _ = tx.send(thread::current().id());
      }),
      None,
    );
    assert_ne!(rx.recv().unwrap(), caller);
  }

  #[completable_macro::test]
  fn cancel_during_delay() {
    let (tx, rx) = channel::<()>();
    let handle = NewThreadScheduler.schedule(
      Box::new(move || {
        let _ = tx.send(());
      }),
      Some(Duration::from_secs(30)),
    );
    handle.clone().unsubscribe();
    assert!(rx.recv().is_err());
    assert!(handle.is_closed());
  }
}
