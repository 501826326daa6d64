//! Virtual time scheduler for deterministic tests of time based operators.
//!
//! Time only moves when the test says so:
//!
//! ```rust
//! use std::time::Duration;
//!
//! use rx_completable::prelude::*;
//!
//! let scheduler = TestScheduler::new();
//! let handle = timer::<CompletableError, _>(Duration::from_secs(1), scheduler.clone())
//!   .subscribe();
//!
//! scheduler.advance_by(Duration::from_millis(999));
//! assert!(!handle.is_closed());
//! scheduler.advance_by(Duration::from_millis(1));
//! assert!(handle.is_closed());
//! ```
//!
//! Each `TestScheduler::new()` owns its own clock and queue; clones share
//! them.

use std::{
  cmp::Ordering,
  collections::BinaryHeap,
  mem,
  sync::{Arc, Weak},
  time::Duration,
};

use parking_lot::Mutex;

use super::{Scheduler, Task, TaskHandle};
use crate::subscription::Subscription;

// ==================== Clock ====================

#[derive(Default)]
struct VirtualClock {
  virtual_time: Duration,
  queue: BinaryHeap<QueuedTask>,
  next_seq: usize,
}

struct QueuedTask {
  due: Duration,
  seq: usize,
  task: Task,
  handle: TaskHandle,
}

impl PartialEq for QueuedTask {
  fn eq(&self, other: &Self) -> bool {
    self.due == other.due && self.seq == other.seq
  }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for QueuedTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // reversed: BinaryHeap pops the earliest due time, then the lowest seq
    other
      .due
      .cmp(&self.due)
      .then_with(|| other.seq.cmp(&self.seq))
  }
}

// ==================== TestScheduler ====================

#[derive(Clone, Default)]
pub struct TestScheduler(Arc<Mutex<VirtualClock>>);

impl TestScheduler {
  pub fn new() -> Self { Self::default() }

  /// Current virtual time, zero at construction.
  pub fn now(&self) -> Duration { self.0.lock().virtual_time }

  /// Number of queued tasks that were neither cancelled nor run.
  pub fn pending_count(&self) -> usize {
    self
      .0
      .lock()
      .queue
      .iter()
      .filter(|t| !t.handle.is_closed())
      .count()
  }

  pub fn is_empty(&self) -> bool { self.pending_count() == 0 }

  /// Number of tasks held in the queue, cancelled or not.
  #[cfg(test)]
  fn queued_len(&self) -> usize { self.0.lock().queue.len() }

  fn run_due(&self, until: Option<Duration>) {
    loop {
      let task = {
        let mut state = self.0.lock();
        let should_stop = state
          .queue
          .peek()
          .is_none_or(|next| until.is_some_and(|limit| next.due > limit));
        if should_stop {
          None
        } else {
          let scheduled = state.queue.pop();
          if let Some(scheduled) = &scheduled {
            state.virtual_time = state.virtual_time.max(scheduled.due);
          }
          scheduled
        }
      };

      let Some(QueuedTask { task, handle, .. }) = task else {
        break;
      };
      handle.run(task);
    }
  }

  /// Advance virtual time by `duration`, running every task that falls due,
  /// in time order and FIFO among equal times. Tasks scheduled by running
  /// tasks are included when they fall inside the window.
  pub fn advance_by(&self, duration: Duration) {
    let until = self.now() + duration;
    self.run_due(Some(until));
    let mut state = self.0.lock();
    state.virtual_time = state.virtual_time.max(until);
  }

  /// Run tasks until the queue is empty, jumping the clock to each due time.
  pub fn flush(&self) { self.run_due(None); }
}

impl Scheduler for TestScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let mut state = self.0.lock();
    let due = state.virtual_time + delay.unwrap_or(Duration::ZERO);
    let seq = state.next_seq;
    state.next_seq += 1;
    state.queue.push(QueuedTask { due, seq, task, handle: handle.clone() });
    drop(state);

    let clock = Arc::downgrade(&self.0);
    handle.on_cancel(move || purge_cancelled(&clock));
    handle
  }

  fn is_queued(&self) -> bool { true }
}

/// Drop cancelled tasks with their closures, outside the clock lock.
fn purge_cancelled(clock: &Weak<Mutex<VirtualClock>>) {
  let Some(clock) = clock.upgrade() else {
    return;
  };
  let purged: Vec<QueuedTask> = {
    let mut state = clock.lock();
    let (purged, kept): (Vec<_>, Vec<_>) =
      mem::take(&mut state.queue).into_vec().into_iter().partition(|t| t.handle.is_cancelled());
    state.queue = BinaryHeap::from(kept);
    purged
  };
  drop(purged);
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> Task {
    let log = log.clone();
    Box::new(move || log.lock().push(label))
  }

  // ==================== Time Advancement ====================

  #[completable_macro::test]
  fn advance_by_is_cumulative() {
    let scheduler = TestScheduler::new();
    scheduler.advance_by(Duration::from_millis(100));
    scheduler.advance_by(Duration::from_millis(50));
    assert_eq!(scheduler.now(), Duration::from_millis(150));
  }

  #[completable_macro::test]
  fn runs_in_time_order_then_fifo() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(vec![]));
    scheduler.schedule(record(&log, "c"), Some(Duration::from_millis(300)));
    scheduler.schedule(record(&log, "a"), Some(Duration::from_millis(100)));
    scheduler.schedule(record(&log, "b1"), Some(Duration::from_millis(200)));
    scheduler.schedule(record(&log, "b2"), Some(Duration::from_millis(200)));

    scheduler.advance_by(Duration::from_millis(200));
    assert_eq!(*log.lock(), vec!["a", "b1", "b2"]);
    assert_eq!(scheduler.pending_count(), 1);

    scheduler.flush();
    assert_eq!(*log.lock(), vec!["a", "b1", "b2", "c"]);
    assert_eq!(scheduler.now(), Duration::from_millis(300));
  }

  #[completable_macro::test]
  fn zero_delay_waits_for_advance() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(vec![]));
    scheduler.schedule(record(&log, "now"), None);
    assert!(log.lock().is_empty());
    scheduler.advance_by(Duration::ZERO);
    assert_eq!(*log.lock(), vec!["now"]);
  }

  // ==================== Cancellation ====================

  #[completable_macro::test]
  fn cancelled_task_does_not_run() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(vec![]));
    let handle = scheduler.schedule(record(&log, "x"), Some(Duration::from_millis(10)));
    assert_eq!(scheduler.pending_count(), 1);
    handle.unsubscribe();
    assert_eq!(scheduler.pending_count(), 0);
    scheduler.flush();
    assert!(log.lock().is_empty());
  }

  #[completable_macro::test]
  fn cancelled_task_leaves_the_queue() {
    let scheduler = TestScheduler::new();
    let payload = Arc::new(());
    let c_payload = payload.clone();
    let handle = scheduler.schedule(Box::new(move || drop(c_payload)), Some(Duration::from_secs(60)));
    let kept = scheduler.schedule(Box::new(|| {}), Some(Duration::from_secs(1)));
    assert_eq!(scheduler.queued_len(), 2);

    handle.unsubscribe();
    assert_eq!(scheduler.queued_len(), 1);
    assert_eq!(Arc::strong_count(&payload), 1);
    assert!(!kept.is_closed());
  }

  #[completable_macro::test]
  fn tasks_scheduled_by_tasks_join_the_window() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(vec![]));
    let (c_scheduler, c_log) = (scheduler.clone(), log.clone());
    scheduler.schedule(
      Box::new(move || {
        c_log.lock().push("first");
        c_scheduler.schedule(record(&c_log, "second"), Some(Duration::from_millis(10)));
      }),
      Some(Duration::from_millis(10)),
    );
    scheduler.advance_by(Duration::from_millis(20));
    assert_eq!(*log.lock(), vec!["first", "second"]);
  }

  #[completable_macro::test]
  fn clones_share_the_clock() {
    let a = TestScheduler::new();
    let b = a.clone();
    a.advance_by(Duration::from_secs(1));
    assert_eq!(b.now(), Duration::from_secs(1));
    assert_eq!(TestScheduler::new().now(), Duration::ZERO);
  }
}
