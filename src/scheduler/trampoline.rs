use std::{
  cell::RefCell,
  cmp::Ordering,
  collections::BinaryHeap,
  time::{Duration, Instant},
};

use super::{Scheduler, Task, TaskHandle};

struct Queued {
  due: Instant,
  seq: u64,
  task: Task,
  handle: TaskHandle,
}

impl PartialEq for Queued {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.seq == other.seq }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Queued {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier due first, then FIFO
    other.due.cmp(&self.due).then_with(|| other.seq.cmp(&self.seq))
  }
}

#[derive(Default)]
struct Queue {
  heap: BinaryHeap<Queued>,
  seq: u64,
}

thread_local! {
  /// `Some` while a trampoline drains on this thread.
  static QUEUE: RefCell<Option<Queue>> = const { RefCell::new(None) };
}

/// Clears the thread's queue even if a task panics.
struct DrainGuard;

impl Drop for DrainGuard {
  fn drop(&mut self) { QUEUE.with(|q| *q.borrow_mut() = None); }
}

/// Runs tasks on the current thread, queued behind the work that is already
/// running there.
///
/// The first `schedule` on a thread becomes the drain loop and returns once
/// the queue is empty; tasks scheduled while it runs are appended and return
/// immediately. Recursive scheduling therefore never grows the stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrampolineScheduler;

fn push(queue: &mut Queue, task: Task, delay: Option<Duration>, handle: TaskHandle) {
  let seq = queue.seq;
  queue.seq += 1;
  let due = Instant::now() + delay.unwrap_or(Duration::ZERO);
  queue.heap.push(Queued { due, seq, task, handle });
}

impl Scheduler for TrampolineScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let c_handle = handle.clone();
    let mut task = Some(task);
    let enqueued = QUEUE.with(|q| match q.borrow_mut().as_mut() {
      Some(queue) => {
        if let Some(task) = task.take() {
          push(queue, task, delay, c_handle);
        }
        true
      }
      None => false,
    });
    if enqueued {
      return handle;
    }

    let mut queue = Queue::default();
    if let Some(task) = task.take() {
      push(&mut queue, task, delay, handle.clone());
    }
    QUEUE.with(|q| *q.borrow_mut() = Some(queue));
    let _guard = DrainGuard;
    loop {
      let next = QUEUE.with(|q| q.borrow_mut().as_mut().and_then(|queue| queue.heap.pop()));
      let Some(Queued { due, task, handle, .. }) = next else {
        break;
      };
      let wait = due.saturating_duration_since(Instant::now());
      if !wait.is_zero() && !handle.sleep(wait) {
        continue;
      }
      handle.run(task);
    }
    handle
  }

  fn is_queued(&self) -> bool { true }
}
