//! Execution contexts.
//!
//! A [`Scheduler`] runs a [`Task`] now, after a delay, or queued behind the
//! work already running on the current thread. Schedulers are plain values
//! passed to the operators that need them; the crate holds no global one.
//!
//! | Scheduler | Runs tasks |
//! |-----------|------------|
//! | [`ImmediateScheduler`] | synchronously, blocking through the delay |
//! | [`TrampolineScheduler`] | on the current thread, queued behind running work |
//! | [`NewThreadScheduler`] | on a fresh thread per task |
//! | [`TestScheduler`] | on virtual time, when the test advances it |
//! | `TokioScheduler` | on a tokio runtime (feature `tokio-scheduler`) |

use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};

use crate::subscription::Subscription;

#[cfg(test)]
mod held;
mod immediate;
mod test_scheduler;
mod thread_scheduler;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;
mod trampoline;

#[cfg(test)]
pub(crate) use held::HeldScheduler;
pub use immediate::ImmediateScheduler;
pub use test_scheduler::TestScheduler;
pub use thread_scheduler::NewThreadScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;
pub use trampoline::TrampolineScheduler;

/// A unit of work handed to a scheduler.
pub type Task = Box<dyn FnOnce() + Send>;

pub trait Scheduler: Clone + Send + Sync + 'static {
  /// Run `task` once `delay` elapsed (as soon as possible for `None`).
  ///
  /// Unsubscribing the returned handle before the task started prevents it
  /// from running.
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle;

  /// Whether tasks scheduled from inside a running task are queued behind it
  /// rather than started right away. Such a scheduler already preserves
  /// submission order, so `observe_on` delegates to it directly.
  fn is_queued(&self) -> bool { false }
}

// ==================== TaskHandle ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskStatus {
  Pending,
  Running,
  Finished,
  Cancelled,
}

type CancelHook = Box<dyn FnOnce() + Send>;

struct TaskSlot {
  status: Mutex<TaskStatus>,
  wake: Condvar,
  /// Locked after `status`, only while the task is pending.
  on_cancel: Mutex<Option<CancelHook>>,
}

/// Handle of a scheduled task, cancels it when unsubscribed.
#[derive(Clone)]
pub struct TaskHandle(Arc<TaskSlot>);

impl Default for TaskHandle {
  fn default() -> Self {
    Self(Arc::new(TaskSlot {
      status: Mutex::new(TaskStatus::Pending),
      wake: Condvar::new(),
      on_cancel: Mutex::new(None),
    }))
  }
}

impl TaskHandle {
  pub fn new() -> Self { Self::default() }

  /// A handle for work that already ran.
  pub fn finished() -> Self {
    let handle = Self::new();
    *handle.0.status.lock() = TaskStatus::Finished;
    handle
  }

  /// Run `task` unless the handle was cancelled first.
  pub fn run(&self, task: Task) {
    let hook = {
      let mut status = self.0.status.lock();
      if *status != TaskStatus::Pending {
        return;
      }
      *status = TaskStatus::Running;
      self.0.on_cancel.lock().take()
    };
    drop(hook);
    task();
    let mut status = self.0.status.lock();
    if *status == TaskStatus::Running {
      *status = TaskStatus::Finished;
    }
    self.0.wake.notify_all();
  }

  /// Block the current thread for `delay` or until the handle is cancelled.
  /// Returns `false` if it was cancelled.
  pub fn sleep(&self, delay: Duration) -> bool {
    let deadline = Instant::now() + delay;
    let mut status = self.0.status.lock();
    while *status == TaskStatus::Pending {
      if self.0.wake.wait_until(&mut status, deadline).timed_out() {
        break;
      }
    }
    *status == TaskStatus::Pending
  }

  pub fn is_cancelled(&self) -> bool { *self.0.status.lock() == TaskStatus::Cancelled }

  pub fn is_finished(&self) -> bool { *self.0.status.lock() == TaskStatus::Finished }

  /// Same as `unsubscribe`, through a shared reference.
  pub fn cancel(&self) {
    let hook = {
      let mut status = self.0.status.lock();
      if *status != TaskStatus::Pending {
        return;
      }
      *status = TaskStatus::Cancelled;
      self.0.wake.notify_all();
      self.0.on_cancel.lock().take()
    };
    if let Some(hook) = hook {
      hook();
    }
  }

  /// Let the scheduler release what it holds for the task once the handle
  /// is cancelled. Runs `hook` right away if that already happened, never
  /// once the task started.
  pub fn on_cancel(&self, hook: impl FnOnce() + Send + 'static) {
    let status = self.0.status.lock();
    match *status {
      TaskStatus::Pending => *self.0.on_cancel.lock() = Some(Box::new(hook)),
      TaskStatus::Cancelled => {
        drop(status);
        hook();
      }
      TaskStatus::Running | TaskStatus::Finished => {}
    }
  }
}

impl Subscription for TaskHandle {
  #[inline]
  fn unsubscribe(self) { self.cancel() }

  fn is_closed(&self) -> bool {
    matches!(*self.0.status.lock(), TaskStatus::Finished | TaskStatus::Cancelled)
  }
}
