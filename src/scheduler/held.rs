use std::{
  sync::Arc,
  thread::{self, JoinHandle},
  time::Duration,
};

use parking_lot::{Condvar, Mutex};

use super::{Scheduler, Task, TaskHandle};

#[derive(Default)]
struct Latch {
  started: usize,
  released: bool,
}

/// Test scheduler running each task on its own thread, parked inside the
/// running task until [`release`](Self::release). Delays are ignored.
#[derive(Clone, Default)]
pub(crate) struct HeldScheduler {
  latch: Arc<(Mutex<Latch>, Condvar)>,
  workers: Arc<Mutex<Vec<JoinHandle<()>>>>,
  queued: bool,
}

impl HeldScheduler {
  /// Same, reporting itself as a queued scheduler.
  pub(crate) fn queued() -> Self { Self { queued: true, ..Self::default() } }

  /// Block until `count` tasks are parked.
  pub(crate) fn wait_started(&self, count: usize) {
    let (latch, wake) = &*self.latch;
    let mut latch = latch.lock();
    while latch.started < count {
      wake.wait(&mut latch);
    }
  }

  /// Let every parked task finish and join their threads.
  pub(crate) fn release(&self) {
    {
      let (latch, wake) = &*self.latch;
      latch.lock().released = true;
      wake.notify_all();
    }
    let workers = std::mem::take(&mut *self.workers.lock());
    for worker in workers {
      let _ = worker.join();
    }
  }
}

impl Scheduler for HeldScheduler {
  fn schedule(&self, task: Task, _delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let c_handle = handle.clone();
    let latch = self.latch.clone();
    let worker = thread::spawn(move || {
      c_handle.run(Box::new(move || {
        let (latch, wake) = &*latch;
        let mut state = latch.lock();
        state.started += 1;
        wake.notify_all();
        while !state.released {
          wake.wait(&mut state);
        }
        drop(state);
        task();
      }))
    });
    self.workers.lock().push(worker);
    handle
  }

  fn is_queued(&self) -> bool { self.queued }
}
