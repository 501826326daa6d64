//! Blocking bridge.
//!
//! `wait` parks the calling thread until the completable terminates. Work
//! queued on a scheduler that only runs on the waiting thread (the
//! [`TestScheduler`](crate::scheduler::TestScheduler), or the trampoline of
//! an enclosing drain) never gets a chance to run, so waiting on it blocks
//! forever.

use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};

use crate::{completable::Completable, error::TimeoutError, observer::Observer, subscription::Subscription};

struct Signal<Err> {
  outcome: Mutex<Option<Result<(), Err>>>,
  done: Condvar,
}

struct WaitObserver<Err>(Arc<Signal<Err>>);

impl<Err> WaitObserver<Err> {
  fn settle(self, result: Result<(), Err>) {
    *self.0.outcome.lock() = Some(result);
    self.0.done.notify_all();
  }
}

impl<Err> Observer<Err> for WaitObserver<Err> {
  fn complete(self) { self.settle(Ok(())) }

  fn error(self, err: Err) { self.settle(Err(err)) }

  fn is_closed(&self) -> bool { self.0.outcome.lock().is_some() }
}

fn subscribe<C: Completable>(source: C) -> (Arc<Signal<C::Err>>, C::Unsub) {
  let signal = Arc::new(Signal { outcome: Mutex::new(None), done: Condvar::new() });
  let subscription = source.actual_subscribe(WaitObserver(signal.clone()));
  (signal, subscription)
}

pub(crate) fn wait<C: Completable>(source: C) -> Result<(), C::Err> {
  let (signal, _subscription) = subscribe(source);
  let mut outcome = signal.outcome.lock();
  loop {
    if let Some(result) = outcome.take() {
      return result;
    }
    signal.done.wait(&mut outcome);
  }
}

pub(crate) fn wait_timeout<C>(source: C, timeout: Duration) -> Result<(), C::Err>
where
  C: Completable,
  C::Err: From<TimeoutError>,
{
  let deadline = Instant::now() + timeout;
  let (signal, subscription) = subscribe(source);
  {
    let mut outcome = signal.outcome.lock();
    loop {
      if let Some(result) = outcome.take() {
        return result;
      }
      if signal.done.wait_until(&mut outcome, deadline).timed_out() {
        if let Some(result) = outcome.take() {
          return result;
        }
        break;
      }
    }
  }
  subscription.unsubscribe();
  Err(TimeoutError(timeout).into())
}
