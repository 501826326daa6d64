use std::time::Duration;

use crate::{
  completable::Completable,
  gate::Gate,
  observer::{BoxedObserver, Observer},
  scheduler::Scheduler,
  subscription::{SingleAssignmentSubscription, Subscription},
};

/// Shifts completion by a fixed duration. Errors pass through at once.
///
/// This struct is created by `CompletableExt::delay`.
#[derive(Clone)]
pub struct Delay<S, Sch> {
  source: S,
  delay: Duration,
  scheduler: Sch,
}

impl<S, Sch> Delay<S, Sch> {
  #[inline]
  pub fn new(source: S, delay: Duration, scheduler: Sch) -> Self { Self { source, delay, scheduler } }
}

pub struct DelayObserver<Err, Sch> {
  observer: Gate<Option<BoxedObserver<Err>>>,
  delay: Duration,
  scheduler: Sch,
  timer: SingleAssignmentSubscription,
}

impl<Err, Sch> Observer<Err> for DelayObserver<Err, Sch>
where
  Err: Send + 'static,
  Sch: Scheduler,
{
  fn complete(self) {
    if self.timer.is_closed() {
      return;
    }
    // disposal empties the gate, even once the task started
    let observer = self.observer;
    let handle = self
      .scheduler
      .schedule(Box::new(move || Observer::<Err>::complete(observer)), Some(self.delay));
    self.timer.set(handle);
  }

  fn error(self, err: Err) { Observer::<Err>::error(self.observer, err) }

  fn is_closed(&self) -> bool { Observer::<Err>::is_closed(&self.observer) }
}

pub struct DelaySubscription<U, Err> {
  source: U,
  timer: SingleAssignmentSubscription,
  observer: Gate<Option<BoxedObserver<Err>>>,
}

impl<U: Subscription, Err> Subscription for DelaySubscription<U, Err> {
  fn unsubscribe(self) {
    self.source.unsubscribe();
    self.timer.dispose();
    let observer = self.observer.lock().take();
    drop(observer);
  }

  fn is_closed(&self) -> bool { self.observer.lock().is_none() }
}

impl<S, Sch> Completable for Delay<S, Sch>
where
  S: Completable,
  Sch: Scheduler,
{
  type Err = S::Err;
  type Unsub = DelaySubscription<S::Unsub, S::Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let observer: Gate<Option<BoxedObserver<S::Err>>> = Gate::new(Some(Box::new(observer)));
    let timer = SingleAssignmentSubscription::new();
    let source = self.source.actual_subscribe(DelayObserver {
      observer: observer.clone(),
      delay: self.delay,
      scheduler: self.scheduler,
      timer: timer.clone(),
    });
    DelaySubscription { source, timer, observer }
  }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{
      atomic::{AtomicBool, Ordering},
      Arc,
    },
    time::Duration,
  };

  use parking_lot::Mutex;

  use crate::{observer::CallbackObserver, prelude::*, scheduler::HeldScheduler};

  #[completable_macro::test]
  fn completion_is_shifted() {
    let scheduler = TestScheduler::new();
    let done = Arc::new(AtomicBool::new(false));
    let c_done = done.clone();
    empty::<CompletableError>()
      .delay(Duration::from_millis(50), scheduler.clone())
      .subscribe_complete(move || c_done.store(true, Ordering::SeqCst));

    scheduler.advance_by(Duration::from_millis(49));
    assert!(!done.load(Ordering::SeqCst));
    scheduler.advance_by(Duration::from_millis(1));
    assert!(done.load(Ordering::SeqCst));
  }

  #[completable_macro::test]
  fn errors_are_not_delayed() {
    let scheduler = TestScheduler::new();
    let errors = Arc::new(Mutex::new(vec![]));
    let c_errors = errors.clone();
    throw(CompletableError::from("now"))
      .delay(Duration::from_secs(5), scheduler.clone())
      .subscribe_all(|| {}, move |err| c_errors.lock().push(err.to_string()));
    assert_eq!(*errors.lock(), vec!["now".to_string()]);
  }

  #[completable_macro::test]
  fn dispose_cancels_pending_completion() {
    let scheduler = TestScheduler::new();
    let done = Arc::new(AtomicBool::new(false));
    let c_done = done.clone();
    let handle = empty::<CompletableError>()
      .delay(Duration::from_millis(50), scheduler.clone())
      .subscribe_complete(move || c_done.store(true, Ordering::SeqCst));
    handle.unsubscribe();
    scheduler.flush();
    assert!(!done.load(Ordering::SeqCst));
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[completable_macro::test]
  fn dispose_while_the_completion_task_runs_is_silent() {
    let scheduler = HeldScheduler::default();
    let done = Arc::new(AtomicBool::new(false));
    let c_done = done.clone();
    let handle = empty::<CompletableError>()
      .delay(Duration::ZERO, scheduler.clone())
      .actual_subscribe(CallbackObserver {
        on_complete: move || c_done.store(true, Ordering::SeqCst),
        on_error: |_: CompletableError| {},
      });

    scheduler.wait_started(1);
    handle.unsubscribe();
    scheduler.release();
    assert!(!done.load(Ordering::SeqCst));
  }
}
