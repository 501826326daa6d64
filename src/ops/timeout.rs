//! Time limits.
//!
//! Both operators schedule their timer before subscribing the source, so a
//! source that terminates synchronously still finds the handle to cancel.

use std::time::Duration;

use tracing::trace;

use crate::{
  completable::Completable,
  error::TimeoutError,
  gate::Gate,
  observer::Observer,
  scheduler::{Scheduler, TaskHandle},
  subscription::{SingleAssignmentSubscription, SourceWithHandle, Subscription, TupleSubscription},
};

// ==================== Timeout ====================

/// Fails with [`TimeoutError`] unless the source terminates in time.
///
/// This struct is created by `CompletableExt::timeout`.
#[derive(Clone)]
pub struct Timeout<S, Sch> {
  source: S,
  duration: Duration,
  scheduler: Sch,
}

impl<S, Sch> Timeout<S, Sch> {
  #[inline]
  pub fn new(source: S, duration: Duration, scheduler: Sch) -> Self {
    Self { source, duration, scheduler }
  }
}

/// Forwards the source terminal if it beats the timer.
pub struct RaceObserver<O> {
  observer: Gate<Option<O>>,
  timer: TaskHandle,
}

impl<O> RaceObserver<O> {
  fn win(&self) -> Option<O> {
    let observer = self.observer.lock().take();
    if observer.is_some() {
      self.timer.cancel();
    }
    observer
  }
}

impl<O, Err> Observer<Err> for RaceObserver<O>
where
  O: Observer<Err>,
{
  fn complete(self) {
    if let Some(observer) = self.win() {
      observer.complete();
    }
  }

  fn error(self, err: Err) {
    if let Some(observer) = self.win() {
      observer.error(err);
    }
  }

  fn is_closed(&self) -> bool { Observer::<Err>::is_closed(&self.observer) }
}

impl<S, Sch> Completable for Timeout<S, Sch>
where
  S: Completable,
  S::Err: From<TimeoutError>,
  Sch: Scheduler,
{
  type Err = S::Err;
  type Unsub = SourceWithHandle<SingleAssignmentSubscription, TaskHandle>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let Self { source, duration, scheduler } = self;
    let observer = Gate::new(Some(observer));
    let source_slot = SingleAssignmentSubscription::new();

    let c_observer = observer.clone();
    let c_slot = source_slot.clone();
    let timer = scheduler.schedule(
      Box::new(move || {
        let observer = c_observer.lock().take();
        if let Some(observer) = observer {
          trace!(?duration, "completable timed out");
          c_slot.dispose();
          observer.error(TimeoutError(duration).into());
        }
      }),
      Some(duration),
    );

    if !Observer::<S::Err>::is_closed(&observer) {
      source_slot.set(source.actual_subscribe(RaceObserver { observer, timer: timer.clone() }));
    }
    SourceWithHandle::new(source_slot, timer)
  }
}

// ==================== TimeoutWith ====================

/// Like [`Timeout`], but switches to a fallback completable instead of
/// failing.
///
/// This struct is created by `CompletableExt::timeout_with`.
#[derive(Clone)]
pub struct TimeoutWith<S, F, Sch> {
  source: S,
  duration: Duration,
  fallback: F,
  scheduler: Sch,
}

impl<S, F, Sch> TimeoutWith<S, F, Sch> {
  #[inline]
  pub fn new(source: S, duration: Duration, fallback: F, scheduler: Sch) -> Self {
    Self { source, duration, fallback, scheduler }
  }
}

impl<S, F, Sch> Completable for TimeoutWith<S, F, Sch>
where
  S: Completable,
  F: Completable<Err = S::Err>,
  Sch: Scheduler,
{
  type Err = S::Err;
  type Unsub =
    TupleSubscription<SourceWithHandle<SingleAssignmentSubscription, TaskHandle>, SingleAssignmentSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let Self { source, duration, fallback, scheduler } = self;
    let observer = Gate::new(Some(observer));
    let source_slot = SingleAssignmentSubscription::new();
    let fallback_slot = SingleAssignmentSubscription::new();

    let c_observer = observer.clone();
    let c_source = source_slot.clone();
    let c_fallback = fallback_slot.clone();
    let timer = scheduler.schedule(
      Box::new(move || {
        let observer = c_observer.lock().take();
        if let Some(observer) = observer {
          trace!(?duration, "completable timed out, switching to fallback");
          c_source.dispose();
          if !c_fallback.is_closed() {
            c_fallback.set(fallback.actual_subscribe(observer));
          }
        }
      }),
      Some(duration),
    );

    if !Observer::<S::Err>::is_closed(&observer) {
      source_slot.set(source.actual_subscribe(RaceObserver { observer, timer: timer.clone() }));
    }
    TupleSubscription::new(SourceWithHandle::new(source_slot, timer), fallback_slot)
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

  use crate::{
    ops::racing::{completes, fails, terminal_event},
    prelude::*,
  };

  #[completable_macro::test]
  fn slow_source_times_out() {
    let scheduler = TestScheduler::new();
    let errors = Arc::new(Mutex::new(vec![]));
    let c_errors = errors.clone();
    timer::<CompletableError, _>(Duration::from_secs(10), scheduler.clone())
      .timeout(Duration::from_secs(1), scheduler.clone())
      .subscribe_all(|| {}, move |err| c_errors.lock().push(err));

    scheduler.advance_by(Duration::from_millis(999));
    assert!(errors.lock().is_empty());
    scheduler.advance_by(Duration::from_millis(1));
    assert_eq!(errors.lock().len(), 1);
    assert!(errors.lock()[0].is_timeout());
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[completable_macro::test]
  fn fast_source_cancels_timer() {
    let scheduler = TestScheduler::new();
    let done = Arc::new(AtomicBool::new(false));
    let c_done = done.clone();
    timer::<CompletableError, _>(Duration::from_millis(10), scheduler.clone())
      .timeout(Duration::from_secs(1), scheduler.clone())
      .subscribe_all(move || c_done.store(true, Ordering::SeqCst), |_| panic!("timed out"));

    scheduler.advance_by(Duration::from_millis(10));
    assert!(done.load(Ordering::SeqCst));
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[completable_macro::test]
  fn source_error_is_forwarded() {
    let scheduler = TestScheduler::new();
    let result = throw(CompletableError::from("broken"))
      .timeout(Duration::from_secs(1), scheduler.clone())
      .wait();
    assert_eq!(result.unwrap_err().to_string(), "broken");
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[completable_macro::test]
  fn timeout_with_switches_to_fallback() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(vec![]));
    let (c_log, f_log) = (log.clone(), log.clone());
    never::<CompletableError>()
      .on_cancel(move || c_log.lock().push("source cancelled"))
      .timeout_with(
        Duration::from_secs(1),
        from_fn(move || f_log.lock().push("fallback")),
        scheduler.clone(),
      )
      .subscribe();

    scheduler.advance_by(Duration::from_secs(1));
    assert_eq!(*log.lock(), vec!["source cancelled", "fallback"]);
  }

  #[completable_macro::test]
  fn dispose_cancels_timer_and_source() {
    let scheduler = TestScheduler::new();
    let handle = timer::<CompletableError, _>(Duration::from_secs(10), scheduler.clone())
      .timeout(Duration::from_secs(1), scheduler.clone())
      .subscribe_all(|| {}, |_| panic!("should not fire"));
    handle.unsubscribe();
    assert_eq!(scheduler.pending_count(), 0);
    scheduler.flush();
  }

  #[completable_macro::test]
  fn timer_racing_the_source_terminates_once() {
    for _ in 0..300 {
      let event = terminal_event(completes().timeout(Duration::from_millis(1), NewThreadScheduler));
      assert!(event == "complete" || event == "error");
      assert_eq!(
        terminal_event(fails().timeout(Duration::from_secs(5), NewThreadScheduler)),
        "error"
      );
    }
  }
}
