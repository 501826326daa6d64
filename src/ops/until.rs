use crate::{
  completable::Completable,
  gate::Gate,
  observer::Observer,
  subscription::{SingleAssignmentSubscription, TupleSubscription},
};

/// Races a source against another completable.
///
/// This struct is created by `CompletableExt::until`.
#[derive(Clone)]
pub struct Until<S, T> {
  source: S,
  other: T,
}

impl<S, T> Until<S, T> {
  #[inline]
  pub fn new(source: S, other: T) -> Self { Self { source, other } }
}

/// Delivers the first terminal event of either racer and disposes both
/// slots, the loser's first.
pub struct UntilObserver<O> {
  observer: Gate<Option<O>>,
  own: SingleAssignmentSubscription,
  loser: SingleAssignmentSubscription,
}

impl<O> UntilObserver<O> {
  fn win(&self) -> Option<O> {
    let observer = self.observer.lock().take();
    if observer.is_some() {
      self.loser.dispose();
      self.own.dispose();
    }
    observer
  }
}

impl<O, Err> Observer<Err> for UntilObserver<O>
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

impl<S, T> Completable for Until<S, T>
where
  S: Completable,
  T: Completable<Err = S::Err>,
{
  type Err = S::Err;
  type Unsub = TupleSubscription<SingleAssignmentSubscription, SingleAssignmentSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let observer = Gate::new(Some(observer));
    let source_slot = SingleAssignmentSubscription::new();
    let other_slot = SingleAssignmentSubscription::new();

    other_slot.set(self.other.actual_subscribe(UntilObserver {
      observer: observer.clone(),
      own: other_slot.clone(),
      loser: source_slot.clone(),
    }));
    if !Observer::<S::Err>::is_closed(&observer) {
      source_slot.set(self.source.actual_subscribe(UntilObserver {
        observer,
        own: source_slot.clone(),
        loser: other_slot.clone(),
      }));
    }
    TupleSubscription::new(source_slot, other_slot)
  }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{
      atomic::{AtomicUsize, Ordering},
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
  fn other_completing_first_cancels_source() {
    let scheduler = TestScheduler::new();
    let done = Arc::new(AtomicUsize::new(0));
    let c_done = done.clone();
    let handle = timer::<CompletableError, _>(Duration::from_secs(10), scheduler.clone())
      .until(timer(Duration::from_secs(1), scheduler.clone()))
      .subscribe_complete(move || {
        c_done.fetch_add(1, Ordering::SeqCst);
      });

    scheduler.advance_by(Duration::from_secs(1));
    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.pending_count(), 0);
    assert!(handle.is_closed());
  }

  #[completable_macro::test]
  fn source_winning_cancels_other() {
    let scheduler = TestScheduler::new();
    let errors = Arc::new(Mutex::new(vec![]));
    let c_errors = errors.clone();
    timer::<CompletableError, _>(Duration::from_secs(1), scheduler.clone())
      .then(throw(CompletableError::from("source failed")))
      .until(timer(Duration::from_secs(5), scheduler.clone()))
      .subscribe_all(|| {}, move |err| c_errors.lock().push(err.to_string()));

    scheduler.flush();
    assert_eq!(*errors.lock(), vec!["source failed".to_string()]);
  }

  #[completable_macro::test]
  fn other_error_propagates() {
    let result = never::<CompletableError>()
      .until(throw(CompletableError::from("stop")))
      .wait();
    assert_eq!(result.unwrap_err().to_string(), "stop");
  }

  #[completable_macro::test]
  fn synchronous_other_skips_source() {
    let subscribed = Arc::new(AtomicUsize::new(0));
    let c_subscribed = subscribed.clone();
    from_fn::<CompletableError, _, _>(move || {
      c_subscribed.fetch_add(1, Ordering::SeqCst);
    })
    .until(empty())
    .subscribe();
    assert_eq!(subscribed.load(Ordering::SeqCst), 0);
  }

  #[completable_macro::test]
  fn racers_on_different_threads_terminate_once() {
    for _ in 0..300 {
      let event = terminal_event(completes().until(fails()));
      assert!(event == "complete" || event == "error");
      assert_eq!(terminal_event(fails().until(never())), "error");
    }
  }
}
