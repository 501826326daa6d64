//! Side-effect operators.
//!
//! Every side effect returns a [`SideEffect`]: `()` when it cannot fail, or
//! `Result<(), Err>` whose `Err` is redirected to the observer.

use crate::{
  completable::Completable,
  error::SideEffect,
  gate::Gate,
  observer::Observer,
  subscription::Subscription,
};

macro_rules! side_effect_operator {
  ($(#[$attr:meta])* $name:ident) => {
    $(#[$attr])*
    #[derive(Clone)]
    pub struct $name<S, F> {
      source: S,
      f: F,
    }

    impl<S, F> $name<S, F> {
      #[inline]
      pub fn new(source: S, f: F) -> Self { Self { source, f } }
    }
  };
}

side_effect_operator!(
  /// Runs a side effect before completion is forwarded.
  OnCompleted
);
side_effect_operator!(
  /// Runs a side effect before an error is forwarded.
  OnError
);
side_effect_operator!(
  /// Runs a side effect before either terminal event is forwarded.
  OnTerminate
);
side_effect_operator!(
  /// Runs a side effect before the source is subscribed.
  OnSubscribe
);
side_effect_operator!(
  /// Runs a side effect when the subscription is disposed early.
  OnCancel
);

/// Forward `err`, or the error the side effect produced instead.
fn fail_with<O: Observer<Err>, Err>(observer: O, err: Err, effect: Result<(), Err>) {
  match effect {
    Ok(()) => observer.error(err),
    Err(replacement) => observer.error(replacement),
  }
}

// ==================== OnCompleted ====================

pub struct OnCompletedObserver<O, F> {
  observer: O,
  f: F,
}

impl<O, F, R, Err> Observer<Err> for OnCompletedObserver<O, F>
where
  O: Observer<Err>,
  F: FnOnce() -> R,
  R: SideEffect<Err>,
{
  fn complete(self) {
    match (self.f)().into_result() {
      Ok(()) => self.observer.complete(),
      Err(err) => self.observer.error(err),
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, F, R> Completable for OnCompleted<S, F>
where
  S: Completable,
  F: FnOnce() -> R + Send + 'static,
  R: SideEffect<S::Err>,
{
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    self
      .source
      .actual_subscribe(OnCompletedObserver { observer, f: self.f })
  }
}

// ==================== OnError ====================

pub struct OnErrorObserver<O, F> {
  observer: O,
  f: F,
}

impl<O, F, R, Err> Observer<Err> for OnErrorObserver<O, F>
where
  O: Observer<Err>,
  F: FnOnce(&Err) -> R,
  R: SideEffect<Err>,
{
  fn complete(self) { self.observer.complete() }

  fn error(self, err: Err) {
    let effect = (self.f)(&err).into_result();
    fail_with(self.observer, err, effect);
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, F, R> Completable for OnError<S, F>
where
  S: Completable,
  F: FnOnce(&S::Err) -> R + Send + 'static,
  R: SideEffect<S::Err>,
{
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    self.source.actual_subscribe(OnErrorObserver { observer, f: self.f })
  }
}

// ==================== OnTerminate ====================

pub struct OnTerminateObserver<O, F> {
  observer: O,
  f: F,
}

impl<O, F, R, Err> Observer<Err> for OnTerminateObserver<O, F>
where
  O: Observer<Err>,
  F: FnOnce() -> R,
  R: SideEffect<Err>,
{
  fn complete(self) {
    match (self.f)().into_result() {
      Ok(()) => self.observer.complete(),
      Err(err) => self.observer.error(err),
    }
  }

  fn error(self, err: Err) {
    let effect = (self.f)().into_result();
    fail_with(self.observer, err, effect);
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, F, R> Completable for OnTerminate<S, F>
where
  S: Completable,
  F: FnOnce() -> R + Send + 'static,
  R: SideEffect<S::Err>,
{
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    self
      .source
      .actual_subscribe(OnTerminateObserver { observer, f: self.f })
  }
}

// ==================== OnSubscribe ====================

impl<S, F, R> Completable for OnSubscribe<S, F>
where
  S: Completable,
  F: FnOnce() -> R + Send + 'static,
  R: SideEffect<S::Err>,
{
  type Err = S::Err;
  type Unsub = Option<S::Unsub>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    match (self.f)().into_result() {
      Ok(()) => Some(self.source.actual_subscribe(observer)),
      Err(err) => {
        observer.error(err);
        None
      }
    }
  }
}

// ==================== OnCancel ====================

/// Drops the cancel action once a terminal event passed through.
pub struct OnCancelObserver<O, F> {
  observer: O,
  action: Gate<Option<F>>,
}

impl<O, F, Err> Observer<Err> for OnCancelObserver<O, F>
where
  O: Observer<Err>,
{
  fn complete(self) {
    self.action.lock().take();
    self.observer.complete();
  }

  fn error(self, err: Err) {
    self.action.lock().take();
    self.observer.error(err);
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

pub struct OnCancelSubscription<U, F> {
  source: U,
  action: Gate<Option<F>>,
}

impl<U: Subscription, F: FnOnce()> Subscription for OnCancelSubscription<U, F> {
  fn unsubscribe(self) {
    self.source.unsubscribe();
    let action = self.action.lock().take();
    if let Some(action) = action {
      action();
    }
  }

  fn is_closed(&self) -> bool { self.source.is_closed() }
}

impl<S, F> Completable for OnCancel<S, F>
where
  S: Completable,
  F: FnOnce() + Send + 'static,
{
  type Err = S::Err;
  type Unsub = OnCancelSubscription<S::Unsub, F>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let action = Gate::new(Some(self.f));
    let source = self
      .source
      .actual_subscribe(OnCancelObserver { observer, action: action.clone() });
    OnCancelSubscription { source, action }
  }
}

#[cfg(test)]
mod tests {
  use std::{sync::Arc, time::Duration};

  use parking_lot::Mutex;

  use crate::prelude::*;

  #[completable_macro::test]
  fn hooks_run_in_order() {
    let log = Arc::new(Mutex::new(vec![]));
    let (a, b, c, d) = (log.clone(), log.clone(), log.clone(), log.clone());
    empty::<CompletableError>()
      .on_subscribe(move || a.lock().push("subscribe"))
      .on_completed(move || b.lock().push("completed"))
      .on_terminate(move || c.lock().push("terminate"))
      .subscribe_complete(move || d.lock().push("observer"));
    assert_eq!(*log.lock(), vec!["subscribe", "completed", "terminate", "observer"]);
  }

  #[completable_macro::test]
  fn failing_on_completed_turns_into_error() {
    let result = empty::<CompletableError>()
      .on_completed(|| Err(CompletableError::from("audit failed")))
      .wait();
    assert_eq!(result.unwrap_err().to_string(), "audit failed");
  }

  #[completable_macro::test]
  fn on_error_sees_error_and_may_replace_it() {
    let seen = Arc::new(Mutex::new(None));
    let c_seen = seen.clone();
    let result = throw(CompletableError::from("first"))
      .on_error(move |err| *c_seen.lock() = Some(err.to_string()))
      .wait();
    assert_eq!(result.unwrap_err().to_string(), "first");
    assert_eq!(seen.lock().as_deref(), Some("first"));

    let result = throw(CompletableError::from("first"))
      .on_error(|_| Err(CompletableError::from("second")))
      .wait();
    assert_eq!(result.unwrap_err().to_string(), "second");
  }

  #[completable_macro::test]
  fn failing_on_subscribe_skips_source() {
    let log = Arc::new(Mutex::new(vec![]));
    let c_log = log.clone();
    let result = from_fn::<CompletableError, _, _>(move || c_log.lock().push("source"))
      .on_subscribe(|| Err(CompletableError::from("denied")))
      .wait();
    assert_eq!(result.unwrap_err().to_string(), "denied");
    assert!(log.lock().is_empty());
  }

  #[completable_macro::test]
  fn on_cancel_only_fires_before_termination() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(vec![]));

    let c_log = log.clone();
    let handle = timer::<CompletableError, _>(Duration::from_secs(1), scheduler.clone())
      .on_cancel(move || c_log.lock().push("cancelled early"))
      .subscribe();
    handle.unsubscribe();

    let c_log = log.clone();
    let handle = empty::<CompletableError>()
      .on_cancel(move || c_log.lock().push("cancelled late"))
      .subscribe();
    handle.unsubscribe();

    assert_eq!(*log.lock(), vec!["cancelled early"]);
  }
}
