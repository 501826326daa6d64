use std::marker::PhantomData;

use super::Completable;
use crate::{
  gate::Gate,
  observer::{BoxedObserver, Observer},
  subscription::{SingleAssignmentSubscription, Subscription},
};

/// Handle a `create` function uses to terminate its subscription.
///
/// The handle is `Clone + Send`, so it can be moved into callbacks or other
/// threads. Only the first terminal call is delivered; the teardown returned
/// by the `create` function is disposed right after it.
pub struct Emitter<Err> {
  observer: Gate<Option<BoxedObserver<Err>>>,
  teardown: SingleAssignmentSubscription,
}

impl<Err> Clone for Emitter<Err> {
  fn clone(&self) -> Self {
    Self { observer: self.observer.clone(), teardown: self.teardown.clone() }
  }
}

impl<Err> Emitter<Err> {
  pub fn complete(&self) {
    let observer = self.observer.lock().take();
    if let Some(observer) = observer {
      observer.complete();
      self.teardown.dispose();
    }
  }

  pub fn error(&self, err: Err) {
    let observer = self.observer.lock().take();
    if let Some(observer) = observer {
      observer.error(err);
      self.teardown.dispose();
    }
  }

  /// Whether the subscription terminated or was disposed. Long running work
  /// should poll it and stop early.
  pub fn is_closed(&self) -> bool { self.observer.lock().as_ref().is_none_or(|o| o.is_closed()) }
}

/// Completable created from a subscribe function.
///
/// This struct is created by [`create`].
pub struct Create<F, Err> {
  f: F,
  _marker: PhantomData<fn() -> Err>,
}

impl<F: Clone, Err> Clone for Create<F, Err> {
  fn clone(&self) -> Self { Self { f: self.f.clone(), _marker: PhantomData } }
}

/// Build a completable from a function run once per subscription.
///
/// The function receives an [`Emitter`] and returns the teardown of the work
/// it started. The teardown is disposed on termination or when the
/// subscription is disposed, whichever happens first.
///
/// ```rust
/// use rx_completable::prelude::*;
///
/// let work = create::<CompletableError, _, _>(|emitter| {
///   std::thread::spawn(move || emitter.complete());
/// });
/// assert!(work.wait().is_ok());
/// ```
pub fn create<Err, F, U>(f: F) -> Create<F, Err>
where
  F: FnOnce(Emitter<Err>) -> U,
  U: Subscription,
{
  Create { f, _marker: PhantomData }
}

impl<F, U, Err> Completable for Create<F, Err>
where
  F: FnOnce(Emitter<Err>) -> U + Send + 'static,
  U: Subscription + Send + 'static,
  Err: Send + 'static,
{
  type Err = Err;
  type Unsub = CreateSubscription<Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Err> + Send + 'static,
  {
    let observer: Gate<Option<BoxedObserver<Err>>> = Gate::new(Some(Box::new(observer)));
    let teardown = SingleAssignmentSubscription::new();
    let emitter = Emitter { observer: observer.clone(), teardown: teardown.clone() };
    teardown.set((self.f)(emitter));
    CreateSubscription { observer, teardown }
  }
}

pub struct CreateSubscription<Err> {
  observer: Gate<Option<BoxedObserver<Err>>>,
  teardown: SingleAssignmentSubscription,
}

impl<Err> Subscription for CreateSubscription<Err> {
  fn unsubscribe(self) {
    let observer = self.observer.lock().take();
    drop(observer);
    self.teardown.dispose();
  }

  fn is_closed(&self) -> bool { self.observer.lock().is_none() }
}
