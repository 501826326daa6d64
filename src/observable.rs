//! Minimal value streams.
//!
//! Completables carry no values, but a few operators sit on the boundary
//! with value streams: `merge_all` consumes a stream of completables,
//! `then_observable` and `then_return` continue a completable with values,
//! and `as_completable` / `Observable::then` go the other way. This module
//! provides just enough of a stream abstraction for those bridges.

use crate::{
  completable::Completable,
  error::NoValueError,
  observer::{AutoDetachObserver, Observer},
  ops::{convert::AsCompletable, merge::MergeAll, then::ObservableThen},
  subscription::SingleAssignmentSubscription,
};

mod create;
mod from_iter;
mod trivial;

pub use create::*;
pub use from_iter::*;
pub use trivial::*;

// ============================================================================
// ValueObserver
// ============================================================================

/// An [`Observer`] that also receives values.
pub trait ValueObserver<Item, Err>: Observer<Err> {
  fn next(&mut self, value: Item);
}

/// Object-safe mirror of [`ValueObserver`].
pub trait DynValueObserver<Item, Err> {
  fn box_next(&mut self, value: Item);
  fn box_complete(self: Box<Self>);
  fn box_error(self: Box<Self>, err: Err);
  fn box_is_closed(&self) -> bool;
}

impl<T, Item, Err> DynValueObserver<Item, Err> for T
where
  T: ValueObserver<Item, Err>,
{
  fn box_next(&mut self, value: Item) { self.next(value) }
  fn box_complete(self: Box<Self>) { self.complete() }
  fn box_error(self: Box<Self>, err: Err) { self.error(err) }
  fn box_is_closed(&self) -> bool { self.is_closed() }
}

pub type BoxedValueObserver<Item, Err> = Box<dyn DynValueObserver<Item, Err> + Send>;

impl<'a, Item, Err> Observer<Err> for Box<dyn DynValueObserver<Item, Err> + Send + 'a> {
  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn is_closed(&self) -> bool { (**self).box_is_closed() }
}

impl<'a, Item, Err> ValueObserver<Item, Err> for Box<dyn DynValueObserver<Item, Err> + Send + 'a> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).box_next(value) }
}

impl<O, Item, Err> ValueObserver<Item, Err> for Option<O>
where
  O: ValueObserver<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(inner) = self {
      inner.next(value);
    }
  }
}

/// Closure observer for value streams, see [`ObservableExt::subscribe_next`].
pub struct ValueCallbackObserver<N, C, E> {
  pub on_next: N,
  pub on_complete: C,
  pub on_error: E,
}

impl<N, C, E, Err> Observer<Err> for ValueCallbackObserver<N, C, E>
where
  C: FnOnce(),
  E: FnOnce(Err),
{
  fn complete(self) { (self.on_complete)() }

  fn error(self, err: Err) { (self.on_error)(err) }

  fn is_closed(&self) -> bool { false }
}

impl<N, C, E, Item, Err> ValueObserver<Item, Err> for ValueCallbackObserver<N, C, E>
where
  N: FnMut(Item),
  C: FnOnce(),
  E: FnOnce(Err),
{
  fn next(&mut self, value: Item) { (self.on_next)(value) }
}

impl<O, Item, Err> ValueObserver<Item, Err> for AutoDetachObserver<O>
where
  O: ValueObserver<Item, Err>,
{
  fn next(&mut self, value: Item) { self.observer.next(value) }
}

/// A value-stream observer that forwards only the terminal event.
pub(crate) struct IgnoreValues<O>(pub O);

impl<O: Observer<Err>, Err> Observer<Err> for IgnoreValues<O> {
  fn complete(self) { self.0.complete() }

  fn error(self, err: Err) { self.0.error(err) }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<O: Observer<Err>, Item, Err> ValueObserver<Item, Err> for IgnoreValues<O> {
  fn next(&mut self, _: Item) {}
}

// ============================================================================
// Observable
// ============================================================================

/// A cold stream of values followed by one terminal event.
pub trait Observable: Sized + Send + 'static {
  type Item: Send + 'static;
  type Err: Send + 'static;
  type Unsub: crate::subscription::Subscription + Send + 'static;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: ValueObserver<Self::Item, Self::Err> + Send + 'static;
}

pub trait ObservableExt: Observable {
  /// Drop the values, keep the terminal event.
  fn as_completable(self) -> AsCompletable<Self> { AsCompletable::new(self) }

  /// Remember the most recent value and, on completion, continue with the
  /// completable `selector` builds from it. Completing without any value
  /// fails with [`NoValueError`].
  fn then<F, C>(self, selector: F) -> ObservableThen<Self, F>
  where
    F: FnOnce(Self::Item) -> C + Send + 'static,
    C: Completable<Err = Self::Err>,
    Self::Err: From<NoValueError>,
  {
    ObservableThen::new(self, selector)
  }

  /// Run every completable the stream emits concurrently.
  fn merge_all(self) -> MergeAll<Self>
  where
    Self::Item: Completable<Err = Self::Err>,
  {
    MergeAll::new(self, usize::MAX)
  }

  /// Like [`merge_all`](Self::merge_all) with at most `max_concurrent`
  /// completables running at once.
  fn merge_all_max(self, max_concurrent: usize) -> MergeAll<Self>
  where
    Self::Item: Completable<Err = Self::Err>,
  {
    MergeAll::new(self, max_concurrent)
  }

  /// Subscribe with closures for values and both terminal events.
  fn subscribe_next<N, C, E>(
    self, on_next: N, on_complete: C, on_error: E,
  ) -> SingleAssignmentSubscription
  where
    N: FnMut(Self::Item) + Send + 'static,
    C: FnOnce() + Send + 'static,
    E: FnOnce(Self::Err) + Send + 'static,
  {
    let observer = AutoDetachObserver::new(ValueCallbackObserver { on_next, on_complete, on_error });
    let handle = observer.subscription.clone();
    handle.set(self.actual_subscribe(observer));
    handle
  }
}

impl<T: Observable> ObservableExt for T {}
