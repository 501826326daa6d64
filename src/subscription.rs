//! Cancellation handles.
//!
//! Every `actual_subscribe` returns a [`Subscription`]. Unsubscribing is
//! idempotent and safe to race with the termination of the subscription it
//! controls: once a handle is closed, notifications that are still in flight
//! on other threads are dropped by the operators that own the handle.
//!
//! Besides the trait itself this module provides the handles the operators
//! are built from:
//!
//! | Type | Role |
//! |------|------|
//! | [`BoxedSubscription`] | type erased, `Send` handle |
//! | [`SingleAssignmentSubscription`] | slot assigned once, after subscribe returns |
//! | [`SerialSubscription`] | "current child" slot, replacing disposes the previous |
//! | [`CompositeSubscription`] | set of children removable by id |
//! | [`TupleSubscription`] / [`SourceWithHandle`] | fixed pairs |
//! | [`SubscriptionGuard`] | RAII: unsubscribes on drop |

mod boxed;
mod composite;
mod serial;
mod single_assignment;
mod source_with_handle;
mod tuple;

pub use boxed::*;
pub use composite::*;
pub use serial::*;
pub use single_assignment::*;
pub use source_with_handle::*;
pub use tuple::*;

/// Handle used to cancel a running subscription.
pub trait Subscription {
  /// Cancel the subscription. Calling it on a terminated subscription is a
  /// no-op.
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;

  /// Wrap the handle so it unsubscribes when dropped.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately.
  fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self>
  where
    Self: Sized,
  {
    SubscriptionGuard(Some(self))
  }
}

impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<S: Subscription> Subscription for Option<S> {
  fn unsubscribe(self) {
    if let Some(s) = self {
      s.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(Subscription::is_closed) }
}

/// A subscription running a teardown closure when unsubscribed.
#[derive(Clone)]
pub struct ClosureSubscription<F>(pub F);

impl<F: FnOnce()> Subscription for ClosureSubscription<F> {
  #[inline]
  fn unsubscribe(self) { (self.0)() }

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// An RAII guard around a subscription. When this structure is dropped (falls
/// out of scope), the subscription will be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope.
#[must_use]
pub struct SubscriptionGuard<S: Subscription>(Option<S>);

impl<S: Subscription> SubscriptionGuard<S> {
  pub fn new(subscription: S) -> Self { Self(Some(subscription)) }

  /// Give up the guard without unsubscribing.
  pub fn into_inner(mut self) -> S {
    // `Some` until drop or `into_inner`, both of which consume the guard.
    match self.0.take() {
      Some(s) => s,
      None => unreachable!("subscription guard emptied before consumption"),
    }
  }
}

impl<S: Subscription> Drop for SubscriptionGuard<S> {
  fn drop(&mut self) {
    if let Some(s) = self.0.take() {
      s.unsubscribe();
    }
  }
}
