//! Observer trait and implementations
//!
//! An observer is the sink of a completable: it receives exactly one terminal
//! notification, `complete` or `error`, both of which consume it.

use crate::subscription::{SingleAssignmentSubscription, Subscription};

// ============================================================================
// Observer Trait
// ============================================================================

/// The consumer of a completion signal.
pub trait Observer<Err> {
  /// The operation finished successfully.
  fn complete(self);

  /// The operation failed.
  fn error(self, err: Err);

  /// Returns `true` once the observer no longer accepts a terminal event.
  ///
  /// Producers check it before doing work whose only purpose is to notify
  /// this observer.
  fn is_closed(&self) -> bool;
}

// ============================================================================
// DynObserver Trait - Object-safe Observer
// ============================================================================

/// Object-safe mirror of [`Observer`], see [`BoxedObserver`].
pub trait DynObserver<Err> {
  fn box_complete(self: Box<Self>);
  fn box_error(self: Box<Self>, err: Err);
  fn box_is_closed(&self) -> bool;
}

impl<T, Err> DynObserver<Err> for T
where
  T: Observer<Err>,
{
  fn box_complete(self: Box<Self>) { self.complete() }
  fn box_error(self: Box<Self>, err: Err) { self.error(err) }
  fn box_is_closed(&self) -> bool { self.is_closed() }
}

/// A type erased observer that can be moved across threads.
pub type BoxedObserver<Err> = Box<dyn DynObserver<Err> + Send>;

impl<'a, Err> Observer<Err> for Box<dyn DynObserver<Err> + Send + 'a> {
  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn is_closed(&self) -> bool { (**self).box_is_closed() }
}

// ============================================================================
// Option
// ============================================================================

/// `None` ignores every event, `Some` delegates.
impl<O, Err> Observer<Err> for Option<O>
where
  O: Observer<Err>,
{
  fn complete(self) {
    if let Some(inner) = self {
      inner.complete();
    }
  }

  fn error(self, err: Err) {
    if let Some(inner) = self {
      inner.error(err);
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(Observer::is_closed) }
}

// ============================================================================
// Closure observers
// ============================================================================

/// Observer built from two closures, see `subscribe_all`.
#[derive(Clone)]
pub struct CallbackObserver<C, E> {
  pub on_complete: C,
  pub on_error: E,
}

impl<C, E, Err> Observer<Err> for CallbackObserver<C, E>
where
  C: FnOnce(),
  E: FnOnce(Err),
{
  #[inline]
  fn complete(self) { (self.on_complete)() }

  #[inline]
  fn error(self, err: Err) { (self.on_error)(err) }

  #[inline]
  fn is_closed(&self) -> bool { false }
}

macro_rules! state_observer {
  ($name:ident, $($state:ident: $ty:ident),+) => {
    /// Observer passing explicit state to plain function pointers, so the
    /// callbacks capture nothing.
    pub struct $name<$($ty,)+ Err> {
      $(pub $state: $ty,)+
      pub on_complete: fn($($ty),+),
      pub on_error: fn($($ty,)+ Err),
    }

    impl<$($ty,)+ Err> Observer<Err> for $name<$($ty,)+ Err> {
      #[inline]
      fn complete(self) { (self.on_complete)($(self.$state),+) }

      #[inline]
      fn error(self, err: Err) { (self.on_error)($(self.$state,)+ err) }

      #[inline]
      fn is_closed(&self) -> bool { false }
    }
  };
}

state_observer!(StateObserver, a: A);
state_observer!(StateObserver2, a: A, b: B);
state_observer!(StateObserver3, a: A, b: B, c: C);

// ============================================================================
// AutoDetachObserver
// ============================================================================

/// Forwards the terminal event, then disposes its own subscription. Events
/// arriving once the subscription was disposed are dropped.
///
/// Every subscribe helper wraps the user observer in one of these, so the
/// subscription graph is released as soon as the work terminates, whether or
/// not the caller keeps the returned handle.
pub struct AutoDetachObserver<O> {
  pub observer: O,
  pub subscription: SingleAssignmentSubscription,
}

impl<O> AutoDetachObserver<O> {
  pub fn new(observer: O) -> Self {
    Self { observer, subscription: SingleAssignmentSubscription::new() }
  }
}

impl<O, Err> Observer<Err> for AutoDetachObserver<O>
where
  O: Observer<Err>,
{
  fn complete(self) {
    if !self.subscription.is_closed() {
      self.observer.complete();
    }
    self.subscription.unsubscribe();
  }

  fn error(self, err: Err) {
    if !self.subscription.is_closed() {
      self.observer.error(err);
    }
    self.subscription.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.subscription.is_closed() || self.observer.is_closed() }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;
  use crate::subscription::ClosureSubscription;

  #[completable_macro::test]
  fn boxed_observer_delegates() {
    let hits = Arc::new(AtomicUsize::new(0));
    let c_hits = hits.clone();
    let boxed: BoxedObserver<()> = Box::new(CallbackObserver {
      on_complete: move || {
        c_hits.fetch_add(1, Ordering::SeqCst);
      },
      on_error: |_: ()| {},
    });
    assert!(!boxed.is_closed());
    boxed.complete();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[completable_macro::test]
  fn state_observer_receives_state() {
    let hits = Arc::new(AtomicUsize::new(0));
    let observer = StateObserver2 {
      a: hits.clone(),
      b: 5usize,
      on_complete: |hits: Arc<AtomicUsize>, n| {
        hits.fetch_add(n, Ordering::SeqCst);
      },
      on_error: |hits: Arc<AtomicUsize>, _, err: usize| {
        hits.fetch_add(err, Ordering::SeqCst);
      },
    };
    observer.error(7);
    assert_eq!(hits.load(Ordering::SeqCst), 7);
  }

  #[completable_macro::test]
  fn auto_detach_disposes_after_forwarding() {
    let hits = Arc::new(AtomicUsize::new(0));
    let c_hits = hits.clone();
    let observer = AutoDetachObserver::new(Some(CallbackObserver {
      on_complete: || {},
      on_error: |_: ()| {},
    }));
    let handle = observer.subscription.clone();
    handle.set(ClosureSubscription(move || {
      c_hits.fetch_add(1, Ordering::SeqCst);
    }));

    observer.complete();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(handle.is_closed());
  }

  #[completable_macro::test]
  fn auto_detach_drops_events_after_dispose() {
    let hits = Arc::new(AtomicUsize::new(0));
    let c_hits = hits.clone();
    let observer = AutoDetachObserver::new(CallbackObserver {
      on_complete: move || {
        c_hits.fetch_add(1, Ordering::SeqCst);
      },
      on_error: |_: ()| {},
    });
    observer.subscription.dispose();

    observer.complete();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
  }

  #[completable_macro::test]
  fn none_is_closed() {
    let none: Option<CallbackObserver<fn(), fn(())>> = None;
    assert!(Observer::<()>::is_closed(&none));
  }
}
