use super::Subscription;

/// Object-safe face of [`Subscription`]: `unsubscribe(self)` needs `Sized`,
/// so boxed handles go through `self: Box<Self>`.
pub trait DynSubscription {
  fn dyn_unsubscribe(self: Box<Self>);

  fn dyn_is_closed(&self) -> bool;
}

impl<T: Subscription> DynSubscription for T {
  #[inline]
  fn dyn_unsubscribe(self: Box<Self>) { (*self).unsubscribe() }

  #[inline]
  fn dyn_is_closed(&self) -> bool { self.is_closed() }
}

/// A type erased, thread-safe subscription.
///
/// Handles live in shared operator state and are disposed from whichever
/// thread terminates the work, so a boxed handle is always `Send + 'static`.
///
/// ```rust
/// use rx_completable::prelude::*;
///
/// let handles = vec![BoxedSubscription::new(()), BoxedSubscription::empty()];
/// assert!(handles.iter().all(Subscription::is_closed));
/// handles.into_iter().for_each(Subscription::unsubscribe);
/// ```
pub struct BoxedSubscription(Box<dyn DynSubscription + Send>);

impl BoxedSubscription {
  #[inline]
  pub fn new(subscription: impl Subscription + Send + 'static) -> Self {
    Self(Box::new(subscription))
  }

  /// Nothing to cancel.
  #[inline]
  pub fn empty() -> Self { Self::new(()) }
}

impl Subscription for BoxedSubscription {
  #[inline]
  fn unsubscribe(self) { self.0.dyn_unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.dyn_is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;
  use crate::subscription::ClosureSubscription;

  #[completable_macro::test]
  fn forwards_to_the_erased_handle() {
    let hits = Arc::new(AtomicUsize::new(0));
    let c_hits = hits.clone();
    let boxed = BoxedSubscription::new(ClosureSubscription(move || {
      c_hits.fetch_add(1, Ordering::SeqCst);
    }));

    assert!(!boxed.is_closed());
    boxed.unsubscribe();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[completable_macro::test]
  fn empty_is_closed() {
    let boxed = BoxedSubscription::empty();
    assert!(boxed.is_closed());
    boxed.unsubscribe();
  }

  #[completable_macro::test]
  fn boxes_cross_threads() {
    let hits = Arc::new(AtomicUsize::new(0));
    let c_hits = hits.clone();
    let boxed = BoxedSubscription::new(ClosureSubscription(move || {
      c_hits.fetch_add(1, Ordering::SeqCst);
    }));
    std::thread::spawn(move || boxed.unsubscribe()).join().unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }
}
