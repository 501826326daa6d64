//! Boxed completable types for type erasure
//!
//! Chains of operators produce deeply nested types. `box_it` erases them so
//! heterogeneous completables can be stored together, as the sequence and
//! merge operators do with the sources they run.

use super::Completable;
use crate::{
  observer::BoxedObserver,
  subscription::{BoxedSubscription, Subscription},
};

// ============================================================================
// DynCompletable Traits
// ============================================================================

/// Object-safe completable trait.
pub trait DynCompletable<Err>: Send {
  fn dyn_subscribe(self: Box<Self>, observer: BoxedObserver<Err>) -> BoxedSubscription;
}

/// Object-safe clone support, available when the underlying chain is `Clone`.
pub trait DynCompletableClone<Err>: DynCompletable<Err> {
  fn clone_box(&self) -> Box<dyn DynCompletableClone<Err>>;
}

impl<C: Completable> DynCompletable<C::Err> for C {
  fn dyn_subscribe(self: Box<Self>, observer: BoxedObserver<C::Err>) -> BoxedSubscription {
    BoxedSubscription::new((*self).actual_subscribe(observer))
  }
}

impl<C: Completable + Clone> DynCompletableClone<C::Err> for C {
  fn clone_box(&self) -> Box<dyn DynCompletableClone<C::Err>> { Box::new(self.clone()) }
}

// ============================================================================
// Boxed wrappers
// ============================================================================

/// A type erased completable.
pub struct BoxedCompletable<Err>(Box<dyn DynCompletable<Err>>);

impl<Err> BoxedCompletable<Err> {
  pub fn new<C: Completable<Err = Err>>(source: C) -> Self { Self(Box::new(source)) }
}

impl<Err: Send + 'static> Completable for BoxedCompletable<Err> {
  type Err = Err;
  type Unsub = BoxedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: crate::observer::Observer<Err> + Send + 'static,
  {
    self.0.dyn_subscribe(Box::new(observer))
  }
}

/// A type erased completable that can still be cloned to subscribe again.
pub struct BoxedCompletableClone<Err>(Box<dyn DynCompletableClone<Err>>);

impl<Err> BoxedCompletableClone<Err> {
  pub fn new<C: Completable<Err = Err> + Clone>(source: C) -> Self { Self(Box::new(source)) }
}

impl<Err> Clone for BoxedCompletableClone<Err> {
  fn clone(&self) -> Self { Self(self.0.clone_box()) }
}

impl<Err: Send + 'static> Completable for BoxedCompletableClone<Err> {
  type Err = Err;
  type Unsub = BoxedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: crate::observer::Observer<Err> + Send + 'static,
  {
    self.0.dyn_subscribe(Box::new(observer))
  }
}

impl<Err> std::fmt::Debug for BoxedCompletable<Err> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("BoxedCompletable")
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use crate::prelude::*;

  #[completable_macro::test]
  fn heterogeneous_sources_in_one_vec() {
    let sources: Vec<BoxedCompletable<CompletableError>> =
      vec![
      empty::<CompletableError>().box_it(),
      throw(CompletableError::from("boom")).box_it(),
      never::<CompletableError>().box_it(),
    ];
    let errors = Arc::new(AtomicUsize::new(0));
    for source in sources {
      let errors = errors.clone();
      source.subscribe_all(
        || {},
        move |_| {
          errors.fetch_add(1, Ordering::SeqCst);
        },
      );
    }
    assert_eq!(errors.load(Ordering::SeqCst), 1);
  }

  #[completable_macro::test]
  fn boxed_clone_subscribes_again() {
    let hits = Arc::new(AtomicUsize::new(0));
    let c_hits = hits.clone();
    let source = from_fn::<CompletableError, _, _>(move || {
      c_hits.fetch_add(1, Ordering::SeqCst);
    })
    .box_clone_it();

    source.clone().subscribe();
    source.subscribe();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
  }

  #[completable_macro::test]
  fn disposing_boxed_subscription_cancels() {
    let scheduler = TestScheduler::new();
    let handle = timer::<CompletableError, _>(std::time::Duration::from_secs(1), scheduler.clone())
      .box_it()
      .subscribe();
    assert_eq!(scheduler.pending_count(), 1);
    handle.unsubscribe();
    assert_eq!(scheduler.pending_count(), 0);
  }
}
