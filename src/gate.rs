//! Shared mutable state for one subscription.
//!
//! A [`Gate`] is the lock a composite operator uses to serialize terminal
//! decisions taken by concurrently running sources. `Gate<Option<O>>` is the
//! canonical "stopped guard": the first terminal event takes the observer out
//! of the slot, every later one finds `None` and is dropped.
//!
//! The lock is never held while calling into downstream observers or user
//! code: terminal paths take what they need out of the gate first and only
//! then deliver.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, ReentrantMutex};

use crate::observer::Observer;

pub struct Gate<T>(Arc<Mutex<T>>);

impl<T> Gate<T> {
  pub fn new(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  #[inline]
  pub fn lock(&self) -> MutexGuard<'_, T> { self.0.lock() }

  /// Whether both handles guard the same state.
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl<T> Clone for Gate<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T: Default> Default for Gate<T> {
  fn default() -> Self { Self::new(T::default()) }
}

impl<O, Err> Observer<Err> for Gate<Option<O>>
where
  O: Observer<Err>,
{
  fn complete(self) {
    let observer = self.lock().take();
    if let Some(observer) = observer {
      observer.complete();
    }
  }

  fn error(self, err: Err) {
    let observer = self.lock().take();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn is_closed(&self) -> bool { self.lock().as_ref().is_none_or(Observer::is_closed) }
}

/// A re-entrant lock that several subscriptions can share to serialize the
/// notifications they deliver. See `synchronize_with`.
#[derive(Clone, Default)]
pub struct SyncGate(Arc<ReentrantMutex<()>>);

impl SyncGate {
  pub fn new() -> Self { Self::default() }

  /// Run `f` while holding the gate.
  pub fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
    let _guard = self.0.lock();
    f()
  }
}
