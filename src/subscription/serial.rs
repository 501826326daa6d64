use super::{BoxedSubscription, Subscription};
use crate::gate::Gate;

#[derive(Default)]
struct SerialState {
  disposed: bool,
  current: Option<BoxedSubscription>,
}

/// Holds the subscription of the one child currently running.
///
/// [`replace`](Self::replace) swaps in the next child and disposes the
/// previous one, so at most one child subscription is alive at a time. Once
/// disposed, every replacement is disposed as soon as it arrives.
#[derive(Clone, Default)]
pub struct SerialSubscription(Gate<SerialState>);

impl SerialSubscription {
  pub fn new() -> Self { Self::default() }

  pub fn replace(&self, subscription: impl Subscription + Send + 'static) {
    let mut state = self.0.lock();
    if state.disposed {
      drop(state);
      subscription.unsubscribe();
      return;
    }
    let prev = state.current.replace(BoxedSubscription::new(subscription));
    drop(state);
    if let Some(prev) = prev {
      prev.unsubscribe();
    }
  }

  /// Same as `unsubscribe`, through a shared reference.
  pub fn dispose(&self) {
    let current = {
      let mut state = self.0.lock();
      state.disposed = true;
      state.current.take()
    };
    if let Some(current) = current {
      current.unsubscribe();
    }
  }
}

impl Subscription for SerialSubscription {
  #[inline]
  fn unsubscribe(self) { self.dispose() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.lock().disposed }
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
  fn replace_disposes_previous() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let serial = SerialSubscription::new();

    let c_first = first.clone();
    serial.replace(ClosureSubscription(move || {
      c_first.fetch_add(1, Ordering::SeqCst);
    }));
    let c_second = second.clone();
    serial.replace(ClosureSubscription(move || {
      c_second.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);

    serial.dispose();
    assert_eq!(second.load(Ordering::SeqCst), 1);
    assert!(serial.is_closed());
  }

  #[completable_macro::test]
  fn replace_after_dispose_disposes_newcomer() {
    let hits = Arc::new(AtomicUsize::new(0));
    let serial = SerialSubscription::new();
    serial.dispose();
    let c_hits = hits.clone();
    serial.replace(ClosureSubscription(move || {
      c_hits.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }
}
