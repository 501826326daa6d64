use smallvec::SmallVec;

use super::{BoxedSubscription, Subscription};
use crate::gate::Gate;

/// Most composites track one or two running sources at a time.
type Children = SmallVec<[(usize, BoxedSubscription); 2]>;

#[derive(Default)]
struct CompositeState {
  closed: bool,
  next_id: usize,
  children: Children,
}

/// A group of subscriptions disposed together.
///
/// Children are added as sources start and removed (and disposed) one by one
/// as they terminate. Disposing the composite disposes every child still
/// present; anything added afterwards is disposed on the spot.
#[derive(Clone)]
pub struct CompositeSubscription(Gate<CompositeState>);

impl Default for CompositeSubscription {
  fn default() -> Self { Self(Gate::default()) }
}

impl CompositeSubscription {
  pub fn new() -> Self { Self::default() }

  /// Add a child and return its id, or `None` when the composite is already
  /// disposed (the child has then been disposed).
  pub fn add(&self, subscription: impl Subscription + Send + 'static) -> Option<usize> {
    let mut state = self.0.lock();
    if state.closed {
      drop(state);
      subscription.unsubscribe();
      None
    } else {
      let id = state.next_id;
      state.next_id += 1;
      state.children.push((id, BoxedSubscription::new(subscription)));
      Some(id)
    }
  }

  /// Remove the child with `id` and dispose it.
  pub fn remove(&self, id: usize) {
    let child = {
      let mut state = self.0.lock();
      let pos = state.children.iter().position(|(child_id, _)| *child_id == id);
      pos.map(|pos| state.children.swap_remove(pos).1)
    };
    if let Some(child) = child {
      child.unsubscribe();
    }
  }

  pub fn len(&self) -> usize { self.0.lock().children.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Same as `unsubscribe`, through a shared reference.
  pub fn dispose(&self) {
    let children = {
      let mut state = self.0.lock();
      if state.closed {
        return;
      }
      state.closed = true;
      std::mem::take(&mut state.children)
    };
    for (_, child) in children {
      child.unsubscribe();
    }
  }
}

impl Subscription for CompositeSubscription {
  #[inline]
  fn unsubscribe(self) { self.dispose() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.lock().closed }
}
