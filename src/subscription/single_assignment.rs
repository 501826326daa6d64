use std::mem;

use super::{BoxedSubscription, Subscription};
use crate::gate::Gate;

enum Slot {
  Empty,
  Assigned(BoxedSubscription),
  Disposed,
}

/// A slot that receives its subscription once, usually right after
/// `actual_subscribe` returned.
///
/// The handle exists before the subscription it controls, so an observer can
/// dispose its own upstream even when the upstream terminates synchronously,
/// inside `actual_subscribe`. In that case the slot is already disposed when
/// the subscription arrives and [`set`](Self::set) disposes it on the spot.
#[derive(Clone)]
pub struct SingleAssignmentSubscription(Gate<Slot>);

impl Default for SingleAssignmentSubscription {
  fn default() -> Self { Self(Gate::new(Slot::Empty)) }
}

impl SingleAssignmentSubscription {
  pub fn new() -> Self { Self::default() }

  pub fn set(&self, subscription: impl Subscription + Send + 'static) {
    let mut slot = self.0.lock();
    match *slot {
      Slot::Empty => {
        *slot = Slot::Assigned(BoxedSubscription::new(subscription));
        return;
      }
      Slot::Assigned(_) => {
        tracing::warn!("single assignment subscription assigned twice, disposing the newcomer");
      }
      Slot::Disposed => {}
    }
    drop(slot);
    subscription.unsubscribe();
  }

  /// Same as `unsubscribe`, through a shared reference.
  pub fn dispose(&self) {
    let prev = mem::replace(&mut *self.0.lock(), Slot::Disposed);
    if let Slot::Assigned(subscription) = prev {
      subscription.unsubscribe();
    }
  }
}

impl Subscription for SingleAssignmentSubscription {
  #[inline]
  fn unsubscribe(self) { self.dispose() }

  #[inline]
  fn is_closed(&self) -> bool { matches!(*self.0.lock(), Slot::Disposed) }
}
