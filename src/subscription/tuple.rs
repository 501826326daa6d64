use super::Subscription;

/// Two subscriptions disposed together.
///
/// Used by operators that own exactly two children, such as a source and the
/// replacement `catch` switched to, or the two racers of `until`.
pub struct TupleSubscription<U1, U2> {
  first: U1,
  second: U2,
}

impl<U1, U2> TupleSubscription<U1, U2> {
  pub fn new(first: U1, second: U2) -> Self { Self { first, second } }
}

impl<U1, U2> Subscription for TupleSubscription<U1, U2>
where
  U1: Subscription,
  U2: Subscription,
{
  fn unsubscribe(self) {
    self.first.unsubscribe();
    self.second.unsubscribe();
  }

  /// Closed once both halves are.
  fn is_closed(&self) -> bool { self.first.is_closed() && self.second.is_closed() }
}
