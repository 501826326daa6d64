use super::Subscription;

/// A source subscription paired with the handle of a scheduled task.
///
/// Operators that schedule work next to their source (`timeout`, `delay`,
/// `subscribe_on`) return this: unsubscribing cancels the task first, then
/// the source.
pub struct SourceWithHandle<U, H> {
  pub source: U,
  pub handle: H,
}

impl<U, H> SourceWithHandle<U, H> {
  #[inline]
  pub fn new(source: U, handle: H) -> Self { Self { source, handle } }
}

impl<U, H> Subscription for SourceWithHandle<U, H>
where
  U: Subscription,
  H: Subscription,
{
  fn unsubscribe(self) {
    self.handle.unsubscribe();
    self.source.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.source.is_closed() }
}
