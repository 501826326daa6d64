use std::iter;

use super::concat::{subscribe_sequence, SequenceMode, SequenceSubscription};
use crate::{
  completable::{Completable, CompletableExt},
  observer::Observer,
};

/// Resubscribes a failing source.
///
/// This struct is created by `CompletableExt::retry`.
#[derive(Clone)]
pub struct Retry<S> {
  source: S,
  count: usize,
}

impl<S> Retry<S> {
  #[inline]
  pub fn new(source: S, count: usize) -> Self { Self { source, count } }
}

impl<S> Completable for Retry<S>
where
  S: Completable + Clone,
{
  type Err = S::Err;
  type Unsub = SequenceSubscription<S::Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let attempts = iter::repeat(self.source)
      .take(self.count.saturating_add(1))
      .enumerate()
      .map(|(attempt, source)| {
        if attempt > 0 {
          tracing::debug!(attempt, "retrying failed completable");
        }
        Ok::<_, S::Err>(source.box_it())
      });
    subscribe_sequence(Box::new(attempts), observer, SequenceMode::Catch)
  }
}
