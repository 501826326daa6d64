use crate::{
  completable::Completable,
  gate::{Gate, SyncGate},
  observer::Observer,
};

/// This struct is created by `CompletableExt::synchronize` and
/// `CompletableExt::synchronize_with`.
#[derive(Clone)]
pub struct Synchronize<S> {
  source: S,
  lock: SyncGate,
}

impl<S> Synchronize<S> {
  #[inline]
  pub fn new(source: S, lock: SyncGate) -> Self { Self { source, lock } }
}

/// Observer whose terminal calls run under a [`SyncGate`].
///
/// Several producers may share one clone each; the first terminal event wins
/// and the rest are dropped.
pub struct SynchronizedObserver<O> {
  inner: Gate<Option<O>>,
  lock: SyncGate,
}

impl<O> Clone for SynchronizedObserver<O> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone(), lock: self.lock.clone() } }
}

impl<O> SynchronizedObserver<O> {
  pub fn new(observer: O, lock: SyncGate) -> Self { Self { inner: Gate::new(Some(observer)), lock } }
}

impl<O, Err> Observer<Err> for SynchronizedObserver<O>
where
  O: Observer<Err>,
{
  fn complete(self) { self.lock.enter(|| Observer::<Err>::complete(self.inner)) }

  fn error(self, err: Err) { self.lock.enter(|| self.inner.error(err)) }

  fn is_closed(&self) -> bool { Observer::<Err>::is_closed(&self.inner) }
}

impl<S: Completable> Completable for Synchronize<S> {
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    self
      .source
      .actual_subscribe(SynchronizedObserver::new(observer, self.lock))
  }
}
