use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  completable::Completable,
  observer::{BoxedObserver, Observer},
  subscription::{CompositeSubscription, Subscription},
};

/// Barrier over a fixed set of completables.
///
/// This struct is created by [`when_all`].
#[derive(Clone)]
pub struct WhenAll<C> {
  sources: Vec<C>,
}

/// Subscribe to every source at once and complete when all of them
/// completed. The first error fails the barrier and disposes the rest; an
/// empty set completes immediately.
pub fn when_all<I>(sources: I) -> WhenAll<I::Item>
where
  I: IntoIterator,
  I::Item: Completable,
{
  WhenAll { sources: sources.into_iter().collect() }
}

struct WhenAllState<Err> {
  observer: Option<BoxedObserver<Err>>,
  remaining: usize,
  terminated: Vec<bool>,
}

struct WhenAllInner<Err> {
  state: Mutex<WhenAllState<Err>>,
  members: CompositeSubscription,
}

impl<C: Completable> Completable for WhenAll<C> {
  type Err = C::Err;
  type Unsub = WhenAllSubscription<C::Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let count = self.sources.len();
    let inner = Arc::new(WhenAllInner {
      state: Mutex::new(WhenAllState {
        observer: None,
        remaining: count,
        terminated: vec![false; count],
      }),
      members: CompositeSubscription::new(),
    });
    if count == 0 {
      observer.complete();
      return WhenAllSubscription(inner);
    }
    inner.state.lock().observer = Some(Box::new(observer));

    for (index, source) in self.sources.into_iter().enumerate() {
      if inner.members.is_closed() {
        break;
      }
      let unsub = source.actual_subscribe(MemberObserver { inner: inner.clone(), index });
      inner.members.add(unsub);
    }
    WhenAllSubscription(inner)
  }
}

struct MemberObserver<Err> {
  inner: Arc<WhenAllInner<Err>>,
  index: usize,
}

impl<Err> MemberObserver<Err> {
  /// Marks the member terminated; `None` if it already was or the barrier
  /// is over.
  fn terminate(
    &self, last: impl FnOnce(&mut WhenAllState<Err>) -> bool,
  ) -> Option<BoxedObserver<Err>> {
    let mut state = self.inner.state.lock();
    if state.observer.is_none() || state.terminated[self.index] {
      return None;
    }
    state.terminated[self.index] = true;
    if last(&mut state) {
      state.observer.take()
    } else {
      None
    }
  }
}

impl<Err> Observer<Err> for MemberObserver<Err> {
  fn complete(self) {
    let observer = self.terminate(|state| {
      state.remaining -= 1;
      state.remaining == 0
    });
    if let Some(observer) = observer {
      self.inner.members.dispose();
      observer.complete();
    }
  }

  fn error(self, err: Err) {
    if let Some(observer) = self.terminate(|_| true) {
      self.inner.members.dispose();
      observer.error(err);
    }
  }

  fn is_closed(&self) -> bool {
    let state = self.inner.state.lock();
    state.observer.is_none() || state.terminated[self.index]
  }
}

pub struct WhenAllSubscription<Err>(Arc<WhenAllInner<Err>>);

impl<Err> Subscription for WhenAllSubscription<Err> {
  fn unsubscribe(self) {
    let observer = self.0.state.lock().observer.take();
    drop(observer);
    self.0.members.dispose();
  }

  fn is_closed(&self) -> bool { self.0.state.lock().observer.is_none() }
}
