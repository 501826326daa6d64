use std::{
  future::Future,
  pin::Pin,
  sync::Arc,
  task::{Context, Poll},
};

use futures::task::AtomicWaker;
use parking_lot::Mutex;

use crate::{completable::Completable, observer::Observer, subscription::Subscription};

struct Shared<Err> {
  outcome: Mutex<Option<Result<(), Err>>>,
  waker: AtomicWaker,
}

struct FutureObserver<Err>(Arc<Shared<Err>>);

impl<Err> FutureObserver<Err> {
  fn settle(self, result: Result<(), Err>) {
    *self.0.outcome.lock() = Some(result);
    self.0.waker.wake();
  }
}

impl<Err> Observer<Err> for FutureObserver<Err> {
  fn complete(self) { self.settle(Ok(())) }

  fn error(self, err: Err) { self.settle(Err(err)) }

  fn is_closed(&self) -> bool { self.0.outcome.lock().is_some() }
}

enum State<C: Completable> {
  Idle(C),
  Running { shared: Arc<Shared<C::Err>>, subscription: C::Unsub },
  Done,
}

/// Future returned by `CompletableExt::into_future`.
///
/// The source is subscribed on the first poll. Dropping the future before it
/// resolved disposes the subscription.
pub struct CompletableFuture<C: Completable> {
  state: State<C>,
}

impl<C: Completable> CompletableFuture<C> {
  pub fn new(source: C) -> Self { Self { state: State::Idle(source) } }
}

// The state is never pinned structurally.
impl<C: Completable> Unpin for CompletableFuture<C> {}

impl<C: Completable> Future for CompletableFuture<C> {
  type Output = Result<(), C::Err>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    this.state = match std::mem::replace(&mut this.state, State::Done) {
      State::Idle(source) => {
        let shared = Arc::new(Shared { outcome: Mutex::new(None), waker: AtomicWaker::new() });
        shared.waker.register(cx.waker());
        let subscription = source.actual_subscribe(FutureObserver(shared.clone()));
        State::Running { shared, subscription }
      }
      state => state,
    };

    let State::Running { shared, .. } = &this.state else {
      return Poll::Pending;
    };
    shared.waker.register(cx.waker());
    let outcome = shared.outcome.lock().take();
    match outcome {
      Some(result) => {
        this.state = State::Done;
        Poll::Ready(result)
      }
      None => Poll::Pending,
    }
  }
}

impl<C: Completable> Drop for CompletableFuture<C> {
  fn drop(&mut self) {
    if let State::Running { subscription, .. } = std::mem::replace(&mut self.state, State::Done) {
      subscription.unsubscribe();
    }
  }
}
