use crate::{
  completable::Completable,
  gate::Gate,
  observer::Observer,
  subscription::Subscription,
};

/// Runs an action exactly once, after the terminal event was delivered or
/// when the subscription is disposed, whichever happens first.
#[derive(Clone)]
pub struct Finally<S, F> {
  source: S,
  action: F,
}

impl<S, F> Finally<S, F> {
  #[inline]
  pub fn new(source: S, action: F) -> Self { Self { source, action } }
}

fn run_once<F: FnOnce()>(action: &Gate<Option<F>>) {
  let action = action.lock().take();
  if let Some(action) = action {
    action();
  }
}

pub struct FinallyObserver<O, F> {
  observer: O,
  action: Gate<Option<F>>,
}

impl<O, F, Err> Observer<Err> for FinallyObserver<O, F>
where
  O: Observer<Err>,
  F: FnOnce(),
{
  fn complete(self) {
    self.observer.complete();
    run_once(&self.action);
  }

  fn error(self, err: Err) {
    self.observer.error(err);
    run_once(&self.action);
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

pub struct FinallySubscription<U, F> {
  source: U,
  action: Gate<Option<F>>,
}

impl<U: Subscription, F: FnOnce()> Subscription for FinallySubscription<U, F> {
  fn unsubscribe(self) {
    self.source.unsubscribe();
    run_once(&self.action);
  }

  fn is_closed(&self) -> bool { self.source.is_closed() }
}

impl<S, F> Completable for Finally<S, F>
where
  S: Completable,
  F: FnOnce() + Send + 'static,
{
  type Err = S::Err;
  type Unsub = FinallySubscription<S::Unsub, F>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let action = Gate::new(Some(self.action));
    let source = self
      .source
      .actual_subscribe(FinallyObserver { observer, action: action.clone() });
    FinallySubscription { source, action }
  }
}
