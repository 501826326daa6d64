use std::marker::PhantomData;

use super::Completable;
use crate::{
  error::SideEffect,
  observer::Observer,
  ops::subscribe_on::SubscribeOn,
  scheduler::Scheduler,
};

/// Runs an action at subscribe time and terminates with its outcome.
///
/// This struct is created by [`from_fn`].
pub struct FromFn<F, Err> {
  f: F,
  _marker: PhantomData<fn() -> Err>,
}

impl<F: Clone, Err> Clone for FromFn<F, Err> {
  fn clone(&self) -> Self { Self { f: self.f.clone(), _marker: PhantomData } }
}

/// Run `f` on every subscription. It may return `()` or `Result<(), Err>`.
///
/// ```rust
/// use rx_completable::prelude::*;
///
/// let save = from_fn::<CompletableError, _, _>(|| Err("disk full".into()));
/// assert_eq!(save.wait().unwrap_err().to_string(), "disk full");
/// ```
pub fn from_fn<Err, F, R>(f: F) -> FromFn<F, Err>
where
  F: FnOnce() -> R,
  R: SideEffect<Err>,
{
  FromFn { f, _marker: PhantomData }
}

/// [`from_fn`] subscribed on `scheduler`: the action runs there.
pub fn start<Err, F, R, S>(f: F, scheduler: S) -> SubscribeOn<FromFn<F, Err>, S>
where
  F: FnOnce() -> R,
  R: SideEffect<Err>,
  S: Scheduler,
{
  SubscribeOn::new(from_fn(f), scheduler)
}

impl<F, R, Err> Completable for FromFn<F, Err>
where
  F: FnOnce() -> R + Send + 'static,
  R: SideEffect<Err>,
  Err: Send + 'static,
{
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Err> + Send + 'static,
  {
    match (self.f)().into_result() {
      Ok(()) => observer.complete(),
      Err(err) => observer.error(err),
    }
  }
}
