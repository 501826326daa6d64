use super::Completable;
use crate::observer::Observer;

/// Completable whose source is built at subscribe time.
///
/// This struct is created by [`defer`].
#[derive(Clone)]
pub struct Defer<F> {
  factory: F,
}

/// Call `factory` on every subscription and subscribe to what it returns.
pub fn defer<F, C>(factory: F) -> Defer<F>
where
  F: FnOnce() -> C,
  C: Completable,
{
  Defer { factory }
}

impl<F, C> Completable for Defer<F>
where
  F: FnOnce() -> C + Send + 'static,
  C: Completable,
{
  type Err = C::Err;
  type Unsub = C::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    (self.factory)().actual_subscribe(observer)
  }
}

/// Like [`Defer`], with a factory that may fail.
///
/// This struct is created by [`try_defer`].
#[derive(Clone)]
pub struct TryDefer<F> {
  factory: F,
}

/// Call `factory` on every subscription; an `Err` is delivered to the
/// observer instead of subscribing.
pub fn try_defer<F, C>(factory: F) -> TryDefer<F>
where
  F: FnOnce() -> Result<C, C::Err>,
  C: Completable,
{
  TryDefer { factory }
}

impl<F, C> Completable for TryDefer<F>
where
  F: FnOnce() -> Result<C, C::Err> + Send + 'static,
  C: Completable,
{
  type Err = C::Err;
  type Unsub = Option<C::Unsub>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    match (self.factory)() {
      Ok(source) => Some(source.actual_subscribe(observer)),
      Err(err) => {
        observer.error(err);
        None
      }
    }
  }
}
