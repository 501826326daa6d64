//! Error recovery.
//!
//! The typed forms decide at composition time, through a handler or a
//! classification function, which errors they recover. Errors they do not
//! recover pass through untouched. For trying a list of candidates in order
//! see `catch_sequence`.

use crate::{
  completable::Completable,
  observer::Observer,
  subscription::{SingleAssignmentSubscription, Subscription, TupleSubscription},
};

// ==================== Catch ====================

/// Switches to a replacement chosen by a handler.
///
/// This struct is created by `CompletableExt::catch`.
#[derive(Clone)]
pub struct Catch<S, F> {
  source: S,
  handler: F,
}

impl<S, F> Catch<S, F> {
  #[inline]
  pub fn new(source: S, handler: F) -> Self { Self { source, handler } }
}

pub struct CatchObserver<O, F> {
  observer: O,
  handler: F,
  replacement: SingleAssignmentSubscription,
}

impl<O, F, C, Err> Observer<Err> for CatchObserver<O, F>
where
  O: Observer<Err> + Send + 'static,
  F: FnOnce(Err) -> Result<C, Err>,
  C: Completable<Err = Err>,
{
  fn complete(self) { self.observer.complete() }

  fn error(self, err: Err) {
    match (self.handler)(err) {
      Ok(replacement) => {
        if self.replacement.is_closed() {
          return;
        }
        tracing::debug!("catch recovered, switching to replacement");
        self.replacement.set(replacement.actual_subscribe(self.observer));
      }
      Err(err) => self.observer.error(err),
    }
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

fn subscribe_catch<S, F, C, O>(
  source: S, handler: F, observer: O,
) -> TupleSubscription<S::Unsub, SingleAssignmentSubscription>
where
  S: Completable,
  F: FnOnce(S::Err) -> Result<C, S::Err> + Send + 'static,
  C: Completable<Err = S::Err>,
  O: Observer<S::Err> + Send + 'static,
{
  let replacement = SingleAssignmentSubscription::new();
  let unsub =
    source.actual_subscribe(CatchObserver { observer, handler, replacement: replacement.clone() });
  TupleSubscription::new(unsub, replacement)
}

impl<S, F, C> Completable for Catch<S, F>
where
  S: Completable,
  F: FnOnce(S::Err) -> Result<C, S::Err> + Send + 'static,
  C: Completable<Err = S::Err>,
{
  type Err = S::Err;
  type Unsub = TupleSubscription<S::Unsub, SingleAssignmentSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    subscribe_catch(self.source, self.handler, observer)
  }
}

// ==================== CatchIf ====================

/// Recovers the errors a classification function accepts.
///
/// This struct is created by `CompletableExt::catch_if`.
#[derive(Clone)]
pub struct CatchIf<S, P, F> {
  source: S,
  matches: P,
  handler: F,
}

impl<S, P, F> CatchIf<S, P, F> {
  #[inline]
  pub fn new(source: S, matches: P, handler: F) -> Self { Self { source, matches, handler } }
}

impl<S, P, F, C> Completable for CatchIf<S, P, F>
where
  S: Completable,
  P: FnOnce(&S::Err) -> bool + Send + 'static,
  F: FnOnce(S::Err) -> C + Send + 'static,
  C: Completable<Err = S::Err>,
{
  type Err = S::Err;
  type Unsub = TupleSubscription<S::Unsub, SingleAssignmentSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let Self { source, matches, handler } = self;
    let handler = move |err: S::Err| if matches(&err) { Ok(handler(err)) } else { Err(err) };
    subscribe_catch(source, handler, observer)
  }
}

// ==================== CatchIgnore ====================

/// Turns recovered errors into completion.
///
/// This struct is created by `CompletableExt::catch_ignore` and
/// `CompletableExt::catch_ignore_if`.
#[derive(Clone)]
pub struct CatchIgnore<S, P> {
  source: S,
  matches: P,
}

impl<S, P> CatchIgnore<S, P> {
  #[inline]
  pub fn new(source: S, matches: P) -> Self { Self { source, matches } }
}

pub struct CatchIgnoreObserver<O, P> {
  observer: O,
  matches: P,
}

impl<O, P, Err> Observer<Err> for CatchIgnoreObserver<O, P>
where
  O: Observer<Err>,
  P: FnOnce(&Err) -> bool,
{
  fn complete(self) { self.observer.complete() }

  fn error(self, err: Err) {
    if (self.matches)(&err) {
      tracing::debug!("catch ignored error, completing instead");
      self.observer.complete();
    } else {
      self.observer.error(err);
    }
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, P> Completable for CatchIgnore<S, P>
where
  S: Completable,
  P: FnOnce(&S::Err) -> bool + Send + 'static,
{
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    self
      .source
      .actual_subscribe(CatchIgnoreObserver { observer, matches: self.matches })
  }
}
