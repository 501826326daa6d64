use crate::{
  completable::Completable,
  observable::{IgnoreValues, Observable, ValueObserver},
  observer::Observer,
};

/// A completable seen as a value stream of `()`.
///
/// With `emit_unit` set, a single `()` is emitted right before completion;
/// otherwise the stream carries no values at all.
///
/// This struct is created by `CompletableExt::as_observable`.
#[derive(Clone)]
pub struct AsObservable<S> {
  source: S,
  emit_unit: bool,
}

impl<S> AsObservable<S> {
  #[inline]
  pub fn new(source: S, emit_unit: bool) -> Self { Self { source, emit_unit } }
}

pub struct UnitObserver<O> {
  observer: O,
  emit_unit: bool,
}

impl<O, Err> Observer<Err> for UnitObserver<O>
where
  O: ValueObserver<(), Err>,
{
  fn complete(mut self) {
    if self.emit_unit {
      self.observer.next(());
    }
    self.observer.complete();
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S: Completable> Observable for AsObservable<S> {
  type Item = ();
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: ValueObserver<(), Self::Err> + Send + 'static,
  {
    self
      .source
      .actual_subscribe(UnitObserver { observer, emit_unit: self.emit_unit })
  }
}

/// A value stream seen as a completable: values are dropped, the terminal
/// event is kept.
#[derive(Clone)]
pub struct AsCompletable<S>(S);

impl<S> AsCompletable<S> {
  #[inline]
  pub fn new(source: S) -> Self { Self(source) }
}

impl<S: Observable> Completable for AsCompletable<S> {
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    self.0.actual_subscribe(IgnoreValues(observer))
  }
}
