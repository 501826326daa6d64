//! Continuations.
//!
//! `then` continues a completable with another completable,
//! `then_observable` and `then_return` continue it with values, and
//! `Observable::then` continues a value stream with a completable built from
//! its last value.

use crate::{
  completable::Completable,
  error::NoValueError,
  observable::{Observable, ValueObserver},
  observer::Observer,
  subscription::{SingleAssignmentSubscription, Subscription, TupleSubscription},
};

// ==================== Then ====================

/// Runs `next` once the source completed.
///
/// This struct is created by `CompletableExt::then`.
#[derive(Clone)]
pub struct Then<S, N> {
  source: S,
  next: N,
}

impl<S, N> Then<S, N> {
  #[inline]
  pub fn new(source: S, next: N) -> Self { Self { source, next } }
}

pub struct ThenObserver<O, N> {
  observer: O,
  next: N,
  next_slot: SingleAssignmentSubscription,
}

impl<O, N, Err> Observer<Err> for ThenObserver<O, N>
where
  O: Observer<Err> + Send + 'static,
  N: Completable<Err = Err>,
{
  fn complete(self) {
    if !self.next_slot.is_closed() {
      self.next_slot.set(self.next.actual_subscribe(self.observer));
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, N> Completable for Then<S, N>
where
  S: Completable,
  N: Completable<Err = S::Err>,
{
  type Err = S::Err;
  type Unsub = TupleSubscription<S::Unsub, SingleAssignmentSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let next_slot = SingleAssignmentSubscription::new();
    let unsub = self.source.actual_subscribe(ThenObserver {
      observer,
      next: self.next,
      next_slot: next_slot.clone(),
    });
    TupleSubscription::new(unsub, next_slot)
  }
}

// ==================== ThenObservable ====================

/// This struct is created by `CompletableExt::then_observable`.
#[derive(Clone)]
pub struct ThenObservable<S, F> {
  source: S,
  factory: F,
}

impl<S, F> ThenObservable<S, F> {
  #[inline]
  pub fn new(source: S, factory: F) -> Self { Self { source, factory } }
}

pub struct ThenObservableObserver<O, F> {
  observer: O,
  factory: F,
  next_slot: SingleAssignmentSubscription,
}

impl<O, F, V, Err> Observer<Err> for ThenObservableObserver<O, F>
where
  F: FnOnce() -> V,
  V: Observable<Err = Err>,
  O: ValueObserver<V::Item, Err> + Send + 'static,
{
  fn complete(self) {
    if !self.next_slot.is_closed() {
      self.next_slot.set((self.factory)().actual_subscribe(self.observer));
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, F, V> Observable for ThenObservable<S, F>
where
  S: Completable,
  F: FnOnce() -> V + Send + 'static,
  V: Observable<Err = S::Err>,
{
  type Item = V::Item;
  type Err = S::Err;
  type Unsub = TupleSubscription<S::Unsub, SingleAssignmentSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: ValueObserver<Self::Item, Self::Err> + Send + 'static,
  {
    let next_slot = SingleAssignmentSubscription::new();
    let unsub = self.source.actual_subscribe(ThenObservableObserver {
      observer,
      factory: self.factory,
      next_slot: next_slot.clone(),
    });
    TupleSubscription::new(unsub, next_slot)
  }
}

// ==================== ThenReturn ====================

/// Emits a single value once the source completed.
///
/// This struct is created by `CompletableExt::then_return`.
#[derive(Clone)]
pub struct ThenReturn<S, T> {
  source: S,
  value: T,
}

impl<S, T> ThenReturn<S, T> {
  #[inline]
  pub fn new(source: S, value: T) -> Self { Self { source, value } }
}

pub struct ThenReturnObserver<O, T> {
  observer: O,
  value: T,
}

impl<O, T, Err> Observer<Err> for ThenReturnObserver<O, T>
where
  O: ValueObserver<T, Err>,
{
  fn complete(mut self) {
    self.observer.next(self.value);
    self.observer.complete();
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, T> Observable for ThenReturn<S, T>
where
  S: Completable,
  T: Send + 'static,
{
  type Item = T;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: ValueObserver<T, Self::Err> + Send + 'static,
  {
    self
      .source
      .actual_subscribe(ThenReturnObserver { observer, value: self.value })
  }
}

// ==================== Observable::then ====================

/// This struct is created by `ObservableExt::then`.
#[derive(Clone)]
pub struct ObservableThen<S, F> {
  source: S,
  selector: F,
}

impl<S, F> ObservableThen<S, F> {
  #[inline]
  pub fn new(source: S, selector: F) -> Self { Self { source, selector } }
}

/// Keeps the most recent value; on completion hands it to the selector.
pub struct LastValueObserver<O, F, Item> {
  observer: O,
  selector: F,
  last: Option<Item>,
  next_slot: SingleAssignmentSubscription,
}

impl<O, F, Item, C, Err> Observer<Err> for LastValueObserver<O, F, Item>
where
  O: Observer<Err> + Send + 'static,
  F: FnOnce(Item) -> C,
  C: Completable<Err = Err>,
  Err: From<NoValueError>,
{
  fn complete(self) {
    match self.last {
      Some(value) => {
        if !self.next_slot.is_closed() {
          self.next_slot.set((self.selector)(value).actual_subscribe(self.observer));
        }
      }
      None => self.observer.error(NoValueError.into()),
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<O, F, Item, C, Err> ValueObserver<Item, Err> for LastValueObserver<O, F, Item>
where
  O: Observer<Err> + Send + 'static,
  F: FnOnce(Item) -> C,
  C: Completable<Err = Err>,
  Err: From<NoValueError>,
{
  fn next(&mut self, value: Item) { self.last = Some(value); }
}

impl<S, F, C> Completable for ObservableThen<S, F>
where
  S: Observable,
  F: FnOnce(S::Item) -> C + Send + 'static,
  C: Completable<Err = S::Err>,
  S::Err: From<NoValueError>,
{
  type Err = S::Err;
  type Unsub = TupleSubscription<S::Unsub, SingleAssignmentSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let next_slot = SingleAssignmentSubscription::new();
    let unsub = self.source.actual_subscribe(LastValueObserver {
      observer,
      selector: self.selector,
      last: None,
      next_slot: next_slot.clone(),
    });
    TupleSubscription::new(unsub, next_slot)
  }
}
