use std::marker::PhantomData;

use super::{Completable, ScheduledSubscription};
use crate::{observer::Observer, scheduler::Scheduler, subscription::ClosureSubscription};

// ==================== Empty ====================

/// Completes immediately on subscribe.
pub struct Empty<Err>(PhantomData<fn() -> Err>);

impl<Err> Clone for Empty<Err> {
  fn clone(&self) -> Self { *self }
}

impl<Err> Copy for Empty<Err> {}

pub fn empty<Err>() -> Empty<Err> { Empty(PhantomData) }

impl<Err: Send + 'static> Completable for Empty<Err> {
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Err> + Send + 'static,
  {
    observer.complete();
  }
}

// ==================== Never ====================

/// Never terminates. The observer is released when the subscription is
/// disposed.
pub struct Never<Err>(PhantomData<fn() -> Err>);

impl<Err> Clone for Never<Err> {
  fn clone(&self) -> Self { *self }
}

impl<Err> Copy for Never<Err> {}

pub fn never<Err>() -> Never<Err> { Never(PhantomData) }

impl<Err: Send + 'static> Completable for Never<Err> {
  type Err = Err;
  type Unsub = ClosureSubscription<Box<dyn FnOnce() + Send>>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Err> + Send + 'static,
  {
    ClosureSubscription(Box::new(move || drop(observer)))
  }
}

// ==================== Throw ====================

/// Fails immediately with a prebuilt error.
#[derive(Clone)]
pub struct Throw<Err> {
  err: Err,
}

pub fn throw<Err>(err: Err) -> Throw<Err> { Throw { err } }

impl<Err: Send + 'static> Completable for Throw<Err> {
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Err> + Send + 'static,
  {
    observer.error(self.err);
  }
}

// ==================== Scheduled variants ====================

/// Completes on a scheduler.
pub struct EmptyOn<Err, S> {
  scheduler: S,
  _marker: PhantomData<fn() -> Err>,
}

impl<Err, S: Clone> Clone for EmptyOn<Err, S> {
  fn clone(&self) -> Self { Self { scheduler: self.scheduler.clone(), _marker: PhantomData } }
}

pub fn empty_on<Err, S: Scheduler>(scheduler: S) -> EmptyOn<Err, S> {
  EmptyOn { scheduler, _marker: PhantomData }
}

impl<Err: Send + 'static, S: Scheduler> Completable for EmptyOn<Err, S> {
  type Err = Err;
  type Unsub = ScheduledSubscription<Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Err> + Send + 'static,
  {
    ScheduledSubscription::schedule(&self.scheduler, observer, Ok(()), None)
  }
}

/// Fails on a scheduler.
#[derive(Clone)]
pub struct ThrowOn<Err, S> {
  err: Err,
  scheduler: S,
}

pub fn throw_on<Err, S: Scheduler>(err: Err, scheduler: S) -> ThrowOn<Err, S> {
  ThrowOn { err, scheduler }
}

impl<Err: Send + 'static, S: Scheduler> Completable for ThrowOn<Err, S> {
  type Err = Err;
  type Unsub = ScheduledSubscription<Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Err> + Send + 'static,
  {
    ScheduledSubscription::schedule(&self.scheduler, observer, Err(self.err), None)
  }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{
      atomic::{AtomicUsize, Ordering},
      Arc,
    },
    time::Duration,
  };

  use crate::prelude::*;

  #[completable_macro::test]
  fn empty_completes_and_closes() {
    let hits = Arc::new(AtomicUsize::new(0));
    let c_hits = hits.clone();
    let handle = empty::<CompletableError>().subscribe_complete(move || {
      c_hits.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(handle.is_closed());
    // disposing a terminated subscription is a no-op
    handle.unsubscribe();
  }

  #[completable_macro::test]
  fn never_stays_open_until_disposed() {
    let handle = never::<CompletableError>().subscribe();
    assert!(!handle.is_closed());
    handle.clone().unsubscribe();
    assert!(handle.is_closed());
  }

  #[completable_macro::test]
  #[should_panic(expected = "boom")]
  fn subscribe_without_error_handler_panics() {
    throw(CompletableError::from("boom")).subscribe();
  }

  #[completable_macro::test]
  fn scheduled_variants_wait_for_the_scheduler() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(AtomicUsize::new(0));
    let (c1, c2) = (log.clone(), log.clone());
    empty_on::<CompletableError, _>(scheduler.clone()).subscribe_complete(move || {
      c1.fetch_add(1, Ordering::SeqCst);
    });
    throw_on(CompletableError::from("x"), scheduler.clone()).subscribe_all(
      || {},
      move |_| {
        c2.fetch_add(10, Ordering::SeqCst);
      },
    );
    assert_eq!(log.load(Ordering::SeqCst), 0);
    scheduler.advance_by(Duration::ZERO);
    assert_eq!(log.load(Ordering::SeqCst), 11);
  }

  #[completable_macro::test]
  fn disposing_scheduled_empty_cancels_it() {
    let scheduler = TestScheduler::new();
    let handle = empty_on::<CompletableError, _>(scheduler.clone()).subscribe();
    handle.unsubscribe();
    assert_eq!(scheduler.pending_count(), 0);
  }
}
