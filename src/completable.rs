//! The completable primitive.
//!
//! A [`Completable`] describes an operation that terminates exactly once,
//! either successfully without a value or with an error. It is cold: nothing
//! runs until it is subscribed, and every subscription runs the operation
//! again. Operators consume `self`, so subscribing twice means cloning first:
//!
//! ```rust
//! use std::sync::{
//!   atomic::{AtomicUsize, Ordering},
//!   Arc,
//! };
//!
//! use rx_completable::prelude::*;
//!
//! let runs = Arc::new(AtomicUsize::new(0));
//! let c_runs = runs.clone();
//! let work = from_fn::<CompletableError, _, _>(move || {
//!   c_runs.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! work.clone().subscribe();
//! work.subscribe();
//! assert_eq!(runs.load(Ordering::SeqCst), 2);
//! ```
//!
//! Every operator lives on [`CompletableExt`], implemented for all
//! completables.

use std::{fmt::Debug, time::Duration};

use crate::{
  error::{SideEffect, TimeoutError},
  gate::SyncGate,
  observable::Observable,
  observer::{
    AutoDetachObserver, CallbackObserver, Observer, StateObserver, StateObserver2, StateObserver3,
  },
  ops::{
    catch::{Catch, CatchIf, CatchIgnore},
    convert::AsObservable,
    delay::Delay,
    finalize::Finally,
    into_future::CompletableFuture,
    lifecycle::{OnCancel, OnCompleted, OnError, OnSubscribe, OnTerminate},
    observe_on::ObserveOn,
    retry::Retry,
    subscribe_on::SubscribeOn,
    synchronize::Synchronize,
    then::{Then, ThenObservable, ThenReturn},
    timeout::{Timeout, TimeoutWith},
    until::Until,
    wait,
  },
  scheduler::Scheduler,
  subscription::{SingleAssignmentSubscription, Subscription},
};

mod boxed;
mod create;
mod defer;
mod from_fn;
mod timer;
mod trivial;

pub use boxed::*;
pub use create::*;
pub use defer::*;
pub use from_fn::*;
pub use timer::*;
pub use trivial::*;

/// A cold, value-less completion signal.
pub trait Completable: Sized + Send + 'static {
  type Err: Send + 'static;
  type Unsub: Subscription + Send + 'static;

  /// Start one execution delivering its outcome to `observer`.
  ///
  /// This is the low level entry point operators are built on; applications
  /// use the `subscribe*` family of [`CompletableExt`], which also releases
  /// the subscription graph once the execution terminated.
  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static;
}

pub trait CompletableExt: Completable {
  // ==================== Composition ====================

  /// Continue with `next` once this completes. Errors skip `next`.
  fn then<N>(self, next: N) -> Then<Self, N>
  where
    N: Completable<Err = Self::Err>,
  {
    Then::new(self, next)
  }

  /// Continue with the value stream `factory` builds once this completes.
  fn then_observable<F, S>(self, factory: F) -> ThenObservable<Self, F>
  where
    F: FnOnce() -> S + Send + 'static,
    S: Observable<Err = Self::Err>,
  {
    ThenObservable::new(self, factory)
  }

  /// Emit `value` once this completes, then complete.
  fn then_return<T: Send + 'static>(self, value: T) -> ThenReturn<Self, T> {
    ThenReturn::new(self, value)
  }

  /// Terminate as soon as either this or `other` terminates, with the
  /// winner's outcome. The loser is disposed.
  fn until<T>(self, other: T) -> Until<Self, T>
  where
    T: Completable<Err = Self::Err>,
  {
    Until::new(self, other)
  }

  // ==================== Recovery ====================

  /// On error, call `handler`: `Ok(replacement)` continues with the
  /// replacement, `Err(err)` fails with `err`.
  fn catch<F, C>(self, handler: F) -> Catch<Self, F>
  where
    F: FnOnce(Self::Err) -> Result<C, Self::Err> + Send + 'static,
    C: Completable<Err = Self::Err>,
  {
    Catch::new(self, handler)
  }

  /// Recover the errors `matches` accepts with the completable `handler`
  /// builds; other errors propagate unchanged.
  ///
  /// ```rust
  /// use rx_completable::prelude::*;
  ///
  /// let recovered = throw(CompletableError::from("offline"))
  ///   .catch_if(|err| !err.is_timeout(), |_| empty())
  ///   .wait();
  /// assert!(recovered.is_ok());
  /// ```
  fn catch_if<P, F, C>(self, matches: P, handler: F) -> CatchIf<Self, P, F>
  where
    P: FnOnce(&Self::Err) -> bool + Send + 'static,
    F: FnOnce(Self::Err) -> C + Send + 'static,
    C: Completable<Err = Self::Err>,
  {
    CatchIf::new(self, matches, handler)
  }

  /// Turn every error into completion.
  fn catch_ignore(self) -> CatchIgnore<Self, fn(&Self::Err) -> bool> {
    let matches: fn(&Self::Err) -> bool = |_| true;
    CatchIgnore::new(self, matches)
  }

  /// Turn the errors `matches` accepts into completion.
  fn catch_ignore_if<P>(self, matches: P) -> CatchIgnore<Self, P>
  where
    P: FnOnce(&Self::Err) -> bool + Send + 'static,
  {
    CatchIgnore::new(self, matches)
  }

  /// Subscribe again, up to `count` more times, while the source fails.
  /// The last error surfaces once the attempts are exhausted.
  fn retry(self, count: usize) -> Retry<Self>
  where
    Self: Clone,
  {
    Retry::new(self, count)
  }

  // ==================== Time ====================

  /// Fail with [`TimeoutError`] unless the source terminates within
  /// `duration`.
  fn timeout<S: Scheduler>(self, duration: Duration, scheduler: S) -> Timeout<Self, S>
  where
    Self::Err: From<TimeoutError>,
  {
    Timeout::new(self, duration, scheduler)
  }

  /// Switch to `fallback` unless the source terminates within `duration`.
  fn timeout_with<F, S>(
    self, duration: Duration, fallback: F, scheduler: S,
  ) -> TimeoutWith<Self, F, S>
  where
    F: Completable<Err = Self::Err>,
    S: Scheduler,
  {
    TimeoutWith::new(self, duration, fallback, scheduler)
  }

  /// Delay the completion by `delay`. Errors are delivered immediately.
  fn delay<S: Scheduler>(self, delay: Duration, scheduler: S) -> Delay<Self, S> {
    Delay::new(self, delay, scheduler)
  }

  // ==================== Context ====================

  /// Deliver the terminal event on `scheduler`.
  fn observe_on<S: Scheduler>(self, scheduler: S) -> ObserveOn<Self, S> {
    ObserveOn::new(self, scheduler)
  }

  /// Subscribe to the source on `scheduler`.
  fn subscribe_on<S: Scheduler>(self, scheduler: S) -> SubscribeOn<Self, S> {
    SubscribeOn::new(self, scheduler)
  }

  /// Serialize the terminal calls reaching the observer.
  fn synchronize(self) -> Synchronize<Self> { Synchronize::new(self, SyncGate::new()) }

  /// Serialize the terminal calls through a lock shared with other
  /// subscriptions.
  fn synchronize_with(self, gate: SyncGate) -> Synchronize<Self> { Synchronize::new(self, gate) }

  // ==================== Lifecycle ====================

  /// Run `f` once after the terminal event, or on dispose if that happens
  /// first.
  fn finally<F>(self, f: F) -> Finally<Self, F>
  where
    F: FnOnce() + Send + 'static,
  {
    Finally::new(self, f)
  }

  /// Run `f` before forwarding completion; an `Err` turns the completion into
  /// that error.
  fn on_completed<F, R>(self, f: F) -> OnCompleted<Self, F>
  where
    F: FnOnce() -> R + Send + 'static,
    R: SideEffect<Self::Err>,
  {
    OnCompleted::new(self, f)
  }

  /// Run `f` before forwarding an error; an `Err` replaces the error.
  fn on_error<F, R>(self, f: F) -> OnError<Self, F>
  where
    F: FnOnce(&Self::Err) -> R + Send + 'static,
    R: SideEffect<Self::Err>,
  {
    OnError::new(self, f)
  }

  /// Run `f` before forwarding either terminal event.
  fn on_terminate<F, R>(self, f: F) -> OnTerminate<Self, F>
  where
    F: FnOnce() -> R + Send + 'static,
    R: SideEffect<Self::Err>,
  {
    OnTerminate::new(self, f)
  }

  /// Run `f` before subscribing; an `Err` fails without subscribing.
  fn on_subscribe<F, R>(self, f: F) -> OnSubscribe<Self, F>
  where
    F: FnOnce() -> R + Send + 'static,
    R: SideEffect<Self::Err>,
  {
    OnSubscribe::new(self, f)
  }

  /// Run `f` if the subscription is disposed before it terminated.
  fn on_cancel<F>(self, f: F) -> OnCancel<Self, F>
  where
    F: FnOnce() + Send + 'static,
  {
    OnCancel::new(self, f)
  }

  // ==================== Conversion ====================

  /// A value stream that emits nothing and mirrors the terminal event.
  fn as_observable(self) -> AsObservable<Self> { AsObservable::new(self, false) }

  /// A value stream that emits `()` once on completion.
  fn as_single_unit_observable(self) -> AsObservable<Self> { AsObservable::new(self, true) }

  fn box_it(self) -> BoxedCompletable<Self::Err> { BoxedCompletable::new(self) }

  fn box_clone_it(self) -> BoxedCompletableClone<Self::Err>
  where
    Self: Clone,
  {
    BoxedCompletableClone::new(self)
  }

  // ==================== Blocking bridge ====================

  /// Subscribe and block the current thread until termination.
  ///
  /// The source must terminate on another thread (or synchronously): waiting
  /// on work queued to this very thread never returns.
  fn wait(self) -> Result<(), Self::Err> { wait::wait(self) }

  /// Like [`wait`](Self::wait), giving up after `timeout`: the subscription
  /// is disposed and [`TimeoutError`] returned.
  fn wait_timeout(self, timeout: Duration) -> Result<(), Self::Err>
  where
    Self::Err: From<TimeoutError>,
  {
    wait::wait_timeout(self, timeout)
  }

  /// A future resolving with the outcome. The source is subscribed on first
  /// poll and disposed if the future is dropped before it resolved.
  fn into_future(self) -> CompletableFuture<Self> { CompletableFuture::new(self) }

  // ==================== Subscribe ====================

  /// Subscribe with `observer`. The returned handle disposes the whole
  /// subscription; it is released automatically after termination.
  fn subscribe_observer<O>(self, observer: O) -> SingleAssignmentSubscription
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let observer = AutoDetachObserver::new(observer);
    let handle = observer.subscription.clone();
    handle.set(self.actual_subscribe(observer));
    handle
  }

  /// Subscribe ignoring completion.
  ///
  /// # Panics
  ///
  /// There is no default error handler: an error panics on the thread that
  /// delivers it.
  fn subscribe(self) -> SingleAssignmentSubscription
  where
    Self::Err: Debug,
  {
    self.subscribe_complete(|| {})
  }

  /// Subscribe with a completion callback.
  ///
  /// # Panics
  ///
  /// Like [`subscribe`](Self::subscribe), an error panics.
  fn subscribe_complete<C>(self, on_complete: C) -> SingleAssignmentSubscription
  where
    C: FnOnce() + Send + 'static,
    Self::Err: Debug,
  {
    self.subscribe_all(on_complete, |err| panic!("unhandled completable error: {err:?}"))
  }

  fn subscribe_all<C, E>(self, on_complete: C, on_error: E) -> SingleAssignmentSubscription
  where
    C: FnOnce() + Send + 'static,
    E: FnOnce(Self::Err) + Send + 'static,
  {
    self.subscribe_observer(CallbackObserver { on_complete, on_error })
  }

  /// Subscribe passing `state` to plain functions instead of capturing it in
  /// closures.
  fn subscribe_with<A>(
    self, a: A, on_complete: fn(A), on_error: fn(A, Self::Err),
  ) -> SingleAssignmentSubscription
  where
    A: Send + 'static,
  {
    self.subscribe_observer(StateObserver { a, on_complete, on_error })
  }

  fn subscribe_with2<A, B>(
    self, a: A, b: B, on_complete: fn(A, B), on_error: fn(A, B, Self::Err),
  ) -> SingleAssignmentSubscription
  where
    A: Send + 'static,
    B: Send + 'static,
  {
    self.subscribe_observer(StateObserver2 { a, b, on_complete, on_error })
  }

  fn subscribe_with3<A, B, C>(
    self, a: A, b: B, c: C, on_complete: fn(A, B, C), on_error: fn(A, B, C, Self::Err),
  ) -> SingleAssignmentSubscription
  where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
  {
    self.subscribe_observer(StateObserver3 { a, b, c, on_complete, on_error })
  }

  /// Subscribe and forget the handle. Errors are logged and swallowed.
  fn fire_and_forget(self)
  where
    Self::Err: Debug,
  {
    self.subscribe_all(
      || {},
      |err| tracing::warn!(error = ?err, "fire-and-forget completable failed"),
    );
  }
}

impl<T: Completable> CompletableExt for T {}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use parking_lot::Mutex;

  use crate::prelude::*;

  #[completable_macro::test]
  fn subscribing_twice_runs_twice() {
    let runs = Arc::new(AtomicUsize::new(0));
    let c_runs = runs.clone();
    let source = create::<CompletableError, _, _>(move |emitter| {
      c_runs.fetch_add(1, Ordering::SeqCst);
      emitter.complete();
      emitter.complete();
    });

    let completes = Arc::new(AtomicUsize::new(0));
    for _ in 0..2 {
      let completes = completes.clone();
      source.clone().subscribe_complete(move || {
        completes.fetch_add(1, Ordering::SeqCst);
      });
    }
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(completes.load(Ordering::SeqCst), 2);
  }

  #[completable_macro::test]
  fn subscribe_with_passes_state() {
    let log = Arc::new(Mutex::new(vec![]));
    empty::<CompletableError>().subscribe_with(
      log.clone(),
      |log| log.lock().push("done".to_string()),
      |log, err| log.lock().push(err.to_string()),
    );
    throw(CompletableError::from("bad")).subscribe_with2(
      log.clone(),
      "prefix",
      |log, p| log.lock().push(p.to_string()),
      |log, p, err| log.lock().push(format!("{p}: {err}")),
    );
    assert_eq!(*log.lock(), vec!["done".to_string(), "prefix: bad".to_string()]);
  }

  #[completable_macro::test]
  fn subscribe_with3_completes() {
    let hits = Arc::new(AtomicUsize::new(0));
    empty::<CompletableError>().subscribe_with3(
      hits.clone(),
      2usize,
      3usize,
      |hits, b, c| {
        hits.fetch_add(b * c, Ordering::SeqCst);
      },
      |_, _, _, _| {},
    );
    assert_eq!(hits.load(Ordering::SeqCst), 6);
  }

  #[completable_macro::test]
  fn fire_and_forget_swallows_errors() {
    throw(CompletableError::from("ignored")).fire_and_forget();
    empty::<CompletableError>().fire_and_forget();
  }

  #[completable_macro::test]
  fn dispose_after_termination_is_noop() {
    let handle = empty::<CompletableError>().subscribe();
    assert!(handle.is_closed());
    handle.clone().unsubscribe();
    handle.unsubscribe();
  }
}
