//! Concurrent composition.
//!
//! The outer source emits completables; each one is subscribed as soon as
//! fewer than `concurrent` are running, otherwise it waits in a queue. The
//! merge completes once the outer source completed, the queue is empty and
//! no inner source is running. The first error, outer or inner, wins: the
//! queue is dropped and everything still running is disposed.
//!
//! All of these decisions are taken under one lock. Starting queued sources
//! goes through a work-in-progress loop, so inner sources completing
//! synchronously never recurse.

use std::{
  collections::VecDeque,
  mem,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
};

use parking_lot::Mutex;

use crate::{
  completable::{BoxedCompletable, Completable, CompletableExt},
  observable::{from_iter, FromIter, Observable, ValueObserver},
  observer::{BoxedObserver, Observer},
  subscription::{CompositeSubscription, SingleAssignmentSubscription, Subscription},
};

/// Merges the completables emitted by an outer source.
///
/// This struct is created by [`merge`], [`merge_max`], [`merge_all`] and
/// [`merge_all_max`].
#[derive(Clone)]
pub struct MergeAll<S> {
  source: S,
  concurrent: usize,
}

impl<S> MergeAll<S> {
  /// A `concurrent` of zero is treated as one.
  #[inline]
  pub fn new(source: S, concurrent: usize) -> Self {
    Self { source, concurrent: concurrent.max(1) }
  }
}

/// Run every source concurrently.
///
/// ```rust
/// use std::time::Duration;
///
/// use rx_completable::prelude::*;
///
/// let scheduler = TestScheduler::new();
/// let both = merge([
///   timer::<CompletableError, _>(Duration::from_secs(1), scheduler.clone()),
///   timer(Duration::from_secs(2), scheduler.clone()),
/// ]);
/// let handle = both.subscribe();
/// scheduler.advance_by(Duration::from_secs(2));
/// assert!(handle.is_closed());
/// ```
pub fn merge<I, C>(sources: I) -> MergeAll<FromIter<I, C::Err>>
where
  I: IntoIterator<Item = C>,
  C: Completable,
{
  MergeAll::new(from_iter(sources), usize::MAX)
}

/// Run the sources with at most `max_concurrent` at once, in order.
pub fn merge_max<I, C>(sources: I, max_concurrent: usize) -> MergeAll<FromIter<I, C::Err>>
where
  I: IntoIterator<Item = C>,
  C: Completable,
{
  MergeAll::new(from_iter(sources), max_concurrent)
}

/// Run every completable `sources` emits concurrently.
pub fn merge_all<S>(sources: S) -> MergeAll<S>
where
  S: Observable,
  S::Item: Completable<Err = S::Err>,
{
  MergeAll::new(sources, usize::MAX)
}

/// Like [`merge_all`] with at most `max_concurrent` inner sources running.
pub fn merge_all_max<S>(sources: S, max_concurrent: usize) -> MergeAll<S>
where
  S: Observable,
  S::Item: Completable<Err = S::Err>,
{
  MergeAll::new(sources, max_concurrent)
}

struct MergeState<Err> {
  observer: Option<BoxedObserver<Err>>,
  subscribe_tasks: VecDeque<BoxedCompletable<Err>>,
  outside_completed: bool,
  subscribed: usize,
}

struct MergeInner<Err> {
  state: Mutex<MergeState<Err>>,
  wip: AtomicUsize,
  concurrent: usize,
  inner_subscriptions: CompositeSubscription,
  outside: SingleAssignmentSubscription,
}

impl<Err: Send + 'static> MergeInner<Err> {
  fn drain(self: &Arc<Self>) {
    if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
      return;
    }
    loop {
      while let Some(source) = self.next_task() {
        self.subscribe_inner(source);
      }

      let finished = {
        let mut state = self.state.lock();
        if state.outside_completed && state.subscribed == 0 && state.subscribe_tasks.is_empty() {
          state.observer.take()
        } else {
          None
        }
      };
      if let Some(observer) = finished {
        self.inner_subscriptions.dispose();
        observer.complete();
      }

      if self.wip.fetch_sub(1, Ordering::AcqRel) == 1 {
        break;
      }
    }
  }

  fn next_task(&self) -> Option<BoxedCompletable<Err>> {
    let mut state = self.state.lock();
    if state.observer.is_none() || state.subscribed >= self.concurrent {
      return None;
    }
    let source = state.subscribe_tasks.pop_front()?;
    state.subscribed += 1;
    Some(source)
  }

  fn subscribe_inner(self: &Arc<Self>, source: BoxedCompletable<Err>) {
    let slot = SingleAssignmentSubscription::new();
    let Some(id) = self.inner_subscriptions.add(slot.clone()) else {
      return;
    };
    slot.set(source.actual_subscribe(InnerObserver { inner: self.clone(), id }));
  }

  fn fail(&self, err: Err) {
    let (observer, queued) = {
      let mut state = self.state.lock();
      (state.observer.take(), mem::take(&mut state.subscribe_tasks))
    };
    drop(queued);
    if let Some(observer) = observer {
      self.outside.dispose();
      self.inner_subscriptions.dispose();
      observer.error(err);
    }
  }
}

struct OutsideObserver<Err> {
  inner: Arc<MergeInner<Err>>,
}

impl<Err: Send + 'static> Observer<Err> for OutsideObserver<Err> {
  fn complete(self) {
    self.inner.state.lock().outside_completed = true;
    // every inner source was produced, release the outer subscription
    self.inner.outside.dispose();
    self.inner.drain();
  }

  fn error(self, err: Err) { self.inner.fail(err) }

  fn is_closed(&self) -> bool { self.inner.state.lock().observer.is_none() }
}

impl<C, Err> ValueObserver<C, Err> for OutsideObserver<Err>
where
  C: Completable<Err = Err>,
  Err: Send + 'static,
{
  fn next(&mut self, source: C) {
    {
      let mut state = self.inner.state.lock();
      if state.observer.is_none() {
        return;
      }
      if state.subscribed >= self.inner.concurrent {
        tracing::trace!(
          running = state.subscribed,
          queued = state.subscribe_tasks.len() + 1,
          "merge queued inner source"
        );
      }
      state.subscribe_tasks.push_back(source.box_it());
    }
    self.inner.drain();
  }
}

struct InnerObserver<Err> {
  inner: Arc<MergeInner<Err>>,
  id: usize,
}

impl<Err: Send + 'static> Observer<Err> for InnerObserver<Err> {
  fn complete(self) {
    {
      let mut state = self.inner.state.lock();
      if state.observer.is_none() {
        return;
      }
      state.subscribed -= 1;
    }
    self.inner.inner_subscriptions.remove(self.id);
    self.inner.drain();
  }

  fn error(self, err: Err) { self.inner.fail(err) }

  fn is_closed(&self) -> bool { self.inner.state.lock().observer.is_none() }
}

pub struct MergeSubscription<Err>(Arc<MergeInner<Err>>);

impl<Err> Subscription for MergeSubscription<Err> {
  fn unsubscribe(self) {
    let (observer, queued) = {
      let mut state = self.0.state.lock();
      (state.observer.take(), mem::take(&mut state.subscribe_tasks))
    };
    drop((observer, queued));
    self.0.outside.dispose();
    self.0.inner_subscriptions.dispose();
  }

  fn is_closed(&self) -> bool { self.0.state.lock().observer.is_none() }
}

impl<S> Completable for MergeAll<S>
where
  S: Observable,
  S::Item: Completable<Err = S::Err>,
{
  type Err = S::Err;
  type Unsub = MergeSubscription<S::Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let inner = Arc::new(MergeInner {
      state: Mutex::new(MergeState {
        observer: Some(Box::new(observer)),
        subscribe_tasks: VecDeque::new(),
        outside_completed: false,
        subscribed: 0,
      }),
      wip: AtomicUsize::new(0),
      concurrent: self.concurrent,
      inner_subscriptions: CompositeSubscription::new(),
      outside: SingleAssignmentSubscription::new(),
    });
    let unsub = self.source.actual_subscribe(OutsideObserver { inner: inner.clone() });
    inner.outside.set(unsub);
    MergeSubscription(inner)
  }
}
