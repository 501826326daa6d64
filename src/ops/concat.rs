//! Sequential composition.
//!
//! `concat`, `catch_sequence` and `retry` share one engine: a source iterator
//! walked by a per-subscription trampoline. A child that completes (or fails,
//! for the catch form) synchronously inside its own `actual_subscribe` only
//! bumps the work-in-progress counter; the loop that is already running
//! picks the next source up, so the stack depth does not depend on the
//! number of sources.

use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

use parking_lot::Mutex;

use crate::{
  completable::{BoxedCompletable, Completable, CompletableExt},
  observer::{BoxedObserver, Observer},
  subscription::{SerialSubscription, SingleAssignmentSubscription, Subscription},
};

pub(crate) type SourceIter<Err> =
  Box<dyn Iterator<Item = Result<BoxedCompletable<Err>, Err>> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SequenceMode {
  /// Next source on completion, stop on the first error.
  Concat,
  /// Next source on error, stop on the first completion.
  Catch,
}

struct SequenceState<Err> {
  sources: Option<SourceIter<Err>>,
  observer: Option<BoxedObserver<Err>>,
  last_error: Option<Err>,
}

struct SequenceInner<Err> {
  state: Mutex<SequenceState<Err>>,
  wip: AtomicUsize,
  current: SerialSubscription,
  mode: SequenceMode,
}

/// Start walking `sources` for `observer`.
pub(crate) fn subscribe_sequence<Err, O>(
  sources: SourceIter<Err>, observer: O, mode: SequenceMode,
) -> SequenceSubscription<Err>
where
  Err: Send + 'static,
  O: Observer<Err> + Send + 'static,
{
  let inner = Arc::new(SequenceInner {
    state: Mutex::new(SequenceState {
      sources: Some(sources),
      observer: Some(Box::new(observer)),
      last_error: None,
    }),
    wip: AtomicUsize::new(0),
    current: SerialSubscription::new(),
    mode,
  });
  drain(&inner);
  SequenceSubscription(inner)
}

fn drain<Err: Send + 'static>(inner: &Arc<SequenceInner<Err>>) {
  if inner.wip.fetch_add(1, Ordering::AcqRel) != 0 {
    return;
  }
  loop {
    step(inner);
    if inner.wip.fetch_sub(1, Ordering::AcqRel) == 1 {
      break;
    }
  }
}

fn step<Err: Send + 'static>(inner: &Arc<SequenceInner<Err>>) {
  let mut sources = {
    let mut state = inner.state.lock();
    if state.observer.is_none() {
      return;
    }
    match state.sources.take() {
      Some(sources) => sources,
      None => return,
    }
  };

  // the iterator may run user code, keep it outside the lock
  let next = sources.next();

  let mut state = inner.state.lock();
  if state.observer.is_none() {
    return;
  }
  match next {
    Some(Ok(source)) => {
      state.sources = Some(sources);
      drop(state);
      tracing::trace!(mode = ?inner.mode, "sequence advancing to next source");
      let slot = SingleAssignmentSubscription::new();
      inner.current.replace(slot.clone());
      slot.set(source.actual_subscribe(SequenceObserver { inner: inner.clone() }));
    }
    Some(Err(err)) => {
      let observer = state.observer.take();
      drop(state);
      drop(sources);
      if let Some(observer) = observer {
        observer.error(err);
      }
    }
    None => {
      let observer = state.observer.take();
      let last_error = state.last_error.take();
      drop(state);
      drop(sources);
      let Some(observer) = observer else {
        return;
      };
      match (inner.mode, last_error) {
        (SequenceMode::Catch, Some(err)) => observer.error(err),
        _ => observer.complete(),
      }
    }
  }
}

fn finish<Err>(inner: &SequenceInner<Err>) -> Option<BoxedObserver<Err>> {
  let (observer, sources) = {
    let mut state = inner.state.lock();
    (state.observer.take(), state.sources.take())
  };
  drop(sources);
  observer
}

struct SequenceObserver<Err> {
  inner: Arc<SequenceInner<Err>>,
}

impl<Err: Send + 'static> Observer<Err> for SequenceObserver<Err> {
  fn complete(self) {
    match self.inner.mode {
      SequenceMode::Concat => drain(&self.inner),
      SequenceMode::Catch => {
        if let Some(observer) = finish(&self.inner) {
          observer.complete();
        }
      }
    }
  }

  fn error(self, err: Err) {
    match self.inner.mode {
      SequenceMode::Concat => {
        if let Some(observer) = finish(&self.inner) {
          observer.error(err);
        }
      }
      SequenceMode::Catch => {
        {
          let mut state = self.inner.state.lock();
          if state.observer.is_none() {
            return;
          }
          state.last_error = Some(err);
        }
        tracing::debug!("catch sequence falling back to next candidate");
        drain(&self.inner);
      }
    }
  }

  fn is_closed(&self) -> bool { self.inner.state.lock().observer.is_none() }
}

pub struct SequenceSubscription<Err>(Arc<SequenceInner<Err>>);

impl<Err> Subscription for SequenceSubscription<Err> {
  fn unsubscribe(self) {
    let observer = finish(&self.0);
    drop(observer);
    self.0.current.dispose();
  }

  fn is_closed(&self) -> bool { self.0.state.lock().observer.is_none() }
}

// ==================== Concat ====================

/// Runs its sources one after another.
///
/// This struct is created by [`concat`].
#[derive(Clone)]
pub struct Concat<I> {
  sources: I,
}

/// Subscribe to each source after the previous one completed. The first
/// error stops the sequence.
///
/// ```rust
/// use rx_completable::prelude::*;
///
/// let steps = (0..3).map(|_| empty::<CompletableError>());
/// assert!(concat(steps).wait().is_ok());
/// ```
pub fn concat<I>(sources: I) -> Concat<I>
where
  I: IntoIterator,
  I::Item: Completable,
{
  Concat { sources }
}

impl<I, C> Completable for Concat<I>
where
  I: IntoIterator<Item = C> + Send + 'static,
  I::IntoIter: Send + 'static,
  C: Completable,
{
  type Err = C::Err;
  type Unsub = SequenceSubscription<C::Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let sources = self.sources.into_iter().map(|c| Ok::<_, C::Err>(c.box_it()));
    subscribe_sequence(Box::new(sources), observer, SequenceMode::Concat)
  }
}

/// Runs fallible sources one after another.
///
/// This struct is created by [`try_concat`].
#[derive(Clone)]
pub struct TryConcat<I> {
  sources: I,
}

/// Like [`concat`] over `Result` items: an `Err` item fails the sequence
/// when it is reached.
pub fn try_concat<I, C>(sources: I) -> TryConcat<I>
where
  I: IntoIterator<Item = Result<C, C::Err>>,
  C: Completable,
{
  TryConcat { sources }
}

impl<I, C> Completable for TryConcat<I>
where
  I: IntoIterator<Item = Result<C, C::Err>> + Send + 'static,
  I::IntoIter: Send + 'static,
  C: Completable,
{
  type Err = C::Err;
  type Unsub = SequenceSubscription<C::Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let sources = self.sources.into_iter().map(|c| c.map(CompletableExt::box_it));
    subscribe_sequence(Box::new(sources), observer, SequenceMode::Concat)
  }
}

// ==================== CatchSequence ====================

/// Tries candidates in order until one completes.
///
/// This struct is created by [`catch_sequence`].
#[derive(Clone)]
pub struct CatchSequence<I> {
  sources: I,
}

/// Subscribe to each candidate after the previous one failed. The first
/// completion ends the chain; if every candidate fails, the last error is
/// delivered. No candidates at all completes.
pub fn catch_sequence<I>(sources: I) -> CatchSequence<I>
where
  I: IntoIterator,
  I::Item: Completable,
{
  CatchSequence { sources }
}

impl<I, C> Completable for CatchSequence<I>
where
  I: IntoIterator<Item = C> + Send + 'static,
  I::IntoIter: Send + 'static,
  C: Completable,
{
  type Err = C::Err;
  type Unsub = SequenceSubscription<C::Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let sources = self.sources.into_iter().map(|c| Ok::<_, C::Err>(c.box_it()));
    subscribe_sequence(Box::new(sources), observer, SequenceMode::Catch)
  }
}
