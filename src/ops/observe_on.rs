use std::collections::VecDeque;

use crate::{
  completable::Completable,
  gate::Gate,
  observer::Observer,
  scheduler::Scheduler,
  subscription::{ClosureSubscription, CompositeSubscription, Subscription, TupleSubscription},
};

/// Delivers the terminal event from a task on a scheduler.
///
/// This struct is created by `CompletableExt::observe_on`.
#[derive(Clone)]
pub struct ObserveOn<S, Sch> {
  source: S,
  scheduler: Sch,
}

impl<S, Sch> ObserveOn<S, Sch> {
  #[inline]
  pub fn new(source: S, scheduler: Sch) -> Self { Self { source, scheduler } }
}

enum Notification<Err> {
  Complete,
  Error(Err),
}

impl<Err> Notification<Err> {
  fn deliver<O: Observer<Err>>(self, observer: O) {
    match self {
      Notification::Complete => observer.complete(),
      Notification::Error(err) => observer.error(err),
    }
  }
}

struct DeliveryQueue<O, Err> {
  observer: Option<O>,
  pending: VecDeque<Notification<Err>>,
  draining: bool,
}

pub struct ObserveOnObserver<O, Err, Sch> {
  queue: Gate<DeliveryQueue<O, Err>>,
  scheduler: Sch,
  tasks: CompositeSubscription,
}

impl<O, Err, Sch> ObserveOnObserver<O, Err, Sch>
where
  O: Observer<Err> + Send + 'static,
  Err: Send + 'static,
  Sch: Scheduler,
{
  fn push(self, notification: Notification<Err>) {
    if self.tasks.is_closed() {
      return;
    }
    if self.scheduler.is_queued() {
      let queue = self.queue.clone();
      let handle = self.scheduler.schedule(
        Box::new(move || {
          let observer = queue.lock().observer.take();
          if let Some(observer) = observer {
            notification.deliver(observer);
          }
        }),
        None,
      );
      self.tasks.add(handle);
      return;
    }

    let start = {
      let mut queue = self.queue.lock();
      queue.pending.push_back(notification);
      !std::mem::replace(&mut queue.draining, true)
    };
    if start {
      let queue = self.queue.clone();
      let handle = self.scheduler.schedule(Box::new(move || drain(&queue)), None);
      self.tasks.add(handle);
    }
  }
}

/// Deliver everything queued so far, in order, from a single scheduled run.
fn drain<O: Observer<Err>, Err>(queue: &Gate<DeliveryQueue<O, Err>>) {
  loop {
    let next = {
      let mut queue = queue.lock();
      match queue.pending.pop_front() {
        Some(notification) => queue.observer.take().map(|o| (o, notification)),
        None => {
          queue.draining = false;
          return;
        }
      }
    };
    if let Some((observer, notification)) = next {
      notification.deliver(observer);
    }
  }
}

impl<O, Err, Sch> Observer<Err> for ObserveOnObserver<O, Err, Sch>
where
  O: Observer<Err> + Send + 'static,
  Err: Send + 'static,
  Sch: Scheduler,
{
  fn complete(self) { self.push(Notification::Complete) }

  fn error(self, err: Err) { self.push(Notification::Error(err)) }

  fn is_closed(&self) -> bool {
    self.tasks.is_closed() || self.queue.lock().observer.as_ref().is_none_or(O::is_closed)
  }
}

impl<S, Sch> Completable for ObserveOn<S, Sch>
where
  S: Completable,
  Sch: Scheduler,
{
  type Err = S::Err;
  type Unsub = TupleSubscription<S::Unsub, CompositeSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let tasks = CompositeSubscription::new();
    let queue =
      Gate::new(DeliveryQueue { observer: Some(observer), pending: VecDeque::new(), draining: false });
    // a task already running finds the observer gone
    let release = queue.clone();
    tasks.add(ClosureSubscription(move || {
      let observer = release.lock().observer.take();
      drop(observer);
    }));
    let unsub = self.source.actual_subscribe(ObserveOnObserver {
      queue,
      scheduler: self.scheduler,
      tasks: tasks.clone(),
    });
    TupleSubscription::new(unsub, tasks)
  }
}
