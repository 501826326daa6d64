use std::{marker::PhantomData, time::Duration};

use super::Completable;
use crate::{
  gate::Gate,
  observer::{BoxedObserver, Observer},
  scheduler::{Scheduler, TaskHandle},
  subscription::Subscription,
};

/// Completes once `delay` elapsed on `scheduler`.
///
/// This struct is created by [`timer`].
pub struct Timer<Err, S> {
  delay: Duration,
  scheduler: S,
  _marker: PhantomData<fn() -> Err>,
}

impl<Err, S: Clone> Clone for Timer<Err, S> {
  fn clone(&self) -> Self {
    Self { delay: self.delay, scheduler: self.scheduler.clone(), _marker: PhantomData }
  }
}

/// Complete after `delay`. Disposing the subscription first cancels the
/// timer without any notification.
pub fn timer<Err, S: Scheduler>(delay: Duration, scheduler: S) -> Timer<Err, S> {
  Timer { delay, scheduler, _marker: PhantomData }
}

impl<Err: Send + 'static, S: Scheduler> Completable for Timer<Err, S> {
  type Err = Err;
  type Unsub = ScheduledSubscription<Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Err> + Send + 'static,
  {
    ScheduledSubscription::schedule(&self.scheduler, observer, Ok(()), Some(self.delay))
  }
}

/// A terminal event waiting on a scheduler.
///
/// Disposing it cancels the task and releases the observer, so a task that
/// already started when the handle was disposed finds nobody to notify.
pub struct ScheduledSubscription<Err> {
  task: TaskHandle,
  observer: Gate<Option<BoxedObserver<Err>>>,
}

impl<Err: Send + 'static> ScheduledSubscription<Err> {
  pub(crate) fn schedule<O, S>(
    scheduler: &S, observer: O, outcome: Result<(), Err>, delay: Option<Duration>,
  ) -> Self
  where
    O: Observer<Err> + Send + 'static,
    S: Scheduler,
  {
    let observer: Gate<Option<BoxedObserver<Err>>> = Gate::new(Some(Box::new(observer)));
    let c_observer = observer.clone();
    let task = scheduler.schedule(
      Box::new(move || match outcome {
        Ok(()) => Observer::<Err>::complete(c_observer),
        Err(err) => Observer::<Err>::error(c_observer, err),
      }),
      delay,
    );
    Self { task, observer }
  }
}

impl<Err> Subscription for ScheduledSubscription<Err> {
  fn unsubscribe(self) {
    self.task.cancel();
    let observer = self.observer.lock().take();
    drop(observer);
  }

  fn is_closed(&self) -> bool { self.observer.lock().is_none() }
}
