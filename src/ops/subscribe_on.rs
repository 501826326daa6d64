use crate::{
  completable::Completable,
  observer::Observer,
  scheduler::{Scheduler, TaskHandle},
  subscription::{SingleAssignmentSubscription, SourceWithHandle},
};

/// Subscribes to the source from a task on `scheduler`.
///
/// This struct is created by `CompletableExt::subscribe_on` and by `start`.
#[derive(Clone)]
pub struct SubscribeOn<S, Sch> {
  source: S,
  scheduler: Sch,
}

impl<S, Sch> SubscribeOn<S, Sch> {
  #[inline]
  pub fn new(source: S, scheduler: Sch) -> Self { Self { source, scheduler } }
}

impl<S, Sch> Completable for SubscribeOn<S, Sch>
where
  S: Completable,
  Sch: Scheduler,
{
  type Err = S::Err;
  type Unsub = SourceWithHandle<SingleAssignmentSubscription, TaskHandle>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Err> + Send + 'static,
  {
    let slot = SingleAssignmentSubscription::new();
    let c_slot = slot.clone();
    let source = self.source;
    let handle = self
      .scheduler
      .schedule(Box::new(move || c_slot.set(source.actual_subscribe(observer))), None);
    SourceWithHandle::new(slot, handle)
  }
}
