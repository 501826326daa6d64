use std::marker::PhantomData;

use super::{BoxedValueObserver, Observable, ValueObserver};
use crate::{
  gate::{Gate, SyncGate},
  observer::Observer,
  subscription::{SingleAssignmentSubscription, Subscription},
};

struct EmitterSlot<Item, Err> {
  /// `None` while `next` delivers, and after the terminal event.
  observer: Option<BoxedValueObserver<Item, Err>>,
  stopped: bool,
  /// Terminal event raised on the delivering thread, from inside `next`.
  deferred: Option<Result<(), Err>>,
}

/// Handle a value-stream `create` function emits through.
///
/// Values sent after the terminal event, or after the subscription was
/// disposed, are dropped. Emissions from several threads are serialized by
/// a dedicated lock; the observer itself is taken out of its slot while it
/// runs, so disposing the subscription from inside a delivery never waits on
/// the emitter. A value emitted re-entrantly from inside a delivery is
/// dropped; a terminal event is delivered once the outer `next` returns.
pub struct ValueEmitter<Item, Err> {
  slot: Gate<EmitterSlot<Item, Err>>,
  emitting: SyncGate,
  teardown: SingleAssignmentSubscription,
}

impl<Item, Err> Clone for ValueEmitter<Item, Err> {
  fn clone(&self) -> Self {
    Self { slot: self.slot.clone(), emitting: self.emitting.clone(), teardown: self.teardown.clone() }
  }
}

impl<Item, Err> ValueEmitter<Item, Err> {
  pub fn next(&self, value: Item) {
    self.emitting.enter(|| {
      let observer = self.slot.lock().observer.take();
      let Some(mut observer) = observer else {
        return;
      };
      observer.next(value);

      let deferred = {
        let mut slot = self.slot.lock();
        if !slot.stopped {
          slot.observer = Some(observer);
          return;
        }
        slot.deferred.take()
      };
      // disposed during the delivery when nothing was deferred
      if let Some(outcome) = deferred {
        self.deliver(observer, outcome);
      }
    })
  }

  pub fn complete(&self) { self.terminate(Ok(())) }

  pub fn error(&self, err: Err) { self.terminate(Err(err)) }

  pub fn is_closed(&self) -> bool {
    let slot = self.slot.lock();
    slot.stopped || slot.observer.as_ref().is_some_and(|o| o.is_closed())
  }

  fn terminate(&self, outcome: Result<(), Err>) {
    self.emitting.enter(|| {
      let observer = {
        let mut slot = self.slot.lock();
        if slot.stopped {
          return;
        }
        slot.stopped = true;
        match slot.observer.take() {
          Some(observer) => observer,
          None => {
            slot.deferred = Some(outcome);
            return;
          }
        }
      };
      self.deliver(observer, outcome);
    })
  }

  fn deliver(&self, observer: BoxedValueObserver<Item, Err>, outcome: Result<(), Err>) {
    match outcome {
      Ok(()) => observer.complete(),
      Err(err) => observer.error(err),
    }
    self.teardown.dispose();
  }
}

/// Build a value stream from a subscribe function.
pub fn create<Item, Err, F, U>(f: F) -> Create<F, Item, Err>
where
  F: FnOnce(ValueEmitter<Item, Err>) -> U,
  U: Subscription,
{
  Create { f, _marker: PhantomData }
}

pub struct Create<F, Item, Err> {
  f: F,
  _marker: PhantomData<fn() -> (Item, Err)>,
}

impl<F: Clone, Item, Err> Clone for Create<F, Item, Err> {
  fn clone(&self) -> Self { Self { f: self.f.clone(), _marker: PhantomData } }
}

impl<F, U, Item, Err> Observable for Create<F, Item, Err>
where
  F: FnOnce(ValueEmitter<Item, Err>) -> U + Send + 'static,
  U: Subscription + Send + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = ValueCreateSubscription<Item, Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: ValueObserver<Item, Err> + Send + 'static,
  {
    let slot = Gate::new(EmitterSlot {
      observer: Some(Box::new(observer) as BoxedValueObserver<Item, Err>),
      stopped: false,
      deferred: None,
    });
    let teardown = SingleAssignmentSubscription::new();
    let emitter =
      ValueEmitter { slot: slot.clone(), emitting: SyncGate::new(), teardown: teardown.clone() };
    teardown.set((self.f)(emitter));
    ValueCreateSubscription { slot, teardown }
  }
}

/// Never takes the emission lock, so it may run from inside a delivery.
pub struct ValueCreateSubscription<Item, Err> {
  slot: Gate<EmitterSlot<Item, Err>>,
  teardown: SingleAssignmentSubscription,
}

impl<Item, Err> Subscription for ValueCreateSubscription<Item, Err> {
  fn unsubscribe(self) {
    let released = {
      let mut slot = self.slot.lock();
      slot.stopped = true;
      (slot.observer.take(), slot.deferred.take())
    };
    drop(released);
    self.teardown.dispose();
  }

  fn is_closed(&self) -> bool { self.slot.lock().stopped }
}
