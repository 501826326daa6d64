use std::marker::PhantomData;

use super::{Observable, ValueObserver};

/// Completes without emitting.
pub fn empty<Item, Err>() -> Empty<Item, Err> { Empty(PhantomData) }

/// Fails without emitting.
pub fn throw<Item, Err>(err: Err) -> Throw<Item, Err> { Throw { err, _marker: PhantomData } }

pub struct Empty<Item, Err>(PhantomData<fn() -> (Item, Err)>);

impl<Item, Err> Clone for Empty<Item, Err> {
  fn clone(&self) -> Self { Self(PhantomData) }
}

impl<Item, Err> Observable for Empty<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: ValueObserver<Item, Err> + Send + 'static,
  {
    observer.complete();
  }
}

pub struct Throw<Item, Err> {
  err: Err,
  _marker: PhantomData<fn() -> Item>,
}

impl<Item, Err: Clone> Clone for Throw<Item, Err> {
  fn clone(&self) -> Self { Self { err: self.err.clone(), _marker: PhantomData } }
}

impl<Item, Err> Observable for Throw<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: ValueObserver<Item, Err> + Send + 'static,
  {
    observer.error(self.err);
  }
}
