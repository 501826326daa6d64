use std::marker::PhantomData;

use super::{Observable, ValueObserver};

/// Emits every item of an iterator, then completes.
///
/// Stops early when the observer closes.
pub fn from_iter<Iter, Err>(iter: Iter) -> FromIter<Iter, Err>
where
  Iter: IntoIterator,
{
  FromIter { iter, _marker: PhantomData }
}

/// Emits one value, then completes.
pub fn of<Item, Err>(value: Item) -> FromIter<std::iter::Once<Item>, Err> {
  from_iter(std::iter::once(value))
}

pub struct FromIter<Iter, Err> {
  iter: Iter,
  _marker: PhantomData<fn() -> Err>,
}

impl<Iter: Clone, Err> Clone for FromIter<Iter, Err> {
  fn clone(&self) -> Self { Self { iter: self.iter.clone(), _marker: PhantomData } }
}

impl<Iter, Err> Observable for FromIter<Iter, Err>
where
  Iter: IntoIterator + Send + 'static,
  Iter::Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Iter::Item;
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: ValueObserver<Self::Item, Err> + Send + 'static,
  {
    for value in self.iter {
      if observer.is_closed() {
        return;
      }
      observer.next(value);
    }
    observer.complete();
  }
}
