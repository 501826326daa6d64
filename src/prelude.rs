//! Prelude module for convenient imports.
//!
//! Value streams share constructor names with completables (`create`,
//! `empty`, `throw`), so only their traits are re-exported here; reach the
//! constructors through [`crate::observable`].

// Completable core and constructors
pub use crate::completable::*;
// Errors
pub use crate::error::{CompletableError, NoValueError, SideEffect, TimeoutError};
pub use crate::gate::{Gate, SyncGate};
// Value streams
pub use crate::observable::{
  BoxedValueObserver, Observable, ObservableExt, ValueCallbackObserver, ValueObserver,
};
// Observers
pub use crate::observer::{
  AutoDetachObserver, BoxedObserver, CallbackObserver, DynObserver, Observer,
};
// N-ary combinators
pub use crate::ops::{
  concat::{catch_sequence, concat, try_concat},
  merge::{merge, merge_all, merge_all_max, merge_max},
  synchronize::SynchronizedObserver,
  when_all::when_all,
};
// Schedulers
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
pub use crate::scheduler::{
  ImmediateScheduler, NewThreadScheduler, Scheduler, Task, TaskHandle, TestScheduler,
  TrampolineScheduler,
};
// Subscriptions
pub use crate::subscription::*;
