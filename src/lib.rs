//! # rx-completable
//!
//! A cold, cancellable, value-less completion signal with a thread-safe
//! operator algebra.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//!
//! use rx_completable::prelude::*;
//!
//! let scheduler = TestScheduler::new();
//! let saved = concat(vec![
//!   timer::<CompletableError, _>(Duration::from_millis(10), scheduler.clone()).box_it(),
//!   from_fn(|| println!("saved")).box_it(),
//! ])
//! .timeout(Duration::from_secs(1), scheduler.clone())
//! .subscribe();
//!
//! scheduler.advance_by(Duration::from_millis(10));
//! assert!(saved.is_closed());
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Completable`] | A unit of work that completes or fails, without a value |
//! | [`Observer`] | Receives exactly one of `complete` or `error` |
//! | [`Subscription`] | Handle to cancel a running subscription |
//! | [`Scheduler`] | Where and when deferred work runs |
//! | [`Observable`] | A value stream bridged to and from completables |
//!
//! ## Feature Flags
//!
//! - **`tokio-scheduler`**: [`TokioScheduler`](scheduler::TokioScheduler),
//!   running tasks on a tokio runtime.
//!
//! [`Completable`]: completable::Completable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Scheduler`]: scheduler::Scheduler
//! [`Observable`]: observable::Observable

pub mod completable;
pub mod error;
pub mod gate;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod scheduler;
pub mod subscription;

pub use prelude::*;

#[cfg(doctest)]
mod readme {
  #![doc = include_str!("../README.md")]
}
