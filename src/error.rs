//! Error kinds produced by the operators themselves.
//!
//! Every operator is generic over the error type of its source. The few
//! operators that have to *create* an error (`timeout`, `wait_timeout`,
//! `Observable::then`) require `Err: From<TimeoutError>` or
//! `Err: From<NoValueError>`. [`CompletableError`] implements both, so it can
//! be used directly when a crate has no error type of its own.
//!
//! User supplied side effects (the do-family, `from_fn`, `try_defer`) may
//! either return nothing or a `Result<(), Err>`; see [`SideEffect`].

use std::{error::Error, sync::Arc, time::Duration};

/// The source did not terminate within the allowed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("completable timed out after {0:?}")]
pub struct TimeoutError(pub Duration);

/// A value-dependent continuation was required but the upstream completed
/// without emitting anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, thiserror::Error)]
#[error("sequence completed without emitting a value")]
pub struct NoValueError;

/// Ready-made error type for completables.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompletableError {
  #[error(transparent)]
  Timeout(#[from] TimeoutError),

  #[error(transparent)]
  NoValue(#[from] NoValueError),

  #[error("{0}")]
  Failed(String),

  #[error(transparent)]
  Source(Arc<dyn Error + Send + Sync>),
}

impl CompletableError {
  /// Wrap an arbitrary error.
  pub fn source<E: Error + Send + Sync + 'static>(err: E) -> Self { Self::Source(Arc::new(err)) }

  pub fn is_timeout(&self) -> bool { matches!(self, Self::Timeout(_)) }
}

impl From<String> for CompletableError {
  fn from(msg: String) -> Self { Self::Failed(msg) }
}

impl From<&str> for CompletableError {
  fn from(msg: &str) -> Self { Self::Failed(msg.to_owned()) }
}

/// Outcome of a user supplied side effect.
///
/// Side effects may either return `()` (they cannot fail) or a
/// `Result<(), Err>`, in which case an `Err` is redirected to the observer
/// and the chain terminates with it.
pub trait SideEffect<Err> {
  fn into_result(self) -> Result<(), Err>;
}

impl<Err> SideEffect<Err> for () {
  #[inline]
  fn into_result(self) -> Result<(), Err> { Ok(()) }
}

impl<Err> SideEffect<Err> for Result<(), Err> {
  #[inline]
  fn into_result(self) -> Result<(), Err> { self }
}
