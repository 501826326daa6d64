//! Operator implementations.
//!
//! Most operators are reached through [`CompletableExt`] and
//! [`ObservableExt`]; the n-ary combinators (`concat`, `merge`, `when_all`,
//! ...) are free functions re-exported from the prelude.
//!
//! [`CompletableExt`]: crate::completable::CompletableExt
//! [`ObservableExt`]: crate::observable::ObservableExt

pub mod catch;
pub mod concat;
pub mod convert;
pub mod delay;
pub mod finalize;
pub mod into_future;
pub mod lifecycle;
pub mod merge;
pub mod observe_on;
pub mod retry;
pub mod subscribe_on;
pub mod synchronize;
pub mod then;
pub mod timeout;
pub mod until;
pub mod wait;
pub mod when_all;

#[cfg(test)]
pub(crate) mod racing;
