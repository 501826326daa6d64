//! Helpers for tests racing terminations on worker threads.

use std::{sync::mpsc, time::Duration};

use crate::prelude::*;

/// A source completing on its own thread.
pub(crate) fn completes() -> BoxedCompletable<CompletableError> {
  timer::<CompletableError, _>(Duration::ZERO, NewThreadScheduler).box_it()
}

/// A source failing on its own thread.
pub(crate) fn fails() -> BoxedCompletable<CompletableError> {
  timer(Duration::ZERO, NewThreadScheduler)
    .then(throw(CompletableError::from("failed")))
    .box_it()
}

/// Subscribe and return the single terminal event, `"complete"` or
/// `"error"`. Panics if there is none within a few seconds, or a second one.
pub(crate) fn terminal_event(source: impl Completable<Err = CompletableError>) -> &'static str {
  let (tx, rx) = mpsc::channel();
  let c_tx = tx.clone();
  source.subscribe_all(
    move || {
      let _ = c_tx.send("complete");
    },
    move |_| {
      let _ = tx.send("error");
    },
  );
  let event = rx
    .recv_timeout(Duration::from_secs(5))
    .unwrap_or_else(|_| panic!("no terminal event"));
  assert!(rx.recv_timeout(Duration::from_millis(5)).is_err());
  event
}
