use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  time::Duration,
};

use parking_lot::Mutex;
use rx_completable::{observable, prelude::*};

type Log = Arc<Mutex<Vec<String>>>;

fn step(log: &Log, name: &'static str, ms: u64, scheduler: &TestScheduler) -> BoxedCompletable<CompletableError> {
  let (started, finished, cancelled) = (log.clone(), log.clone(), log.clone());
  timer(Duration::from_millis(ms), scheduler.clone())
    .on_subscribe(move || started.lock().push(format!("{name} start")))
    .on_completed(move || finished.lock().push(format!("{name} done")))
    .on_cancel(move || cancelled.lock().push(format!("{name} cancelled")))
    .box_it()
}

#[completable_macro::test]
fn subscribing_twice_runs_the_work_twice() {
  let runs = Arc::new(AtomicUsize::new(0));
  let terminals = Arc::new(AtomicUsize::new(0));
  let c_runs = runs.clone();
  let work = from_fn::<CompletableError, _, _>(move || {
    c_runs.fetch_add(1, Ordering::SeqCst);
  });

  for _ in 0..2 {
    let terminals = terminals.clone();
    work.clone().subscribe_all(
      move || {
        terminals.fetch_add(1, Ordering::SeqCst);
      },
      |_| {},
    );
  }
  assert_eq!(runs.load(Ordering::SeqCst), 2);
  assert_eq!(terminals.load(Ordering::SeqCst), 2);
}

#[completable_macro::test]
fn long_synchronous_concat_does_not_overflow() {
  let count = Arc::new(AtomicUsize::new(0));
  let sources = (0..100_000).map({
    let count = count.clone();
    move |_| {
      let count = count.clone();
      from_fn::<CompletableError, _, _>(move || {
        count.fetch_add(1, Ordering::SeqCst);
      })
    }
  });
  assert!(concat(sources).wait().is_ok());
  assert_eq!(count.load(Ordering::SeqCst), 100_000);
}

#[derive(Debug, Clone, PartialEq)]
enum SyncError {
  Offline,
  Conflict(u32),
}

#[completable_macro::test]
fn typed_catch_recovers_only_matching_errors() {
  let offline = throw(SyncError::Offline)
    .catch_if(|err| matches!(err, SyncError::Offline), |_| empty())
    .wait();
  assert_eq!(offline, Ok(()));

  let conflict = throw(SyncError::Conflict(7))
    .catch_if(|err| matches!(err, SyncError::Offline), |_| empty())
    .wait();
  assert_eq!(conflict, Err(SyncError::Conflict(7)));
}

#[completable_macro::test]
fn merge_error_disposes_the_sibling() {
  let scheduler = TestScheduler::new();
  let log: Log = Arc::new(Mutex::new(vec![]));
  let errors = Arc::new(Mutex::new(vec![]));
  let c_errors = errors.clone();

  let failing = timer(Duration::from_millis(10), scheduler.clone())
    .then(throw(CompletableError::from("a failed")))
    .box_it();
  merge(vec![failing, step(&log, "b", 100, &scheduler)])
    .subscribe_all(|| panic!("must not complete"), move |err| c_errors.lock().push(err.to_string()));

  scheduler.flush();
  assert_eq!(*errors.lock(), vec!["a failed".to_string()]);
  assert_eq!(*log.lock(), vec!["b start".to_string(), "b cancelled".to_string()]);
  assert_eq!(scheduler.pending_count(), 0);
}

#[completable_macro::test]
fn merge_with_one_slot_behaves_like_concat() {
  let run = |serial: bool| {
    let scheduler = TestScheduler::new();
    let log: Log = Arc::new(Mutex::new(vec![]));
    let steps = vec![
      step(&log, "a", 30, &scheduler),
      step(&log, "b", 10, &scheduler),
      step(&log, "c", 20, &scheduler),
    ];
    let handle = if serial { concat(steps).subscribe() } else { merge_max(steps, 1).subscribe() };
    scheduler.flush();
    assert!(handle.is_closed());
    let entries = log.lock().clone();
    entries
  };
  assert_eq!(run(true), run(false));
  assert_eq!(
    run(false),
    ["a start", "a done", "b start", "b done", "c start", "c done"]
      .map(String::from)
      .to_vec()
  );
}

#[completable_macro::test]
fn when_all_of_nothing_completes_at_once() {
  let sources: Vec<Empty<CompletableError>> = vec![];
  assert!(when_all(sources).wait().is_ok());
}

#[completable_macro::test]
fn when_all_fails_once_after_others_completed() {
  let scheduler = TestScheduler::new();
  let log: Log = Arc::new(Mutex::new(vec![]));
  let errors = Arc::new(Mutex::new(vec![]));
  let c_errors = errors.clone();

  let c = timer(Duration::from_millis(50), scheduler.clone())
    .then(throw(CompletableError::from("c failed")))
    .box_it();
  when_all(vec![step(&log, "a", 10, &scheduler), step(&log, "b", 20, &scheduler), c])
    .subscribe_all(|| panic!("must not complete"), move |err| c_errors.lock().push(err.to_string()));

  scheduler.flush();
  assert_eq!(*errors.lock(), vec!["c failed".to_string()]);
  assert!(log.lock().contains(&"a done".to_string()));
  assert!(log.lock().contains(&"b done".to_string()));
}

#[completable_macro::test]
fn timeout_fires_and_disposes_the_slow_timer() {
  let scheduler = TestScheduler::new();
  let errors = Arc::new(Mutex::new(vec![]));
  let c_errors = errors.clone();
  timer::<CompletableError, _>(Duration::from_secs(10), scheduler.clone())
    .timeout(Duration::from_secs(1), scheduler.clone())
    .subscribe_all(|| {}, move |err| c_errors.lock().push(err));

  scheduler.advance_by(Duration::from_secs(1));
  assert_eq!(scheduler.now(), Duration::from_secs(1));
  assert_eq!(errors.lock().len(), 1);
  assert!(errors.lock()[0].is_timeout());
  assert_eq!(scheduler.pending_count(), 0);
}

#[completable_macro::test]
fn disposing_after_termination_is_a_no_op() {
  let scheduler = TestScheduler::new();
  let log: Log = Arc::new(Mutex::new(vec![]));
  let handle = step(&log, "a", 10, &scheduler).subscribe();
  scheduler.flush();
  handle.clone().unsubscribe();
  handle.unsubscribe();
  assert_eq!(*log.lock(), vec!["a start".to_string(), "a done".to_string()]);
}

#[completable_macro::test]
fn value_stream_then_receives_the_last_value() {
  let seen = Arc::new(Mutex::new(vec![]));
  let c_seen = seen.clone();
  let result = observable::from_iter::<_, CompletableError>(vec!["v1", "v2", "v3"])
    .then(move |last| from_fn(move || c_seen.lock().push(last)))
    .wait();
  assert!(result.is_ok());
  assert_eq!(*seen.lock(), vec!["v3"]);
}

#[completable_macro::test]
fn retry_then_fallback_chain() {
  let attempts = Arc::new(AtomicUsize::new(0));
  let c_attempts = attempts.clone();
  let flaky = defer(move || {
    c_attempts.fetch_add(1, Ordering::SeqCst);
    throw::<CompletableError>("flaky".into())
  });
  let result = flaky.retry(2).catch(|err| {
    assert_eq!(err.to_string(), "flaky");
    Ok(empty())
  });
  assert!(result.wait().is_ok());
  assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[completable_macro::test]
async fn awaiting_a_completable() {
  let result = timer::<CompletableError, _>(Duration::from_millis(5), NewThreadScheduler)
    .then(from_fn(|| Err(CompletableError::from("after timer"))))
    .into_future()
    .await;
  assert_eq!(result.unwrap_err().to_string(), "after timer");
}
