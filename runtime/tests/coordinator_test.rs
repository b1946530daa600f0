//! Integration tests for the request coordinator
//!
//! Exercises the admission gate and the recorded lifecycle transitions
//! against a shared mock container, including last-write-wins resolution
//! of racing completions.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::cell::Cell;
use std::fmt;
use std::future::{Ready, ready};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use storefetch_core::{ActionContext, PayloadKey, RequestKey, RequestState};
use storefetch_runtime::Coordinator;
use storefetch_testing::{MockContext, MockError};
use tokio::sync::oneshot;
use tokio_test::assert_ok;

// ============================================================================
// Tests
// ============================================================================

/// Test first observation of a key
///
/// Verifies that reading a never-observed key reports `NotStarted` and
/// durably records that default in the table.
#[tokio::test]
async fn test_state_of_records_default_on_first_read() {
    let context: MockContext = MockContext::new();
    let coordinator = Coordinator::new(context.clone());
    let k = key(r#"{"id":1}"#);

    assert_eq!(coordinator.state_of(&k).await, RequestState::NotStarted);

    let tracked = context.state(|state| state.requests.len()).await;
    assert_eq!(tracked, 1);
}

/// Test ordering between table writes and callbacks
///
/// Verifies that the placeholder callback runs before the key moves to
/// `Pending`, and that the success transition is already recorded when
/// `on_success` observes the state.
#[tokio::test]
async fn test_run_records_success_before_the_callback() {
    let context: MockContext = MockContext::new();
    let coordinator = Coordinator::new(context.clone());
    let k = key(r#"{"id":1}"#);

    let result = coordinator
        .run(
            &k,
            false,
            || ready(Ok::<u32, MockError>(42)),
            |state| {
                assert_eq!(state.requests.get(&k), RequestState::NotStarted);
            },
            |state, raw| {
                assert_eq!(raw, 42);
                assert_eq!(state.requests.get(&k), RequestState::Success);
            },
            |_state, _error| panic!("fulfilled call must not report an error"),
        )
        .await;

    assert_ok!(result);
    assert_eq!(context.request_state(&k).await, RequestState::Success);
}

/// Test rejection propagation
///
/// Verifies that a rejected call surfaces its error verbatim, and that
/// the key reads `Error` by the time `on_error` observes the state.
#[tokio::test]
async fn test_run_propagates_rejections_after_recording_error() {
    let context: MockContext = MockContext::new();
    let coordinator = Coordinator::new(context.clone());
    let k = key(r#"{"id":1}"#);

    let result = coordinator
        .run(
            &k,
            false,
            || ready(Err::<u32, MockError>(MockError::new("boom"))),
            |_state| {},
            |_state, _raw| panic!("rejected call must not report success"),
            |state, error| {
                assert_eq!(*error, MockError::new("boom"));
                assert_eq!(state.requests.get(&k), RequestState::Error);
            },
        )
        .await;

    assert_eq!(result, Err(MockError::new("boom")));
    assert_eq!(context.request_state(&k).await, RequestState::Error);
}

/// Test rejection types that cannot be shared between threads
///
/// Verifies that an error type which is `Send` but not `Sync` moves
/// through the completion section and out to the caller.
#[tokio::test]
async fn test_non_sync_errors_propagate() {
    let context: MockContext = MockContext::new();
    let coordinator = Coordinator::new(context.clone());
    let k = key(r#"{"id":1}"#);

    let result = coordinator
        .run(
            &k,
            false,
            || ready(Err::<u32, NonSyncError>(NonSyncError::new("boom"))),
            |_state| {},
            |_state, _raw| {},
            |state, error| {
                assert_eq!(error.to_string(), "boom");
                assert_eq!(state.requests.get(&k), RequestState::Error);
            },
        )
        .await;

    assert_eq!(result.unwrap_err().to_string(), "boom");
    assert_eq!(context.request_state(&k).await, RequestState::Error);
}

/// Test deduplication of overlapping runs
///
/// Verifies that a second non-forced run for a pending key resolves
/// without issuing its call or touching the state.
#[tokio::test]
async fn test_overlapping_run_short_circuits_while_pending() {
    init_tracing();
    let context: MockContext = MockContext::new();
    let k = key(r#"{"id":1}"#);
    let (release, gate) = oneshot::channel::<()>();

    let background = spawn_gated_run(&context, &k, gate, Ok(1));
    wait_for_state(&context, &k, RequestState::Pending).await;

    let calls = Arc::new(AtomicUsize::new(0));
    let result = Coordinator::new(context.clone())
        .run(
            &k,
            false,
            counted_op(&calls),
            |_state| panic!("skipped run must not emit a placeholder"),
            |_state, _raw| panic!("skipped run must not report success"),
            |_state, _error| panic!("skipped run must not report an error"),
        )
        .await;

    assert_ok!(result);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    release.send(()).ok();
    assert_ok!(background.await.expect("background run panicked"));
    assert_eq!(context.request_state(&k).await, RequestState::Success);
}

/// Test refetch suppression after success
///
/// Verifies that a succeeded key skips non-forced runs and that a forced
/// run re-issues the call.
#[tokio::test]
async fn test_success_suppresses_refetch_until_forced() {
    let context: MockContext = MockContext::new();
    let k = key(r#"{"id":1}"#);
    let calls = Arc::new(AtomicUsize::new(0));

    run_ok(&context, &k, false, &calls).await;
    assert_eq!(context.request_state(&k).await, RequestState::Success);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    run_ok(&context, &k, false, &calls).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    run_ok(&context, &k, true, &calls).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Test re-admission after an error
///
/// Verifies that a failed key does not suppress the next non-forced run.
#[tokio::test]
async fn test_error_state_admits_the_next_run() {
    let context: MockContext = MockContext::new();
    let coordinator = Coordinator::new(context.clone());
    let k = key(r#"{"id":1}"#);

    let failed = coordinator
        .run(
            &k,
            false,
            || ready(Err::<u32, MockError>(MockError::new("boom"))),
            |_state| {},
            |_state, _raw| {},
            |_state, _error| {},
        )
        .await;
    assert_eq!(failed, Err(MockError::new("boom")));
    assert_eq!(context.request_state(&k).await, RequestState::Error);

    let calls = Arc::new(AtomicUsize::new(0));
    run_ok(&context, &k, false, &calls).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(context.request_state(&k).await, RequestState::Success);
}

/// Test force against a pending key
///
/// Verifies that a forced run is admitted while the key is pending and
/// records its own completion.
#[tokio::test]
async fn test_force_bypasses_a_pending_key() {
    let context: MockContext = MockContext::new();
    let k = key(r#"{"id":1}"#);
    let (release, gate) = oneshot::channel::<()>();

    let background = spawn_gated_run(&context, &k, gate, Ok(1));
    wait_for_state(&context, &k, RequestState::Pending).await;

    let calls = Arc::new(AtomicUsize::new(0));
    run_ok(&context, &k, true, &calls).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(context.request_state(&k).await, RequestState::Success);

    release.send(()).ok();
    assert_ok!(background.await.expect("background run panicked"));
}

/// Test racing completions
///
/// Verifies that completions for one key land in completion order: a
/// forced run's success is overwritten when the older call settles later
/// with an error.
#[tokio::test]
async fn test_racing_forced_completions_resolve_last_write_wins() {
    init_tracing();
    let context: MockContext = MockContext::new();
    let k = key(r#"{"id":1}"#);
    let (release, gate) = oneshot::channel::<()>();

    let background = spawn_gated_run(&context, &k, gate, Err(MockError::new("late")));
    wait_for_state(&context, &k, RequestState::Pending).await;

    let calls = Arc::new(AtomicUsize::new(0));
    run_ok(&context, &k, true, &calls).await;
    assert_eq!(context.request_state(&k).await, RequestState::Success);

    release.send(()).ok();
    let late = background.await.expect("background run panicked");
    assert_eq!(late, Err(MockError::new("late")));
    assert_eq!(context.request_state(&k).await, RequestState::Error);
}

/// Test invalidation during flight
///
/// Verifies that invalidating a pending key reverts it to `NotStarted`
/// and that the in-flight completion is still recorded when it settles.
#[tokio::test]
async fn test_completion_after_invalidate_is_recorded() {
    let context: MockContext = MockContext::new();
    let coordinator = Coordinator::new(context.clone());
    let k = key(r#"{"id":1}"#);
    let (release, gate) = oneshot::channel::<()>();

    let background = spawn_gated_run(&context, &k, gate, Ok(1));
    wait_for_state(&context, &k, RequestState::Pending).await;

    coordinator.invalidate(&k).await;
    assert_eq!(context.request_state(&k).await, RequestState::NotStarted);

    release.send(()).ok();
    assert_ok!(background.await.expect("background run panicked"));
    assert_eq!(context.request_state(&k).await, RequestState::Success);
}

/// Test invalidation from settled states
///
/// Verifies that invalidation reverts any recorded state to `NotStarted`.
#[tokio::test]
async fn test_invalidate_reverts_any_state_to_not_started() {
    let context: MockContext = MockContext::new();
    let coordinator = Coordinator::new(context.clone());
    let k = key(r#"{"id":1}"#);

    coordinator.set_state(&k, RequestState::Error).await;
    coordinator.invalidate(&k).await;
    assert_eq!(coordinator.state_of(&k).await, RequestState::NotStarted);

    coordinator.set_state(&k, RequestState::Success).await;
    coordinator.invalidate(&k).await;
    assert_eq!(coordinator.state_of(&k).await, RequestState::NotStarted);
}

/// Test recovering the container from a coordinator
///
/// Verifies that a coordinator built over a context by value can be
/// unwrapped back into it, with the seeded table intact.
#[tokio::test]
async fn test_into_context_recovers_the_seeded_container() {
    let context: MockContext = MockContext::new();
    let coordinator = Coordinator::new(context);
    let k = key(r#"{"id":1}"#);

    coordinator.set_state(&k, RequestState::Success).await;

    let context = coordinator.into_context();
    assert_eq!(context.request_state(&k).await, RequestState::Success);
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Build a request key for the `load` operation with a literal payload key
fn key(payload: &str) -> RequestKey {
    RequestKey::new("load".into(), PayloadKey::new(payload))
}

/// Route coordinator tracing to the test writer, for `--nocapture` runs
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Immediate-success call that counts how many times it is issued
fn counted_op(calls: &Arc<AtomicUsize>) -> impl FnOnce() -> Ready<Result<u32, MockError>> + Send {
    let calls = Arc::clone(calls);
    move || {
        calls.fetch_add(1, Ordering::SeqCst);
        ready(Ok(7))
    }
}

/// Run the coordinator once with a counted immediate-success call
async fn run_ok(context: &MockContext, k: &RequestKey, force: bool, calls: &Arc<AtomicUsize>) {
    let result = Coordinator::new(context.clone())
        .run(
            k,
            force,
            counted_op(calls),
            |_state| {},
            |_state, _raw| {},
            |_state, _error| {},
        )
        .await;
    assert_ok!(result);
}

/// Spawn a run whose call stays pending until `gate` fires, then settles with `outcome`
fn spawn_gated_run(
    context: &MockContext,
    k: &RequestKey,
    gate: oneshot::Receiver<()>,
    outcome: Result<u32, MockError>,
) -> tokio::task::JoinHandle<Result<(), MockError>> {
    let context = context.clone();
    let k = k.clone();
    tokio::spawn(async move {
        Coordinator::new(context)
            .run(
                &k,
                false,
                move || async move {
                    gate.await.ok();
                    outcome
                },
                |_state| {},
                |_state, _raw| {},
                |_state, _error| {},
            )
            .await
    })
}

/// Poll the table until `key` reads `expected`, panicking after ~400ms
async fn wait_for_state(context: &MockContext, key: &RequestKey, expected: RequestState) {
    for _ in 0..200 {
        if context.request_state(key).await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("request never reached {expected}");
}

/// Rejection that is `Send` but not `Sync`
#[derive(Debug)]
struct NonSyncError {
    message: String,
    _marker: PhantomData<Cell<()>>,
}

impl NonSyncError {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
            _marker: PhantomData,
        }
    }
}

impl fmt::Display for NonSyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
