//! Mock implementations for exercising fetch handlers.
//!
//! The mock state records every emission in arrival order alongside its
//! request table, so tests can assert both the placeholder/fill sequence
//! and the recorded lifecycle. Canned calls have fixed outcomes, and
//! [`slow_call`] holds its result long enough for a test to observe the
//! pending window.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use storefetch_core::{
    ActionContext, Model, Mutate, OperationId, Payload, RequestKey, RequestState, RequestTracker,
    TrackedState,
};
use thiserror::Error;
use tokio::sync::RwLock;

/// Raw response fragment returned by canned calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockRaw {
    /// Identifier of the fetched entity.
    pub id: u32,
    /// Arbitrary numeric field.
    pub mock_number: i64,
    /// Arbitrary string field.
    pub mock_string: String,
}

/// Domain model populated from [`MockRaw`] fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockModel {
    /// Identifier copied from the raw fragment.
    pub id: u32,
    /// Numeric field copied from the raw fragment.
    pub mock_number: i64,
    /// String field copied from the raw fragment.
    pub mock_string: String,
}

impl Model for MockModel {
    type Raw = MockRaw;

    fn empty() -> Self {
        Self::default()
    }

    fn fill(mut self, raw: MockRaw) -> Self {
        self.id = raw.id;
        self.mock_number = raw.mock_number;
        self.mock_string = raw.mock_string;
        self
    }
}

/// Payload identifying which mock entity to fetch.
///
/// Distinct `id` values produce distinct request keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MockPayload {
    /// Entity identifier.
    pub id: u32,
}

impl Payload for MockPayload {}

/// Payload with no canonical encoding.
///
/// Holds a tuple-keyed map entry. JSON object keys must be strings, so
/// serialization rejects the map and key derivation fails before any
/// call is issued.
#[derive(Debug, Clone, Serialize)]
pub struct UnkeyablePayload {
    by_coordinate: HashMap<(i32, i32), String>,
}

impl UnkeyablePayload {
    /// Creates a payload holding one coordinate-keyed entry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_coordinate: HashMap::from([((0, 0), "origin".to_owned())]),
        }
    }
}

impl Default for UnkeyablePayload {
    fn default() -> Self {
        Self::new()
    }
}

impl Payload for UnkeyablePayload {}

/// Rejection produced by canned failing calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct MockError(String);

impl MockError {
    /// Creates an error carrying `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// One value routed through the mutation entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    /// Operation the value was emitted under.
    pub operation: OperationId,
    /// The emitted value.
    pub value: CommittedValue,
}

/// Value shapes the mock state accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommittedValue {
    /// A single-result emission.
    Single(MockModel),
    /// A bulk-result emission.
    Bulk(Vec<MockModel>),
}

/// Container state recording every emission alongside the request table.
#[derive(Debug, Clone, Default)]
pub struct MockState {
    /// The embedded request-state table.
    pub requests: RequestTracker,
    /// Every emitted value, in arrival order.
    pub committed: Vec<Committed>,
}

impl TrackedState for MockState {
    fn requests(&self) -> &RequestTracker {
        &self.requests
    }

    fn requests_mut(&mut self) -> &mut RequestTracker {
        &mut self.requests
    }
}

impl Mutate<MockModel> for MockState {
    fn apply(&mut self, operation: &OperationId, value: MockModel) {
        self.committed.push(Committed {
            operation: operation.clone(),
            value: CommittedValue::Single(value),
        });
    }
}

impl Mutate<Vec<MockModel>> for MockState {
    fn apply(&mut self, operation: &OperationId, value: Vec<MockModel>) {
        self.committed.push(Committed {
            operation: operation.clone(),
            value: CommittedValue::Bulk(value),
        });
    }
}

/// Shared-state execution context backed by an async read-write lock.
///
/// Clones share one underlying state, mirroring how a store hands the
/// same container to every dispatched action.
#[derive(Debug)]
pub struct MockContext<S = MockState> {
    state: Arc<RwLock<S>>,
}

impl<S> Clone for MockContext<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: Default> MockContext<S> {
    /// Creates a context over a default-initialized state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(S::default())),
        }
    }
}

impl<S: Default> Default for MockContext<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl MockContext<MockState> {
    /// Snapshot of every emission recorded so far, in arrival order.
    pub async fn committed(&self) -> Vec<Committed> {
        self.state(|state| state.committed.clone()).await
    }

    /// Recorded request state for `key`, without touching the table.
    pub async fn request_state(&self, key: &RequestKey) -> RequestState {
        self.state(|state| state.requests.get(key)).await
    }
}

impl<S> ActionContext for MockContext<S>
where
    S: TrackedState + Send + Sync + 'static,
{
    type State = S;

    fn state<T, F>(&self, f: F) -> impl Future<Output = T> + Send
    where
        F: FnOnce(&Self::State) -> T + Send,
        T: Send,
    {
        async move {
            let guard = self.state.read().await;
            f(&*guard)
        }
    }

    fn update<T, F>(&self, f: F) -> impl Future<Output = T> + Send
    where
        F: FnOnce(&mut Self::State) -> T + Send,
        T: Send,
    {
        async move {
            let mut guard = self.state.write().await;
            f(&mut *guard)
        }
    }
}

/// Delay applied by [`slow_call`] before resolving.
pub const SLOW_CALL_DELAY: Duration = Duration::from_millis(300);

/// Canned call resolving immediately with a clone of `raw`.
#[must_use]
pub fn ok_call<P, R>(
    raw: R,
) -> impl Fn(P) -> BoxFuture<'static, Result<R, MockError>> + Clone + Send + Sync
where
    R: Clone + Send + Sync + 'static,
{
    move |_payload| {
        let raw = raw.clone();
        async move { Ok(raw) }.boxed()
    }
}

/// Canned call rejecting immediately with `message`.
#[must_use]
pub fn failing_call<P, R>(
    message: impl Into<String>,
) -> impl Fn(P) -> BoxFuture<'static, Result<R, MockError>> + Clone + Send + Sync
where
    R: Send + 'static,
{
    let error = MockError::new(message);
    move |_payload| {
        let error = error.clone();
        async move { Err(error) }.boxed()
    }
}

/// Canned call resolving with a clone of `raw` after [`SLOW_CALL_DELAY`].
///
/// The delay is long enough for a test to dispatch an overlapping
/// invocation while the first one is still pending.
#[must_use]
pub fn slow_call<P, R>(
    raw: R,
) -> impl Fn(P) -> BoxFuture<'static, Result<R, MockError>> + Clone + Send + Sync
where
    R: Clone + Send + Sync + 'static,
{
    move |_payload| {
        let raw = raw.clone();
        async move {
            tokio::time::sleep(SLOW_CALL_DELAY).await;
            Ok(raw)
        }
        .boxed()
    }
}

/// Number of times a counted call was issued.
#[derive(Debug, Clone, Default)]
pub struct CallCount(Arc<AtomicUsize>);

impl CallCount {
    /// Calls issued so far.
    #[must_use]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Wraps `call`, counting each time it is issued.
///
/// The count increments when the call is issued, not when it settles, so
/// a deduplicated dispatch that never reaches the call leaves the count
/// untouched.
#[must_use]
pub fn counted_call<P, R, E, C, Fut>(
    call: C,
) -> (
    impl Fn(P) -> BoxFuture<'static, Result<R, E>> + Clone + Send + Sync,
    CallCount,
)
where
    C: Fn(P) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    let count = CallCount::default();
    let counter = count.clone();

    let wrapped = move |payload: P| {
        counter.0.fetch_add(1, Ordering::SeqCst);
        call(payload).boxed()
    };

    (wrapped, count)
}
