//! Host container contracts consumed by the coordinator.
//!
//! The coordinator never talks to a concrete store. It sees the container
//! through [`ActionContext`]: a pair of closure accessors over the
//! container's state (one shared, one exclusive) plus a `commit` helper
//! routing values through the state's mutation entry point. Any store
//! whose state implements [`TrackedState`] can host fetch actions by
//! implementing this trait over its own locking discipline.

use crate::key::OperationId;
use crate::tracker::TrackedState;
use std::future::Future;

/// The single designated mutation entry point of the host container.
///
/// Emissions for an operation land through `apply` while the container's
/// exclusive lock is held, exactly like a store mutation: synchronous, no
/// suspension, keyed by the operation identifier. A state implements
/// `Mutate<V>` once per value shape it accepts (a model for single
/// results, a sequence of models for bulk results).
pub trait Mutate<V> {
    /// Applies an emitted value for `operation` to this state.
    fn apply(&mut self, operation: &OperationId, value: V);
}

/// Execution context handed to produced handlers by the host container.
///
/// `state` mirrors a store's shared read path and `update` its exclusive
/// path. Closures run synchronously while the container's lock is held,
/// so they must not block or suspend; the coordinator keeps each of its
/// critical sections inside a single `update` call, which is what makes
/// the dedup check atomic on a multi-threaded executor.
pub trait ActionContext: Send + Sync + 'static {
    /// Container state shape, which embeds the request-state table.
    type State: TrackedState + Send;

    /// Runs `f` against a shared snapshot of container state.
    fn state<T, F>(&self, f: F) -> impl Future<Output = T> + Send
    where
        F: FnOnce(&Self::State) -> T + Send,
        T: Send;

    /// Runs `f` with exclusive access to container state.
    fn update<T, F>(&self, f: F) -> impl Future<Output = T> + Send
    where
        F: FnOnce(&mut Self::State) -> T + Send,
        T: Send;

    /// Routes `value` through the mutation entry point for `operation`.
    fn commit<V>(&self, operation: OperationId, value: V) -> impl Future<Output = ()> + Send
    where
        Self::State: Mutate<V>,
        V: Send,
    {
        self.update(move |state| state.apply(&operation, value))
    }
}
