//! The request-state table and the container state contract around it.

use crate::key::{OperationId, PayloadKey, RequestKey};
use crate::state::RequestState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Two-level table recording the lifecycle of every observed request.
///
/// The outer level is keyed by operation identifier, the inner level by
/// canonical payload key. Entries appear when a key is first observed and
/// stay until explicitly invalidated. The maps themselves are private:
/// every transition flows through the methods below, which are exactly the
/// coordinator's table operations plus a non-recording read for observers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTracker {
    entries: HashMap<OperationId, HashMap<PayloadKey, RequestState>>,
}

impl RequestTracker {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded state for `key`, durably defaulting never-observed keys.
    ///
    /// The first observation of a key writes `NotStarted` into the table,
    /// so later lookups hit an existing entry. Use [`get`](Self::get) for
    /// reads that must leave the table untouched.
    pub fn state_of(&mut self, key: &RequestKey) -> RequestState {
        *self
            .entries
            .entry(key.operation().clone())
            .or_default()
            .entry(key.payload().clone())
            .or_default()
    }

    /// Recorded state for `key` without the defaulting write.
    ///
    /// Absent entries read as `NotStarted`.
    #[must_use]
    pub fn get(&self, key: &RequestKey) -> RequestState {
        self.entries
            .get(key.operation())
            .and_then(|states| states.get(key.payload()))
            .copied()
            .unwrap_or_default()
    }

    /// Unconditionally overwrites the state recorded for `key`.
    ///
    /// Writing to a never-observed key creates its entry.
    pub fn set(&mut self, key: &RequestKey, state: RequestState) {
        self.entries
            .entry(key.operation().clone())
            .or_default()
            .insert(key.payload().clone(), state);
    }

    /// Removes the entry for `key`; its next read reports `NotStarted`.
    pub fn invalidate(&mut self, key: &RequestKey) {
        if let Some(states) = self.entries.get_mut(key.operation()) {
            states.remove(key.payload());
        }
    }

    /// Number of tracked keys across all operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// Whether no key is currently tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Container state shapes that embed the request-state table.
///
/// The coordinator reaches the table only through this accessor pair; the
/// application's own fields live alongside it untouched.
///
/// ```
/// use storefetch_core::{RequestTracker, TrackedState};
///
/// #[derive(Default)]
/// struct AppState {
///     requests: RequestTracker,
///     user_count: usize,
/// }
///
/// impl TrackedState for AppState {
///     fn requests(&self) -> &RequestTracker {
///         &self.requests
///     }
///
///     fn requests_mut(&mut self) -> &mut RequestTracker {
///         &mut self.requests
///     }
/// }
/// ```
pub trait TrackedState {
    /// Shared access to the table.
    fn requests(&self) -> &RequestTracker;

    /// Exclusive access to the table.
    fn requests_mut(&mut self) -> &mut RequestTracker;
}
