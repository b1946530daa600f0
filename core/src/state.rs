//! Request lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one keyed request as recorded in the state table.
///
/// Exactly one value is associated with a request key at any time.
/// `NotStarted` doubles as the implicit state of keys that have never
/// been observed, which is why it is the `Default`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestState {
    /// No call has been issued for this key.
    #[default]
    NotStarted,
    /// A call is in flight; its outcome has not been recorded yet.
    Pending,
    /// The most recent call fulfilled and its result was emitted.
    Success,
    /// The most recent call rejected; the failure was surfaced to the caller.
    Error,
    /// Reserved for a future cancellation pathway. No transition produces it.
    Cancelled,
}

impl RequestState {
    /// Whether this state suppresses a non-forced re-issue of the request.
    ///
    /// `Pending` and `Success` block; `NotStarted` and `Error` admit a new
    /// call, so a failed request is re-issued by simply dispatching again.
    #[must_use]
    pub const fn suppresses_refetch(self) -> bool {
        matches!(self, Self::Pending | Self::Success)
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotStarted => "not_started",
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{label}")
    }
}
