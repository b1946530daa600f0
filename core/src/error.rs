//! Error types surfaced by produced handlers.

use crate::key::KeyError;
use thiserror::Error;

/// Failure of a produced fetch handler.
///
/// `E` is the remote call's own error type, embedded verbatim so callers
/// can match on the original rejection.
#[derive(Error, Debug)]
pub enum FetchError<E> {
    /// The payload could not be canonicalized into a request key.
    #[error("request key derivation failed: {0}")]
    Key(#[from] KeyError),

    /// The remote call rejected. The state table records `Error` for the
    /// key before this surfaces.
    #[error("remote call failed: {0}")]
    Call(E),
}
