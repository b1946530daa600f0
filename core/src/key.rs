//! Request identity: operation identifiers and canonical payload keys.
//!
//! Deduplication is value-based. Two invocations for the same operation
//! with structurally-equal payloads must collapse onto the same
//! [`RequestKey`], no matter how the payload instances were built, so the
//! payload side of the key is a canonical string encoding rather than the
//! payload itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure to derive a canonical key from a payload.
#[derive(Error, Debug)]
pub enum KeyError {
    /// The payload has no canonical JSON representation.
    #[error("payload cannot be canonicalized: {0}")]
    Canonicalize(#[from] serde_json::Error),
}

/// Stable, caller-chosen name for an operation.
///
/// Doubles as the routing key for the container's mutation entry point:
/// emissions for an operation always target the mutation registered under
/// the same identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(String);

impl OperationId {
    /// Creates an identifier from any string-ish value.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OperationId {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for OperationId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Canonical, comparable encoding of a payload value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadKey(String);

impl PayloadKey {
    /// Wraps an encoding produced outside [`Payload::canonical_key`].
    ///
    /// The caller is responsible for determinism: structurally-equal
    /// payloads must wrap identical strings.
    #[must_use]
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// The encoded form as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PayloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload values that can identify a request.
///
/// The provided derivation serializes the payload through
/// [`serde_json::Value`], whose object representation keeps keys sorted,
/// so map-shaped payloads encode independently of insertion order.
/// Override [`canonical_key`](Payload::canonical_key) to plug in a
/// different encoding; any replacement must stay deterministic for
/// structurally-equal values or deduplication breaks.
///
/// Implementations are usually empty:
///
/// ```
/// use serde::Serialize;
/// use storefetch_core::Payload;
///
/// #[derive(Serialize)]
/// struct UserQuery {
///     id: u32,
/// }
///
/// impl Payload for UserQuery {}
///
/// let key = UserQuery { id: 1 }.canonical_key()?;
/// assert_eq!(key.as_str(), r#"{"id":1}"#);
/// # Ok::<(), storefetch_core::KeyError>(())
/// ```
pub trait Payload: Serialize {
    /// Derives the canonical key for this payload value.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Canonicalize`] if the payload cannot be
    /// represented as JSON (for example a map with non-string keys).
    fn canonical_key(&self) -> Result<PayloadKey, KeyError> {
        let value = serde_json::to_value(self)?;
        Ok(PayloadKey(value.to_string()))
    }
}

/// Identity of one logical request: operation plus canonical payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    operation: OperationId,
    payload: PayloadKey,
}

impl RequestKey {
    /// Builds a key from an operation identifier and an encoded payload key.
    #[must_use]
    pub const fn new(operation: OperationId, payload: PayloadKey) -> Self {
        Self { operation, payload }
    }

    /// Derives the key for `payload` under `operation`.
    ///
    /// # Errors
    ///
    /// Propagates [`KeyError`] from the payload's canonical encoding.
    pub fn for_payload<P: Payload>(
        operation: OperationId,
        payload: &P,
    ) -> Result<Self, KeyError> {
        Ok(Self {
            payload: payload.canonical_key()?,
            operation,
        })
    }

    /// The operation identifier component.
    #[must_use]
    pub const fn operation(&self) -> &OperationId {
        &self.operation
    }

    /// The canonical payload component.
    #[must_use]
    pub const fn payload(&self) -> &PayloadKey {
        &self.payload
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.operation, self.payload)
    }
}
