//! # Storefetch Runtime
//!
//! Request coordination and fetch-action construction on top of
//! [`storefetch-core`](storefetch_core).
//!
//! ## Core Components
//!
//! - **[`Coordinator`]**: keyed request-state machine that admits, dedupes,
//!   and records async operations against a shared state container
//! - **[`FetchFactory`]**: builders that wrap remote calls into dispatchable
//!   fetch actions with placeholder and fill semantics
//!
//! ## Example
//!
//! ```ignore
//! use storefetch_runtime::{FetchAction, FetchFactory};
//!
//! let load_user: FetchAction<AppContext, UserQuery, ApiError> = FetchFactory::single(
//!     false,
//!     "loadUser".into(),
//!     move |query: UserQuery| api.fetch_user(query),
//!     User::empty,
//! );
//!
//! // Dispatch: overlapping calls for the same query coalesce into one fetch.
//! load_user(context.clone(), UserQuery { id: 42 }).await?;
//! ```

/// Request coordination: the keyed state machine gating fetch execution
pub mod coordinator;

/// Action builders producing deduplicated fetch handlers
pub mod factory;

pub use coordinator::Coordinator;
pub use factory::{FetchAction, FetchFactory};
