//! # Storefetch Core
//!
//! Core traits and types for the Storefetch request coordination library.
//!
//! This crate provides the fundamental abstractions for building
//! deduplicated fetch actions on top of a store-based state container:
//! the request lifecycle enum, value-based request keys, the state table
//! embedded in container state, and the contracts the host container and
//! domain models must satisfy.
//!
//! ## Core Concepts
//!
//! - **RequestState**: lifecycle of one logical request
//!   (`NotStarted` → `Pending` → `Success`/`Error`)
//! - **RequestKey**: value-based identity of a request (operation
//!   identifier plus canonical payload encoding)
//! - **RequestTracker**: the two-level state table, reachable only through
//!   coordinator-shaped operations
//! - **Model**: empty-construction plus fill-from-raw capability carrying
//!   fetched data
//! - **ActionContext / Mutate**: the host container boundary (state access
//!   closures and the keyed mutation entry point)
//!
//! ## Example
//!
//! ```ignore
//! use storefetch_core::{Model, Mutate, OperationId, RequestTracker, TrackedState};
//!
//! #[derive(Default)]
//! struct AppState {
//!     requests: RequestTracker,
//!     user: Option<User>,
//! }
//!
//! impl TrackedState for AppState {
//!     fn requests(&self) -> &RequestTracker {
//!         &self.requests
//!     }
//!
//!     fn requests_mut(&mut self) -> &mut RequestTracker {
//!         &mut self.requests
//!     }
//! }
//!
//! impl Mutate<User> for AppState {
//!     fn apply(&mut self, _operation: &OperationId, value: User) {
//!         self.user = Some(value);
//!     }
//! }
//! ```

pub mod container;
pub mod error;
pub mod key;
pub mod model;
pub mod state;
pub mod tracker;

pub use container::{ActionContext, Mutate};
pub use error::FetchError;
pub use key::{KeyError, OperationId, Payload, PayloadKey, RequestKey};
pub use model::Model;
pub use state::RequestState;
pub use tracker::{RequestTracker, TrackedState};
