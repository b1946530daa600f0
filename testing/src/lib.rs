//! # Storefetch Testing
//!
//! Testing utilities and mock contexts for the Storefetch request
//! coordination library.
//!
//! This crate provides:
//! - `MockContext` / `MockState`: an in-memory state container that records
//!   every committed value alongside its request-state table
//! - Canned remote calls (`ok_call`, `failing_call`, `slow_call`) with
//!   predictable outcomes
//! - `counted_call`: a wrapper that counts how many times a call is issued,
//!   for asserting deduplication
//!
//! ## Example
//!
//! ```ignore
//! use storefetch_runtime::FetchFactory;
//! use storefetch_testing::{MockContext, MockModel, MockPayload, MockRaw, ok_call};
//!
//! #[tokio::test]
//! async fn test_load_flow() {
//!     let context: MockContext = MockContext::new();
//!     let load = FetchFactory::single(
//!         false,
//!         "load".into(),
//!         ok_call(MockRaw { id: 1, ..MockRaw::default() }),
//!         MockModel::empty,
//!     );
//!
//!     load(context.clone(), MockPayload { id: 1 }).await?;
//!
//!     let committed = context.committed().await;
//!     assert_eq!(committed.len(), 2); // placeholder, then filled model
//! }
//! ```

/// Mock contexts, states, and canned remote calls
pub mod mocks;

// Re-export commonly used items
pub use mocks::{
    CallCount, Committed, CommittedValue, MockContext, MockError, MockModel, MockPayload, MockRaw,
    MockState, SLOW_CALL_DELAY, UnkeyablePayload, counted_call, failing_call, ok_call, slow_call,
};
