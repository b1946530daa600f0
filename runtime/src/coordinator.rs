//! Request coordination: the keyed state machine gating fetch execution.

use std::fmt::Display;
use std::future::Future;

use storefetch_core::{ActionContext, RequestKey, RequestState, TrackedState};

/// Drives every state-table transition for one host container.
///
/// The coordinator is stateless glue around an [`ActionContext`]: the
/// table itself lives inside the container's state, and each operation
/// below runs inside a single exclusive state access, so concurrent
/// handlers observe transitions atomically and in order.
pub struct Coordinator<C> {
    context: C,
}

impl<C: ActionContext> Coordinator<C> {
    /// Wraps a container context.
    #[must_use]
    pub const fn new(context: C) -> Self {
        Self { context }
    }

    /// Recorded state for `key`.
    ///
    /// A never-observed key reads as `NotStarted`, and that default is
    /// durably recorded, so the first read of a key also creates its
    /// table entry.
    pub async fn state_of(&self, key: &RequestKey) -> RequestState {
        self.context
            .update(|state| state.requests_mut().state_of(key))
            .await
    }

    /// Unconditionally overwrites the state recorded for `key`.
    pub async fn set_state(&self, key: &RequestKey, state: RequestState) {
        self.context
            .update(|container| container.requests_mut().set(key, state))
            .await;
    }

    /// Removes the entry for `key`; its next read reports `NotStarted`.
    #[tracing::instrument(skip_all, name = "fetch_invalidate", fields(key = %key))]
    pub async fn invalidate(&self, key: &RequestKey) {
        self.context
            .update(|state| state.requests_mut().invalidate(key))
            .await;

        tracing::debug!("Invalidated request entry");
        metrics::counter!("fetch.invalidations.total", "operation" => key.operation().to_string())
            .increment(1);
    }

    /// The orchestration primitive: gate, record, await, record.
    ///
    /// Admission is one exclusive section: the current state is read
    /// (recording `NotStarted` on first observation); if it is `Pending`
    /// or `Success` and `force` is not set, the invocation is skipped:
    /// `op` is not created, no callback runs, nothing changes. Otherwise
    /// `on_before_start` runs against the state (the placeholder
    /// emission), then the key moves to `Pending`, all before the lock is
    /// released, so an overlapping invocation can only observe `Pending`.
    ///
    /// `op` is awaited outside the lock. Its outcome lands in a second
    /// exclusive section: `Success` then `on_success(raw)`, or `Error`
    /// then `on_error(&error)`. Racing completions for the same key are
    /// resolved last-write-wins.
    ///
    /// # Errors
    ///
    /// Returns the rejection of `op` verbatim; it is recorded as `Error`
    /// before this returns. A skipped invocation returns `Ok(())`.
    #[tracing::instrument(skip_all, name = "fetch_run", fields(key = %key, force))]
    pub async fn run<F, Fut, R, E, B, S, H>(
        &self,
        key: &RequestKey,
        force: bool,
        op: F,
        on_before_start: B,
        on_success: S,
        on_error: H,
    ) -> Result<(), E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<R, E>> + Send,
        R: Send,
        E: Display + Send,
        B: FnOnce(&mut C::State) + Send,
        S: FnOnce(&mut C::State, R) + Send,
        H: FnOnce(&mut C::State, &E) + Send,
    {
        let operation = key.operation().to_string();
        metrics::counter!("fetch.runs.total", "operation" => operation.clone()).increment(1);

        let skipped = self
            .context
            .update(|state| {
                let current = state.requests_mut().state_of(key);
                if !force && current.suppresses_refetch() {
                    return Some(current);
                }
                on_before_start(state);
                state.requests_mut().set(key, RequestState::Pending);
                None
            })
            .await;

        if let Some(current) = skipped {
            tracing::debug!(state = %current, "Skipping call, request already covered");
            metrics::counter!("fetch.runs.deduped", "operation" => operation).increment(1);
            return Ok(());
        }

        tracing::trace!("Recorded pending state, awaiting call");

        let start = std::time::Instant::now();
        let outcome = op().await;
        metrics::histogram!("fetch.call.duration_seconds", "operation" => operation.clone())
            .record(start.elapsed().as_secs_f64());

        match outcome {
            Ok(raw) => {
                self.context
                    .update(|state| {
                        state.requests_mut().set(key, RequestState::Success);
                        on_success(state, raw);
                    })
                    .await;

                tracing::debug!("Call fulfilled, recorded success");
                metrics::counter!("fetch.runs.succeeded", "operation" => operation).increment(1);
                Ok(())
            }
            Err(error) => {
                // `error` moves through the closure and back out; capturing
                // a borrow would require `E: Sync` for `update`'s `Send` bound.
                let error = self
                    .context
                    .update(|state| {
                        state.requests_mut().set(key, RequestState::Error);
                        on_error(state, &error);
                        error
                    })
                    .await;

                tracing::warn!(error = %error, "Call rejected, recorded error");
                metrics::counter!("fetch.runs.failed", "operation" => operation).increment(1);
                Err(error)
            }
        }
    }

    /// Unwraps the coordinator back into its context.
    #[must_use]
    pub fn into_context(self) -> C {
        self.context
    }
}
