//! Action builders: composing remote calls and models into fetch handlers.

use std::fmt::Display;
use std::future::Future;

use futures::future::BoxFuture;
use storefetch_core::{ActionContext, FetchError, Model, Mutate, OperationId, Payload, RequestKey};

use crate::coordinator::Coordinator;

/// Handler produced by the builders.
///
/// Invoked with the container's execution context and a payload; resolves
/// once the request settles or is skipped by the dedup check, and rejects
/// with the wrapped call failure. This is the sole surface callers
/// register and dispatch.
pub type FetchAction<C, P, E> =
    Box<dyn Fn(C, P) -> BoxFuture<'static, Result<(), FetchError<E>>> + Send + Sync>;

/// Factory for deduplicated fetch handlers.
///
/// Each builder pairs a caller-supplied remote call with a model
/// constructor and returns a [`FetchAction`] wired through
/// [`Coordinator::run`]. The `force` flag fixes the produced handler's
/// admission behavior: a forced handler re-issues its call even while the
/// key reads `Pending` or `Success`.
pub struct FetchFactory;

impl FetchFactory {
    /// Builds a single-result handler for `operation`.
    ///
    /// On dispatch the handler derives the request key from the payload
    /// and runs the gated fetch: an empty model is emitted as the
    /// placeholder, `call(payload)` is awaited, and a fresh model filled
    /// from the raw response is emitted on fulfillment. Every emission
    /// routes through the container's mutation entry point for
    /// `operation`.
    ///
    /// The handler rejects with [`FetchError::Key`] when the payload has
    /// no canonical encoding, and with [`FetchError::Call`] when `call`
    /// rejects; the key's table entry reads `Error` by the time the
    /// rejection is observable.
    #[must_use]
    pub fn single<C, P, Call, Fut, R, E, MF, M>(
        force: bool,
        operation: OperationId,
        call: Call,
        model_factory: MF,
    ) -> FetchAction<C, P, E>
    where
        C: ActionContext,
        C::State: Mutate<M>,
        P: Payload + Send + 'static,
        Call: Fn(P) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: Send + 'static,
        E: Display + Send + 'static,
        MF: Fn() -> M + Clone + Send + Sync + 'static,
        M: Model<Raw = R> + Send + 'static,
    {
        Box::new(move |context, payload| {
            let operation = operation.clone();
            let call = call.clone();
            let model_factory = model_factory.clone();

            Box::pin(async move {
                let key = RequestKey::for_payload(operation.clone(), &payload)?;
                let coordinator = Coordinator::new(context);

                coordinator
                    .run(
                        &key,
                        force,
                        || call(payload),
                        |state| state.apply(&operation, model_factory()),
                        |state, raw| state.apply(&operation, model_factory().fill(raw)),
                        |_state, _error| {},
                    )
                    .await
                    .map_err(FetchError::Call)
            })
        })
    }

    /// Builds a bulk-result handler for `operation`.
    ///
    /// Identical to [`single`](Self::single) except that `call` resolves
    /// to a sequence of raw fragments: the placeholder is an empty
    /// sequence, and on fulfillment each fragment is filled into its own
    /// fresh model and the populated sequence is emitted as one value.
    #[must_use]
    pub fn bulk<C, P, Call, Fut, R, E, MF, M>(
        force: bool,
        operation: OperationId,
        call: Call,
        model_factory: MF,
    ) -> FetchAction<C, P, E>
    where
        C: ActionContext,
        C::State: Mutate<Vec<M>>,
        P: Payload + Send + 'static,
        Call: Fn(P) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<R>, E>> + Send + 'static,
        R: Send + 'static,
        E: Display + Send + 'static,
        MF: Fn() -> M + Clone + Send + Sync + 'static,
        M: Model<Raw = R> + Send + 'static,
    {
        Box::new(move |context, payload| {
            let operation = operation.clone();
            let call = call.clone();
            let model_factory = model_factory.clone();

            Box::pin(async move {
                let key = RequestKey::for_payload(operation.clone(), &payload)?;
                let coordinator = Coordinator::new(context);

                coordinator
                    .run(
                        &key,
                        force,
                        || call(payload),
                        |state| state.apply(&operation, Vec::new()),
                        |state, raws: Vec<R>| {
                            let models: Vec<M> = raws
                                .into_iter()
                                .map(|raw| model_factory().fill(raw))
                                .collect();
                            state.apply(&operation, models);
                        },
                        |_state, _error| {},
                    )
                    .await
                    .map_err(FetchError::Call)
            })
        })
    }

    /// Builds an invalidation handler for `operation`.
    ///
    /// The produced handler derives the request key from the payload and
    /// removes its table entry, so the next read reports `NotStarted` and
    /// the next fetch dispatch is admitted. It never touches the remote
    /// call; its sole failure mode is key derivation
    /// ([`FetchError::Key`]).
    #[must_use]
    pub fn invalidate<C, P, E>(operation: OperationId) -> FetchAction<C, P, E>
    where
        C: ActionContext,
        P: Payload + Send + 'static,
        E: Send + 'static,
    {
        Box::new(move |context, payload| {
            let operation = operation.clone();

            Box::pin(async move {
                let key = RequestKey::for_payload(operation, &payload)?;
                Coordinator::new(context).invalidate(&key).await;
                Ok(())
            })
        })
    }
}
