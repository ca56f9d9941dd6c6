use thiserror::Error;

/// Outcome of a [`load`](crate::Loader::load) that did not produce a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError<E> {
    /// The batch function broke its contract: the result list does not
    /// match the key list in length, so no position can be trusted. Every
    /// caller of the affected batch receives this error; later batches are
    /// unaffected.
    #[error("batch function returned {value_count} results for {key_count} keys")]
    UnequalKeyValueSize {
        key_count: usize,
        value_count: usize,
    },

    /// The dispatch task went away before resolving this request, which
    /// happens when the batch function panics.
    #[error("batch dispatch dropped before resolving the request")]
    SenderDropped,

    /// The batch function reported a per-key error for this key.
    #[error("batch function error: {0}")]
    BatchFn(E),
}

/// Ready-made per-key error for batch functions that do not carry a richer
/// error type of their own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The backing store holds no entity for this key. Not cached, so the
    /// key is fetched again on its next load.
    #[error("not found")]
    NotFound,

    /// The backing store failed to answer. Not cached either.
    #[error("backend error: {0}")]
    Backend(String),
}
