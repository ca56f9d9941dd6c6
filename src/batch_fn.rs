use async_trait::async_trait;

/// A batched fetch against the backing store.
///
/// `load` receives a deduplicated key list in first-appearance order and
/// must return exactly one result per key, with `results[i]` answering
/// `keys[i]`. A result list of any other length fails the whole batch with
/// [`LoadError::UnequalKeyValueSize`](crate::LoadError::UnequalKeyValueSize).
///
/// Errors are per key: a failed position resolves only the callers waiting
/// on that key, and failed keys are never cached.
#[async_trait]
pub trait BatchFn<K, V> {
    /// Per-key error type. Cloned when several callers wait on one key.
    type Error: Clone;

    async fn load(&mut self, keys: &[K]) -> Vec<Result<V, Self::Error>>;
}
