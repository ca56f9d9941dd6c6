use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::mem;

use futures::channel::oneshot;
use futures::future;
use tracing::{debug, trace};

use crate::cache::{Cache, DriverCache, NullCache};
use crate::config::CacheSettings;
use crate::error::LoadError;
use crate::runtime::{self, Arc, Mutex};
use crate::BatchFn;

type Waiter<V, E> = oneshot::Sender<Result<V, LoadError<E>>>;

struct Batch<K, V, E> {
    seq: u64,
    // Deduplicated, in first-appearance order; this is exactly the key
    // list the batch function receives.
    keys: Vec<K>,
    waiters: HashMap<K, Vec<Waiter<V, E>>>,
}

impl<K, V, E> Batch<K, V, E>
where
    K: Eq + Hash + Clone,
{
    fn new(seq: u64) -> Self {
        Batch {
            seq,
            keys: Vec::new(),
            waiters: HashMap::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn enqueue(&mut self, key: K) -> oneshot::Receiver<Result<V, LoadError<E>>> {
        let (tx, rx) = oneshot::channel();
        match self.waiters.entry(key.clone()) {
            Entry::Occupied(mut slot) => {
                slot.get_mut().push(tx);
            }
            Entry::Vacant(slot) => {
                self.keys.push(key);
                slot.insert(vec![tx]);
            }
        }
        rx
    }
}

struct State<K, V, E, C> {
    cache: C,
    batch: Batch<K, V, E>,
}

impl<K, V, E, C> State<K, V, E, C>
where
    K: Eq + Hash + Clone,
{
    // Installs a fresh batch so arrivals during the fetch accumulate the
    // next one, and returns the closed batch for dispatch.
    fn close_batch(&mut self) -> Batch<K, V, E> {
        let next = Batch::new(self.batch.seq.wrapping_add(1));
        mem::replace(&mut self.batch, next)
    }
}

/// Batching data loader with an optional cache.
///
/// Concurrent [`load`](Loader::load) calls are coalesced into one call of
/// the [`BatchFn`]; successful values are cached so later loads of the
/// same key skip the fetch entirely. Cloning is cheap and every clone
/// works against the same batch and cache.
///
/// Batching relies on spawned tasks, so a loader must be used from inside
/// the selected runtime.
pub struct Loader<K, V, E, F, C = NullCache> {
    state: Arc<Mutex<State<K, V, E, C>>>,
    load_fn: Arc<Mutex<F>>,
    max_batch_size: usize,
    yield_count: usize,
}

// Manual implementation is used to omit applying unnecessary Clone bounds.
impl<K, V, E, F, C> Clone for Loader<K, V, E, F, C> {
    fn clone(&self) -> Self {
        Loader {
            state: self.state.clone(),
            load_fn: self.load_fn.clone(),
            max_batch_size: self.max_batch_size,
            yield_count: self.yield_count,
        }
    }
}

impl<K, V, E, F> Loader<K, V, E, F, NullCache>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
    F: BatchFn<K, V, Error = E> + Send + 'static,
{
    /// Creates a loader that batches but does not cache.
    pub fn new(load_fn: F) -> Self {
        Loader::with_cache(load_fn, NullCache)
    }
}

impl<K, V, E, F> Loader<K, V, E, F, DriverCache<K, V>>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
    F: BatchFn<K, V, Error = E> + Send + 'static,
{
    /// Creates a loader with the cache the settings select.
    pub fn with_settings(load_fn: F, settings: &CacheSettings) -> Self {
        Loader::with_cache(load_fn, DriverCache::from_settings(settings))
    }
}

impl<K, V, E, F, C> Loader<K, V, E, F, C>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
    F: BatchFn<K, V, Error = E> + Send + 'static,
    C: Cache<K, V> + Send + 'static,
{
    pub fn with_cache(load_fn: F, cache: C) -> Self {
        Loader {
            state: Arc::new(Mutex::new(State {
                cache,
                batch: Batch::new(0),
            })),
            load_fn: Arc::new(Mutex::new(load_fn)),
            max_batch_size: 200,
            yield_count: 10,
        }
    }

    /// Caps how many distinct keys a single batch fetch may carry.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// How many scheduler turns a batch stays open for other loads to
    /// join before it is dispatched.
    pub fn with_yield_count(mut self, yield_count: usize) -> Self {
        self.yield_count = yield_count;
        self
    }

    /// Loads one key, answering from the cache when possible and joining
    /// the open batch otherwise.
    ///
    /// Dropping the returned future abandons only this caller: the key
    /// stays in the batch and other waiters are unaffected.
    pub async fn load(&self, key: K) -> Result<V, LoadError<E>> {
        let rx = {
            let mut state = self.state.lock().await;
            if let Some(value) = state.cache.get(&key) {
                trace!("load answered from cache");
                return Ok(value);
            }
            let first_of_batch = state.batch.is_empty();
            let rx = state.batch.enqueue(key);
            if state.batch.keys.len() >= self.max_batch_size {
                let batch = state.close_batch();
                let loader = self.clone();
                runtime::spawn(async move { loader.dispatch(batch).await });
            } else if first_of_batch {
                let seq = state.batch.seq;
                let loader = self.clone();
                runtime::spawn(async move { loader.window(seq).await });
            }
            rx
        };
        match rx.await {
            Ok(result) => result,
            Err(oneshot::Canceled) => Err(LoadError::SenderDropped),
        }
    }

    /// Loads many keys, one outcome per input position.
    pub async fn load_many(&self, keys: Vec<K>) -> Vec<Result<V, LoadError<E>>> {
        future::join_all(keys.into_iter().map(|key| self.load(key))).await
    }

    /// Dispatches the open batch right away instead of waiting out the
    /// yield window. Returns once every waiter of that batch is resolved.
    ///
    /// Dropping the returned future abandons only the wait: the dispatch
    /// keeps running and still resolves every waiter of the batch.
    pub async fn flush(&self) {
        let batch = {
            let mut state = self.state.lock().await;
            if state.batch.is_empty() {
                return;
            }
            state.close_batch()
        };
        let (done_tx, done_rx) = oneshot::channel();
        let loader = self.clone();
        runtime::spawn(async move {
            loader.dispatch(batch).await;
            let _ = done_tx.send(());
        });
        let _ = done_rx.await;
    }

    /// Inserts a value into the cache unless the key is already present.
    pub async fn prime(&self, key: K, value: V) {
        let mut state = self.state.lock().await;
        if !state.cache.contains_key(&key) {
            state.cache.insert(key, value);
        }
    }

    /// Removes one key from the cache, returning the cached value if any.
    pub async fn remove(&self, key: &K) -> Option<V> {
        let mut state = self.state.lock().await;
        state.cache.remove(key)
    }

    /// Drops every cached value.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.cache.clear();
    }

    // Holds the batch open for other loads, then dispatches it unless
    // flush or the size cap already did.
    async fn window(&self, seq: u64) {
        // yield for other load to append request
        let mut i = 0;
        while i < self.yield_count {
            runtime::yield_now().await;
            i += 1;
        }
        let batch = {
            let mut state = self.state.lock().await;
            if state.batch.seq != seq {
                return;
            }
            state.close_batch()
        };
        self.dispatch(batch).await;
    }

    async fn dispatch(&self, batch: Batch<K, V, E>) {
        let Batch {
            keys, mut waiters, ..
        } = batch;
        debug!(keys = keys.len(), "dispatching batch");

        // The fetch runs without the state lock held, so loads keep
        // accumulating the next batch while this one is in flight.
        let results = {
            let mut load_fn = self.load_fn.lock().await;
            load_fn.load(&keys).await
        };

        if results.len() != keys.len() {
            let err = LoadError::UnequalKeyValueSize {
                key_count: keys.len(),
                value_count: results.len(),
            };
            for key in &keys {
                if let Some(senders) = waiters.remove(key) {
                    for tx in senders {
                        let _ = tx.send(Err(err.clone()));
                    }
                }
            }
            return;
        }

        // Successes land in the cache before anyone is resolved, so a
        // caller reacting to its result immediately hits the cache.
        // Errors are never cached.
        {
            let mut state = self.state.lock().await;
            for (key, result) in keys.iter().zip(results.iter()) {
                if let Ok(value) = result {
                    state.cache.insert(key.clone(), value.clone());
                }
            }
        }

        for (key, result) in keys.iter().zip(results.into_iter()) {
            let outcome = result.map_err(LoadError::BatchFn);
            if let Some(senders) = waiters.remove(key) {
                for tx in senders {
                    // A closed receiver is a caller that went away.
                    let _ = tx.send(outcome.clone());
                }
            }
        }
    }
}
