//! Pluggable value caches for the loader.
//!
//! Every implementation is a plain single-threaded structure; the loader
//! serializes all access behind its own lock. Methods take `&mut self`
//! because reads have side effects here: an LRU hit reorders the recency
//! list and a TTL lookup drops entries that have expired.

mod driver;
mod lru;
mod null;
mod stats;
mod ttl;


pub use driver::DriverCache;
pub use lru::LruCache;
pub use null::NullCache;
pub use stats::CacheStats;
pub use ttl::{spawn_purge_task, TtlCache};

/// Storage contract the loader works against.
///
/// `get` after `insert` returns the inserted value until the entry is
/// evicted or expires. A missing key is `None`, never an error, and no
/// method blocks on I/O.
pub trait Cache<K, V> {
    fn contains_key(&mut self, key: &K) -> bool {
        self.get(key).is_some()
    }
    fn get(&mut self, key: &K) -> Option<V>;
    fn insert(&mut self, key: K, value: V);
    fn remove(&mut self, key: &K) -> Option<V>;
    fn clear(&mut self);
}
