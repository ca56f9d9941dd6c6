use std::hash::Hash;

use crate::config::{CacheDriver, CacheSettings};

use super::{Cache, LruCache, TtlCache};

/// The configured cache behind one concrete type.
///
/// [`from_settings`](DriverCache::from_settings) resolves the driver choice
/// once, so loaders built from configuration have the same type no matter
/// which driver the deployment picked.
#[derive(Debug)]
pub enum DriverCache<K, V> {
    Null,
    Lru(LruCache<K, V>),
    Ttl(TtlCache<K, V>),
}

impl<K, V> DriverCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn from_settings(settings: &CacheSettings) -> Self {
        match settings.driver {
            CacheDriver::None => DriverCache::Null,
            CacheDriver::Lru => DriverCache::Lru(LruCache::new(settings.capacity)),
            CacheDriver::Memory => DriverCache::Ttl(TtlCache::new(settings.expire)),
        }
    }
}

impl<K, V> Cache<K, V> for DriverCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn contains_key(&mut self, key: &K) -> bool {
        match self {
            DriverCache::Null => false,
            DriverCache::Lru(c) => c.contains_key(key),
            DriverCache::Ttl(c) => c.contains_key(key),
        }
    }

    fn get(&mut self, key: &K) -> Option<V> {
        match self {
            DriverCache::Null => None,
            DriverCache::Lru(c) => c.get(key),
            DriverCache::Ttl(c) => c.get(key),
        }
    }

    fn insert(&mut self, key: K, value: V) {
        match self {
            DriverCache::Null => {}
            DriverCache::Lru(c) => c.insert(key, value),
            DriverCache::Ttl(c) => c.insert(key, value),
        }
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        match self {
            DriverCache::Null => None,
            DriverCache::Lru(c) => c.remove(key),
            DriverCache::Ttl(c) => c.remove(key),
        }
    }

    fn clear(&mut self) {
        match self {
            DriverCache::Null => {}
            DriverCache::Lru(c) => c.clear(),
            DriverCache::Ttl(c) => c.clear(),
        }
    }
}
