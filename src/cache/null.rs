use super::Cache;

/// Cache that keeps nothing. The default when no driver is configured:
/// every lookup misses, every insert vanishes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

impl<K, V> Cache<K, V> for NullCache {
    fn get(&mut self, _key: &K) -> Option<V> {
        None
    }

    fn insert(&mut self, _key: K, _value: V) {}

    fn remove(&mut self, _key: &K) -> Option<V> {
        None
    }

    fn clear(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_stores() {
        let mut cache = NullCache;
        Cache::insert(&mut cache, "k", 1);
        assert_eq!(Cache::<_, i32>::get(&mut cache, &"k"), None);
        assert_eq!(Cache::<_, i32>::remove(&mut cache, &"k"), None);
        assert!(!Cache::<_, i32>::contains_key(&mut cache, &"k"));
    }
}
