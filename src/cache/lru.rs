use std::collections::HashMap;
use std::hash::Hash;

use super::{Cache, CacheStats};

// Sentinel index for "no node".
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Capacity-bounded cache evicting the least recently used entry.
///
/// A hash map indexes into a slot arena threaded with a doubly-linked
/// recency list, head holding the most recently used entry. Lookups,
/// inserts and removals are all O(1); a hit moves the entry to the head,
/// an insert past capacity silently drops the tail.
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    map: HashMap<K, usize>,
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache holding at most `capacity` entries. A capacity of
    /// zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        LruCache {
            capacity,
            map: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            stats: CacheStats::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Key next in line for eviction, if any. Does not refresh recency.
    pub fn peek_oldest(&self) -> Option<&K> {
        match self.slots.get(self.tail) {
            Some(Some(node)) => Some(&node.key),
            _ => None,
        }
    }

    /// Removes and returns the least recently used entry.
    pub fn evict_oldest(&mut self) -> Option<(K, V)> {
        let idx = self.tail;
        let node = self.slots.get_mut(idx)?.take()?;
        self.unlink(node.prev, node.next);
        self.free.push(idx);
        self.map.remove(&node.key);
        self.stats.record_eviction();
        Some((node.key, node.value))
    }

    // Bypasses the node whose stored links are (prev, next). NIL neighbors
    // mean the node was at an end of the list.
    fn unlink(&mut self, prev: usize, next: usize) {
        match self.slots.get_mut(prev).and_then(Option::as_mut) {
            Some(p) => p.next = next,
            None => self.head = next,
        }
        match self.slots.get_mut(next).and_then(Option::as_mut) {
            Some(n) => n.prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots.get_mut(idx).and_then(Option::as_mut) {
            node.prev = NIL;
            node.next = old_head;
        }
        if let Some(prev_head) = self.slots.get_mut(old_head).and_then(Option::as_mut) {
            prev_head.prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        let links = match self.slots.get(idx).and_then(Option::as_ref) {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        self.unlink(links.0, links.1);
        self.push_front(idx);
    }

    fn alloc(&mut self, node: Node<K, V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }
}

impl<K, V> Cache<K, V> for LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // Presence check without promoting the entry.
    fn contains_key(&mut self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn get(&mut self, key: &K) -> Option<V> {
        let idx = match self.map.get(key) {
            Some(&idx) => idx,
            None => {
                self.stats.record_miss();
                return None;
            }
        };
        self.move_to_front(idx);
        self.stats.record_hit();
        self.slots
            .get(idx)
            .and_then(Option::as_ref)
            .map(|node| node.value.clone())
    }

    fn insert(&mut self, key: K, value: V) {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(node) = self.slots.get_mut(idx).and_then(Option::as_mut) {
                node.value = value;
            }
            self.move_to_front(idx);
            return;
        }
        if self.map.len() >= self.capacity {
            self.evict_oldest();
        }
        let idx = self.alloc(Node {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        });
        self.push_front(idx);
        self.map.insert(key, idx);
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.map.remove(key)?;
        let node = self.slots.get_mut(idx)?.take()?;
        self.unlink(node.prev, node.next);
        self.free.push(idx);
        Some(node.value)
    }

    fn clear(&mut self) {
        self.map.clear();
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_after_insert() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"b"), None);
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = LruCache::new(2);
        cache.insert("x", 1);
        cache.insert("y", 2);
        assert_eq!(cache.get(&"x"), Some(1));
        cache.insert("z", 3);

        assert_eq!(cache.get(&"y"), None);
        assert_eq!(cache.get(&"x"), Some(1));
        assert_eq!(cache.get(&"z"), Some(3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn insert_past_capacity_evicts_exactly_one() {
        let mut cache = LruCache::new(3);
        for i in 0..3 {
            cache.insert(i, i * 10);
        }
        assert_eq!(cache.len(), 3);
        cache.insert(3, 30);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.get(&0), None);
        assert_eq!(cache.get(&3), Some(30));
    }

    #[test]
    fn overwrite_refreshes_recency_without_eviction() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("a", 9);
        cache.insert("c", 3);

        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(9));
        assert_eq!(cache.get(&"c"), Some(3));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn peek_oldest_tracks_access_order() {
        let mut cache = LruCache::new(3);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);
        assert_eq!(cache.peek_oldest(), Some(&"a"));

        cache.get(&"a");
        assert_eq!(cache.peek_oldest(), Some(&"b"));
    }

    #[test]
    fn remove_then_reinsert_reuses_slot() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.remove(&"a"), Some(1));
        assert_eq!(cache.remove(&"a"), None);
        assert_eq!(cache.len(), 1);

        cache.insert("c", 3);
        cache.insert("d", 4);
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"c"), Some(3));
        assert_eq!(cache.get(&"d"), Some(4));
    }

    #[test]
    fn remove_head_and_tail_keep_list_consistent() {
        let mut cache = LruCache::new(3);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);

        cache.remove(&"c");
        assert_eq!(cache.peek_oldest(), Some(&"a"));
        cache.remove(&"a");
        assert_eq!(cache.peek_oldest(), Some(&"b"));
        assert_eq!(cache.evict_oldest(), Some(("b", 2)));
        assert!(cache.is_empty());
        assert_eq!(cache.evict_oldest(), None);
    }

    #[test]
    fn clear_empties_everything() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"a"), None);

        cache.insert("c", 3);
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn zero_capacity_is_bumped_to_one() {
        let mut cache = LruCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
    }

    #[test]
    fn contains_key_does_not_promote() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert!(cache.contains_key(&"a"));
        cache.insert("c", 3);

        // "a" stayed oldest despite the contains_key lookup.
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
    }

    #[test]
    fn stats_count_hits_and_misses() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.get(&"a");
        cache.get(&"a");
        cache.get(&"missing");
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }
}
