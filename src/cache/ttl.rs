use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::runtime::{self, Arc, JoinHandle, Mutex};

use super::{Cache, CacheStats};

#[derive(Debug)]
struct Entry<V> {
    value: V,
    // None when `now + expire` overflows Instant; such an entry never
    // comes due.
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    // Expired the moment the deadline is reached, not after it.
    fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }
}

/// Cache whose entries expire a fixed duration after insertion.
///
/// Each insert stamps an absolute deadline of `now + expire`; hits never
/// extend it, and a deadline too large to represent never comes due.
/// Expired entries are dropped lazily when a lookup touches them, or in
/// bulk by [`purge_expired`](TtlCache::purge_expired) and the timer task
/// from [`spawn_purge_task`]. Entry count is unbounded.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    expire: Duration,
    entries: HashMap<K, Entry<V>>,
    stats: CacheStats,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
{
    pub fn new(expire: Duration) -> Self {
        TtlCache {
            expire,
            entries: HashMap::new(),
            stats: CacheStats::new(),
        }
    }

    pub fn expire(&self) -> Duration {
        self.expire
    }

    /// Live entries plus expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Time left before `key` expires. `None` for absent or already
    /// expired entries; an entry whose deadline cannot be represented
    /// reports [`Duration::MAX`].
    pub fn ttl_remaining(&self, key: &K) -> Option<Duration> {
        let now = Instant::now();
        let entry = self.entries.get(key)?;
        if entry.is_expired(now) {
            return None;
        }
        match entry.expires_at {
            Some(deadline) => Some(deadline - now),
            None => Some(Duration::MAX),
        }
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - self.entries.len();
        self.stats.expirations += removed as u64;
        removed
    }
}

impl<K, V> Cache<K, V> for TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn contains_key(&mut self, key: &K) -> bool {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return true,
            None => return false,
            Some(_) => {}
        }
        self.entries.remove(key);
        self.stats.record_expiration();
        false
    }

    fn get(&mut self, key: &K) -> Option<V> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                self.stats.record_hit();
                return Some(entry.value.clone());
            }
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(_) => {}
        }
        // Deadline passed: drop the entry on the way out.
        self.entries.remove(key);
        self.stats.record_expiration();
        self.stats.record_miss();
        None
    }

    fn insert(&mut self, key: K, value: V) {
        let expires_at = Instant::now().checked_add(self.expire);
        self.entries.insert(key, Entry { value, expires_at });
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.entries.remove(key)?;
        if entry.is_expired(Instant::now()) {
            self.stats.record_expiration();
            return None;
        }
        Some(entry.value)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Spawns a task that runs [`purge_expired`](TtlCache::purge_expired)
/// every `interval`. Dropping the returned handle detaches the task; keep
/// it to stop the sweep on shutdown.
pub fn spawn_purge_task<K, V>(
    cache: Arc<Mutex<TtlCache<K, V>>>,
    interval: Duration,
) -> JoinHandle<()>
where
    K: Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    runtime::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "ttl purge task started");
        loop {
            runtime::sleep(interval).await;
            let removed = cache.lock().await.purge_expired();
            if removed > 0 {
                info!(removed, "purged expired cache entries");
            } else {
                debug!("no expired cache entries to purge");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn hit_before_deadline_miss_after() {
        let mut cache = TtlCache::new(Duration::from_millis(100));
        cache.insert("k", 7);
        assert_eq!(cache.get(&"k"), Some(7));

        sleep(Duration::from_millis(150));
        assert_eq!(cache.get(&"k"), None);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn hits_do_not_extend_the_deadline() {
        let mut cache = TtlCache::new(Duration::from_millis(200));
        cache.insert("k", 7);

        sleep(Duration::from_millis(120));
        assert_eq!(cache.get(&"k"), Some(7));

        sleep(Duration::from_millis(120));
        assert_eq!(cache.get(&"k"), None);
    }

    #[test]
    fn expired_exactly_at_deadline() {
        let now = Instant::now();
        let entry = Entry {
            value: 1,
            expires_at: Some(now),
        };
        assert!(entry.is_expired(now));
        assert!(!entry.is_expired(now - Duration::from_millis(1)));
    }

    #[test]
    fn oversized_expiry_never_comes_due() {
        let mut cache = TtlCache::new(Duration::from_secs(u64::MAX));
        cache.insert("k", 1);

        assert_eq!(cache.get(&"k"), Some(1));
        assert!(cache.ttl_remaining(&"k").unwrap() > Duration::from_secs(3600));
        assert_eq!(cache.purge_expired(), 0);
        assert_eq!(cache.get(&"k"), Some(1));
    }

    #[test]
    fn reinsert_restarts_the_clock() {
        let mut cache = TtlCache::new(Duration::from_millis(200));
        cache.insert("k", 1);
        sleep(Duration::from_millis(120));
        cache.insert("k", 2);
        sleep(Duration::from_millis(120));
        // 240ms after the first insert, 120ms after the second.
        assert_eq!(cache.get(&"k"), Some(2));
    }

    #[test]
    fn ttl_remaining_reports_time_left() {
        let mut cache = TtlCache::new(Duration::from_secs(10));
        cache.insert("k", 1);
        let left = cache.ttl_remaining(&"k").unwrap();
        assert!(left <= Duration::from_secs(10));
        assert!(left > Duration::from_secs(9));
        assert_eq!(cache.ttl_remaining(&"absent"), None);
    }

    #[test]
    fn purge_expired_removes_only_dead_entries() {
        let mut cache = TtlCache::new(Duration::from_millis(100));
        cache.insert("old", 1);
        sleep(Duration::from_millis(150));
        cache.insert("fresh", 2);

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"fresh"), Some(2));
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn remove_returns_nothing_for_expired_entry() {
        let mut cache = TtlCache::new(Duration::from_millis(50));
        cache.insert("k", 1);
        sleep(Duration::from_millis(80));
        assert_eq!(cache.remove(&"k"), None);
    }

    #[cfg(feature = "runtime-tokio")]
    #[tokio::test]
    async fn purge_task_sweeps_on_a_timer() {
        let cache = Arc::new(Mutex::new(TtlCache::new(Duration::from_millis(50))));
        {
            let mut guard = cache.lock().await;
            guard.insert("a", 1);
            guard.insert("b", 2);
        }

        let handle = spawn_purge_task(cache.clone(), Duration::from_millis(30));
        runtime::sleep(Duration::from_millis(150)).await;

        let guard = cache.lock().await;
        assert_eq!(guard.len(), 0);
        assert_eq!(guard.stats().expirations, 2);
        handle.abort();
    }
}
