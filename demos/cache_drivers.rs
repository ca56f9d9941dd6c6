//! Cache drivers picked through configuration.
//!
//! Run with `cargo run --example cache_drivers`. The same batch function is
//! wrapped in a loader per driver; watch how many fetches each one issues.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use batchcache::{BatchFn, CacheDriver, CacheSettings, FetchError, Loader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
struct CountingBatcher {
    fetches: Arc<AtomicUsize>,
}

impl CountingBatcher {
    fn new() -> Self {
        CountingBatcher {
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchFn<u64, String> for CountingBatcher {
    type Error = FetchError;

    async fn load(&mut self, keys: &[u64]) -> Vec<Result<String, FetchError>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        println!("load batch {:?}", keys);
        keys.iter().map(|id| Ok(format!("user #{}", id))).collect()
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "batchcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n -- lru driver: repeats hit the cache, capacity evicts --");
    let batcher = CountingBatcher::new();
    let settings = CacheSettings {
        driver: CacheDriver::Lru,
        capacity: 2,
        ..CacheSettings::default()
    };
    let loader = Loader::with_settings(batcher.clone(), &settings);

    loader.load(1).await.unwrap();
    loader.load(1).await.unwrap(); // cache hit
    loader.load(2).await.unwrap();
    loader.load(3).await.unwrap(); // evicts 1
    loader.load(1).await.unwrap(); // fetched again
    println!("fetches: {} (5 loads)", batcher.fetches());
    assert_eq!(batcher.fetches(), 4);

    println!("\n -- memory driver: entries expire after the configured ttl --");
    let batcher = CountingBatcher::new();
    let settings = CacheSettings {
        driver: CacheDriver::Memory,
        expire: Duration::from_millis(200),
        ..CacheSettings::default()
    };
    let loader = Loader::with_settings(batcher.clone(), &settings);

    loader.load(7).await.unwrap();
    loader.load(7).await.unwrap(); // still cached
    tokio::time::sleep(Duration::from_millis(250)).await;
    loader.load(7).await.unwrap(); // expired, fetched again
    println!("fetches: {} (3 loads)", batcher.fetches());
    assert_eq!(batcher.fetches(), 2);

    println!("\n -- no driver: every load reaches the batch function --");
    let batcher = CountingBatcher::new();
    let loader = Loader::with_settings(batcher.clone(), &CacheSettings::default());

    loader.load(9).await.unwrap();
    loader.load(9).await.unwrap();
    println!("fetches: {} (2 loads)", batcher.fetches());
    assert_eq!(batcher.fetches(), 2);
}
