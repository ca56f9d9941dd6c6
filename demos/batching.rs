//! Concurrent loads coalescing into batches.
//!
//! Run with `cargo run --example batching`. Set `RUST_LOG=batchcache=debug`
//! to watch the dispatch cycles.

use async_trait::async_trait;
use batchcache::{BatchFn, FetchError, Loader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct Batcher;

#[async_trait]
impl BatchFn<i32, i32> for Batcher {
    type Error = FetchError;

    async fn load(&mut self, keys: &[i32]) -> Vec<Result<i32, FetchError>> {
        println!("load batch {:?}", keys);
        keys.iter().map(|v| Ok(v * 10)).collect()
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

    let loader = Loader::new(Batcher);

    println!("\n -- one batch from two tasks --");
    let l1 = loader.clone();
    let h1 = tokio::spawn(async move {
        let v = l1.load(3).await.unwrap();
        l1.load_many(vec![v, v + 5, v + 10]).await
    });
    let l2 = loader.clone();
    let h2 = tokio::spawn(async move {
        let v = l2.load(4).await.unwrap();
        l2.load_many(vec![v, v + 5, v + 10]).await
    });

    let r1 = h1.await.unwrap();
    let r2 = h2.await.unwrap();
    assert_eq!(r1, vec![Ok(300), Ok(350), Ok(400)]);
    assert_eq!(r2, vec![Ok(400), Ok(450), Ok(500)]);
    println!("results: {:?} {:?}", r1, r2);

    println!("\n -- duplicate keys share one slot --");
    let (a1, b, a2) = tokio::join!(loader.load(7), loader.load(8), loader.load(7));
    assert_eq!((a1, b, a2), (Ok(70), Ok(80), Ok(70)));
    println!("results: 7 => {:?}, 8 => {:?}", 70, 80);

    println!("\n -- flush dispatches without waiting out the window --");
    let slow = loader.clone().with_yield_count(10_000);
    let (v, _) = tokio::join!(slow.load(9), slow.flush());
    assert_eq!(v, Ok(90));
    println!("result: 9 => {:?}", 90);
}
