//! Batched data loader with request coalescing and pluggable caching.
//!
//! Individual [`load`](Loader::load) calls are coalesced: the first miss
//! opens a batch, concurrent loads join it (duplicate keys collapse into
//! one slot), and after a short cooperative-yield window the whole batch
//! goes to your [`BatchFn`] as a single fetch. Every caller receives the
//! outcome of its own key. Successful values can be cached across batches
//! with the LRU or TTL cache, selected directly or through
//! [`CacheSettings`].
//!
//! Runs on tokio by default; enable `runtime-async-std` (with default
//! features off) to run on async-std instead.

#[cfg(not(any(feature = "runtime-async-std", feature = "runtime-tokio")))]
compile_error!("enable one of the runtime-tokio or runtime-async-std features");

#[cfg(all(feature = "runtime-async-std", feature = "runtime-tokio"))]
compile_error!("the runtime-tokio and runtime-async-std features are mutually exclusive");

mod batch_fn;
pub mod cache;
mod config;
mod error;
mod loader;
mod runtime;

pub use batch_fn::BatchFn;
pub use cache::{Cache, CacheStats, DriverCache, LruCache, NullCache, TtlCache};
pub use config::{CacheDriver, CacheSettings};
pub use error::{FetchError, LoadError};
pub use loader::Loader;
