// runtime-async-std
#[cfg(feature = "runtime-async-std")]
pub type Arc<T> = async_std::sync::Arc<T>;

#[cfg(feature = "runtime-async-std")]
pub type Mutex<T> = async_std::sync::Mutex<T>;

#[cfg(feature = "runtime-async-std")]
pub use async_std::task::{sleep, spawn, yield_now, JoinHandle};

// runtime-tokio
#[cfg(feature = "runtime-tokio")]
pub type Arc<T> = std::sync::Arc<T>;

#[cfg(feature = "runtime-tokio")]
pub type Mutex<T> = tokio::sync::Mutex<T>;

#[cfg(feature = "runtime-tokio")]
pub use tokio::task::{spawn, yield_now, JoinHandle};

#[cfg(feature = "runtime-tokio")]
pub use tokio::time::sleep;
