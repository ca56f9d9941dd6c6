use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Cache selection for a loader, resolved once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDriver {
    /// No caching.
    None,
    /// Capacity-bounded cache evicting the least recently used entry.
    Lru,
    /// In-memory cache whose entries expire after a fixed duration.
    Memory,
}

impl Default for CacheDriver {
    fn default() -> Self {
        CacheDriver::None
    }
}

impl FromStr for CacheDriver {
    type Err = std::convert::Infallible;

    // Unknown names select no caching rather than failing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "lru" => CacheDriver::Lru,
            "memory" => CacheDriver::Memory,
            _ => CacheDriver::None,
        })
    }
}

/// Cache configuration, usually loaded once at startup.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub driver: CacheDriver,
    /// Entry capacity for the `Lru` driver.
    pub capacity: usize,
    /// Entry lifetime for the `Memory` driver.
    pub expire: Duration,
}

impl CacheSettings {
    /// Loads settings from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    ///
    /// - `CACHE_DRIVER`: `lru`, `memory`, anything else means no cache
    /// - `CACHE_CAPACITY`: LRU entry capacity (default 1000)
    /// - `CACHE_EXPIRE`: memory-driver lifetime in seconds (default 300)
    pub fn from_env() -> Self {
        Self {
            driver: env::var("CACHE_DRIVER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            capacity: env::var("CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            expire: Duration::from_secs(
                env::var("CACHE_EXPIRE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(300),
            ),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            driver: CacheDriver::None,
            capacity: 1000,
            expire: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_names_resolve_like_the_config_switch() {
        assert_eq!("lru".parse(), Ok(CacheDriver::Lru));
        assert_eq!("memory".parse(), Ok(CacheDriver::Memory));
        assert_eq!("".parse(), Ok(CacheDriver::None));
        assert_eq!("redis".parse(), Ok(CacheDriver::None));
        assert_eq!("LRU".parse(), Ok(CacheDriver::None));
    }

    #[test]
    fn settings_default() {
        let settings = CacheSettings::default();
        assert_eq!(settings.driver, CacheDriver::None);
        assert_eq!(settings.capacity, 1000);
        assert_eq!(settings.expire, Duration::from_secs(300));
    }

    // One test covers all env handling so parallel tests never race on the
    // process environment.
    #[test]
    fn settings_from_env() {
        env::remove_var("CACHE_DRIVER");
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("CACHE_EXPIRE");
        let settings = CacheSettings::from_env();
        assert_eq!(settings.driver, CacheDriver::None);
        assert_eq!(settings.capacity, 1000);
        assert_eq!(settings.expire, Duration::from_secs(300));

        env::set_var("CACHE_DRIVER", "lru");
        env::set_var("CACHE_CAPACITY", "64");
        env::set_var("CACHE_EXPIRE", "5");
        let settings = CacheSettings::from_env();
        assert_eq!(settings.driver, CacheDriver::Lru);
        assert_eq!(settings.capacity, 64);
        assert_eq!(settings.expire, Duration::from_secs(5));

        env::set_var("CACHE_CAPACITY", "not a number");
        assert_eq!(CacheSettings::from_env().capacity, 1000);

        env::remove_var("CACHE_DRIVER");
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("CACHE_EXPIRE");
    }
}
