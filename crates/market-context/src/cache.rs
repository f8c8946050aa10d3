//! TTL caches
//!
//! Three independent stores keyed by normalized symbol. Staleness is checked on
//! read and stale entries are evicted there; nothing is refreshed proactively.
//! Each store is a `DashMap`, so concurrent requests never see a torn entry.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use market_core::{MarketSnapshot, TickerProfile};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Source of "now" for cache staleness checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        if let Some(entry) = self.entries.get(key) {
            if now - entry.cached_at < self.ttl {
                return Some(entry.data.clone());
            }
        }
        // Evict-on-read
        self.entries.remove_if(key, |_, entry| now - entry.cached_at >= self.ttl);
        None
    }

    pub fn insert(&self, key: impl Into<String>, data: V) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                data,
                cached_at: self.clock.now(),
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// TTLs for the three stores
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub snapshot: Duration,
    pub profile: Duration,
    pub benchmark: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            snapshot: Duration::hours(24),
            profile: Duration::days(7),
            benchmark: Duration::hours(6),
        }
    }
}

pub struct ResultCache {
    /// Fully computed primary snapshots (long TTL)
    pub snapshots: TtlCache<MarketSnapshot>,
    /// Provider profiles (very long TTL)
    pub profiles: TtlCache<TickerProfile>,
    /// ETF one-day moves, keyed by ETF symbol (medium TTL)
    pub benchmarks: TtlCache<f64>,
}

impl ResultCache {
    pub fn new(ttls: CacheTtls, clock: Arc<dyn Clock>) -> Self {
        Self {
            snapshots: TtlCache::new(ttls.snapshot, clock.clone()),
            profiles: TtlCache::new(ttls.profile, clock.clone()),
            benchmarks: TtlCache::new(ttls.benchmark, clock),
        }
    }

    pub fn clear(&self) {
        self.snapshots.clear();
        self.profiles.clear();
        self.benchmarks.clear();
    }
}
