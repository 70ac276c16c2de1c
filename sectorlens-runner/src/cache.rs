//! In-memory TTL cache for fetched price series.
//!
//! Entries are keyed by a BLAKE3 hash of (symbol, period, end date, interval)
//! and expire after a fixed time-to-live. The cache sits in front of a
//! provider; the analysis core never sees it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

use sectorlens_core::domain::PriceSeries;

use crate::provider::{FetchError, FetchRequest, PriceProvider};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Cache key for one symbol under one request.
pub fn cache_key(symbol: &str, request: &FetchRequest) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    hasher.update(b"|");
    hasher.update(request.period.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(request.end.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(request.interval.as_str().as_bytes());
    hasher.finalize().to_hex().to_string()
}

#[derive(Debug)]
pub struct TtlCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, PriceSeries)>>,
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // Poisoning is ignored: the map is never left mid-update.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, (Instant, PriceSeries)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fresh entry for `key`, if any. Expired entries are evicted.
    pub fn get(&self, key: &str) -> Option<PriceSeries> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some((stored, series)) if stored.elapsed() < self.ttl => Some(series.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `series` under `key`, pruning every expired entry first.
    pub fn insert(&self, key: String, series: PriceSeries) {
        let mut entries = self.lock();
        entries.retain(|_, (stored, _)| stored.elapsed() < self.ttl);
        entries.insert(key, (Instant::now(), series));
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Provider wrapper that consults a [`TtlCache`] before fetching.
///
/// Only successful fetches are cached.
pub struct CachedProvider<P> {
    inner: P,
    cache: TtlCache,
}

impl<P: PriceProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: PriceProvider> PriceProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, symbol: &str, request: &FetchRequest) -> Result<PriceSeries, FetchError> {
        let key = cache_key(symbol, request);
        if let Some(series) = self.cache.get(&key) {
            debug!(symbol, "cache hit");
            return Ok(series);
        }
        let series = self.inner.fetch(symbol, request)?;
        self.cache.insert(key, series.clone());
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sectorlens_core::domain::{HistoryPeriod, Interval};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
    }

    impl PriceProvider for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch(&self, symbol: &str, _request: &FetchRequest) -> Result<PriceSeries, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if symbol == "MISSING" {
                return Err(FetchError::SymbolNotFound {
                    symbol: symbol.into(),
                });
            }
            Ok(PriceSeries::from_unsorted(symbol, Vec::new()))
        }
    }

    fn request(interval: Interval) -> FetchRequest {
        FetchRequest::new(
            interval,
            HistoryPeriod::OneYear,
            NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
        )
    }

    #[test]
    fn key_depends_on_every_field() {
        let daily = request(Interval::Daily);
        let weekly = request(Interval::Weekly);
        let mut two_years = daily.clone();
        two_years.period = HistoryPeriod::TwoYears;

        let base = cache_key("^NSEI", &daily);
        assert_eq!(base, cache_key("^NSEI", &daily));
        assert_ne!(base, cache_key("^NSEI", &weekly));
        assert_ne!(base, cache_key("^NSEI", &two_years));
        assert_ne!(base, cache_key("^CNXIT", &daily));
        assert_eq!(base.len(), 64);
    }

    #[test]
    fn hit_within_ttl_and_errors_not_cached() {
        let provider = CachedProvider::new(
            Counting {
                calls: AtomicUsize::new(0),
            },
            DEFAULT_TTL,
        );
        let req = request(Interval::Daily);

        provider.fetch("^NSEI", &req).unwrap();
        provider.fetch("^NSEI", &req).unwrap();
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 1);

        assert!(provider.fetch("MISSING", &req).is_err());
        assert!(provider.fetch("MISSING", &req).is_err());
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 3);
        assert_eq!(provider.cache().len(), 1);
    }

    #[test]
    fn expired_entries_are_evicted() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.insert("k".into(), PriceSeries::from_unsorted("X", Vec::new()));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_prunes_expired_keys() {
        let cache = TtlCache::new(Duration::from_millis(50));
        cache.insert("old".into(), PriceSeries::from_unsorted("A", Vec::new()));
        std::thread::sleep(Duration::from_millis(80));
        cache.insert("new".into(), PriceSeries::from_unsorted("B", Vec::new()));

        assert_eq!(cache.len(), 1);
        assert!(cache.get("new").is_some());
    }

    #[test]
    fn clear_empties_cache() {
        let cache = TtlCache::default();
        cache.insert("a".into(), PriceSeries::from_unsorted("A", Vec::new()));
        cache.insert("b".into(), PriceSeries::from_unsorted("B", Vec::new()));
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.get("a").is_none());
        assert_eq!(cache.ttl(), DEFAULT_TTL);
    }
}
