//! Generic TTL cache
//!
//! Reads never fetch. A refresh only fetches when forced or stale, and a
//! failed fetch keeps the previous value and its timestamp so the next
//! check retries.

/// Cached value with its fetch time
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CacheEntry<T> {
    pub value: T,
    /// Monotonic time of the successful fetch (ms)
    pub last_fetch_at_ms: u64,
    pub ttl_ms: u32,
}

impl<T> CacheEntry<T> {
    /// Check whether the entry has outlived its TTL at `now_ms`
    pub fn is_stale(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_fetch_at_ms) >= self.ttl_ms as u64
    }
}

/// Outcome of a refresh check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Refresh {
    /// Entry still fresh; nothing fetched
    Fresh,
    /// Fetch succeeded and the entry was replaced
    Refreshed,
    /// A precondition was not met; nothing fetched, not a failure
    Skipped,
}

/// Time-boxed cache around a fetch operation
#[derive(Debug, Clone)]
pub struct TtlCache<T> {
    ttl_ms: u32,
    entry: Option<CacheEntry<T>>,
    force_pending: bool,
}

impl<T> TtlCache<T> {
    /// Create an empty cache; the first refresh always fetches
    pub const fn new(ttl_ms: u32) -> Self {
        Self {
            ttl_ms,
            entry: None,
            force_pending: false,
        }
    }

    /// Current value, if any fetch has ever succeeded
    pub fn get(&self) -> Option<&T> {
        self.entry.as_ref().map(|entry| &entry.value)
    }

    pub fn entry(&self) -> Option<&CacheEntry<T>> {
        self.entry.as_ref()
    }

    pub fn ttl_ms(&self) -> u32 {
        self.ttl_ms
    }

    /// Check whether a refresh at `now_ms` would fetch without forcing
    pub fn is_stale(&self, now_ms: u64) -> bool {
        self.entry
            .as_ref()
            .map_or(true, |entry| entry.is_stale(now_ms))
    }

    /// Force the next refresh to fetch regardless of age
    pub fn request_refresh(&mut self) {
        self.force_pending = true;
    }

    /// Check whether a forced refresh is queued
    pub fn refresh_pending(&self) -> bool {
        self.force_pending
    }

    /// Fetch if forced (now or by an earlier request) or stale
    ///
    /// On failure the previous entry is left untouched and the error is
    /// returned.
    pub fn refresh_if_needed<E, F>(&mut self, now_ms: u64, forced: bool, fetch: F) -> Result<Refresh, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if !(forced || self.force_pending || self.is_stale(now_ms)) {
            return Ok(Refresh::Fresh);
        }

        let value = fetch()?;
        self.entry = Some(CacheEntry {
            value,
            last_fetch_at_ms: now_ms,
            ttl_ms: self.ttl_ms,
        });
        self.force_pending = false;
        Ok(Refresh::Refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_refresh_fetches() {
        let mut cache = TtlCache::<u32>::new(1_000);
        assert!(cache.get().is_none());

        let result: Result<Refresh, ()> = cache.refresh_if_needed(0, false, || Ok(5));

        assert_eq!(result, Ok(Refresh::Refreshed));
        assert_eq!(cache.get(), Some(&5));
        assert_eq!(cache.entry().unwrap().last_fetch_at_ms, 0);
    }

    #[test]
    fn test_fresh_entry_not_refetched() {
        let mut cache = TtlCache::<u32>::new(1_000);
        let _ = cache.refresh_if_needed::<(), _>(0, false, || Ok(1));

        let mut called = false;
        let result: Result<Refresh, ()> = cache.refresh_if_needed(999, false, || {
            called = true;
            Ok(2)
        });

        assert_eq!(result, Ok(Refresh::Fresh));
        assert!(!called);
        assert_eq!(cache.get(), Some(&1));
    }

    #[test]
    fn test_failure_keeps_value_and_timestamp() {
        let mut cache = TtlCache::<u32>::new(1_000);
        let _ = cache.refresh_if_needed::<(), _>(0, false, || Ok(1));

        assert_eq!(cache.refresh_if_needed(1_500, false, || Err("offline")), Err("offline"));
        assert_eq!(cache.get(), Some(&1));
        assert_eq!(cache.entry().unwrap().last_fetch_at_ms, 0);
        assert!(cache.is_stale(1_501));
    }

    #[test]
    fn test_requested_refresh_survives_failure() {
        let mut cache = TtlCache::<u32>::new(1_000);
        let _ = cache.refresh_if_needed::<(), _>(0, false, || Ok(1));
        cache.request_refresh();

        assert_eq!(cache.refresh_if_needed(10, false, || Err(())), Err(()));
        assert!(cache.refresh_pending());

        assert_eq!(cache.refresh_if_needed::<(), _>(20, false, || Ok(2)), Ok(Refresh::Refreshed));
        assert!(!cache.refresh_pending());
        assert_eq!(cache.get(), Some(&2));
    }
}
