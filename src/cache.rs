use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CacheEntry<T> {
    data: T,
    timestamp: Instant,
}

/// Outcome of a non-evicting probe, see [`TtlCache::lookup`].
pub enum CacheLookup<T> {
    Fresh(T),
    Stale(T),
    Missing,
}

/// Key-value store with a fixed time-to-live per instance.
///
/// Expiry is checked lazily on read; there is no background eviction task, so
/// an entry that is never read again stays in memory. Callers with an
/// unbounded key space must bound it themselves. The map is mutex-guarded and
/// the lock is never held across an await point, so a cache can be shared
/// freely between tasks.
pub struct TtlCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores `data` under `key`, replacing any previous entry.
    pub fn set(&self, key: &str, data: T) {
        let mut entries = self.lock();
        entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                timestamp: Instant::now(),
            },
        );
    }

    /// Returns the value for `key` if it is younger than the TTL. An expired
    /// entry is removed on the way out and reported as absent.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.timestamp.elapsed() <= self.ttl => Some(entry.data.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Probes `key` without evicting anything, classifying the entry by age.
    /// This is what the fetch path uses so an expired value remains available
    /// as a stale fallback while the live request is in flight.
    pub fn lookup(&self, key: &str) -> CacheLookup<T> {
        let entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.timestamp.elapsed() <= self.ttl => {
                CacheLookup::Fresh(entry.data.clone())
            }
            Some(entry) => CacheLookup::Stale(entry.data.clone()),
            None => CacheLookup::Missing,
        }
    }

    pub fn delete(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
        // A poisoned lock only means another thread panicked mid-operation;
        // the map itself is still usable.
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn set_then_get_returns_value() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("quote:AAPL", 42);
        assert_eq!(cache.get("quote:AAPL"), Some(42));
    }

    #[test]
    fn set_overwrites_previous_entry() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("k", 1);
        cache.set("k", 2);
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn expired_entry_is_absent_and_stays_absent() {
        let cache = TtlCache::new(Duration::from_millis(30));
        cache.set("k", 7);
        sleep(Duration::from_millis(60));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn lookup_reports_stale_without_evicting() {
        let cache = TtlCache::new(Duration::from_millis(30));
        cache.set("k", 7);
        sleep(Duration::from_millis(60));
        assert!(matches!(cache.lookup("k"), CacheLookup::Stale(7)));
        assert!(matches!(cache.lookup("k"), CacheLookup::Stale(7)));
        assert!(matches!(cache.lookup("missing"), CacheLookup::Missing));
    }

    #[test]
    fn delete_and_clear_remove_entries() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("a", 1);
        cache.set("b", 2);
        cache.delete("a");
        assert_eq!(cache.get("a"), None);
        cache.clear();
        assert_eq!(cache.get("b"), None);
    }
}
