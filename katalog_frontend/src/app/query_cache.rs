use std::collections::HashMap;
use std::time::Instant;

use log::debug;

use crate::api::RemoteError;
use crate::config::CacheSettings;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Feed { page: u32 },
    UserActivities { username: String, page: u32 },
    UnreadNotifications,
}

struct Entry<V> {
    value: Option<V>,
    fetched_at: Option<Instant>,
    in_flight: bool,
    invalidated: bool,
    failures: u32,
    last_error: Option<RemoteError>,
    failed_at: Option<Instant>,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            value: None,
            fetched_at: None,
            in_flight: false,
            invalidated: false,
            failures: 0,
            last_error: None,
            failed_at: None,
        }
    }
}

/// Key-addressed record of fetches: what is loaded, what is in flight, what
/// failed and how often. The cache never performs a fetch itself; callers
/// ask `should_fetch`, mark `begin_fetch` and report back with `complete`.
pub struct QueryCache<V> {
    settings: CacheSettings,
    entries: HashMap<QueryKey, Entry<V>>,
}

impl<V> QueryCache<V> {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            entries: HashMap::new(),
        }
    }

    /// Last good value, even while stale or refetching.
    pub fn get(&self, key: &QueryKey) -> Option<&V> {
        self.entries.get(key).and_then(|e| e.value.as_ref())
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.entries.get(key).map(|e| e.in_flight).unwrap_or(false)
    }

    pub fn error(&self, key: &QueryKey) -> Option<&RemoteError> {
        self.entries.get(key).and_then(|e| e.last_error.as_ref())
    }

    pub fn retries_exhausted(&self, key: &QueryKey) -> bool {
        self.entries
            .get(key)
            .map(|e| e.failures > self.settings.max_retries)
            .unwrap_or(false)
    }

    pub fn should_fetch(&self, key: &QueryKey, now: Instant) -> bool {
        let Some(entry) = self.entries.get(key) else {
            return true;
        };
        if entry.in_flight {
            return false;
        }
        if entry.failures > 0 {
            if entry.failures > self.settings.max_retries {
                return false;
            }
            let wait = self.settings.retry_backoff * entry.failures;
            return entry
                .failed_at
                .map(|at| now.saturating_duration_since(at) >= wait)
                .unwrap_or(true);
        }
        if entry.value.is_none() || entry.invalidated {
            return true;
        }
        entry
            .fetched_at
            .map(|at| now.saturating_duration_since(at) >= self.settings.stale_after)
            .unwrap_or(true)
    }

    /// Marks a fetch as started. Returns false when one is already running.
    pub fn begin_fetch(&mut self, key: &QueryKey) -> bool {
        let entry = self.entries.entry(key.clone()).or_default();
        if entry.in_flight {
            return false;
        }
        entry.in_flight = true;
        true
    }

    pub fn complete(&mut self, key: &QueryKey, result: Result<V, RemoteError>, now: Instant) {
        let Some(entry) = self.entries.get_mut(key) else {
            debug!("dropping result for evicted query {key:?}");
            return;
        };
        entry.in_flight = false;
        match result {
            Ok(value) => {
                entry.value = Some(value);
                entry.fetched_at = Some(now);
                entry.invalidated = false;
                entry.failures = 0;
                entry.last_error = None;
                entry.failed_at = None;
            }
            Err(err) => {
                entry.failures += 1;
                entry.last_error = Some(err);
                entry.failed_at = Some(now);
            }
        }
    }

    /// Marks the entry stale; its last value stays readable until replaced.
    pub fn invalidate(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.invalidated = true;
            entry.failures = 0;
        }
    }

    pub fn invalidate_where(&mut self, mut predicate: impl FnMut(&QueryKey) -> bool) {
        for (key, entry) in self.entries.iter_mut() {
            if predicate(key) {
                entry.invalidated = true;
                entry.failures = 0;
            }
        }
    }

    /// Manual retry after automatic retries ran out.
    pub fn retry(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.failures = 0;
            entry.failed_at = None;
        }
    }

    pub fn remove(&mut self, key: &QueryKey) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn cache() -> QueryCache<u32> {
        QueryCache::new(CacheSettings {
            stale_after: Duration::from_secs(60),
            max_retries: 2,
            retry_backoff: Duration::from_secs(2),
        })
    }

    #[test]
    fn fetch_once_until_stale() {
        let start = Instant::now();
        let key = QueryKey::Feed { page: 0 };
        let mut cache = cache();

        assert!(cache.should_fetch(&key, start));
        assert!(cache.begin_fetch(&key));
        assert!(!cache.begin_fetch(&key));
        assert!(!cache.should_fetch(&key, start + Duration::from_secs(600)));

        cache.complete(&key, Ok(7), start);
        assert_eq!(cache.get(&key), Some(&7));
        assert!(!cache.should_fetch(&key, start + Duration::from_secs(59)));
        assert!(cache.should_fetch(&key, start + Duration::from_secs(60)));
    }

    #[test]
    fn invalidation_keeps_value_but_requests_refetch() {
        let start = Instant::now();
        let key = QueryKey::UnreadNotifications;
        let other = QueryKey::Feed { page: 1 };
        let mut cache = cache();
        for k in [&key, &other] {
            cache.begin_fetch(k);
            cache.complete(k, Ok(3), start);
        }

        cache.invalidate_where(|k| matches!(k, QueryKey::UnreadNotifications));
        assert!(cache.should_fetch(&key, start));
        assert!(!cache.should_fetch(&other, start));
        assert_eq!(cache.get(&key), Some(&3));
    }

    #[test]
    fn failures_retry_with_backoff_then_stop() {
        let start = Instant::now();
        let key = QueryKey::UserActivities {
            username: "mert".into(),
            page: 0,
        };
        let mut cache = cache();

        cache.begin_fetch(&key);
        cache.complete(&key, Err(RemoteError::new("boom")), start);
        assert!(!cache.should_fetch(&key, start + Duration::from_secs(1)));
        assert!(cache.should_fetch(&key, start + Duration::from_secs(2)));

        cache.begin_fetch(&key);
        cache.complete(&key, Err(RemoteError::new("boom")), start);
        assert!(!cache.should_fetch(&key, start + Duration::from_secs(3)));
        assert!(cache.should_fetch(&key, start + Duration::from_secs(4)));

        cache.begin_fetch(&key);
        cache.complete(&key, Err(RemoteError::new("still down")), start);
        assert!(cache.retries_exhausted(&key));
        assert!(!cache.should_fetch(&key, start + Duration::from_secs(3600)));
        assert_eq!(cache.error(&key).map(|e| e.message()), Some("still down"));

        cache.retry(&key);
        assert!(cache.should_fetch(&key, start));
    }

    #[test]
    fn results_for_removed_keys_are_dropped() {
        let key = QueryKey::Feed { page: 0 };
        let mut cache = cache();
        cache.begin_fetch(&key);
        cache.remove(&key);
        cache.complete(&key, Ok(1), Instant::now());
        assert!(cache.get(&key).is_none());
    }
}
