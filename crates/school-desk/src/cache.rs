use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Freshness windows tiered by volatility.
pub mod stale {
    use std::time::Duration;

    pub const LIST: Duration = Duration::from_secs(120);
    pub const DETAIL: Duration = Duration::from_secs(300);
    pub const STATS: Duration = Duration::from_secs(300);
    pub const SEARCH: Duration = Duration::from_secs(60);
}

/// Resource family a key belongs to; invalidation after a mutation operates
/// on whole families so a typo can never silently no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    SchoolYears,
    Tenants,
    AccessRequests,
}

/// Structured cache key: the resource family plus the normalized parameters
/// that distinguish one query from another. Two filter combinations hash to
/// two entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    SchoolYearList(Vec<(String, String)>),
    SchoolYearDetail(String),
    TenantYearList(String),
    SchoolYearStats(Option<String>),
    TenantList(Vec<(String, String)>),
    TenantDetail(String),
    AccessRequestList(String),
}

impl QueryKey {
    pub const fn family(&self) -> KeyFamily {
        match self {
            Self::SchoolYearList(_)
            | Self::SchoolYearDetail(_)
            | Self::TenantYearList(_)
            | Self::SchoolYearStats(_) => KeyFamily::SchoolYears,
            Self::TenantList(_) | Self::TenantDetail(_) => KeyFamily::Tenants,
            Self::AccessRequestList(_) => KeyFamily::AccessRequests,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: serde_json::Value,
    fetched_at: Instant,
}

/// Query result cache shared across screens. Values are stored as JSON
/// snapshots so one cache serves every response type.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value when it is younger than `max_age`.
    pub fn lookup<T: DeserializeOwned>(&self, key: &QueryKey, max_age: Duration) -> Option<T> {
        let guard = self.entries.lock().expect("cache mutex poisoned");
        let entry = guard.get(key)?;
        if entry.fetched_at.elapsed() >= max_age {
            return None;
        }
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub fn put<T: Serialize>(&self, key: QueryKey, value: &T) {
        let snapshot = match serde_json::to_value(value) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(error = %err, "failed to snapshot query result; skipping cache");
                return;
            }
        };
        let mut guard = self.entries.lock().expect("cache mutex poisoned");
        guard.insert(
            key,
            CacheEntry {
                value: snapshot,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drops every entry in the family, lists and stats included.
    pub fn invalidate_family(&self, family: KeyFamily) {
        let mut guard = self.entries.lock().expect("cache mutex poisoned");
        guard.retain(|key, _| key.family() != family);
    }

    pub fn clear(&self) {
        let mut guard = self.entries.lock().expect("cache mutex poisoned");
        guard.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_key(tenant: &str) -> QueryKey {
        QueryKey::SchoolYearList(vec![("tenantId".to_string(), tenant.to_string())])
    }

    #[test]
    fn distinct_filter_params_cache_independently() {
        let cache = QueryCache::new();
        cache.put(list_key("t1"), &vec!["a"]);
        cache.put(list_key("t2"), &vec!["b"]);

        let hit: Option<Vec<String>> = cache.lookup(&list_key("t1"), stale::LIST);
        assert_eq!(hit, Some(vec!["a".to_string()]));
        assert_eq!(cache.len(), 2);
        assert!(!cache.is_empty());
    }

    #[test]
    fn family_invalidation_spares_other_families() {
        let cache = QueryCache::new();
        cache.put(list_key("t1"), &1u32);
        cache.put(QueryKey::SchoolYearStats(Some("t1".to_string())), &2u32);
        cache.put(QueryKey::TenantList(Vec::new()), &3u32);

        cache.invalidate_family(KeyFamily::SchoolYears);

        assert!(cache
            .lookup::<u32>(&list_key("t1"), stale::LIST)
            .is_none());
        assert!(cache
            .lookup::<u32>(&QueryKey::SchoolYearStats(Some("t1".to_string())), stale::STATS)
            .is_none());
        assert_eq!(
            cache.lookup::<u32>(&QueryKey::TenantList(Vec::new()), stale::LIST),
            Some(3)
        );
    }

    #[test]
    fn expired_entries_are_not_returned() {
        let cache = QueryCache::new();
        cache.put(list_key("t1"), &1u32);
        let hit: Option<u32> = cache.lookup(&list_key("t1"), Duration::ZERO);
        assert!(hit.is_none());
    }
}
