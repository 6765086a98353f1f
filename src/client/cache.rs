//! In-memory GET response cache.
//!
//! Entries expire after a fixed TTL and are evicted in insertion order once the
//! cache is full. Reads never refresh an entry's position, so eviction is FIFO
//! rather than LRU.
//!
//! Network writes are fenced by tickets: a request takes a ticket from
//! [`ResponseCache::issue`] before it goes out and hands it back with the
//! payload. A payload is rejected if the key already holds data from a later
//! ticket, or if the cache was cleared or invalidated after the ticket was
//! issued.

use super::types::Method;
use indexmap::IndexMap;
use std::time::Duration;
use tokio::time::Instant;

/// Build the cache key for a request: `METHOD:url:body`.
pub fn cache_key(method: Method, url: &str, body: Option<&str>) -> String {
    format!("{}:{}:{}", method, url, body.unwrap_or_default())
}

/// A cached response envelope.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub data: serde_json::Value,
    pub stored_at: Instant,
    /// Ticket of the request that produced `data`.
    pub ticket: u64,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() > ttl
    }
}

/// Bounded TTL cache keyed by [`cache_key`].
#[derive(Debug)]
pub struct ResponseCache {
    entries: IndexMap<String, CacheEntry>,
    ttl: Duration,
    max_size: usize,
    last_ticket: u64,
    /// Tickets at or below this were issued before the last clear.
    floor: u64,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            ttl,
            max_size: max_size.max(1),
            last_ticket: 0,
            floor: 0,
        }
    }

    /// Return the cached payload if present and not older than the TTL.
    /// Expired entries are dropped on the way out.
    pub fn get(&mut self, key: &str) -> Option<serde_json::Value> {
        let expired = self.entries.get(key)?.is_expired(self.ttl);
        if expired {
            tracing::trace!(key, "Cache entry expired");
            self.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.data.clone())
    }

    /// Hand out the next write ticket.
    pub fn issue(&mut self) -> u64 {
        self.last_ticket += 1;
        self.last_ticket
    }

    /// Store a payload as the newest data for `key`.
    pub fn insert(&mut self, key: String, data: serde_json::Value) {
        let ticket = self.issue();
        self.store(key, data, ticket);
    }

    /// Store a payload fetched under `ticket`.
    ///
    /// Returns `false` and leaves the cache untouched when the payload is
    /// older than what the cache already knows about.
    pub fn insert_issued(&mut self, key: String, data: serde_json::Value, ticket: u64) -> bool {
        if ticket <= self.floor {
            tracing::debug!(key = %key, ticket, "Dropped response issued before cache reset");
            return false;
        }
        if let Some(existing) = self.entries.get(&key) {
            if existing.ticket > ticket {
                tracing::debug!(
                    key = %key,
                    ticket,
                    newer = existing.ticket,
                    "Dropped response older than cached entry"
                );
                return false;
            }
        }
        self.store(key, data, ticket);
        true
    }

    fn store(&mut self, key: String, data: serde_json::Value, ticket: u64) {
        self.entries.shift_remove(&key);

        while self.entries.len() >= self.max_size {
            let Some((oldest, _)) = self.entries.shift_remove_index(0) else {
                break;
            };
            tracing::debug!(key = %oldest, "Evicted oldest cache entry");
        }

        self.entries.insert(
            key.clone(),
            CacheEntry {
                key,
                data,
                stored_at: Instant::now(),
                ticket,
            },
        );
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.shift_remove(key).is_some()
    }

    /// Drop every entry whose key contains `fragment` (typically an endpoint path).
    /// Requests already in flight will not repopulate the cache.
    pub fn remove_matching(&mut self, fragment: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.contains(fragment));
        self.floor = self.last_ticket;
        before - self.entries.len()
    }

    /// Drop all expired entries, returning how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(ttl));
        before - self.entries.len()
    }

    /// Drop every entry. Requests already in flight will not repopulate the cache.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.floor = self.last_ticket;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order, oldest first.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache(max_size: usize) -> ResponseCache {
        ResponseCache::new(Duration::from_secs(60), max_size)
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(
            cache_key(Method::Get, "http://glpi/api/tickets", None),
            "GET:http://glpi/api/tickets:"
        );
        assert_eq!(
            cache_key(Method::Post, "http://glpi/api/search", Some("{\"q\":1}")),
            "POST:http://glpi/api/search:{\"q\":1}"
        );
    }

    #[test]
    fn test_insert_then_get() {
        let mut cache = cache(10);
        cache.insert("a".to_string(), json!({"success": true}));
        assert_eq!(cache.get("a"), Some(json!({"success": true})));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_eviction_drops_oldest_insert() {
        let mut cache = cache(2);
        cache.insert("A".to_string(), json!(1));
        cache.insert("B".to_string(), json!(2));
        cache.insert("C".to_string(), json!(3));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys(), vec!["B".to_string(), "C".to_string()]);
        assert_eq!(cache.get("A"), None);
    }

    #[test]
    fn test_reads_do_not_change_eviction_order() {
        let mut cache = cache(2);
        cache.insert("A".to_string(), json!(1));
        cache.insert("B".to_string(), json!(2));
        // Reading A would save it under LRU, but eviction is by insertion order.
        assert!(cache.get("A").is_some());
        cache.insert("C".to_string(), json!(3));

        assert_eq!(cache.get("A"), None);
        assert!(cache.get("B").is_some());
    }

    #[test]
    fn test_reinsert_existing_key_does_not_evict() {
        let mut cache = cache(2);
        cache.insert("A".to_string(), json!(1));
        cache.insert("B".to_string(), json!(2));
        cache.insert("B".to_string(), json!(20));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("A"), Some(json!(1)));
        assert_eq!(cache.get("B"), Some(json!(20)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let mut cache = ResponseCache::new(Duration::from_secs(30), 10);
        cache.insert("a".to_string(), json!(1));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(cache.get("a").is_some(), "age equal to TTL is still fresh");

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let mut cache = ResponseCache::new(Duration::from_secs(10), 10);
        cache.insert("old".to_string(), json!(1));
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.insert("new".to_string(), json!(2));
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.keys(), vec!["new".to_string()]);
    }

    #[test]
    fn test_remove_matching() {
        let mut cache = cache(10);
        cache.insert(cache_key(Method::Get, "http://h/api/tickets?a=1", None), json!(1));
        cache.insert(cache_key(Method::Get, "http://h/api/tickets?a=2", None), json!(2));
        cache.insert(cache_key(Method::Get, "http://h/api/levels", None), json!(3));

        assert_eq!(cache.remove_matching("/api/tickets"), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.keys().len(), 1);
    }

    #[test]
    fn test_older_ticket_does_not_replace_newer_entry() {
        let mut cache = cache(10);
        let slow = cache.issue();
        let fast = cache.issue();

        assert!(cache.insert_issued("k".to_string(), json!("fresh"), fast));
        assert!(!cache.insert_issued("k".to_string(), json!("stale"), slow));
        assert_eq!(cache.get("k"), Some(json!("fresh")));
    }

    #[test]
    fn test_older_ticket_fills_empty_key() {
        let mut cache = cache(10);
        let slow = cache.issue();
        let _fast = cache.issue();

        assert!(cache.insert_issued("k".to_string(), json!(1), slow));
        assert_eq!(cache.get("k"), Some(json!(1)));
    }

    #[test]
    fn test_clear_rejects_tickets_issued_before_it() {
        let mut cache = cache(10);
        let before = cache.issue();
        cache.clear();
        let after = cache.issue();

        assert!(!cache.insert_issued("a".to_string(), json!(1), before));
        assert!(cache.insert_issued("b".to_string(), json!(2), after));
        assert_eq!(cache.keys(), vec!["b".to_string()]);
    }

    #[test]
    fn test_remove_matching_rejects_in_flight_tickets() {
        let mut cache = cache(10);
        let in_flight = cache.issue();
        cache.remove_matching("/api/tickets");

        assert!(!cache.insert_issued("GET:http://h/api/tickets:".to_string(), json!(1), in_flight));
        assert!(cache.is_empty());
    }
}
