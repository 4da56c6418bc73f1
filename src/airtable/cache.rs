use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::models::ArticleRecord;

struct CacheEntry {
    fetched_at: Instant,
    records: Vec<ArticleRecord>,
}

/// TTL cache for fetched article lists, keyed by requested limit.
///
/// An entry for one limit is never served for another.
pub struct ResponseCache {
    ttl: Duration,
    entries: RwLock<HashMap<u32, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get the cached records for `limit`, or None if missing or stale
    pub async fn get(&self, limit: u32) -> Option<Vec<ArticleRecord>> {
        let entries = self.entries.read().await;
        entries
            .get(&limit)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.records.clone())
    }

    /// Store records for `limit`, replacing any previous entry.
    ///
    /// Stale entries are dropped here so the map stays bounded even when
    /// requests cycle through many distinct limits.
    pub async fn put(&self, limit: u32, records: Vec<ArticleRecord>) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
        entries.insert(
            limit,
            CacheEntry {
                fetched_at: Instant::now(),
                records,
            },
        );
    }
}
