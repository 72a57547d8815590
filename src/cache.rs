//! In-memory content cache for extracted articles.
//!
//! Entries are keyed by a SHA-256 digest of the article URL and expire after
//! a fixed TTL. Expired entries are dropped lazily on lookup or in bulk by
//! [`ContentCache::cleanup_expired`].

use crate::dedup::content_hash;
use crate::models::ExtractedContent;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    content: ExtractedContent,
    /// Hash of the cached body, checked on every hit.
    content_hash: String,
    stored_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ContentCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl ContentCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, url: &str) -> Option<ExtractedContent> {
        self.get_at(url, Utc::now())
    }

    pub fn insert(&self, url: &str, content: ExtractedContent) {
        self.insert_at(url, content, Utc::now());
    }

    pub fn get_at(&self, url: &str, now: DateTime<Utc>) -> Option<ExtractedContent> {
        let key = cache_key(url);
        let mut entries = self.entries.lock().ok()?;
        let entry = entries.get(&key)?;

        if now - entry.stored_at > self.ttl {
            debug!(%url, "Cache entry expired");
            entries.remove(&key);
            return None;
        }
        if content_hash(&entry.content.content) != entry.content_hash {
            debug!(%url, "Cache entry hash mismatch");
            entries.remove(&key);
            return None;
        }
        debug!(%url, "Cache hit");
        Some(entry.content.clone())
    }

    pub fn insert_at(&self, url: &str, content: ExtractedContent, now: DateTime<Utc>) {
        let entry = CacheEntry {
            content_hash: content_hash(&content.content),
            content,
            stored_at: now,
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(cache_key(url), entry);
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn cleanup_expired(&self, now: DateTime<Utc>) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, entry| now - entry.stored_at <= self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }
}
