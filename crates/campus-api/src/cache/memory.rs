use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{expiry_after, CacheEntry, CacheError, CacheStore};

#[derive(Debug, Clone)]
struct StoredValue {
    data: Value,
    stored_at: Instant,
    ttl: Duration,
    expires_at: DateTime<Utc>,
}

impl StoredValue {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }
}

/// In-process cache with TTL, bounded by `max_entries`
pub struct MemoryCache {
    store: RwLock<HashMap<String, StoredValue>>,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        {
            let store = self.store.read().await;
            match store.get(key) {
                None => return Ok(None),
                Some(stored) if !stored.is_expired() => {
                    return Ok(Some(CacheEntry {
                        data: stored.data.clone(),
                        expires_at: stored.expires_at,
                    }))
                }
                Some(_) => {}
            }
        }

        // Expired: drop it under the write lock, re-checking in case it was refreshed
        let mut store = self.store.write().await;
        if store.get(key).is_some_and(StoredValue::is_expired) {
            store.remove(key);
            tracing::debug!(key = %key, "Cache entry expired");
        }
        Ok(None)
    }

    async fn set(&self, key: String, data: Value, ttl: Duration) -> Result<CacheEntry, CacheError> {
        let expires_at = expiry_after(ttl)?;

        let mut store = self.store.write().await;
        if !store.contains_key(&key) && store.len() >= self.max_entries {
            store.retain(|_, v| !v.is_expired());
            if store.len() >= self.max_entries {
                return Err(CacheError::Full {
                    max_entries: self.max_entries,
                });
            }
        }

        store.insert(
            key,
            StoredValue {
                data: data.clone(),
                stored_at: Instant::now(),
                ttl,
                expires_at,
            },
        );

        Ok(CacheEntry { data, expires_at })
    }
}
