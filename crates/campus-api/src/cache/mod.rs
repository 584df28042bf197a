use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

mod memory;
mod redis_store;

pub use memory::MemoryCache;
pub use redis_store::RedisCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache is full ({max_entries} entries)")]
    Full { max_entries: usize },

    #[error("invalid expiration: {0}")]
    InvalidExpiration(String),

    #[error("cache backend failure: {0}")]
    Backend(String),
}

/// A cached value and when it stops being served
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub data: Value,
    pub expires_at: DateTime<Utc>,
}

/// Key/value store with per-entry expiration
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a live entry; expired entries read as missing
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Store `data` under `key` for `ttl`, replacing any previous value
    async fn set(&self, key: String, data: Value, ttl: Duration) -> Result<CacheEntry, CacheError>;
}

/// Wall-clock instant at which an entry stored now for `ttl` expires
fn expiry_after(ttl: Duration) -> Result<DateTime<Utc>, CacheError> {
    let ttl_chrono = chrono::Duration::from_std(ttl)
        .map_err(|e| CacheError::InvalidExpiration(e.to_string()))?;
    Utc::now()
        .checked_add_signed(ttl_chrono)
        .ok_or_else(|| CacheError::InvalidExpiration(format!("{:?} is too far out", ttl)))
}
