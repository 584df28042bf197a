use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{expiry_after, CacheEntry, CacheError, CacheStore};
use crate::config::CacheConfig;

/// Stored form of an entry. Redis owns the expiry; `expires_at` is kept so
/// reads can report it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    data: Value,
    expires_at: DateTime<Utc>,
}

fn backend_error(err: redis::RedisError) -> CacheError {
    CacheError::Backend(err.to_string())
}

fn encode(entry: &CacheEntry) -> Result<String, CacheError> {
    serde_json::to_string(&Envelope {
        data: entry.data.clone(),
        expires_at: entry.expires_at,
    })
    .map_err(|e| CacheError::Backend(e.to_string()))
}

fn decode(key: &str, raw: &str) -> Result<CacheEntry, CacheError> {
    let envelope: Envelope = serde_json::from_str(raw)
        .map_err(|e| CacheError::Backend(format!("corrupt entry under {}: {}", key, e)))?;
    Ok(CacheEntry {
        data: envelope.data,
        expires_at: envelope.expires_at,
    })
}

/// Whole seconds for `SET EX`, rounded up so entries never expire early
fn expire_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

/// Cache backed by a Redis server
#[derive(Clone)]
pub struct RedisCache {
    connection: MultiplexedConnection,
}

impl RedisCache {
    /// Connect using `cache.host`, `cache.port` and `cache.password`
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: RedisConnectionInfo {
                password: config.password.clone(),
                ..Default::default()
            },
        };
        let client = redis::Client::open(info).map_err(backend_error)?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend_error)?;

        tracing::info!(host = %config.host, port = config.port, "Connected to Redis");
        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut connection)
            .await
            .map_err(backend_error)?;

        raw.map(|raw| decode(key, &raw)).transpose()
    }

    async fn set(&self, key: String, data: Value, ttl: Duration) -> Result<CacheEntry, CacheError> {
        let entry = CacheEntry {
            data,
            expires_at: expiry_after(ttl)?,
        };
        let payload = encode(&entry)?;

        let mut connection = self.connection.clone();
        let _: () = redis::cmd("SET")
            .arg(&key)
            .arg(payload)
            .arg("EX")
            .arg(expire_seconds(ttl))
            .query_async(&mut connection)
            .await
            .map_err(backend_error)?;

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expire_seconds_rounds_up() {
        assert_eq!(expire_seconds(Duration::from_secs(3600)), 3600);
        assert_eq!(expire_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(expire_seconds(Duration::from_millis(10)), 1);
    }

    #[test]
    fn test_envelope_keeps_data_and_expiry() {
        let entry = CacheEntry {
            data: json!({"modules": [1, 2]}),
            expires_at: Utc::now(),
        };
        let raw = encode(&entry).unwrap();
        assert_eq!(decode("k", &raw).unwrap(), entry);
    }

    #[test]
    fn test_corrupt_entry_is_backend_error() {
        let err = decode("k", "not json").unwrap_err();
        assert!(matches!(err, CacheError::Backend(msg) if msg.contains("k")));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_backend_error() {
        let config = CacheConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..CacheConfig::default()
        };
        let result = RedisCache::connect(&config).await;
        assert!(matches!(result, Err(CacheError::Backend(_))));
    }
}
