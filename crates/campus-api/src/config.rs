use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub store: StoreConfig,
    pub cache: CacheConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    pub mongodb_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database: String,
    /// Load demo fixtures on startup
    pub seed: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database: "campus".to_string(),
            seed: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub host: String,
    pub port: u16,
    /// Also read from `REDIS_PASSWORD`
    pub password: Option<String>,
    pub default_expiration_secs: u64,
    /// Only bounds the in-process backend
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            default_expiration_secs: 3600,
            max_entries: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn default_expiration(&self) -> Duration {
        Duration::from_secs(self.default_expiration_secs)
    }
}

/// The simulated signed-in user
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub current_user_id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            current_user_id: "user-1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables, `CAMPUS_<SECTION>__<KEY>` (e.g. `CAMPUS_SERVER__PORT`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("CAMPUS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        if cfg.store.backend == StoreBackend::Mongodb {
            cfg.mongodb_uri = std::env::var("MONGODB_URI").map_err(|_| {
                ConfigError::Message(
                    "MONGODB_URI environment variable is required for the mongodb backend"
                        .to_string(),
                )
            })?;
        }

        if cfg.cache.password.is_none() {
            cfg.cache.password = std::env::var("REDIS_PASSWORD").ok().filter(|p| !p.is_empty());
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let cfg: Config = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.default_expiration_secs == 0 {
            return Err(ConfigError::Message(
                "cache.default_expiration_secs must be greater than zero".to_string(),
            ));
        }
        if self.cache.backend == CacheBackend::Redis && self.cache.host.trim().is_empty() {
            return Err(ConfigError::Message(
                "cache.host must not be empty for the redis backend".to_string(),
            ));
        }
        if self.session.current_user_id.trim().is_empty() {
            return Err(ConfigError::Message(
                "session.current_user_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
