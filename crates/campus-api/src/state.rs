use std::sync::Arc;

use campus_persist::{CommunityStore, IdGenerator, MemoryStore, UuidGenerator};

use crate::cache::{CacheStore, MemoryCache, RedisCache};
use crate::config::{CacheBackend, Config, StoreBackend};

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn CommunityStore>,
    pub cache: Arc<dyn CacheStore>,
    pub ids: Arc<dyn IdGenerator>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn CommunityStore>,
        cache: Arc<dyn CacheStore>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            cache,
            ids,
        }
    }

    /// Wire up the configured store and cache with UUID ids
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let store = build_store(&config).await?;
        let cache = build_cache(&config).await?;
        Ok(Self::new(config, store, cache, Arc::new(UuidGenerator)))
    }

    pub fn current_user_id(&self) -> &str {
        &self.config.session.current_user_id
    }
}

async fn build_cache(config: &Config) -> anyhow::Result<Arc<dyn CacheStore>> {
    match config.cache.backend {
        CacheBackend::Memory => {
            tracing::info!(max_entries = config.cache.max_entries, "Using in-process cache");
            Ok(Arc::new(MemoryCache::new(config.cache.max_entries)))
        }
        CacheBackend::Redis => {
            let cache = RedisCache::connect(&config.cache).await?;
            Ok(Arc::new(cache))
        }
    }
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn CommunityStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            let store = if config.store.seed {
                tracing::info!("Using in-memory store with seed fixtures");
                MemoryStore::with_fixtures(campus_persist::seed::fixtures())
            } else {
                tracing::info!("Using empty in-memory store");
                MemoryStore::new()
            };
            Ok(Arc::new(store))
        }
        #[cfg(feature = "mongodb")]
        StoreBackend::Mongodb => {
            tracing::info!("Connecting to MongoDB");
            let store =
                campus_persist::MongoStore::connect(&config.mongodb_uri, &config.store.database)
                    .await?;
            if config.store.seed {
                store.seed(campus_persist::seed::fixtures()).await?;
            }
            tracing::info!("MongoDB connected");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mongodb"))]
        StoreBackend::Mongodb => {
            anyhow::bail!("this build does not include the mongodb backend")
        }
    }
}
