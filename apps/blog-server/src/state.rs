//! Application state - shared across all handlers.

use std::sync::Arc;

use inkwell_core::ports::{Cache, Repositories, TokenService};
use inkwell_core::services::{FeedService, PageCache, PostService};
use inkwell_infra::{InMemoryCache, InMemoryStore, JwtTokenService};

#[cfg(feature = "postgres")]
use inkwell_infra::database::{DatabaseConfig, DatabaseConnections, postgres_repositories};

#[cfg(feature = "redis")]
use inkwell_infra::{RedisCache, RedisConfig};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    /// Gate in front of the rendered global listing.
    pub index_cache: Arc<PageCache>,
    pub tokens: Arc<dyn TokenService>,
    pub login_url: String,
    /// Name of the storage backend, reported by the health check.
    pub storage: &'static str,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state, falling back to in-memory backends for
    /// anything that is not configured or cannot be reached.
    pub async fn new(config: &AppConfig) -> Self {
        let cache = build_cache(config).await;
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));

        #[cfg(feature = "postgres")]
        {
            if let Some(connections) = connect_database(config).await {
                let connections = Arc::new(connections);
                let repos = postgres_repositories(connections.main.clone());
                let mut state = Self::from_parts(repos, cache, tokens, config);
                state.storage = "postgres";
                state.db = Some(connections);
                return state;
            }
        }

        Self::from_parts(in_memory_repositories(), cache, tokens, config)
    }

    /// Assemble state from already constructed adapters.
    pub fn from_parts(
        repos: Repositories,
        cache: Arc<dyn Cache>,
        tokens: Arc<dyn TokenService>,
        config: &AppConfig,
    ) -> Self {
        let index_cache = PageCache::new(
            cache,
            config.index_cache_prefix.clone(),
            config.index_cache_ttl,
        );

        tracing::info!(
            cache_prefix = %config.index_cache_prefix,
            cache_ttl_secs = config.index_cache_ttl.as_secs(),
            "Application state initialized"
        );

        Self {
            feed: Arc::new(FeedService::new(repos.clone())),
            posts: Arc::new(PostService::new(repos)),
            index_cache: Arc::new(index_cache),
            tokens,
            login_url: config.login_url.clone(),
            storage: "memory",
            #[cfg(feature = "postgres")]
            db: None,
        }
    }
}

fn in_memory_repositories() -> Repositories {
    tracing::warn!("Running without a database (in-memory mode). Data is lost on restart.");
    Arc::new(InMemoryStore::new()).repositories()
}

#[cfg(feature = "postgres")]
async fn connect_database(config: &AppConfig) -> Option<DatabaseConnections> {
    let Some(url) = config.database_url.clone() else {
        tracing::warn!("DATABASE_URL not set.");
        return None;
    };

    let db_config = DatabaseConfig {
        url,
        max_connections: config.db_max_connections,
        min_connections: config.db_min_connections,
    };

    match DatabaseConnections::init(&db_config).await {
        Ok(connections) => Some(connections),
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
            None
        }
    }
}

#[cfg(feature = "redis")]
async fn build_cache(config: &AppConfig) -> Arc<dyn Cache> {
    if let Some(url) = &config.redis_url {
        match RedisCache::new(RedisConfig::new(url.clone())).await {
            Ok(cache) => return Arc::new(cache),
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to Redis. Using in-memory cache.");
            }
        }
    }
    Arc::new(InMemoryCache::new())
}

#[cfg(not(feature = "redis"))]
async fn build_cache(_config: &AppConfig) -> Arc<dyn Cache> {
    Arc::new(InMemoryCache::new())
}
