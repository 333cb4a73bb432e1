//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use inkwell_core::services::PageCache;
use inkwell_infra::auth::JwtConfig;

pub const DEFAULT_LOGIN_URL: &str = "/auth/login/";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Absent means the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    /// Absent means the in-process cache.
    pub redis_url: Option<String>,
    pub index_cache_ttl: Duration,
    pub index_cache_prefix: String,
    /// Where unauthenticated users are sent, with `?next=<path>` appended.
    pub login_url: String,
    pub jwt: JwtConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source. Unparseable values fall
    /// back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let jwt_defaults = JwtConfig::default();

        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed(&lookup, "PORT").unwrap_or(8080),
            database_url: lookup("DATABASE_URL").filter(|v| !v.is_empty()),
            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS").unwrap_or(100),
            db_min_connections: parsed(&lookup, "DB_MIN_CONNECTIONS").unwrap_or(10),
            redis_url: lookup("REDIS_URL").filter(|v| !v.is_empty()),
            index_cache_ttl: parsed(&lookup, "INDEX_CACHE_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(PageCache::DEFAULT_TTL),
            index_cache_prefix: lookup("INDEX_CACHE_PREFIX")
                .unwrap_or_else(|| PageCache::DEFAULT_PREFIX.to_string()),
            login_url: lookup("LOGIN_URL").unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string()),
            jwt: JwtConfig {
                secret: lookup("JWT_SECRET").unwrap_or(jwt_defaults.secret),
                expiration_hours: parsed(&lookup, "JWT_EXPIRATION_HOURS")
                    .unwrap_or(jwt_defaults.expiration_hours),
                issuer: lookup("JWT_ISSUER").unwrap_or(jwt_defaults.issuer),
            },
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}
