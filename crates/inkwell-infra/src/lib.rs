//! # Inkwell Infrastructure
//!
//! Concrete implementations of the ports defined in `inkwell-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory adapters only
//! - `postgres` - PostgreSQL storage via SeaORM
//! - `auth` - JWT token validation
//! - `redis` - Redis-backed page cache

pub mod cache;
pub mod database;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use cache::InMemoryCache;
pub use database::InMemoryStore;

#[cfg(feature = "postgres")]
pub use database::{DatabaseConfig, DatabaseConnections};

#[cfg(feature = "auth")]
pub use auth::JwtTokenService;

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
