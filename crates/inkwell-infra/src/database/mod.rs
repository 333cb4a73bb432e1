//! Storage adapters: an in-memory store and SeaORM/PostgreSQL repositories.

mod memory;

#[cfg(feature = "postgres")]
mod connections;
#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

pub use memory::InMemoryStore;

#[cfg(feature = "postgres")]
pub use connections::{DatabaseConfig, DatabaseConnections};

#[cfg(feature = "postgres")]
pub use postgres_repo::{
    PostgresCommentRepository, PostgresFollowRepository, PostgresGroupRepository,
    PostgresPostRepository, PostgresUserRepository, postgres_repositories,
};

#[cfg(feature = "postgres")]
#[cfg(test)]
mod tests;
