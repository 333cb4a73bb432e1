//! Time-boxed cache around a rendered listing page.
//!
//! Entries are keyed `<prefix>:<variant>` where the variant names the resolved
//! page, so sub-pages never share an entry. Writes to the underlying feed do
//! not touch the cache: a rendered page stays as it was until it expires or
//! [`PageCache::invalidate`] runs.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::DomainError;
use crate::ports::{Cache, CacheError};

/// A rendered body and whether it came from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    pub body: String,
    pub hit: bool,
}

pub struct PageCache {
    cache: Arc<dyn Cache>,
    prefix: String,
    ttl: Duration,
}

impl PageCache {
    pub const DEFAULT_PREFIX: &'static str = "index_page";
    pub const DEFAULT_TTL: Duration = Duration::from_secs(20);

    pub fn new(cache: Arc<dyn Cache>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
            ttl,
        }
    }

    pub fn key(&self, variant: &str) -> String {
        format!("{}:{}", self.prefix, variant)
    }

    /// Serve the cached body for `variant`, or render, store and serve a fresh one.
    ///
    /// Render errors are returned and nothing is cached. A failed cache write is
    /// logged and the fresh body is still served.
    pub async fn get_or_render<F, Fut>(
        &self,
        variant: &str,
        render: F,
    ) -> Result<CachedPage, DomainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, DomainError>>,
    {
        let key = self.key(variant);

        if let Some(body) = self.cache.get(&key).await {
            tracing::debug!(cache = %key, outcome = "hit", "Serving cached page");
            return Ok(CachedPage { body, hit: true });
        }

        tracing::debug!(cache = %key, outcome = "miss", "Rendering page");
        let body = render().await?;

        if let Err(e) = self.cache.set(&key, &body, Some(self.ttl)).await {
            tracing::warn!(cache = %key, error = %e, "Failed to store rendered page");
        }

        Ok(CachedPage { body, hit: false })
    }

    /// Drop every cached variant of this page.
    pub async fn invalidate(&self) -> Result<usize, CacheError> {
        let removed = self.cache.delete_prefix(&format!("{}:", self.prefix)).await?;
        tracing::info!(prefix = %self.prefix, removed, "Page cache invalidated");
        Ok(removed)
    }
}
