//! Explicit invalidation of the index cache.

use actix_web::{HttpResponse, web};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub const ADMIN_ROLE: &str = "admin";

/// POST /cache/clear/
pub async fn clear(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    if !identity.has_role(ADMIN_ROLE) {
        tracing::info!(user = %identity.username, "Cache clear refused");
        return Err(AppError::Forbidden);
    }

    let removed = state.index_cache.invalidate().await?;
    tracing::info!(user = %identity.username, removed, "Index cache cleared");
    Ok(HttpResponse::NoContent().finish())
}
