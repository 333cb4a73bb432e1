//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub storage: &'static str,
    pub timestamp: String,
}

/// Liveness probe. Reports `degraded` when the database stops answering.
///
/// GET /health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let status = if database_reachable(&state).await {
        "ok"
    } else {
        "degraded"
    };

    HttpResponse::Ok().json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(feature = "postgres")]
async fn database_reachable(state: &AppState) -> bool {
    match &state.db {
        Some(db) => match db.main.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Database ping failed");
                false
            }
        },
        None => true,
    }
}

#[cfg(not(feature = "postgres"))]
async fn database_reachable(_state: &AppState) -> bool {
    true
}
