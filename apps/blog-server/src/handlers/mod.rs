//! HTTP handlers and route configuration.

mod cache;
mod follow;
mod health;
mod listing;
mod posts;
mod render;


use actix_web::{HttpRequest, HttpResponse, http::header, web};
use url::Url;

use inkwell_shared::ErrorResponse;

use crate::middleware::error::AppError;
use crate::observability::RequestId;

/// Only the path of this base ever reaches a response.
const PATH_BASE: &str = "http://inkwell.invalid/";

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(listing::index))
        .route("/health", web::get().to(health::health_check))
        .route("/group/{slug}/", web::get().to(listing::group_posts))
        .route("/follow/", web::get().to(listing::follow_index))
        .route("/profile/{username}/", web::get().to(listing::profile))
        .service(
            web::resource("/profile/{username}/follow/")
                .route(web::get().to(follow::follow))
                .route(web::post().to(follow::follow)),
        )
        .service(
            web::resource("/profile/{username}/unfollow/")
                .route(web::get().to(follow::unfollow))
                .route(web::post().to(follow::unfollow)),
        )
        .route("/create/", web::post().to(posts::create))
        .route("/posts/{post_id}/", web::get().to(posts::detail))
        .route("/posts/{post_id}/edit/", web::post().to(posts::edit))
        .route("/posts/{post_id}/comment/", web::post().to(posts::add_comment))
        .route("/cache/clear/", web::post().to(cache::clear));
}

/// Fallback for unmapped paths: a 404 problem document naming the path.
pub async fn not_found(req: HttpRequest, request_id: RequestId) -> HttpResponse {
    let path = req.path().to_string();
    tracing::debug!(path = %path, "No route matched");

    HttpResponse::NotFound().json(
        ErrorResponse::not_found(format!("No route for {path}"))
            .with_instance(path)
            .with_request_id(request_id.as_str()),
    )
}

/// `/profile/<username>/` with the username percent-encoded as one path segment.
pub(crate) fn profile_url(username: &str) -> Result<String, AppError> {
    let mut url = Url::parse(PATH_BASE).map_err(|e| AppError::Internal(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| AppError::Internal("redirect base cannot carry a path".to_string()))?
        .clear()
        .extend(["profile", username, ""]);
    Ok(url.path().to_string())
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}
