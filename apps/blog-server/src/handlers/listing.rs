//! Listing pages: global index, group, profile and follow feed.

use actix_web::{HttpResponse, http::header::ContentType, web};
use serde::Deserialize;

use inkwell_core::PageRequest;
use inkwell_core::error::DomainError;

use super::render;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

pub const CACHE_STATUS_HEADER: &str = "X-Cache";

/// `?page=` as sent by the client; anything unparseable means page 1.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref())
    }
}

/// GET /
///
/// Served through the index cache: posts written or deleted after a page was
/// rendered stay invisible on it until the entry expires or is cleared. The
/// entry is picked by the page the request resolves to.
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let window = state.feed.resolve_global(query.request()).await?;
    let feed = state.feed.clone();

    let page = state
        .index_cache
        .get_or_render(&window.cache_key(), || async move {
            let page = feed.global_at(window).await?;
            serde_json::to_string(&render::listing(page))
                .map_err(|e| DomainError::Internal(e.to_string()))
        })
        .await?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .insert_header((CACHE_STATUS_HEADER, if page.hit { "HIT" } else { "MISS" }))
        .body(page.body))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let feed = state.feed.group(&slug, query.request()).await?;

    let mut listing = render::listing(feed.page);
    listing.group = Some(render::group(&feed.group));
    Ok(HttpResponse::Ok().json(listing))
}

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let profile = state
        .feed
        .profile(&username, viewer.user_id(), query.request())
        .await?;

    let mut listing = render::listing(profile.page);
    listing.author = Some(render::author(&profile.author));
    listing.following = Some(profile.following);
    Ok(HttpResponse::Ok().json(listing))
}

/// GET /follow/
pub async fn follow_index(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .feed
        .follow_feed(identity.user_id, query.request())
        .await?;

    let mut listing = render::listing(page);
    listing.follow = Some(true);
    Ok(HttpResponse::Ok().json(listing))
}
