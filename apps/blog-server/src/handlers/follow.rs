//! Follow and unfollow actions. Both answer with a redirect to the profile.

use actix_web::{HttpResponse, web};

use inkwell_core::services::FollowOutcome;

use super::{profile_url, redirect};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET|POST /profile/{username}/follow/
pub async fn follow(
    state: web::Data<AppState>,
    identity: Identity,
    username: web::Path<String>,
) -> AppResult<HttpResponse> {
    let outcome = state.feed.follow(identity.user_id, &username).await?;

    if outcome == FollowOutcome::SelfFollow {
        tracing::debug!(user = %identity.username, "Self-follow ignored");
    }
    Ok(redirect(&profile_url(&username)?))
}

/// GET|POST /profile/{username}/unfollow/
pub async fn unfollow(
    state: web::Data<AppState>,
    identity: Identity,
    username: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.feed.unfollow(identity.user_id, &username).await?;
    Ok(redirect(&profile_url(&username)?))
}
