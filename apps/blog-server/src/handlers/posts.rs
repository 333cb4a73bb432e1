//! Post detail, authoring and comments.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use inkwell_core::services::{CommentForm, EditOutcome, PostForm};

use super::{profile_url, redirect, render};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn detail_url(post_id: Uuid) -> String {
    format!("/posts/{post_id}/")
}

/// GET /posts/{post_id}/
pub async fn detail(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let detail = state.posts.detail(*post_id).await?;
    Ok(HttpResponse::Ok().json(render::detail(detail)))
}

/// POST /create/
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .create(identity.user_id, form.into_inner())
        .await?;

    Ok(redirect(&profile_url(&identity.username)?))
}

/// POST /posts/{post_id}/edit/
///
/// Someone other than the author is sent back to the index and nothing changes.
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let post_id = post_id.into_inner();

    match state
        .posts
        .edit(identity.user_id, post_id, form.into_inner())
        .await?
    {
        EditOutcome::Updated(post) => Ok(redirect(&detail_url(post.id))),
        EditOutcome::Denied(_) => Ok(redirect("/")),
    }
}

/// POST /posts/{post_id}/comment/
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let post_id = post_id.into_inner();
    state
        .posts
        .comment(identity.user_id, post_id, form.into_inner())
        .await?;

    Ok(redirect(&detail_url(post_id)))
}
