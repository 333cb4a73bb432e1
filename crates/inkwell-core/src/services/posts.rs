//! Post authoring, editing and comments.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Comment, Post, PostCard, User};
use crate::error::{DomainError, RepoError};
use crate::ports::{BaseRepository, Repositories};

use super::feed::compose_cards;

/// Submitted post form. `group` is a group slug.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

/// Why an edit was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotAuthor,
}

/// Outcome of a capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied(DenyReason),
}

/// Only the author may edit a post.
pub fn edit_access(post: &Post, editor: Uuid) -> Access {
    if post.is_authored_by(editor) {
        Access::Allowed
    } else {
        Access::Denied(DenyReason::NotAuthor)
    }
}

#[derive(Debug, Clone)]
pub enum EditOutcome {
    Updated(Post),
    /// Nothing was written.
    Denied(DenyReason),
}

/// A comment with its author, if the author still exists.
#[derive(Debug, Clone)]
pub struct CommentCard {
    pub comment: Comment,
    pub author: Option<User>,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub card: PostCard,
    /// Newest first.
    pub comments: Vec<CommentCard>,
}

pub struct PostService {
    repos: Repositories,
}

impl PostService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Publish a new post by `author`.
    pub async fn create(&self, author: Uuid, form: PostForm) -> Result<Post, DomainError> {
        let text = required_text(&form.text, "text")?;
        let group_id = self.resolve_group(form.group.as_deref()).await?;

        let post = Post::new(author, text, group_id, non_blank(form.image));
        let post = self.repos.posts.save(post).await?;

        tracing::info!(post_id = %post.id, author = %author, "Post created");
        Ok(post)
    }

    pub async fn detail(&self, post_id: Uuid) -> Result<PostDetail, DomainError> {
        let post = self.find_post(post_id).await?;
        let card = compose_cards(&self.repos, vec![post])
            .await?
            .pop()
            .ok_or_else(|| DomainError::Internal("post card composition lost the post".into()))?;

        let comments = self.repos.comments.list_for_post(post_id).await?;
        let mut cards = Vec::with_capacity(comments.len());
        for comment in comments {
            let author = match comment.author_id {
                Some(author_id) => self.repos.users.find_by_id(author_id).await?,
                None => None,
            };
            cards.push(CommentCard { comment, author });
        }

        Ok(PostDetail {
            card,
            comments: cards,
        })
    }

    /// Edit a post on behalf of `editor`. Non-authors get `Denied` and nothing is stored;
    /// the ownership check runs before the form is validated.
    pub async fn edit(
        &self,
        editor: Uuid,
        post_id: Uuid,
        form: PostForm,
    ) -> Result<EditOutcome, DomainError> {
        let mut post = self.find_post(post_id).await?;

        if let Access::Denied(reason) = edit_access(&post, editor) {
            tracing::info!(post_id = %post_id, editor = %editor, ?reason, "Edit denied");
            return Ok(EditOutcome::Denied(reason));
        }

        post.text = required_text(&form.text, "text")?;
        post.group_id = self.resolve_group(form.group.as_deref()).await?;
        if let Some(image) = non_blank(form.image) {
            post.image = Some(image);
        }

        let post = match self.repos.posts.update(post).await {
            Err(RepoError::NotFound) => {
                return Err(DomainError::not_found("post", post_id.to_string()));
            }
            result => result?,
        };
        tracing::debug!(post_id = %post.id, "Post updated");
        Ok(EditOutcome::Updated(post))
    }

    pub async fn comment(
        &self,
        author: Uuid,
        post_id: Uuid,
        form: CommentForm,
    ) -> Result<Comment, DomainError> {
        let post = self.find_post(post_id).await?;
        let text = required_text(&form.text, "text")?;

        let comment = self
            .repos
            .comments
            .save(Comment::new(post.id, author, text))
            .await?;
        tracing::debug!(post_id = %post.id, comment_id = %comment.id, "Comment added");
        Ok(comment)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id.to_string()))
    }

    async fn resolve_group(&self, slug: Option<&str>) -> Result<Option<Uuid>, DomainError> {
        let Some(slug) = slug.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        match self.repos.groups.find_by_slug(slug).await? {
            Some(group) => Ok(Some(group.id)),
            None => Err(DomainError::Validation(format!("group: unknown group '{slug}'"))),
        }
    }
}

fn required_text(value: &str, field: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::Validation(format!("{field}: this field is required")));
    }
    Ok(value.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
