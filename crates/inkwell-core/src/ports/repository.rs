use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, Follow, Group, Post, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, applying the store's cascade rules.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

#[async_trait]
pub trait GroupRepository: BaseRepository<Group, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;
}

/// Which posts a feed is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(Uuid),
    Author(Uuid),
    /// Posts by any of these authors; empty matches nothing.
    Authors(Vec<Uuid>),
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(*group_id),
            PostFilter::Author(author_id) => post.author_id == *author_id,
            PostFilter::Authors(authors) => authors.contains(&post.author_id),
        }
    }
}

/// Post repository. Listings are ordered newest first (see [`Post::newest_first`]).
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn count(&self, filter: &PostFilter) -> Result<usize, RepoError>;

    async fn list(
        &self,
        filter: &PostFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Post>, RepoError>;

    /// Overwrite a stored post. Never inserts: a post deleted in the meantime
    /// yields [`RepoError::NotFound`].
    async fn update(&self, post: Post) -> Result<Post, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments on a post, newest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;
}

/// Follow relation. The `(user_id, author_id)` pair is unique.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    /// Return the existing edge or create it. The flag is `true` when it was created.
    async fn get_or_create(&self, user_id: Uuid, author_id: Uuid)
    -> Result<(Follow, bool), RepoError>;

    /// Remove the edge if present. Returns whether anything was removed.
    async fn remove(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    /// Ids of every author `user_id` follows.
    async fn followed_authors(&self, user_id: Uuid) -> Result<Vec<Uuid>, RepoError>;
}

/// The full set of repositories the services need.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
}
