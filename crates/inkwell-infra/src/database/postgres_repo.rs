//! PostgreSQL repository implementations.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};
use uuid::Uuid;

use inkwell_core::domain::{Comment, Follow, Group, Post, User};
use inkwell_core::error::RepoError;
use inkwell_core::ports::{
    CommentRepository, FollowRepository, GroupRepository, PostFilter, PostRepository,
    Repositories, UserRepository,
};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::follow::{self, Entity as FollowEntity};
use super::entity::group::{self, Entity as GroupEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, repo_err};

pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;
pub type PostgresGroupRepository = PostgresBaseRepository<GroupEntity>;
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// Wire every repository port to one connection pool.
pub fn postgres_repositories(db: DbConn) -> Repositories {
    Repositories {
        users: Arc::new(PostgresUserRepository::new(db.clone())),
        groups: Arc::new(PostgresGroupRepository::new(db.clone())),
        posts: Arc::new(PostgresPostRepository::new(db.clone())),
        comments: Arc::new(PostgresCommentRepository::new(db.clone())),
        follows: Arc::new(PostgresFollowRepository::new(db)),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let result = GroupEntity::find()
            .filter(group::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }
}

/// `None` when the filter cannot match any row.
fn filtered_posts(filter: &PostFilter) -> Option<Select<PostEntity>> {
    let query = PostEntity::find();
    match filter {
        PostFilter::All => Some(query),
        PostFilter::Group(group_id) => Some(query.filter(post::Column::GroupId.eq(*group_id))),
        PostFilter::Author(author_id) => Some(query.filter(post::Column::AuthorId.eq(*author_id))),
        PostFilter::Authors(authors) if authors.is_empty() => None,
        PostFilter::Authors(authors) => {
            Some(query.filter(post::Column::AuthorId.is_in(authors.iter().copied())))
        }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn count(&self, filter: &PostFilter) -> Result<usize, RepoError> {
        let Some(query) = filtered_posts(filter) else {
            return Ok(0);
        };

        let total = query.count(&self.db).await.map_err(repo_err)?;
        usize::try_from(total).map_err(|e| RepoError::Query(e.to_string()))
    }

    async fn list(
        &self,
        filter: &PostFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Post>, RepoError> {
        let Some(query) = filtered_posts(filter) else {
            return Ok(Vec::new());
        };

        tracing::debug!(?filter, offset, limit, "Listing posts");

        let rows = query
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(offset as u64)
            .limit(limit as u64)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// `UPDATE .. WHERE id`; no row updated means the post is gone.
    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let active: post::ActiveModel = post.into();

        let model = active.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => RepoError::NotFound,
            other => repo_err(other),
        })?;

        Ok(model.into())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let rows = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Follow edges. Uniqueness of the pair is enforced by the database.
pub struct PostgresFollowRepository {
    db: DbConn,
}

impl PostgresFollowRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    fn edge(user_id: Uuid, author_id: Uuid) -> Select<FollowEntity> {
        FollowEntity::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
    }

    async fn find_edge(&self, user_id: Uuid, author_id: Uuid) -> Result<Option<Follow>, RepoError> {
        let row = Self::edge(user_id, author_id)
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl FollowRepository for PostgresFollowRepository {
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let count = Self::edge(user_id, author_id)
            .count(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(count > 0)
    }

    async fn get_or_create(
        &self,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<(Follow, bool), RepoError> {
        if let Some(existing) = self.find_edge(user_id, author_id).await? {
            return Ok((existing, false));
        }

        let active: follow::ActiveModel = Follow::new(user_id, author_id).into();
        match FollowEntity::insert(active)
            .exec_with_returning(&self.db)
            .await
            .map_err(repo_err)
        {
            Ok(model) => Ok((model.into(), true)),
            // A concurrent request created the same edge first.
            Err(RepoError::Constraint(_)) => self
                .find_edge(user_id, author_id)
                .await?
                .map(|existing| (existing, false))
                .ok_or(RepoError::NotFound),
            Err(e) => Err(e),
        }
    }

    async fn remove(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let result = FollowEntity::delete_many()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn followed_authors(&self, user_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        FollowEntity::find()
            .select_only()
            .column(follow::Column::AuthorId)
            .filter(follow::Column::UserId.eq(user_id))
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await
            .map_err(repo_err)
    }
}
