//! Process-local store implementing every repository port.
//!
//! Used when no database is configured and as the fixture store in tests. It
//! enforces the same uniqueness and delete rules as the relational schema.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use inkwell_core::domain::{Comment, Follow, Group, Post, User};
use inkwell_core::error::RepoError;
use inkwell_core::ports::{
    BaseRepository, CommentRepository, FollowRepository, GroupRepository, PostFilter,
    PostRepository, Repositories, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    groups: HashMap<Uuid, Group>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    follows: Vec<Follow>,
}

impl Tables {
    fn posts_matching(&self, filter: &PostFilter) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self.posts.values().filter(|p| filter.matches(p)).collect();
        posts.sort_by(|a, b| Post::newest_first(a, b));
        posts
    }

    fn check_post_references(&self, post: &Post) -> Result<(), RepoError> {
        if !self.users.contains_key(&post.author_id) {
            return Err(missing_reference("user", post.author_id));
        }
        match post.group_id {
            Some(group_id) if !self.groups.contains_key(&group_id) => {
                Err(missing_reference("group", group_id))
            }
            _ => Ok(()),
        }
    }

    fn drop_comments_on(&mut self, post_id: Uuid) {
        self.comments.retain(|_, c| c.post_id != post_id);
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose this store through every repository port.
    pub fn repositories(self: Arc<Self>) -> Repositories {
        Repositories {
            users: self.clone(),
            groups: self.clone(),
            posts: self.clone(),
            comments: self.clone(),
            follows: self,
        }
    }
}

fn missing_reference(entity: &'static str, id: Uuid) -> RepoError {
    RepoError::MissingReference {
        entity,
        key: id.to_string(),
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;

        let taken = tables
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id);
        if taken {
            return Err(RepoError::Constraint(format!(
                "username '{}' is taken",
                user.username
            )));
        }

        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Posts (with their comments) and follow edges go with the user; their
    /// comments on other posts stay, without an author.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.users.remove(&id).ok_or(RepoError::NotFound)?;

        let authored: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            tables.posts.remove(&post_id);
            tables.drop_comments_on(post_id);
        }

        for comment in tables.comments.values_mut() {
            if comment.author_id == Some(id) {
                comment.author_id = None;
            }
        }

        tables.follows.retain(|f| f.user_id != id && f.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl BaseRepository<Group, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, RepoError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn save(&self, group: Group) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;

        if tables
            .groups
            .values()
            .any(|g| g.slug == group.slug && g.id != group.id)
        {
            return Err(RepoError::Constraint(format!(
                "slug '{}' is taken",
                group.slug
            )));
        }

        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    /// Posts in the group survive, detached from it.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.groups.remove(&id).ok_or(RepoError::NotFound)?;

        for post in tables.posts.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.values().find(|g| g.slug == slug).cloned())
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.check_post_references(&post)?;

        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.posts.remove(&id).ok_or(RepoError::NotFound)?;
        tables.drop_comments_on(id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn count(&self, filter: &PostFilter) -> Result<usize, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.values().filter(|p| filter.matches(p)).count())
    }

    async fn list(
        &self,
        filter: &PostFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts_matching(filter)
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }
        tables.check_post_references(&post)?;

        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;

        if !tables.posts.contains_key(&comment.post_id) {
            return Err(missing_reference("post", comment.post_id));
        }

        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.comments.remove(&id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(comments)
    }
}

#[async_trait]
impl FollowRepository for InMemoryStore {
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn get_or_create(
        &self,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<(Follow, bool), RepoError> {
        // Check and insert under one write lock so concurrent calls cannot both create.
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables
            .follows
            .iter()
            .find(|f| f.user_id == user_id && f.author_id == author_id)
        {
            return Ok((existing.clone(), false));
        }

        for id in [user_id, author_id] {
            if !tables.users.contains_key(&id) {
                return Err(missing_reference("user", id));
            }
        }

        let follow = Follow::new(user_id, author_id);
        tables.follows.push(follow.clone());
        Ok((follow, true))
    }

    async fn remove(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(tables.follows.len() < before)
    }

    async fn followed_authors(&self, user_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.author_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    async fn seeded() -> (Arc<InMemoryStore>, User, User, Group) {
        let store = Arc::new(InMemoryStore::new());
        let leo = store.save(User::new("leo")).await.unwrap();
        let kim = store.save(User::new("kim")).await.unwrap();
        let group = store
            .save(Group::new("Cats", "cats", "All about cats"))
            .await
            .unwrap();
        (store, leo, kim, group)
    }

    #[tokio::test]
    async fn test_username_and_slug_are_unique() {
        let (store, _, _, _) = seeded().await;

        let user: Result<User, _> = store.save(User::new("leo")).await;
        assert!(matches!(user, Err(RepoError::Constraint(_))));

        let group: Result<Group, _> = store.save(Group::new("Other", "cats", "")).await;
        assert!(matches!(group, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_deleting_user_cascades() {
        let (store, leo, kim, _) = seeded().await;

        let leos_post: Post = store
            .save(Post::new(leo.id, "mine".into(), None, None))
            .await
            .unwrap();
        let kims_post: Post = store
            .save(Post::new(kim.id, "theirs".into(), None, None))
            .await
            .unwrap();
        let on_leos: Comment = store
            .save(Comment::new(leos_post.id, kim.id, "nice".into()))
            .await
            .unwrap();
        let by_leo: Comment = store
            .save(Comment::new(kims_post.id, leo.id, "thanks".into()))
            .await
            .unwrap();
        store.get_or_create(kim.id, leo.id).await.unwrap();

        BaseRepository::<User, Uuid>::delete(store.as_ref(), leo.id)
            .await
            .unwrap();

        let post: Option<Post> = store.find_by_id(leos_post.id).await.unwrap();
        assert!(post.is_none());
        let gone: Option<Comment> = store.find_by_id(on_leos.id).await.unwrap();
        assert!(gone.is_none());
        let orphan: Option<Comment> = store.find_by_id(by_leo.id).await.unwrap();
        assert_eq!(orphan.unwrap().author_id, None);
        assert!(store.followed_authors(kim.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_group_detaches_posts() {
        let (store, leo, _, group) = seeded().await;
        let post: Post = store
            .save(Post::new(leo.id, "grouped".into(), Some(group.id), None))
            .await
            .unwrap();

        BaseRepository::<Group, Uuid>::delete(store.as_ref(), group.id)
            .await
            .unwrap();

        let post: Option<Post> = store.find_by_id(post.id).await.unwrap();
        assert_eq!(post.unwrap().group_id, None);
    }

    #[tokio::test]
    async fn test_follow_edge_is_unique() {
        let (store, leo, kim, _) = seeded().await;

        let (_, created) = store.get_or_create(leo.id, kim.id).await.unwrap();
        assert!(created);
        let (_, created) = store.get_or_create(leo.id, kim.id).await.unwrap();
        assert!(!created);

        assert_eq!(store.followed_authors(leo.id).await.unwrap(), [kim.id]);
        assert!(store.remove(leo.id, kim.id).await.unwrap());
        assert!(!store.remove(leo.id, kim.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_dangling_references_are_not_duplicates() {
        let (store, leo, _, _) = seeded().await;
        let ghost = Uuid::new_v4();

        let post: Result<Post, _> = store.save(Post::new(ghost, "hi".into(), None, None)).await;
        assert!(matches!(post, Err(RepoError::MissingReference { entity: "user", .. })));

        let follow = store.get_or_create(leo.id, ghost).await;
        assert!(matches!(follow, Err(RepoError::MissingReference { entity: "user", .. })));

        let comment: Result<Comment, _> = store.save(Comment::new(ghost, leo.id, "hi".into())).await;
        assert!(matches!(comment, Err(RepoError::MissingReference { entity: "post", .. })));
    }

    #[tokio::test]
    async fn test_update_does_not_resurrect_deleted_post() {
        let (store, leo, _, _) = seeded().await;
        let post: Post = store
            .save(Post::new(leo.id, "draft".into(), None, None))
            .await
            .unwrap();
        BaseRepository::<Post, Uuid>::delete(store.as_ref(), post.id)
            .await
            .unwrap();

        let mut edited = post.clone();
        edited.text = "final".into();
        assert!(matches!(store.update(edited).await, Err(RepoError::NotFound)));

        let gone: Option<Post> = store.find_by_id(post.id).await.unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let (store, leo, _, _) = seeded().await;
        for i in 0..3 {
            let _: Post = store
                .save(Post::new(leo.id, format!("post {i}"), None, None))
                .await
                .unwrap();
        }

        let posts = store.list(&PostFilter::All, 0, 10).await.unwrap();
        let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["post 2", "post 1", "post 0"]);
    }
}
