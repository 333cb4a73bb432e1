//! Feed, follow and authoring behaviour against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use inkwell_core::PageRequest;
use inkwell_core::domain::{Group, Post, PostCard, User};
use inkwell_core::error::DomainError;
use inkwell_core::ports::{BaseRepository, FollowRepository, Repositories};
use inkwell_core::services::{
    CommentForm, DenyReason, EditOutcome, FeedService, FollowOutcome, PageCache, PostForm,
    PostService,
};
use inkwell_infra::{InMemoryCache, InMemoryStore};

struct World {
    repos: Repositories,
    feed: FeedService,
    posts: PostService,
}

impl World {
    fn new() -> Self {
        let repos = Arc::new(InMemoryStore::new()).repositories();
        Self {
            feed: FeedService::new(repos.clone()),
            posts: PostService::new(repos.clone()),
            repos,
        }
    }

    async fn user(&self, name: &str) -> User {
        self.repos.users.save(User::new(name)).await.unwrap()
    }

    async fn group(&self, slug: &str) -> Group {
        self.repos
            .groups
            .save(Group::new(slug.to_uppercase(), slug, ""))
            .await
            .unwrap()
    }

    async fn publish(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.posts
            .create(
                author.id,
                PostForm {
                    text: text.to_string(),
                    group: group.map(|g| g.slug.clone()),
                    image: None,
                },
            )
            .await
            .unwrap()
    }
}

fn texts<'a>(cards: impl IntoIterator<Item = &'a PostCard>) -> Vec<String> {
    cards.into_iter().map(|c| c.post.text.clone()).collect()
}

#[tokio::test]
async fn test_global_feed_pages_through_every_post() {
    let world = World::new();
    let leo = world.user("leo").await;
    for i in 0..13 {
        world.publish(&leo, &format!("post {i}"), None).await;
    }

    let first = world.feed.global(PageRequest::first()).await.unwrap();
    assert_eq!(first.len(), 10);
    assert_eq!(first.num_pages(), 2);
    assert_eq!(first.items()[0].post.text, "post 12");
    assert_eq!(first.items()[0].author.username, "leo");

    let last = world.feed.global(PageRequest::number(2)).await.unwrap();
    assert_eq!(texts(last.items()), ["post 2", "post 1", "post 0"]);

    let clamped = world.feed.global(PageRequest::number(50)).await.unwrap();
    assert_eq!(clamped.number(), 2);
}

#[tokio::test]
async fn test_empty_feed_is_one_empty_page() {
    let world = World::new();

    let page = world.feed.global(PageRequest::first()).await.unwrap();

    assert!(page.is_empty());
    assert_eq!(page.num_pages(), 1);
}

#[tokio::test]
async fn test_group_feed_excludes_other_groups() {
    let world = World::new();
    let leo = world.user("leo").await;
    let cats = world.group("cats").await;
    let dogs = world.group("dogs").await;

    world.publish(&leo, "meow", Some(&cats)).await;
    world.publish(&leo, "woof", Some(&dogs)).await;
    world.publish(&leo, "ungrouped", None).await;

    let feed = world.feed.group("cats", PageRequest::first()).await.unwrap();

    assert_eq!(feed.group.slug, "cats");
    assert_eq!(texts(feed.page.items()), ["meow"]);
    assert!(feed.page.items().iter().all(|c| c.group.as_ref() == Some(&cats)));
}

#[tokio::test]
async fn test_unknown_group_and_profile_are_not_found() {
    let world = World::new();

    let group = world.feed.group("nope", PageRequest::first()).await;
    assert!(matches!(group, Err(DomainError::NotFound { .. })));

    let profile = world.feed.profile("ghost", None, PageRequest::first()).await;
    assert!(matches!(profile, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_profile_reports_following_flag() {
    let world = World::new();
    let leo = world.user("leo").await;
    let kim = world.user("kim").await;
    world.publish(&leo, "hello", None).await;
    world.publish(&kim, "not leo", None).await;

    let anonymous = world.feed.profile("leo", None, PageRequest::first()).await.unwrap();
    assert!(!anonymous.following);
    assert_eq!(texts(anonymous.page.items()), ["hello"]);

    world.feed.follow(kim.id, "leo").await.unwrap();
    let viewer = world
        .feed
        .profile("leo", Some(kim.id), PageRequest::first())
        .await
        .unwrap();
    assert!(viewer.following);
}

#[tokio::test]
async fn test_follow_feed_holds_only_followed_authors() {
    let world = World::new();
    let leo = world.user("leo").await;
    let kim = world.user("kim").await;
    let ann = world.user("ann").await;

    world.publish(&leo, "by leo", None).await;
    world.publish(&ann, "by ann", None).await;

    let nobody = world.feed.follow_feed(kim.id, PageRequest::first()).await.unwrap();
    assert!(nobody.is_empty());

    world.feed.follow(kim.id, "leo").await.unwrap();
    let feed = world.feed.follow_feed(kim.id, PageRequest::first()).await.unwrap();
    assert_eq!(texts(feed.items()), ["by leo"]);
}

#[tokio::test]
async fn test_follow_is_idempotent() {
    let world = World::new();
    let leo = world.user("leo").await;
    let kim = world.user("kim").await;

    assert_eq!(world.feed.follow(leo.id, "kim").await.unwrap(), FollowOutcome::Followed);
    assert_eq!(
        world.feed.follow(leo.id, "kim").await.unwrap(),
        FollowOutcome::AlreadyFollowing
    );

    assert_eq!(world.repos.follows.followed_authors(leo.id).await.unwrap(), [kim.id]);
}

#[tokio::test]
async fn test_self_follow_is_refused() {
    let world = World::new();
    let leo = world.user("leo").await;

    assert_eq!(world.feed.follow(leo.id, "leo").await.unwrap(), FollowOutcome::SelfFollow);
    assert!(world.repos.follows.followed_authors(leo.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unfollow_without_edge_is_a_no_op() {
    let world = World::new();
    let leo = world.user("leo").await;
    let kim = world.user("kim").await;
    let ann = world.user("ann").await;
    world.feed.follow(kim.id, "ann").await.unwrap();

    assert!(!world.feed.unfollow(leo.id, "kim").await.unwrap());
    assert_eq!(world.repos.follows.followed_authors(kim.id).await.unwrap(), [ann.id]);

    assert!(world.feed.unfollow(kim.id, "ann").await.unwrap());
    assert!(world.repos.follows.followed_authors(kim.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cached_index_hides_deletes_until_invalidated() {
    let world = World::new();
    let leo = world.user("leo").await;
    let doomed = world.publish(&leo, "doomed", None).await;

    let cache = PageCache::new(
        Arc::new(InMemoryCache::new()),
        PageCache::DEFAULT_PREFIX,
        Duration::from_secs(20),
    );
    let world = &world;
    let render = move || async move {
        let page = world.feed.global(PageRequest::first()).await?;
        Ok::<_, DomainError>(texts(page.items()).join(","))
    };

    let before = cache.get_or_render("page=1", render).await.unwrap();
    assert_eq!(before.body, "doomed");

    world.repos.posts.delete(doomed.id).await.unwrap();

    let stale = cache.get_or_render("page=1", render).await.unwrap();
    assert!(stale.hit);
    assert_eq!(stale.body, "doomed");

    cache.invalidate().await.unwrap();
    let fresh = cache.get_or_render("page=1", render).await.unwrap();
    assert!(!fresh.hit);
    assert_eq!(fresh.body, "");
}

#[tokio::test]
async fn test_non_author_edit_changes_nothing() {
    let world = World::new();
    let leo = world.user("leo").await;
    let kim = world.user("kim").await;
    let post = world.publish(&leo, "original", None).await;

    let outcome = world
        .posts
        .edit(
            kim.id,
            post.id,
            PostForm {
                text: "hijacked".to_string(),
                ..PostForm::default()
            },
        )
        .await
        .unwrap();
    assert!(matches!(outcome, EditOutcome::Denied(DenyReason::NotAuthor)));

    let stored = world.posts.detail(post.id).await.unwrap();
    assert_eq!(stored.card.post.text, "original");
}

#[tokio::test]
async fn test_author_edit_keeps_creation_time() {
    let world = World::new();
    let leo = world.user("leo").await;
    let cats = world.group("cats").await;
    let post = world.publish(&leo, "draft", None).await;

    let outcome = world
        .posts
        .edit(
            leo.id,
            post.id,
            PostForm {
                text: "final".to_string(),
                group: Some("cats".to_string()),
                image: None,
            },
        )
        .await
        .unwrap();

    let EditOutcome::Updated(updated) = outcome else {
        panic!("author edit was denied");
    };
    assert_eq!(updated.text, "final");
    assert_eq!(updated.group_id, Some(cats.id));
    assert_eq!(updated.created_at, post.created_at);
}

#[tokio::test]
async fn test_blank_post_is_rejected() {
    let world = World::new();
    let leo = world.user("leo").await;

    let result = world.posts.create(leo.id, PostForm::default()).await;
    assert!(matches!(result, Err(DomainError::Validation(_))));

    let unknown_group = world
        .posts
        .create(
            leo.id,
            PostForm {
                text: "hi".to_string(),
                group: Some("missing".to_string()),
                image: None,
            },
        )
        .await;
    assert!(matches!(unknown_group, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn test_unknown_acting_user_is_not_found() {
    let world = World::new();
    world.user("leo").await;
    let ghost = Uuid::new_v4();

    let post = world
        .posts
        .create(
            ghost,
            PostForm {
                text: "hello".to_string(),
                ..PostForm::default()
            },
        )
        .await;
    assert!(matches!(post, Err(DomainError::NotFound { entity_type: "user", .. })));

    let follow = world.feed.follow(ghost, "leo").await;
    assert!(matches!(follow, Err(DomainError::NotFound { entity_type: "user", .. })));
}

#[tokio::test]
async fn test_global_window_resolves_before_rendering() {
    let world = World::new();
    let leo = world.user("leo").await;
    for i in 0..13 {
        world.publish(&leo, &format!("post {i}"), None).await;
    }

    let last = world.feed.resolve_global(PageRequest::number(999)).await.unwrap();
    let negative = world.feed.resolve_global(PageRequest::number(-5)).await.unwrap();
    assert_eq!(last.cache_key(), "page=2");
    assert_eq!(negative, last);

    let page = world.feed.global_at(last).await.unwrap();
    assert_eq!(texts(page.items()), ["post 2", "post 1", "post 0"]);
}

#[tokio::test]
async fn test_comments_show_newest_first() {
    let world = World::new();
    let leo = world.user("leo").await;
    let kim = world.user("kim").await;
    let post = world.publish(&leo, "discuss", None).await;

    for text in ["first", "second"] {
        world
            .posts
            .comment(kim.id, post.id, CommentForm { text: text.to_string() })
            .await
            .unwrap();
    }

    let detail = world.posts.detail(post.id).await.unwrap();
    let comments: Vec<&str> = detail.comments.iter().map(|c| c.comment.text.as_str()).collect();
    assert_eq!(comments, ["second", "first"]);
    assert_eq!(detail.comments[0].author.as_ref().unwrap().username, "kim");

    let missing = world
        .posts
        .comment(kim.id, Uuid::new_v4(), CommentForm { text: "x".to_string() })
        .await;
    assert!(matches!(missing, Err(DomainError::NotFound { .. })));
}
