//! Feed composition: which posts a viewer sees for each listing scope, and the
//! follow relation that drives the personal feed.

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::{Group, Post, PostCard, User};
use crate::error::DomainError;
use crate::pagination::{Page, PageRequest, PageWindow, Paginator};
use crate::ports::{BaseRepository, PostFilter, Repositories};

/// Listing of a single group.
#[derive(Debug, Clone)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<PostCard>,
}

/// Listing of a single author, as seen by a (possibly anonymous) viewer.
#[derive(Debug, Clone)]
pub struct ProfileFeed {
    pub author: User,
    /// Whether the viewer currently follows `author`. Always false for anonymous viewers.
    pub following: bool,
    pub page: Page<PostCard>,
}

/// Result of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    /// Following oneself is refused; nothing was stored.
    SelfFollow,
}

/// Builds the global, group, profile and follow feeds.
pub struct FeedService {
    repos: Repositories,
    paginator: Paginator,
}

impl FeedService {
    pub fn new(repos: Repositories) -> Self {
        Self {
            repos,
            paginator: Paginator::default(),
        }
    }

    /// Every post, newest first.
    pub async fn global(&self, request: PageRequest) -> Result<Page<PostCard>, DomainError> {
        self.page(PostFilter::All, request).await
    }

    /// Which page of the global feed `request` lands on right now.
    pub async fn resolve_global(&self, request: PageRequest) -> Result<PageWindow, DomainError> {
        let total = self.repos.posts.count(&PostFilter::All).await?;
        Ok(self.paginator.window(total, request))
    }

    /// The global feed sliced at an already resolved window.
    pub async fn global_at(&self, window: PageWindow) -> Result<Page<PostCard>, DomainError> {
        self.fill(&PostFilter::All, window).await
    }

    /// Posts filed under the group with `slug`.
    pub async fn group(&self, slug: &str, request: PageRequest) -> Result<GroupFeed, DomainError> {
        let group = self
            .repos
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("group", slug))?;

        let page = self.page(PostFilter::Group(group.id), request).await?;
        Ok(GroupFeed { group, page })
    }

    /// Posts written by `username`, plus whether `viewer` follows them.
    pub async fn profile(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        request: PageRequest,
    ) -> Result<ProfileFeed, DomainError> {
        let author = self.find_user(username).await?;

        let following = match viewer {
            Some(viewer) => self.repos.follows.exists(viewer, author.id).await?,
            None => false,
        };

        let page = self.page(PostFilter::Author(author.id), request).await?;
        Ok(ProfileFeed {
            author,
            following,
            page,
        })
    }

    /// Posts by everyone `viewer` follows.
    pub async fn follow_feed(
        &self,
        viewer: Uuid,
        request: PageRequest,
    ) -> Result<Page<PostCard>, DomainError> {
        let authors = self.repos.follows.followed_authors(viewer).await?;
        tracing::debug!(viewer = %viewer, authors = authors.len(), "Composing follow feed");

        self.page(PostFilter::Authors(authors), request).await
    }

    /// Make `follower` follow `username`. Repeated calls never duplicate the edge.
    pub async fn follow(
        &self,
        follower: Uuid,
        username: &str,
    ) -> Result<FollowOutcome, DomainError> {
        let author = self.find_user(username).await?;

        if author.id == follower {
            tracing::debug!(user = %follower, "Ignoring self-follow");
            return Ok(FollowOutcome::SelfFollow);
        }

        let (_, created) = self
            .repos
            .follows
            .get_or_create(follower, author.id)
            .await?;

        if created {
            tracing::info!(follower = %follower, author = %author.username, "Follow created");
            Ok(FollowOutcome::Followed)
        } else {
            Ok(FollowOutcome::AlreadyFollowing)
        }
    }

    /// Stop `follower` following `username`. Returns whether an edge was removed;
    /// removing a missing edge is not an error.
    pub async fn unfollow(&self, follower: Uuid, username: &str) -> Result<bool, DomainError> {
        let author = self.find_user(username).await?;
        let removed = self.repos.follows.remove(follower, author.id).await?;

        if removed {
            tracing::info!(follower = %follower, author = %author.username, "Follow removed");
        }
        Ok(removed)
    }

    async fn find_user(&self, username: &str) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))
    }

    async fn page(
        &self,
        filter: PostFilter,
        request: PageRequest,
    ) -> Result<Page<PostCard>, DomainError> {
        let total = self.repos.posts.count(&filter).await?;
        let window = self.paginator.window(total, request);
        self.fill(&filter, window).await
    }

    async fn fill(
        &self,
        filter: &PostFilter,
        window: PageWindow,
    ) -> Result<Page<PostCard>, DomainError> {
        let posts = if window.limit == 0 {
            Vec::new()
        } else {
            self.repos
                .posts
                .list(filter, window.offset, window.limit)
                .await?
        };

        let cards = compose_cards(&self.repos, posts).await?;
        Ok(Page::new(cards, window))
    }
}

/// Attach author and group to each post, looking every id up once.
pub(crate) async fn compose_cards(
    repos: &Repositories,
    posts: Vec<Post>,
) -> Result<Vec<PostCard>, DomainError> {
    let mut authors: HashMap<Uuid, User> = HashMap::new();
    let mut groups: HashMap<Uuid, Option<Group>> = HashMap::new();
    let mut cards = Vec::with_capacity(posts.len());

    for post in posts {
        let author = match authors.get(&post.author_id) {
            Some(author) => author.clone(),
            None => {
                let author = repos
                    .users
                    .find_by_id(post.author_id)
                    .await?
                    .ok_or_else(|| {
                        DomainError::Internal(format!(
                            "post {} references missing author {}",
                            post.id, post.author_id
                        ))
                    })?;
                authors.insert(author.id, author.clone());
                author
            }
        };

        let group = match post.group_id {
            Some(group_id) => match groups.get(&group_id) {
                Some(group) => group.clone(),
                None => {
                    let group = repos.groups.find_by_id(group_id).await?;
                    groups.insert(group_id, group.clone());
                    group
                }
            },
            None => None,
        };

        cards.push(PostCard {
            post,
            author,
            group,
        });
    }

    Ok(cards)
}
