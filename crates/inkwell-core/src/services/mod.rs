//! Application services composing the ports into the platform's use cases.

mod feed;
mod page_cache;
mod posts;

pub use feed::{FeedService, FollowOutcome, GroupFeed, ProfileFeed};
pub use page_cache::{CachedPage, PageCache};
pub use posts::{
    Access, CommentCard, CommentForm, DenyReason, EditOutcome, PostDetail, PostForm, PostService,
    edit_access,
};
