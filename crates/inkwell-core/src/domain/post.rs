use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Group, User};

/// Post entity - a blog entry written by one author.
///
/// Ids are UUIDv7, so ordering by `(created_at, id)` also follows insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub text: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post. The creation timestamp is assigned here and never changes.
    pub fn new(author_id: Uuid, text: String, group_id: Option<Uuid>, image: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            author_id,
            group_id,
            text,
            image,
            created_at: Utc::now(),
        }
    }

    /// Canonical listing order: newest first, later insert first on equal timestamps.
    pub fn newest_first(a: &Post, b: &Post) -> std::cmp::Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}

/// A post together with the author and group it is displayed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCard {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
}
