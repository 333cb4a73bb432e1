//! Data Transfer Objects - the context each page is rendered from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One page of a listing plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageObj<T> {
    pub object_list: Vec<T>,
    /// 1-based number of this page.
    pub number: usize,
    pub num_pages: usize,
    /// Size of the whole listing.
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_page_number: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post as shown in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostItem {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Context of every listing page. Only the keys relevant to the page are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingResponse {
    pub page_obj: PageObj<PostItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorResponse>,
    /// Whether the viewer follows `author` (profile pages).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following: Option<bool>,
    /// Set on the follow feed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow: Option<bool>,
}

impl ListingResponse {
    pub fn new(page_obj: PageObj<PostItem>) -> Self {
        Self {
            page_obj,
            group: None,
            author: None,
            following: None,
            follow: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentItem {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Absent once the author account is gone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetailResponse {
    pub post: PostItem,
    pub comments: Vec<CommentItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_omits_absent_context_keys() {
        let page = PageObj::<PostItem> {
            object_list: Vec::new(),
            number: 1,
            num_pages: 1,
            count: 0,
            has_next: false,
            has_previous: false,
            next_page_number: None,
            previous_page_number: None,
        };

        let json = serde_json::to_value(ListingResponse::new(page)).unwrap();

        assert!(json.get("page_obj").is_some());
        assert!(json.get("group").is_none());
        assert!(json.get("following").is_none());
        assert!(json["page_obj"].get("next_page_number").is_none());
    }
}
