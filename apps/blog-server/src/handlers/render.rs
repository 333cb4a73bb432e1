//! Conversion of domain results into the listing context.

use inkwell_core::Page;
use inkwell_core::domain::{Group, PostCard, User};
use inkwell_core::services::{CommentCard, PostDetail};
use inkwell_shared::dto::{
    AuthorResponse, CommentItem, GroupResponse, ListingResponse, PageObj, PostDetailResponse,
    PostItem,
};

pub fn author(user: &User) -> AuthorResponse {
    AuthorResponse {
        id: user.id,
        username: user.username.clone(),
    }
}

pub fn group(group: &Group) -> GroupResponse {
    GroupResponse {
        id: group.id,
        title: group.title.clone(),
        slug: group.slug.clone(),
        description: group.description.clone(),
    }
}

fn post_item(card: PostCard) -> PostItem {
    PostItem {
        id: card.post.id,
        text: card.post.text,
        created_at: card.post.created_at,
        author: author(&card.author),
        group: card.group.as_ref().map(group),
        image: card.post.image,
    }
}

fn comment_item(card: CommentCard) -> CommentItem {
    CommentItem {
        id: card.comment.id,
        text: card.comment.text,
        created_at: card.comment.created_at,
        author: card.author.as_ref().map(author),
    }
}

pub fn page_obj(page: Page<PostCard>) -> PageObj<PostItem> {
    PageObj {
        number: page.number(),
        num_pages: page.num_pages(),
        count: page.total(),
        has_next: page.has_next(),
        has_previous: page.has_previous(),
        next_page_number: page.next_page_number(),
        previous_page_number: page.previous_page_number(),
        object_list: page.into_items().into_iter().map(post_item).collect(),
    }
}

pub fn listing(page: Page<PostCard>) -> ListingResponse {
    ListingResponse::new(page_obj(page))
}

pub fn detail(detail: PostDetail) -> PostDetailResponse {
    PostDetailResponse {
        post: post_item(detail.card),
        comments: detail.comments.into_iter().map(comment_item).collect(),
    }
}
