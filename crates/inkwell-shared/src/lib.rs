//! # Inkwell Shared
//!
//! Wire types of the blog's HTTP surface: the listing context handed to the
//! rendering layer and RFC 7807 error documents.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
