//! # Quill Shared
//!
//! Wire types for the Quill HTTP API.
//! Kept free of server dependencies so clients can compile it as well.

pub mod dto;
pub mod response;

pub use dto::{
    AdminPostQuery, AuthorResponse, HealthResponse, ImageResponse, MessageResponse, PageResponse,
    PostForm, PostListQuery, PostResponse, TagsField,
};
pub use response::ErrorResponse;
