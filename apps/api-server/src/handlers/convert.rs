//! Conversions between wire types and core types.

use quill_core::domain::{PostDetails, PostStatus, TagInput};
use quill_core::query::Page;
use quill_core::service::{NewPost, PostPatch};
use quill_shared::{AuthorResponse, ImageResponse, PageResponse, PostForm, PostResponse, TagsField};

use crate::middleware::error::AppError;

pub fn post_response(details: PostDetails) -> PostResponse {
    let PostDetails { post, author } = details;
    let image = post
        .image
        .map(|image| ImageResponse {
            url: Some(image.url),
            external_id: Some(image.external_id),
        })
        .unwrap_or_default();

    PostResponse {
        id: post.id,
        title: post.title,
        slug: post.slug,
        content: post.content,
        excerpt: post.excerpt,
        meta_description: post.meta_description,
        tags: post.tags,
        status: post.status.to_string(),
        image,
        author: AuthorResponse {
            id: author.id,
            username: author.username,
            avatar: author.avatar,
        },
        is_featured: post.is_featured,
        view_count: post.view_count,
        published_at: post.published_at,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub fn page_response(page: Page<PostDetails>) -> PageResponse<PostResponse> {
    PageResponse {
        items: page.items.into_iter().map(post_response).collect(),
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages,
        total_items: page.total_items,
        has_next: page.has_next,
        has_prev: page.has_prev,
    }
}

pub fn parse_status(raw: &str) -> Result<PostStatus, AppError> {
    raw.parse::<PostStatus>().map_err(AppError::BadRequest)
}

fn tag_input(tags: TagsField) -> TagInput {
    match tags {
        TagsField::List(items) => TagInput::List(items),
        TagsField::Csv(raw) => TagInput::Delimited(raw),
    }
}

pub fn new_post(form: PostForm) -> Result<NewPost, AppError> {
    Ok(NewPost {
        title: form.title.unwrap_or_default(),
        content: form.content.unwrap_or_default(),
        excerpt: form.excerpt,
        meta_description: form.meta_description,
        tags: form.tags.map(tag_input),
        status: form.status.as_deref().map(parse_status).transpose()?,
        is_featured: form.is_featured,
    })
}

pub fn post_patch(form: PostForm) -> Result<PostPatch, AppError> {
    Ok(PostPatch {
        title: form.title,
        content: form.content,
        excerpt: form.excerpt,
        meta_description: form.meta_description,
        tags: form.tags.map(tag_input),
        status: form.status.as_deref().map(parse_status).transpose()?,
        is_featured: form.is_featured,
    })
}
