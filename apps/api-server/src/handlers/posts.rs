//! Post endpoints.

use std::future::Future;

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::DomainError;
use quill_core::query::{ADMIN_DEFAULT_LIMIT, DEFAULT_LIMIT, PageRequest};
use quill_core::service::PublicPostQuery;
use quill_shared::{AdminPostQuery, MessageResponse, PostListQuery};

use super::convert::{new_post, page_response, parse_status, post_patch, post_response};
use super::submission::PostSubmission;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Run a post operation under the request deadline.
async fn within<T>(
    state: &AppState,
    operation: impl Future<Output = Result<T, DomainError>>,
) -> AppResult<T> {
    match tokio::time::timeout(state.request_timeout, operation).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => {
            tracing::warn!(timeout = ?state.request_timeout, "Post operation timed out");
            Err(AppError::Timeout)
        }
    }
}

/// GET /api/posts
pub async fn list_public(
    state: web::Data<AppState>,
    query: web::Query<PostListQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let request = PublicPostQuery {
        tag: query.tag,
        author_id: query.author,
        page: PageRequest::new(query.page, query.limit, DEFAULT_LIMIT),
    };

    let page = within(&state, state.posts.list_public(request)).await?;
    Ok(HttpResponse::Ok().json(page_response(page)))
}

/// GET /api/posts/{slug}
pub async fn get_by_slug(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = within(&state, state.posts.get_by_slug(&slug)).await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    submission: PostSubmission,
) -> AppResult<HttpResponse> {
    let input = new_post(submission.form)?;
    let requester = identity.requester();

    let post = within(&state, state.posts.create(&requester, input, submission.image)).await?;
    Ok(HttpResponse::Created().json(post_response(post)))
}

/// PUT /api/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
    submission: PostSubmission,
) -> AppResult<HttpResponse> {
    let patch = post_patch(submission.form)?;
    let requester = identity.requester();

    let post = within(
        &state,
        state.posts.update(&requester, *id, patch, submission.image),
    )
    .await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// DELETE /api/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let requester = identity.requester();
    within(&state, state.posts.delete(&requester, *id)).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted successfully")))
}

/// GET /api/posts/user/{user_id}
pub async fn list_for_user(
    state: web::Data<AppState>,
    identity: Identity,
    user_id: web::Path<Uuid>,
    query: web::Query<PostListQuery>,
) -> AppResult<HttpResponse> {
    let page_request = PageRequest::new(query.page, query.limit, DEFAULT_LIMIT);
    let requester = identity.requester();

    let page = within(
        &state,
        state.posts.list_for_owner(&requester, *user_id, page_request),
    )
    .await?;
    Ok(HttpResponse::Ok().json(page_response(page)))
}

/// GET /api/posts/admin/all
pub async fn list_admin(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<AdminPostQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let page_request = PageRequest::new(query.page, query.limit, ADMIN_DEFAULT_LIMIT);
    let requester = identity.requester();

    let page = within(
        &state,
        state.posts.list_admin(&requester, status, page_request),
    )
    .await?;
    Ok(HttpResponse::Ok().json(page_response(page)))
}

/// GET /api/posts/id/{id}
pub async fn get_by_id(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let requester = identity.requester();
    let post = within(&state, state.posts.get_by_id(&requester, *id)).await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// PATCH /api/posts/{id}/featured
pub async fn toggle_featured(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let requester = identity.requester();
    let post = within(&state, state.posts.toggle_featured(&requester, *id)).await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}
