//! Post handlers: the feed, CRUD, and voting.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use forum_core::domain::{Cursor, VoteValue};
use forum_core::services::MAX_PAGE_SIZE;
use forum_core::{DomainError, RequestContext};
use forum_shared::ApiResponse;
use forum_shared::dto::{
    DeletePostResponse, FeedQuery, PaginatedPostsResponse, PostInput, VoteRequest,
};

use super::render::{post_response, post_responses};
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn request_context(state: &AppState, identity: &OptionalIdentity) -> RequestContext {
    RequestContext::new(identity.user_id(), state.users.clone(), state.votes.clone())
}

/// GET /api/posts?limit=&cursor=
pub async fn list(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    query: web::Query<FeedQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let cursor = query.cursor.as_deref().map(Cursor::parse).transpose()?;
    let limit = query.limit.unwrap_or(MAX_PAGE_SIZE as i64);

    let page = state.feed.list(limit, cursor).await?;

    let ctx = request_context(&state, &identity);
    let posts = post_responses(&ctx, page.posts).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(PaginatedPostsResponse {
        total_count: page.total_count,
        cursor: page.cursor.map(|c| c.encode()),
        has_more: page.has_more,
        posts,
    })))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    body: web::Json<PostInput>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .create(identity.user_id(), &body.title, &body.text)
        .await?;

    let ctx = request_context(&state, &identity);
    let post = post_response(&ctx, post).await?;
    Ok(HttpResponse::Created().json(ApiResponse::created(post)))
}

/// GET /api/posts/{id} - null data when the post does not exist.
pub async fn get(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = match state.posts.get(path.into_inner()).await? {
        Some(post) => {
            let ctx = request_context(&state, &identity);
            Some(post_response(&ctx, post).await?)
        }
        None => None,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// PUT /api/posts/{id} - author only.
pub async fn update(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
    body: web::Json<PostInput>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .update(identity.user_id(), path.into_inner(), &body.title, &body.text)
        .await?;

    let ctx = request_context(&state, &identity);
    let post = post_response(&ctx, post).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// DELETE /api/posts/{id} - author only. Removes the post's votes too.
pub async fn delete(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let votes_removed = state.posts.delete(identity.user_id(), id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(DeletePostResponse { id, votes_removed })))
}

/// POST /api/posts/{id}/vote with `{"value": 1}` or `{"value": -1}`.
pub async fn vote(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
    body: web::Json<VoteRequest>,
) -> AppResult<HttpResponse> {
    let value = match body.as_i16() {
        Some(raw) => VoteValue::try_from(raw)
            .map_err(|e| AppError::from(DomainError::invalid("value", e.to_string())))?,
        None => {
            return Err(DomainError::invalid("value", "vote value must be 1 or -1").into());
        }
    };

    let post = state
        .ledger
        .apply_vote(identity.user_id(), path.into_inner(), value)
        .await?;

    let ctx = request_context(&state, &identity);
    let post = post_response(&ctx, post).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}
