//! Post handlers.
//!
//! - `GET    /api/posts`      : one page of the feed, newest first.
//! - `POST   /api/posts`      : create a post.
//! - `GET    /api/posts/{id}` : a post with its likers and comments.
//! - `PUT    /api/posts/{id}` : change title and/or description.
//! - `DELETE /api/posts/{id}` : delete a post with its likes and comments.
//!
//! Feed pagination uses an opaque `cursor` (see [`PostCursor::encode`]).
//! `limit` defaults to the node's configured page size and is clamped to its
//! maximum.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use sociograph::{NewPost, Post, PostCursor, PostPatch, UserId, ValidationError};
use sociograph_api::{
    CreatePostRequest, FeedQuery, MessageResponse, PostDetailResponse, PostListResponse,
    UpdatePostRequest,
};

use crate::error::AppError;

use super::{post_id, AppState};

/// `GET /api/posts?limit=&cursor=&author=`
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<FeedQuery>, QueryRejection>,
) -> Result<Json<PostListResponse>, AppError> {
    let Query(q) = query?;
    let after = q
        .cursor
        .as_deref()
        .map(|c| PostCursor::decode(c).ok_or_else(|| ValidationError::InvalidCursor(c.into())))
        .transpose()?;
    let author = q.author.map(UserId);
    let limit = state.config.clamp_limit(q.limit);

    let (items, next) = state.graph.feed_page(author, after, limit).await?;
    Ok(Json(PostListResponse {
        items,
        next_cursor: next.map(|c| c.encode()),
    }))
}

/// `POST /api/posts`: returns 201 with the new post, 404 if the author does
/// not exist.
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let Json(req) = body?;
    let args = NewPost::try_from(req)?;
    let post = state.graph.create_post(args).await?;
    tracing::info!(post = %post.id, author = %post.author_id, "created post");
    Ok((StatusCode::CREATED, Json(post)))
}

/// `GET /api/posts/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostDetailResponse>, AppError> {
    let id = post_id(&id)?;
    Ok(Json(state.graph.post_detail(id).await?))
}

/// `PUT /api/posts/{id}`: returns the updated post.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<Json<Post>, AppError> {
    let id = post_id(&id)?;
    let Json(req) = body?;
    let patch = PostPatch::try_from(req)?;
    Ok(Json(state.graph.update_post(id, patch).await?))
}

/// `DELETE /api/posts/{id}`
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = post_id(&id)?;
    let deleted = state.graph.delete_post(id).await?;
    tracing::info!(post = %id, "deleted post");
    Ok(Json(MessageResponse::deleted("Post deleted", deleted.count)))
}
