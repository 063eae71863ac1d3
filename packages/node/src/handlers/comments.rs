//! Comment handlers.
//!
//! - `POST /api/comment/{id}`  : body `userId` comments on post `{id}`.
//! - `GET  /api/comments/{id}` : a single comment.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use sociograph::{validation, Comment, CommentId};
use sociograph_api::CreateCommentRequest;

use crate::error::AppError;

use super::{post_id, AppState};

/// `POST /api/comment/{id}`: returns 201 with the new comment, 404 if the
/// user or the post does not exist.
pub async fn create(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let post = post_id(&id)?;
    let Json(req) = body?;
    let args = req.into_new_comment(post)?;
    let comment = state.graph.create_comment(args).await?;
    tracing::info!(comment = %comment.id, post = %post, "created comment");
    Ok((StatusCode::CREATED, Json(comment)))
}

/// `GET /api/comments/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Comment>, AppError> {
    let id = validation::parse_id("id", &id).map(CommentId)?;
    Ok(Json(state.graph.get_comment(id).await?))
}
