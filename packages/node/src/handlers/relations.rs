//! Follow and like handlers.
//!
//! - `POST /api/follow/{id}`   : body `userId` follows user `{id}`.
//! - `POST /api/unfollow/{id}` : body `userId` stops following user `{id}`.
//! - `POST /api/like/{id}`     : body `userId` likes post `{id}`.
//! - `POST /api/unlike/{id}`   : body `userId` unlikes post `{id}`.
//!
//! A repeated follow or like is 409 `already_exists`; removing an edge that
//! is not there is 404 `edge_not_found`. Either way the stored state is the
//! one the caller asked for.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use sociograph::Edge;
use sociograph_api::{EdgeRequest, MessageResponse};

use crate::error::AppError;

use super::{post_id, user_id, AppState};

/// `POST /api/follow/{id}`
pub async fn follow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<EdgeRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(req) = body?;
    let edge = Edge::follow(req.subject()?, user_id(&id)?);
    state.graph.create_edge(edge).await?;
    tracing::debug!(%edge, "created edge");
    Ok(Json(MessageResponse::new("Followed user")))
}

/// `POST /api/unfollow/{id}`
pub async fn unfollow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<EdgeRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(req) = body?;
    let edge = Edge::follow(req.subject()?, user_id(&id)?);
    state.graph.remove_edge(edge).await?;
    tracing::debug!(%edge, "removed edge");
    Ok(Json(MessageResponse::new("Unfollowed user")))
}

/// `POST /api/like/{id}`
pub async fn like(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<EdgeRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(req) = body?;
    let edge = Edge::like(req.subject()?, post_id(&id)?);
    state.graph.create_edge(edge).await?;
    tracing::debug!(%edge, "created edge");
    Ok(Json(MessageResponse::new("Post liked")))
}

/// `POST /api/unlike/{id}`
pub async fn unlike(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<EdgeRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(req) = body?;
    let edge = Edge::like(req.subject()?, post_id(&id)?);
    state.graph.remove_edge(edge).await?;
    tracing::debug!(%edge, "removed edge");
    Ok(Json(MessageResponse::new("Post unliked")))
}
