//! User handlers.
//!
//! - `POST  /api/users`     : create a user.
//! - `GET   /api/user/{id}` : a user with their follow graph and liked posts.
//! - `PATCH /api/user/{id}` : change username and/or email.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use sociograph::{NewUser, User, UserPatch};
use sociograph_api::{CreateUserRequest, UpdateUserRequest, UserResponse};

use crate::error::AppError;

use super::{user_id, AppState};

/// `POST /api/users`: returns 201 with the new user, 409 if the email is
/// already taken, 422 if `username` or `email` is missing or malformed.
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let Json(req) = body?;
    let args = NewUser::try_from(req)?;
    let user = state.graph.create_user(args).await?;
    tracing::info!(user = %user.id, "created user");
    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /api/user/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let id = user_id(&id)?;
    Ok(Json(state.graph.user_with_follow_graph(id).await?))
}

/// `PATCH /api/user/{id}`: absent fields are left unchanged.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let id = user_id(&id)?;
    let Json(req) = body?;
    let patch = UserPatch::try_from(req)?;
    Ok(Json(state.graph.update_user(id, patch).await?))
}
