//! Assembles the Axum [`Router`] from all handler modules.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    config::NodeConfig,
    handlers::{comments, health, posts, relations, users, AppState},
    service::SocialGraph,
    storage::Storage,
};

/// Build the complete application router with shared state.
pub fn build_router(storage: Arc<dyn Storage>, config: NodeConfig) -> Router {
    let state = AppState {
        graph: SocialGraph::new(storage),
        config,
    };

    Router::new()
        .route("/health", get(health::health))
        // Users
        .route("/api/users", post(users::create))
        .route("/api/user/{id}", get(users::get).patch(users::update))
        // Posts
        .route("/api/posts", get(posts::list).post(posts::create))
        .route(
            "/api/posts/{id}",
            get(posts::get).put(posts::update).delete(posts::delete),
        )
        // Follows and likes
        .route("/api/follow/{id}", post(relations::follow))
        .route("/api/unfollow/{id}", post(relations::unfollow))
        .route("/api/like/{id}", post(relations::like))
        .route("/api/unlike/{id}", post(relations::unlike))
        // Comments
        .route("/api/comment/{id}", post(comments::create))
        .route("/api/comments/{id}", get(comments::get))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
