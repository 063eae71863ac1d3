//! Shared helpers for the Sociograph conformance test suite.
//!
//! Provides [`spawn_node`], which binds a `TcpListener` on an ephemeral port,
//! wires up an in-process node backed by `MemoryStorage`, and returns both
//! the local URL and a reference to the underlying storage so tests can
//! inspect state without going through the HTTP layer.

use std::sync::Arc;

use serde_json::{json, Value};
use sociograph::User;
use sociograph_node::{build_router, MemoryStorage, NodeConfig, Storage};

/// Start an ephemeral in-process node and return `(base_url, storage)`.
///
/// The node runs in a background `tokio` task and is bound to an OS-assigned
/// port on `127.0.0.1`. The returned `String` is the base URL, e.g.
/// `http://127.0.0.1:51234`.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound.
pub async fn spawn_node() -> (String, Arc<MemoryStorage>) {
    spawn_node_with(NodeConfig::default()).await
}

/// Like [`spawn_node`], with explicit configuration. `bind_addr` is ignored.
pub async fn spawn_node_with(config: NodeConfig) -> (String, Arc<MemoryStorage>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    let base_url = format!("http://{addr}");

    let mem_storage = Arc::new(MemoryStorage::new());
    let storage: Arc<dyn Storage> = Arc::clone(&mem_storage) as Arc<dyn Storage>;

    let router = build_router(
        storage,
        NodeConfig {
            bind_addr: addr,
            ..config
        },
    );

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("conformance node error");
    });

    (base_url, mem_storage)
}

/// A `reqwest` client with a short timeout.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("build reqwest client")
}

/// Create a user with email `{name}@x` through the API.
///
/// # Panics
///
/// Panics if the node does not answer 201.
pub async fn create_user(client: &reqwest::Client, base: &str, name: &str) -> User {
    let resp = client
        .post(format!("{base}/api/users"))
        .json(&json!({ "username": name, "email": format!("{name}@x") }))
        .send()
        .await
        .expect("POST /api/users");
    assert_eq!(resp.status(), 201, "creating user {name}");
    resp.json().await.expect("user body")
}

/// Create a post through the API and return its JSON body.
///
/// # Panics
///
/// Panics if the node does not answer 201.
pub async fn create_post(client: &reqwest::Client, base: &str, author: i64, title: &str) -> Value {
    let resp = client
        .post(format!("{base}/api/posts"))
        .json(&json!({ "title": title, "authorId": author }))
        .send()
        .await
        .expect("POST /api/posts");
    assert_eq!(resp.status(), 201, "creating post {title}");
    resp.json().await.expect("post body")
}
