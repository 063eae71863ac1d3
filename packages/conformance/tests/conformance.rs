//! End-to-end conformance tests for the Sociograph HTTP API.
//!
//! Each test spawns an ephemeral in-process node (real TCP, real HTTP) via
//! [`sociograph_conformance::spawn_node`] and drives it with a `reqwest`
//! client. Concurrency tests fire many identical requests at once and check
//! that exactly one wins.
//!
//! # Coverage
//!
//! | Test | Area |
//! |------|------|
//! | `health_reports_ok` | liveness |
//! | `follow_scenario` | follow, duplicate follow, follow graph |
//! | `post_without_title_is_rejected` | validation, nothing persisted |
//! | `like_by_unknown_user_is_rejected` | subject existence |
//! | `delete_post_cascades` | likes and comments removed, later like fails |
//! | `unfollow_absent_edge` | edge_not_found |
//! | `follow_unfollow_follow` | create/remove/create round trip |
//! | `concurrent_follows_create_one_edge` | composite key under contention |
//! | `concurrent_likes_create_one_edge` | composite key under contention |
//! | `concurrent_user_creation_with_same_email` | unique email under contention |
//! | `feed_walk_is_ordered_and_complete` | cursor pagination |
//! | `feed_limit_is_clamped` | max page size |
//! | `error_bodies_have_code_and_message` | error shape |

use reqwest::StatusCode;
use serde_json::{json, Value};
use sociograph::{PostId, UserGraph, UserId};
use sociograph_api::{ErrorResponse, MessageResponse, PostDetailResponse, PostListResponse};
use sociograph_conformance::{client, create_post, create_user, spawn_node, spawn_node_with};
use sociograph_node::{NodeConfig, Storage};
use tokio::task::JoinSet;

async fn post_json(c: &reqwest::Client, url: String, body: Value) -> reqwest::Response {
    c.post(url).json(&body).send().await.unwrap()
}

async fn error_code(resp: reqwest::Response) -> String {
    resp.json::<ErrorResponse>().await.unwrap().code
}

// ---------------------------------------------------------------------------
// Basics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ok() {
    let (base, _) = spawn_node().await;
    let resp = client().get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn error_bodies_have_code_and_message() {
    let (base, _) = spawn_node().await;
    let resp = client().get(format!("{base}/api/user/999")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: ErrorResponse = resp.json().await.unwrap();
    assert_eq!(body.code, "not_found");
    assert_eq!(body.error, "user 999 not found");
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn follow_scenario() {
    let (base, _) = spawn_node().await;
    let c = client();
    let a = create_user(&c, &base, "a").await;
    let b = create_user(&c, &base, "b").await;
    assert_eq!((a.id, b.id), (UserId(1), UserId(2)));

    let resp = post_json(&c, format!("{base}/api/follow/2"), json!({ "userId": 1 })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let msg: MessageResponse = resp.json().await.unwrap();
    assert_eq!(msg.message, "Followed user");

    let resp = post_json(&c, format!("{base}/api/follow/2"), json!({ "userId": 1 })).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(resp).await, "already_exists");

    let graph: UserGraph = c
        .get(format!("{base}/api/user/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(graph.following_ids.into_iter().collect::<Vec<_>>(), [UserId(2)]);
    assert!(graph.follower_ids.is_empty());
}

#[tokio::test]
async fn post_without_title_is_rejected() {
    let (base, storage) = spawn_node().await;
    let c = client();
    let a = create_user(&c, &base, "a").await;

    let resp = post_json(
        &c,
        format!("{base}/api/posts"),
        json!({ "description": "body only", "authorId": a.id }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(resp).await, "validation_failed");
    assert!(storage.post_detail(PostId(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn like_by_unknown_user_is_rejected() {
    let (base, storage) = spawn_node().await;
    let c = client();
    let a = create_user(&c, &base, "a").await;
    create_post(&c, &base, a.id.get(), "t").await;

    let resp = post_json(&c, format!("{base}/api/like/1"), json!({ "userId": 999 })).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(resp).await, "not_found");
    let detail = storage.post_detail(PostId(1)).await.unwrap().unwrap();
    assert!(detail.liking_users.is_empty());
}

#[tokio::test]
async fn delete_post_cascades() {
    let (base, storage) = spawn_node().await;
    let c = client();
    let a = create_user(&c, &base, "a").await;
    let p = create_post(&c, &base, a.id.get(), "t").await;
    let pid = p["id"].as_i64().unwrap();

    let resp = post_json(&c, format!("{base}/api/like/{pid}"), json!({ "userId": a.id })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = post_json(
        &c,
        format!("{base}/api/comment/{pid}"),
        json!({ "userId": a.id, "comment": "hi" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let comment: Value = resp.json().await.unwrap();
    let cid = comment["id"].as_i64().unwrap();

    let detail: PostDetailResponse = c
        .get(format!("{base}/api/posts/{pid}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail.liking_users.len(), 1);
    assert_eq!(detail.comments.len(), 1);

    let resp = c.delete(format!("{base}/api/posts/{pid}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(storage.post_detail(PostId(pid)).await.unwrap().is_none());
    let graph = storage.user_graph(a.id).await.unwrap().unwrap();
    assert!(graph.liked_post_ids.is_empty());
    let resp = c.get(format!("{base}/api/comments/{cid}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = post_json(&c, format!("{base}/api/like/{pid}"), json!({ "userId": a.id })).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(resp).await, "not_found");
}

#[tokio::test]
async fn unfollow_absent_edge() {
    let (base, _) = spawn_node().await;
    let c = client();
    create_user(&c, &base, "a").await;
    create_user(&c, &base, "b").await;

    let resp = post_json(&c, format!("{base}/api/unfollow/2"), json!({ "userId": 1 })).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(resp).await, "edge_not_found");
}

#[tokio::test]
async fn follow_unfollow_follow() {
    let (base, storage) = spawn_node().await;
    let c = client();
    create_user(&c, &base, "a").await;
    create_user(&c, &base, "b").await;

    for path in ["follow", "unfollow", "follow"] {
        let resp = post_json(&c, format!("{base}/api/{path}/2"), json!({ "userId": "1" })).await;
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }
    let graph = storage.user_graph(UserId(1)).await.unwrap().unwrap();
    assert_eq!(graph.following_ids.into_iter().collect::<Vec<_>>(), [UserId(2)]);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

/// Fire `n` identical POSTs concurrently and return the status codes.
async fn race(url: String, body: Value, n: usize) -> Vec<StatusCode> {
    let c = client();
    let mut set = JoinSet::new();
    for _ in 0..n {
        let (c, url, body) = (c.clone(), url.clone(), body.clone());
        set.spawn(async move { c.post(url).json(&body).send().await.unwrap().status() });
    }
    let mut statuses = Vec::with_capacity(n);
    while let Some(status) = set.join_next().await {
        statuses.push(status.unwrap());
    }
    statuses
}

fn count(statuses: &[StatusCode], wanted: StatusCode) -> usize {
    statuses.iter().filter(|s| **s == wanted).count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_follows_create_one_edge() {
    let (base, storage) = spawn_node().await;
    let c = client();
    create_user(&c, &base, "a").await;
    create_user(&c, &base, "b").await;

    let statuses = race(format!("{base}/api/follow/2"), json!({ "userId": 1 }), 20).await;
    assert_eq!(count(&statuses, StatusCode::OK), 1, "{statuses:?}");
    assert_eq!(count(&statuses, StatusCode::CONFLICT), 19, "{statuses:?}");
    let graph = storage.user_graph(UserId(2)).await.unwrap().unwrap();
    assert_eq!(graph.follower_ids.into_iter().collect::<Vec<_>>(), [UserId(1)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_likes_create_one_edge() {
    let (base, storage) = spawn_node().await;
    let c = client();
    let a = create_user(&c, &base, "a").await;
    create_post(&c, &base, a.id.get(), "t").await;

    let statuses = race(format!("{base}/api/like/1"), json!({ "userId": 1 }), 20).await;
    assert_eq!(count(&statuses, StatusCode::OK), 1, "{statuses:?}");
    assert_eq!(count(&statuses, StatusCode::CONFLICT), 19, "{statuses:?}");
    let detail = storage.post_detail(PostId(1)).await.unwrap().unwrap();
    let likers: Vec<_> = detail.liking_users.iter().map(|u| u.id).collect();
    assert_eq!(likers, [UserId(1)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_user_creation_with_same_email() {
    let (base, _) = spawn_node().await;
    let statuses = race(
        format!("{base}/api/users"),
        json!({ "username": "racer", "email": "race@x" }),
        20,
    )
    .await;
    assert_eq!(count(&statuses, StatusCode::CREATED), 1, "{statuses:?}");
    assert_eq!(count(&statuses, StatusCode::CONFLICT), 19, "{statuses:?}");
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn feed_walk_is_ordered_and_complete() {
    let (base, _) = spawn_node().await;
    let c = client();
    let a = create_user(&c, &base, "a").await;
    for i in 0..7 {
        create_post(&c, &base, a.id.get(), &format!("p{i}")).await;
    }

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let mut url = format!("{base}/api/posts?limit=3");
        if let Some(cur) = &cursor {
            url.push_str(&format!("&cursor={cur}"));
        }
        let page: PostListResponse = c.get(url).send().await.unwrap().json().await.unwrap();
        assert!(page.items.len() <= 3);
        seen.extend(page.items);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    let titles: Vec<_> = seen.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["p6", "p5", "p4", "p3", "p2", "p1", "p0"]);
    assert!(seen.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

#[tokio::test]
async fn feed_limit_is_clamped() {
    let (base, _) = spawn_node_with(NodeConfig {
        page_size: 2,
        max_page_size: 3,
        ..NodeConfig::default()
    })
    .await;
    let c = client();
    let a = create_user(&c, &base, "a").await;
    for i in 0..5 {
        create_post(&c, &base, a.id.get(), &format!("p{i}")).await;
    }

    let page: PostListResponse = c
        .get(format!("{base}/api/posts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);

    let page: PostListResponse = c
        .get(format!("{base}/api/posts?limit=50"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(page.next_cursor.is_some());
}
