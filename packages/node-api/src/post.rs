//! Post types: `GET|POST /api/posts`, `GET|PUT|DELETE /api/posts/{id}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sociograph::{
    validation::{self, coerce_text},
    NewPost, Post, PostPatch, UserId, ValidationError,
};

/// Request body for `POST /api/posts`.
///
/// `description` is also accepted as `desc`, and `authorId` as `author`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default, alias = "desc")]
    pub description: Option<Value>,
    #[serde(default, alias = "author")]
    pub author_id: Option<Value>,
}

impl TryFrom<CreatePostRequest> for NewPost {
    type Error = ValidationError;

    fn try_from(req: CreatePostRequest) -> Result<Self, Self::Error> {
        let author = validation::coerce_id("authorId", req.author_id.as_ref()).map(UserId)?;
        NewPost::new(
            coerce_text("title", req.title)?,
            coerce_text("description", req.description)?,
            author,
        )
    }
}

/// Request body for `PUT /api/posts/{id}`.
///
/// Only the fields present are changed. A blank `description` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default, alias = "desc")]
    pub description: Option<Value>,
}

impl TryFrom<UpdatePostRequest> for PostPatch {
    type Error = ValidationError;

    fn try_from(req: UpdatePostRequest) -> Result<Self, Self::Error> {
        PostPatch::new(
            coerce_text("title", req.title)?,
            coerce_text("description", req.description)?,
        )
    }
}

/// Query parameters for `GET /api/posts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedQuery {
    /// Page size. Clamped to the node's configured maximum.
    #[serde(default)]
    pub limit: Option<u32>,

    /// Opaque cursor from a previous page's `nextCursor`.
    #[serde(default)]
    pub cursor: Option<String>,

    /// Restrict the feed to one author.
    #[serde(default)]
    pub author: Option<i64>,
}

/// One page of the post feed, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostListResponse {
    pub items: Vec<Post>,

    /// Cursor for the next page; absent when this is the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// `GET /api/posts/{id}` returns the post with likers and comments.
pub type PostDetailResponse = sociograph::PostDetail;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_field_names_are_accepted() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"title": "t", "desc": "d", "author": "3"}"#).unwrap();
        let post = NewPost::try_from(req).unwrap();
        assert_eq!(post.description(), Some("d"));
        assert_eq!(post.author_id(), UserId(3));
    }

    #[test]
    fn missing_title_is_rejected() {
        let req: CreatePostRequest = serde_json::from_str(r#"{"authorId": 1}"#).unwrap();
        assert_eq!(
            NewPost::try_from(req),
            Err(ValidationError::Missing("title"))
        );
    }

    #[test]
    fn missing_author_is_rejected() {
        let req: CreatePostRequest = serde_json::from_str(r#"{"title": "t"}"#).unwrap();
        assert_eq!(
            NewPost::try_from(req),
            Err(ValidationError::Missing("authorId"))
        );
    }

    #[test]
    fn numeric_title_is_a_validation_error() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"title": 7, "authorId": 1}"#).unwrap();
        assert!(matches!(
            NewPost::try_from(req),
            Err(ValidationError::NotText { field: "title", .. })
        ));
        let req: UpdatePostRequest = serde_json::from_str(r#"{"desc": false}"#).unwrap();
        assert!(matches!(
            PostPatch::try_from(req),
            Err(ValidationError::NotText { field: "description", .. })
        ));
    }

    #[test]
    fn empty_page_omits_cursor() {
        let page = PostListResponse {
            items: vec![],
            next_cursor: None,
        };
        let json = serde_json::to_string(&page).unwrap();
        assert_eq!(json, r#"{"items":[]}"#);
    }
}
