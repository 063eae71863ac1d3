//! Comment types: `POST /api/comment/{postId}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sociograph::{validation, NewComment, PostId, UserId, ValidationError};

/// Request body for `POST /api/comment/{postId}`.
///
/// The comment text is accepted as either `comment` or `text`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default, alias = "text")]
    pub comment: Option<Value>,
}

impl CreateCommentRequest {
    /// Build the argument record for commenting on `post_id`.
    pub fn into_new_comment(self, post_id: PostId) -> Result<NewComment, ValidationError> {
        let user_id = validation::coerce_id("userId", self.user_id.as_ref()).map(UserId)?;
        let text = validation::coerce_text("comment", self.comment)?;
        NewComment::new(text, user_id, post_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_either_text_field_name() {
        let a: CreateCommentRequest =
            serde_json::from_str(r#"{"userId": 1, "comment": "hi"}"#).unwrap();
        let b: CreateCommentRequest =
            serde_json::from_str(r#"{"userId": 1, "text": "hi"}"#).unwrap();
        let a = a.into_new_comment(PostId(2)).unwrap();
        let b = b.into_new_comment(PostId(2)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.text(), "hi");
        assert_eq!(a.post_id(), PostId(2));
    }

    #[test]
    fn user_is_checked_before_text() {
        let req: CreateCommentRequest = serde_json::from_str(r#"{"comment": "hi"}"#).unwrap();
        assert_eq!(
            req.into_new_comment(PostId(1)),
            Err(ValidationError::Missing("userId"))
        );
    }
}
