//! Relation request body: `POST /api/{follow,unfollow,like,unlike}/{id}`.
//!
//! The path carries the object (the user to follow, or the post to like);
//! the body names the acting user.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sociograph::{validation, UserId, ValidationError};

/// Request body shared by follow, unfollow, like, and unlike.
///
/// `userId` may be sent as a number or a numeric string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRequest {
    #[serde(default)]
    pub user_id: Option<Value>,
}

impl EdgeRequest {
    /// The acting user (follower or liker).
    pub fn subject(&self) -> Result<UserId, ValidationError> {
        validation::coerce_id("userId", self.user_id.as_ref()).map(UserId)
    }
}
