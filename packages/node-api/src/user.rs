//! User types: `POST /api/users`, `GET|PATCH /api/user/{id}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sociograph::{validation::coerce_text, NewUser, UserPatch, ValidationError};

/// Request body for `POST /api/users`.
///
/// Fields are kept loosely typed so a wrong JSON type is reported as a
/// validation failure on that field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
}

impl TryFrom<CreateUserRequest> for NewUser {
    type Error = ValidationError;

    fn try_from(req: CreateUserRequest) -> Result<Self, Self::Error> {
        NewUser::new(
            coerce_text("username", req.username)?,
            coerce_text("email", req.email)?,
        )
    }
}

/// Request body for `PATCH /api/user/{id}`. Absent fields are left as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
}

impl TryFrom<UpdateUserRequest> for UserPatch {
    type Error = ValidationError;

    fn try_from(req: UpdateUserRequest) -> Result<Self, Self::Error> {
        UserPatch::new(
            coerce_text("username", req.username)?,
            coerce_text("email", req.email)?,
        )
    }
}

/// `GET /api/user/{id}` returns the user with their follow graph.
pub type UserResponse = sociograph::UserGraph;
