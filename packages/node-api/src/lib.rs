//! Request and response types for the Sociograph HTTP API.
//!
//! Request types deserialise loosely (every field optional, ids as numbers or
//! numeric strings) and convert into the validated argument records from
//! [`sociograph::args`], so a malformed body becomes a typed
//! [`sociograph::ValidationError`] rather than a deserialisation failure.
//!
//! # Endpoints covered
//!
//! | Method | Path | Type |
//! |--------|------|------|
//! | POST | `/api/users` | [`CreateUserRequest`] → [`sociograph::User`] |
//! | GET | `/api/user/{id}` | → [`UserResponse`] |
//! | PATCH | `/api/user/{id}` | [`UpdateUserRequest`] → [`sociograph::User`] |
//! | GET | `/api/posts` | [`FeedQuery`] → [`PostListResponse`] |
//! | POST | `/api/posts` | [`CreatePostRequest`] → [`sociograph::Post`] |
//! | GET | `/api/posts/{id}` | → [`PostDetailResponse`] |
//! | PUT | `/api/posts/{id}` | [`UpdatePostRequest`] → [`sociograph::Post`] |
//! | DELETE | `/api/posts/{id}` | → [`MessageResponse`] |
//! | POST | `/api/follow/{id}` | [`EdgeRequest`] → [`MessageResponse`] |
//! | POST | `/api/unfollow/{id}` | [`EdgeRequest`] → [`MessageResponse`] |
//! | POST | `/api/like/{id}` | [`EdgeRequest`] → [`MessageResponse`] |
//! | POST | `/api/unlike/{id}` | [`EdgeRequest`] → [`MessageResponse`] |
//! | POST | `/api/comment/{id}` | [`CreateCommentRequest`] → [`sociograph::Comment`] |
//! | GET | `/api/comments/{id}` | → [`sociograph::Comment`] |

pub mod comment;
pub mod error;
pub mod post;
pub mod relation;
pub mod user;

pub use comment::CreateCommentRequest;
pub use error::{codes, ErrorResponse, MessageResponse};
pub use post::{CreatePostRequest, FeedQuery, PostDetailResponse, PostListResponse, UpdatePostRequest};
pub use relation::EdgeRequest;
pub use user::{CreateUserRequest, UpdateUserRequest, UserResponse};
