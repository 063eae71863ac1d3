//! Core data types for the Sociograph domain.
//!
//! Rows: [`User`], [`Post`], [`Comment`]. Edges: [`Edge`] (follow and like),
//! keyed by their endpoints rather than a surrogate id. Projections returned
//! by read operations: [`UserGraph`], [`PostDetail`], [`UserSummary`].
//!
//! All types serialise to camelCase JSON.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// The raw integer key.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

id_type!(
    /// Surrogate key of a [`User`] row. Generated by storage, never reused.
    UserId
);
id_type!(
    /// Surrogate key of a [`Post`] row.
    PostId
);
id_type!(
    /// Surrogate key of a [`Comment`] row.
    CommentId
);

/// The tables that carry a surrogate id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Post,
    Comment,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => write!(f, "user"),
            EntityKind::Post => write!(f, "post"),
            EntityKind::Comment => write!(f, "comment"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Position of this post in the feed, used as a keyset pagination cursor.
    pub fn cursor(&self) -> PostCursor {
        PostCursor {
            created_at: self.created_at,
            id: self.id,
        }
    }
}

/// A comment on a post. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub user_id: UserId,
    pub post_id: PostId,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// The two relation tables keyed by a composite primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Follow,
    Like,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Follow => write!(f, "follow"),
            EdgeKind::Like => write!(f, "like"),
        }
    }
}

/// A directed relation row, identified entirely by its two endpoints.
///
/// The subject is always a user. The object is a user for follows and a
/// post for likes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Follow { follower: UserId, followee: UserId },
    Like { user: UserId, post: PostId },
}

impl Edge {
    pub fn follow(follower: UserId, followee: UserId) -> Self {
        Edge::Follow { follower, followee }
    }

    pub fn like(user: UserId, post: PostId) -> Self {
        Edge::Like { user, post }
    }

    pub fn kind(&self) -> EdgeKind {
        match self {
            Edge::Follow { .. } => EdgeKind::Follow,
            Edge::Like { .. } => EdgeKind::Like,
        }
    }

    /// The user on the outgoing end of the edge.
    pub fn subject(&self) -> UserId {
        match *self {
            Edge::Follow { follower, .. } => follower,
            Edge::Like { user, .. } => user,
        }
    }

    /// The table the object endpoint lives in.
    pub fn object_kind(&self) -> EntityKind {
        match self {
            Edge::Follow { .. } => EntityKind::User,
            Edge::Like { .. } => EntityKind::Post,
        }
    }

    /// Raw key of the object endpoint.
    pub fn object_id(&self) -> i64 {
        match *self {
            Edge::Follow { followee, .. } => followee.get(),
            Edge::Like { post, .. } => post.get(),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Follow { follower, followee } => {
                write!(f, "follow from user {follower} to user {followee}")
            }
            Edge::Like { user, post } => write!(f, "like from user {user} on post {post}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Feed cursor
// ---------------------------------------------------------------------------

/// Keyset position in the post feed.
///
/// The feed is ordered by `created_at` descending, then `id` ascending, so a
/// post comes after the cursor when it is strictly older, or equally old with
/// a larger id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostCursor {
    pub created_at: DateTime<Utc>,
    pub id: PostId,
}

impl PostCursor {
    /// Returns `true` if `post` sorts strictly after this cursor in the feed.
    pub fn precedes(&self, post: &Post) -> bool {
        post.created_at < self.created_at
            || (post.created_at == self.created_at && post.id > self.id)
    }

    /// Opaque wire form: `<microseconds since epoch>.<post id>`.
    pub fn encode(&self) -> String {
        format!("{}.{}", self.created_at.timestamp_micros(), self.id)
    }

    /// Parse the output of [`PostCursor::encode`]. Returns `None` for
    /// anything else.
    pub fn decode(s: &str) -> Option<Self> {
        let (micros, id) = s.split_once('.')?;
        let created_at = DateTime::from_timestamp_micros(micros.parse().ok()?)?;
        let id = PostId(id.parse().ok()?);
        Some(Self { created_at, id })
    }
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// The public face of a user inside another entity's projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
}

/// A user together with both directions of their follow graph and the posts
/// they like.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserGraph {
    #[serde(flatten)]
    pub user: User,
    pub following_ids: BTreeSet<UserId>,
    pub follower_ids: BTreeSet<UserId>,
    pub liked_post_ids: BTreeSet<PostId>,
}

/// A post with the users who like it (ordered by id) and its comments
/// (ordered by creation time).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub liking_users: Vec<UserSummary>,
    pub comments: Vec<Comment>,
}

/// Outcome of a successful delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub count: u64,
}
