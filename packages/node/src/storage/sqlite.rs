//! SQLite-backed storage implementation.
//!
//! Uses `rusqlite` (with bundled SQLite) wrapped in an `Arc<Mutex<Connection>>`
//! to satisfy the `Send + Sync` requirements. All blocking calls are offloaded
//! to a thread-pool via `tokio::task::spawn_blocking`.
//!
//! Every mutation is a single SQL statement, so SQLite's own constraint
//! checks (`UNIQUE`, composite `PRIMARY KEY`, `REFERENCES`) are atomic with
//! the write. Constraint failures are classified by extended result code.
//!
//! # Schema
//!
//! - `users`: `email` carries a `UNIQUE` constraint.
//! - `posts`: `author_id` references `users`.
//! - `comments`: references `users` and `posts`; cascades with its post.
//! - `follows`: `(follower_id, followee_id)` composite primary key.
//! - `likes`: `(user_id, post_id)` composite primary key; cascades with its post.
//!
//! Timestamps are stored as microseconds since the Unix epoch. `created_at`
//! is computed inside the insert statement as the larger of the supplied
//! clock value and one microsecond past the newest value already in the
//! table, so it strictly increases with insertion order.
//!
//! Projections issue several `SELECT`s inside one transaction while holding
//! the connection lock, so all of them see the same database state.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{ffi, params, params_from_iter, Connection, OptionalExtension, Row};
use sociograph::{
    Comment, CommentId, DescriptionChange, Edge, NewComment, NewPost, NewUser, Post, PostDetail,
    PostId, PostPatch, User, UserGraph, UserId, UserPatch, UserSummary,
};

use super::{PostQuery, Storage, StorageError};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS posts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    description TEXT,
    author_id   INTEGER NOT NULL REFERENCES users(id),
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_posts_feed   ON posts(created_at DESC, id ASC);
CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id);

CREATE TABLE IF NOT EXISTS comments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    text        TEXT NOT NULL,
    user_id     INTEGER NOT NULL REFERENCES users(id),
    post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    created_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created_at, id);

CREATE TABLE IF NOT EXISTS follows (
    follower_id INTEGER NOT NULL REFERENCES users(id),
    followee_id INTEGER NOT NULL REFERENCES users(id),
    created_at  INTEGER NOT NULL,
    PRIMARY KEY (follower_id, followee_id)
);
CREATE INDEX IF NOT EXISTS idx_follows_followee ON follows(followee_id);

CREATE TABLE IF NOT EXISTS likes (
    user_id     INTEGER NOT NULL REFERENCES users(id),
    post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    created_at  INTEGER NOT NULL,
    PRIMARY KEY (user_id, post_id)
);
CREATE INDEX IF NOT EXISTS idx_likes_post ON likes(post_id);
";

const USER_COLUMNS: &str = "id, username, email, created_at, updated_at";
const POST_COLUMNS: &str = "id, title, description, author_id, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, text, user_id, post_id, created_at";

// ---------------------------------------------------------------------------
// SqliteStorage
// ---------------------------------------------------------------------------

/// SQLite-backed implementation of [`Storage`].
///
/// Holds a single database connection protected by a `Mutex`. All operations
/// run inside `spawn_blocking` to avoid blocking the async runtime.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) the SQLite database at `path` and apply the schema.
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database (data is lost when dropped).
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking thread-pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StorageError::Unavailable("sqlite connection lock poisoned".into()))?;
            f(&conn)
        })
        .await
        .map_err(|e| StorageError::Unavailable(format!("task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// Error conversions
// ---------------------------------------------------------------------------

fn map_err(e: rusqlite::Error) -> StorageError {
    if let rusqlite::Error::SqliteFailure(err, msg) = &e {
        match err.extended_code {
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY => return StorageError::AlreadyExists,
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return StorageError::ForeignKey,
            ffi::SQLITE_CONSTRAINT_UNIQUE => {
                // "UNIQUE constraint failed: users.email"
                let constraint = msg
                    .as_deref()
                    .and_then(|m| m.rsplit(": ").next())
                    .unwrap_or("unique");
                return StorageError::Unique(constraint.to_string());
            }
            _ => {}
        }
    }
    StorageError::Unavailable(e.to_string())
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

fn now_micros() -> i64 {
    micros(Utc::now().trunc_subsecs(6))
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: i64 = row.get(idx)?;
    DateTime::from_timestamp_micros(raw).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, raw))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        created_at: timestamp(row, 3)?,
        updated_at: timestamp(row, 4)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: PostId(row.get(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        author_id: UserId(row.get(3)?),
        created_at: timestamp(row, 4)?,
        updated_at: timestamp(row, 5)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: CommentId(row.get(0)?),
        text: row.get(1)?,
        user_id: UserId(row.get(2)?),
        post_id: PostId(row.get(3)?),
        created_at: timestamp(row, 4)?,
    })
}

/// Table, subject column, object column, and key values for an edge.
fn edge_columns(edge: &Edge) -> (&'static str, &'static str, &'static str, i64, i64) {
    match *edge {
        Edge::Follow { follower, followee } => (
            "follows",
            "follower_id",
            "followee_id",
            follower.get(),
            followee.get(),
        ),
        Edge::Like { user, post } => ("likes", "user_id", "post_id", user.get(), post.get()),
    }
}

fn query_ids(conn: &Connection, sql: &str, key: i64) -> Result<Vec<i64>, StorageError> {
    let mut stmt = conn.prepare(sql).map_err(map_err)?;
    let ids = stmt
        .query_map(params![key], |row| row.get::<_, i64>(0))
        .map_err(map_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_err)?;
    Ok(ids)
}

fn load_user_graph(conn: &Connection, id: UserId) -> Result<Option<UserGraph>, StorageError> {
    let Some(user) = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.get()],
            user_from_row,
        )
        .optional()
        .map_err(map_err)?
    else {
        return Ok(None);
    };
    let following = query_ids(
        conn,
        "SELECT followee_id FROM follows WHERE follower_id = ?1",
        id.get(),
    )?;
    let followers = query_ids(
        conn,
        "SELECT follower_id FROM follows WHERE followee_id = ?1",
        id.get(),
    )?;
    let liked = query_ids(conn, "SELECT post_id FROM likes WHERE user_id = ?1", id.get())?;
    Ok(Some(UserGraph {
        user,
        following_ids: following.into_iter().map(UserId).collect(),
        follower_ids: followers.into_iter().map(UserId).collect(),
        liked_post_ids: liked.into_iter().map(PostId).collect(),
    }))
}

fn load_post_detail(conn: &Connection, id: PostId) -> Result<Option<PostDetail>, StorageError> {
    let Some(post) = conn
        .query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
            params![id.get()],
            post_from_row,
        )
        .optional()
        .map_err(map_err)?
    else {
        return Ok(None);
    };

    let mut stmt = conn
        .prepare(
            "SELECT u.id, u.username FROM likes l JOIN users u ON u.id = l.user_id
             WHERE l.post_id = ?1 ORDER BY u.id ASC",
        )
        .map_err(map_err)?;
    let liking_users = stmt
        .query_map(params![id.get()], |row| {
            Ok(UserSummary {
                id: UserId(row.get(0)?),
                username: row.get(1)?,
            })
        })
        .map_err(map_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_err)?;

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = ?1
             ORDER BY created_at ASC, id ASC"
        ))
        .map_err(map_err)?;
    let comments = stmt
        .query_map(params![id.get()], comment_from_row)
        .map_err(map_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_err)?;

    Ok(Some(PostDetail {
        post,
        liking_users,
        comments,
    }))
}

// ---------------------------------------------------------------------------
// Storage impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Storage for SqliteStorage {
    // --- Users ---------------------------------------------------------------

    async fn insert_user(&self, user: &NewUser) -> Result<User, StorageError> {
        let user = user.clone();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO users (username, email, created_at, updated_at)
                     SELECT ?1, ?2, t, t FROM
                       (SELECT MAX(?3, COALESCE(MAX(created_at) + 1, 0)) AS t FROM users)
                     RETURNING {USER_COLUMNS}"
                ),
                params![user.username(), user.email(), now_micros()],
                user_from_row,
            )
            .map_err(map_err)
        })
        .await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.get()],
                user_from_row,
            )
            .optional()
            .map_err(map_err)
        })
        .await
    }

    async fn update_user(
        &self,
        id: UserId,
        patch: &UserPatch,
    ) -> Result<Option<User>, StorageError> {
        let patch = patch.clone();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE users SET
                       username   = COALESCE(?2, username),
                       email      = COALESCE(?3, email),
                       updated_at = MAX(?4, created_at)
                     WHERE id = ?1
                     RETURNING {USER_COLUMNS}"
                ),
                params![id.get(), patch.username(), patch.email(), now_micros()],
                user_from_row,
            )
            .optional()
            .map_err(map_err)
        })
        .await
    }

    // --- Posts ---------------------------------------------------------------

    async fn insert_post(&self, post: &NewPost) -> Result<Post, StorageError> {
        let post = post.clone();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO posts (title, description, author_id, created_at, updated_at)
                     SELECT ?1, ?2, ?3, t, t FROM
                       (SELECT MAX(?4, COALESCE(MAX(created_at) + 1, 0)) AS t FROM posts)
                     RETURNING {POST_COLUMNS}"
                ),
                params![
                    post.title(),
                    post.description(),
                    post.author_id().get(),
                    now_micros()
                ],
                post_from_row,
            )
            .map_err(map_err)
        })
        .await
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StorageError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                params![id.get()],
                post_from_row,
            )
            .optional()
            .map_err(map_err)
        })
        .await
    }

    async fn update_post(
        &self,
        id: PostId,
        patch: &PostPatch,
    ) -> Result<Option<Post>, StorageError> {
        let title = patch.title().map(str::to_string);
        let (replace_description, description) = match patch.description() {
            DescriptionChange::Keep => (false, None),
            DescriptionChange::Clear => (true, None),
            DescriptionChange::Set(d) => (true, Some(d.clone())),
        };
        self.with_conn(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE posts SET
                       title       = COALESCE(?2, title),
                       description = CASE WHEN ?3 THEN ?4 ELSE description END,
                       updated_at  = MAX(?5, created_at)
                     WHERE id = ?1
                     RETURNING {POST_COLUMNS}"
                ),
                params![id.get(), title, replace_description, description, now_micros()],
                post_from_row,
            )
            .optional()
            .map_err(map_err)
        })
        .await
    }

    async fn delete_post(&self, id: PostId) -> Result<u64, StorageError> {
        self.with_conn(move |conn| {
            // Likes and comments go with it via ON DELETE CASCADE.
            let n = conn
                .execute("DELETE FROM posts WHERE id = ?1", params![id.get()])
                .map_err(map_err)?;
            Ok(n as u64)
        })
        .await
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<(Vec<Post>, bool), StorageError> {
        let query = query.clone();
        self.with_conn(move |conn| {
            let mut sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE 1=1");
            let mut params_vec: Vec<i64> = Vec::new();

            if let Some(author) = query.author {
                sql.push_str(" AND author_id = ?");
                params_vec.push(author.get());
            }

            if let Some(after) = query.after {
                sql.push_str(" AND (created_at < ? OR (created_at = ? AND id > ?))");
                let at = micros(after.created_at);
                params_vec.extend([at, at, after.id.get()]);
            }

            sql.push_str(" ORDER BY created_at DESC, id ASC LIMIT ?");
            params_vec.push(i64::from(query.limit) + 1);

            let mut stmt = conn.prepare(&sql).map_err(map_err)?;
            let mut posts = stmt
                .query_map(params_from_iter(params_vec.iter()), post_from_row)
                .map_err(map_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_err)?;

            let limit = query.limit as usize;
            let has_more = posts.len() > limit;
            posts.truncate(limit);
            Ok((posts, has_more))
        })
        .await
    }

    // --- Comments ------------------------------------------------------------

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, StorageError> {
        let comment = comment.clone();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO comments (text, user_id, post_id, created_at)
                     SELECT ?1, ?2, ?3, MAX(?4, COALESCE(MAX(created_at) + 1, 0)) FROM comments
                     RETURNING {COMMENT_COLUMNS}"
                ),
                params![
                    comment.text(),
                    comment.user_id().get(),
                    comment.post_id().get(),
                    now_micros()
                ],
                comment_from_row,
            )
            .map_err(map_err)
        })
        .await
    }

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, StorageError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
                params![id.get()],
                comment_from_row,
            )
            .optional()
            .map_err(map_err)
        })
        .await
    }

    // --- Edges ---------------------------------------------------------------

    async fn insert_edge(&self, edge: &Edge) -> Result<(), StorageError> {
        let (table, subject, object, s, o) = edge_columns(edge);
        self.with_conn(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {table} ({subject}, {object}, created_at)
                     SELECT ?1, ?2, MAX(?3, COALESCE(MAX(created_at) + 1, 0)) FROM {table}"
                ),
                params![s, o, now_micros()],
            )
            .map_err(map_err)?;
            Ok(())
        })
        .await
    }

    async fn delete_edge(&self, edge: &Edge) -> Result<u64, StorageError> {
        let (table, subject, object, s, o) = edge_columns(edge);
        self.with_conn(move |conn| {
            let n = conn
                .execute(
                    &format!("DELETE FROM {table} WHERE {subject} = ?1 AND {object} = ?2"),
                    params![s, o],
                )
                .map_err(map_err)?;
            Ok(n as u64)
        })
        .await
    }

    // --- Projections ---------------------------------------------------------

    async fn user_graph(&self, id: UserId) -> Result<Option<UserGraph>, StorageError> {
        self.with_conn(move |conn| {
            let tx = conn.unchecked_transaction().map_err(map_err)?;
            let graph = load_user_graph(&tx, id)?;
            tx.commit().map_err(map_err)?;
            Ok(graph)
        })
        .await
    }

    async fn post_detail(&self, id: PostId) -> Result<Option<PostDetail>, StorageError> {
        self.with_conn(move |conn| {
            let tx = conn.unchecked_transaction().map_err(map_err)?;
            let detail = load_post_detail(&tx, id)?;
            tx.commit().map_err(map_err)?;
            Ok(detail)
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
