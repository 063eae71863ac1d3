//! In-memory storage implementation.
//!
//! All data is held in RAM behind a [`RwLock`] and is lost when the process
//! exits. Use this for tests, the conformance suite, and ephemeral nodes.
//!
//! Every mutating method takes the write lock once and performs its
//! constraint checks and its write inside that single critical section, which
//! gives the same all-or-nothing behaviour as a constraint-checked SQL insert.
//! Edge tables are [`BTreeMap`]s keyed by the composite key, so "at most one
//! edge per pair" is a property of the map itself.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sociograph::{
    Comment, CommentId, Edge, NewComment, NewPost, NewUser, Post, PostDetail, PostId, PostPatch,
    User, UserGraph, UserId, UserPatch, UserSummary,
};

use super::{next_timestamp, PostQuery, Storage, StorageError};

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

/// Latest `created_at` handed out per table.
#[derive(Default)]
struct Clock {
    users: Option<DateTime<Utc>>,
    posts: Option<DateTime<Utc>>,
    comments: Option<DateTime<Utc>>,
    follows: Option<DateTime<Utc>>,
    likes: Option<DateTime<Utc>>,
}

fn stamp(latest: &mut Option<DateTime<Utc>>) -> DateTime<Utc> {
    let at = next_timestamp(*latest);
    *latest = Some(at);
    at
}

#[derive(Default)]
struct Inner {
    users: BTreeMap<UserId, User>,
    /// Unique index on `users.email`.
    emails: HashMap<String, UserId>,
    posts: BTreeMap<PostId, Post>,
    comments: BTreeMap<CommentId, Comment>,
    /// (follower, followee) → created_at.
    follows: BTreeMap<(UserId, UserId), DateTime<Utc>>,
    /// (user, post) → created_at.
    likes: BTreeMap<(UserId, PostId), DateTime<Utc>>,
    last_user_id: i64,
    last_post_id: i64,
    last_comment_id: i64,
    clock: Clock,
}

impl Inner {
    fn endpoints_exist(&self, edge: &Edge) -> bool {
        match edge {
            Edge::Follow { follower, followee } => {
                self.users.contains_key(follower) && self.users.contains_key(followee)
            }
            Edge::Like { user, post } => {
                self.users.contains_key(user) && self.posts.contains_key(post)
            }
        }
    }

    fn user_graph(&self, id: UserId) -> Option<UserGraph> {
        let user = self.users.get(&id)?.clone();
        Some(UserGraph {
            user,
            following_ids: self
                .follows
                .keys()
                .filter(|(follower, _)| *follower == id)
                .map(|(_, followee)| *followee)
                .collect(),
            follower_ids: self
                .follows
                .keys()
                .filter(|(_, followee)| *followee == id)
                .map(|(follower, _)| *follower)
                .collect(),
            liked_post_ids: self
                .likes
                .keys()
                .filter(|(liker, _)| *liker == id)
                .map(|(_, post)| *post)
                .collect(),
        })
    }

    fn post_detail(&self, id: PostId) -> Option<PostDetail> {
        let post = self.posts.get(&id)?.clone();
        // Keys sort by user first, so likers come out ascending.
        let liking_users = self
            .likes
            .keys()
            .filter(|(_, liked)| *liked == id)
            .filter_map(|(user, _)| self.users.get(user))
            .map(|u| UserSummary {
                id: u.id,
                username: u.username.clone(),
            })
            .collect();
        let mut comments: Vec<Comment> = self
            .comments
            .values()
            .filter(|c| c.post_id == id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Some(PostDetail {
            post,
            liking_users,
            comments,
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// Thread-safe, in-memory implementation of [`Storage`].
#[derive(Default)]
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StorageError> {
        self.inner
            .read()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StorageError> {
        self.inner
            .write()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))
    }
}

// ---------------------------------------------------------------------------
// Storage impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Storage for MemoryStorage {
    // --- Users ---------------------------------------------------------------

    async fn insert_user(&self, user: &NewUser) -> Result<User, StorageError> {
        let mut inner = self.write()?;
        if inner.emails.contains_key(user.email()) {
            return Err(StorageError::Unique("users.email".into()));
        }
        inner.last_user_id += 1;
        let id = UserId(inner.last_user_id);
        let at = stamp(&mut inner.clock.users);
        let row = User {
            id,
            username: user.username().to_string(),
            email: user.email().to_string(),
            created_at: at,
            updated_at: at,
        };
        inner.emails.insert(row.email.clone(), id);
        inner.users.insert(id, row.clone());
        Ok(row)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn update_user(
        &self,
        id: UserId,
        patch: &UserPatch,
    ) -> Result<Option<User>, StorageError> {
        let mut inner = self.write()?;
        let Some(current) = inner.users.get(&id).cloned() else {
            return Ok(None);
        };
        if let Some(email) = patch.email() {
            if inner.emails.get(email).is_some_and(|owner| *owner != id) {
                return Err(StorageError::Unique("users.email".into()));
            }
        }

        let mut row = current;
        if let Some(username) = patch.username() {
            row.username = username.to_string();
        }
        if let Some(email) = patch.email() {
            inner.emails.remove(&row.email);
            row.email = email.to_string();
            inner.emails.insert(row.email.clone(), id);
        }
        row.updated_at = Utc::now().trunc_subsecs(6).max(row.created_at);
        inner.users.insert(id, row.clone());
        Ok(Some(row))
    }

    // --- Posts ---------------------------------------------------------------

    async fn insert_post(&self, post: &NewPost) -> Result<Post, StorageError> {
        let mut inner = self.write()?;
        if !inner.users.contains_key(&post.author_id()) {
            return Err(StorageError::ForeignKey);
        }
        inner.last_post_id += 1;
        let id = PostId(inner.last_post_id);
        let at = stamp(&mut inner.clock.posts);
        let row = Post {
            id,
            title: post.title().to_string(),
            description: post.description().map(str::to_string),
            author_id: post.author_id(),
            created_at: at,
            updated_at: at,
        };
        inner.posts.insert(id, row.clone());
        Ok(row)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StorageError> {
        Ok(self.read()?.posts.get(&id).cloned())
    }

    async fn update_post(
        &self,
        id: PostId,
        patch: &PostPatch,
    ) -> Result<Option<Post>, StorageError> {
        let mut inner = self.write()?;
        let Some(row) = inner.posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title() {
            row.title = title.to_string();
        }
        row.description = patch.apply_description(row.description.take());
        row.updated_at = Utc::now().trunc_subsecs(6).max(row.created_at);
        Ok(Some(row.clone()))
    }

    async fn delete_post(&self, id: PostId) -> Result<u64, StorageError> {
        let mut inner = self.write()?;
        if inner.posts.remove(&id).is_none() {
            return Ok(0);
        }
        inner.likes.retain(|(_, post), _| *post != id);
        inner.comments.retain(|_, c| c.post_id != id);
        Ok(1)
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<(Vec<Post>, bool), StorageError> {
        let inner = self.read()?;
        let limit = query.limit as usize;

        let mut matching: Vec<&Post> = inner
            .posts
            .values()
            .filter(|p| query.author.is_none_or(|a| p.author_id == a))
            .filter(|p| query.after.is_none_or(|c| c.precedes(p)))
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let has_more = matching.len() > limit;
        let page = matching.into_iter().take(limit).cloned().collect();
        Ok((page, has_more))
    }

    // --- Comments ------------------------------------------------------------

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, StorageError> {
        let mut inner = self.write()?;
        if !inner.users.contains_key(&comment.user_id())
            || !inner.posts.contains_key(&comment.post_id())
        {
            return Err(StorageError::ForeignKey);
        }
        inner.last_comment_id += 1;
        let row = Comment {
            id: CommentId(inner.last_comment_id),
            text: comment.text().to_string(),
            user_id: comment.user_id(),
            post_id: comment.post_id(),
            created_at: stamp(&mut inner.clock.comments),
        };
        inner.comments.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, StorageError> {
        Ok(self.read()?.comments.get(&id).cloned())
    }

    // --- Edges ---------------------------------------------------------------

    async fn insert_edge(&self, edge: &Edge) -> Result<(), StorageError> {
        let mut inner = self.write()?;
        if !inner.endpoints_exist(edge) {
            return Err(StorageError::ForeignKey);
        }
        let inner = &mut *inner;
        match *edge {
            Edge::Follow { follower, followee } => {
                if inner.follows.contains_key(&(follower, followee)) {
                    return Err(StorageError::AlreadyExists);
                }
                let at = stamp(&mut inner.clock.follows);
                inner.follows.insert((follower, followee), at);
            }
            Edge::Like { user, post } => {
                if inner.likes.contains_key(&(user, post)) {
                    return Err(StorageError::AlreadyExists);
                }
                let at = stamp(&mut inner.clock.likes);
                inner.likes.insert((user, post), at);
            }
        }
        Ok(())
    }

    async fn delete_edge(&self, edge: &Edge) -> Result<u64, StorageError> {
        let mut inner = self.write()?;
        let removed = match *edge {
            Edge::Follow { follower, followee } => {
                inner.follows.remove(&(follower, followee)).is_some()
            }
            Edge::Like { user, post } => inner.likes.remove(&(user, post)).is_some(),
        };
        Ok(u64::from(removed))
    }

    // --- Projections ---------------------------------------------------------

    async fn user_graph(&self, id: UserId) -> Result<Option<UserGraph>, StorageError> {
        Ok(self.read()?.user_graph(id))
    }

    async fn post_detail(&self, id: PostId) -> Result<Option<PostDetail>, StorageError> {
        Ok(self.read()?.post_detail(id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
