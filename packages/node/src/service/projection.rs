//! Read-only projections: a user with their follow graph, a post with its
//! likers and comments, and the post feed.
//!
//! The user and post projections are each a single storage call, so every
//! part of one result comes from the same snapshot.

use std::sync::Arc;

use sociograph::{EntityKind, Post, PostCursor, PostDetail, PostId, UserGraph, UserId};

use super::{ServiceError, SocialGraph};
use crate::storage::{PostQuery, Storage};

/// Page size used by [`SocialGraph::list_posts`].
const COLLECT_PAGE_SIZE: u32 = 100;

impl SocialGraph {
    pub async fn user_with_follow_graph(&self, id: UserId) -> Result<UserGraph, ServiceError> {
        self.storage
            .user_graph(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::User, id))
    }

    pub async fn post_detail(&self, id: PostId) -> Result<PostDetail, ServiceError> {
        self.storage
            .post_detail(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Post, id))
    }

    /// Start a fresh walk over the feed, newest first.
    pub fn post_feed(&self, author: Option<UserId>, page_size: u32) -> PostFeed {
        PostFeed {
            storage: Arc::clone(&self.storage),
            author,
            page_size: page_size.max(1),
            cursor: None,
            done: false,
        }
    }

    /// One page of the feed starting after `after`. Returns the posts and,
    /// when more remain, the cursor to pass for the next page.
    pub async fn feed_page(
        &self,
        author: Option<UserId>,
        after: Option<PostCursor>,
        limit: u32,
    ) -> Result<(Vec<Post>, Option<PostCursor>), ServiceError> {
        if let Some(author) = author {
            if self.storage.get_user(author).await?.is_none() {
                return Err(ServiceError::not_found(EntityKind::User, author));
            }
        }
        let query = PostQuery {
            author,
            after,
            limit: limit.max(1),
        };
        let (posts, has_more) = self.storage.list_posts(&query).await?;
        let next = match posts.last() {
            Some(last) if has_more => Some(last.cursor()),
            _ => None,
        };
        Ok((posts, next))
    }

    /// The whole feed in order.
    pub async fn list_posts(&self) -> Result<Vec<Post>, ServiceError> {
        self.post_feed(None, COLLECT_PAGE_SIZE).collect_all().await
    }
}

/// A lazy, finite walk over the post feed.
///
/// Pages are fetched on demand with keyset pagination, so posts created
/// while walking never cause duplicates or skips among the posts that
/// existed when the walk started. Obtain a new feed from
/// [`SocialGraph::post_feed`] to start over.
pub struct PostFeed {
    storage: Arc<dyn Storage>,
    author: Option<UserId>,
    page_size: u32,
    cursor: Option<PostCursor>,
    done: bool,
}

impl PostFeed {
    /// Fetch the next page. Returns `None` once the feed is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Post>>, ServiceError> {
        if self.done {
            return Ok(None);
        }
        let query = PostQuery {
            author: self.author,
            after: self.cursor,
            limit: self.page_size,
        };
        let (posts, has_more) = self.storage.list_posts(&query).await?;
        self.done = !has_more;
        match posts.last() {
            Some(last) => {
                self.cursor = Some(last.cursor());
                Ok(Some(posts))
            }
            None => {
                self.done = true;
                Ok(None)
            }
        }
    }

    /// Drain the remaining pages into one vector.
    pub async fn collect_all(mut self) -> Result<Vec<Post>, ServiceError> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page);
        }
        Ok(all)
    }
}
