//! Entity store operations: create, get, update, delete per entity type.
//!
//! Uniqueness is left entirely to storage. The existence checks in
//! [`SocialGraph::create_post`] and [`SocialGraph::create_comment`] only
//! produce precise errors; the storage foreign keys are what actually
//! guarantee the references resolve.

use sociograph::{
    Comment, CommentId, Deleted, EntityKind, NewComment, NewPost, NewUser, Post, PostId,
    PostPatch, User, UserId, UserPatch,
};

use super::{ServiceError, SocialGraph};
use crate::storage::StorageError;

impl SocialGraph {
    // --- Users ---------------------------------------------------------------

    pub async fn create_user(&self, user: NewUser) -> Result<User, ServiceError> {
        self.storage.insert_user(&user).await.map_err(|e| match e {
            StorageError::Unique(_) => {
                ServiceError::UniquenessViolation(format!("email {} is already in use", user.email()))
            }
            other => other.into(),
        })
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, ServiceError> {
        self.storage
            .get_user(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::User, id))
    }

    pub async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, ServiceError> {
        if patch.is_empty() {
            return self.get_user(id).await;
        }
        match self.storage.update_user(id, &patch).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(ServiceError::not_found(EntityKind::User, id)),
            Err(StorageError::Unique(_)) => Err(ServiceError::UniquenessViolation(format!(
                "email {} is already in use",
                patch.email().unwrap_or_default()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    // --- Posts ---------------------------------------------------------------

    pub async fn create_post(&self, post: NewPost) -> Result<Post, ServiceError> {
        let author = post.author_id();
        self.get_user(author).await?;
        match self.storage.insert_post(&post).await {
            Ok(post) => Ok(post),
            Err(StorageError::ForeignKey) => Err(ServiceError::not_found(EntityKind::User, author)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_post(&self, id: PostId) -> Result<Post, ServiceError> {
        self.storage
            .get_post(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Post, id))
    }

    pub async fn update_post(&self, id: PostId, patch: PostPatch) -> Result<Post, ServiceError> {
        if patch.is_empty() {
            return self.get_post(id).await;
        }
        self.storage
            .update_post(id, &patch)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Post, id))
    }

    /// Delete a post along with its likes and comments.
    pub async fn delete_post(&self, id: PostId) -> Result<Deleted, ServiceError> {
        match self.storage.delete_post(id).await? {
            0 => Err(ServiceError::not_found(EntityKind::Post, id)),
            count => Ok(Deleted { count }),
        }
    }

    // --- Comments ------------------------------------------------------------

    /// Comment on a post. The commenter is the subject, the post the object.
    pub async fn create_comment(&self, comment: NewComment) -> Result<Comment, ServiceError> {
        let (user, post) = (comment.user_id(), comment.post_id());
        if self.storage.get_user(user).await?.is_none() {
            return Err(ServiceError::SubjectNotFound {
                entity: EntityKind::User,
                id: user.get(),
            });
        }
        if self.storage.get_post(post).await?.is_none() {
            return Err(ServiceError::ObjectNotFound {
                entity: EntityKind::Post,
                id: post.get(),
            });
        }
        match self.storage.insert_comment(&comment).await {
            Ok(comment) => Ok(comment),
            // Users are never deleted, so the post went away after the check.
            Err(StorageError::ForeignKey) => Err(ServiceError::ObjectNotFound {
                entity: EntityKind::Post,
                id: post.get(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_comment(&self, id: CommentId) -> Result<Comment, ServiceError> {
        self.storage
            .get_comment(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Comment, id))
    }
}
