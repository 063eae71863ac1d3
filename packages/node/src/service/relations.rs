//! Relationship engine: follow/unfollow and like/unlike.
//!
//! Both relations are composite-keyed join rows and share one algorithm:
//!
//! 1. Check the subject (always a user) exists, else `SubjectNotFound`.
//! 2. Check the object (user or post) exists, else `ObjectNotFound`.
//! 3. Insert or delete the row in a single storage call.
//!
//! Steps 1 and 2 exist for precise errors only. Two concurrent requests can
//! both pass them, so step 3 relies on the storage constraints: the composite
//! primary key turns a duplicate insert into `AlreadyExists`, and the foreign
//! keys turn an insert against a just-deleted post into `ObjectNotFound`.
//! A delete that removes zero rows is `EdgeNotFound`.

use sociograph::{Edge, EntityKind, PostId, UserId};

use super::{ServiceError, SocialGraph};
use crate::storage::StorageError;

impl SocialGraph {
    /// Create an edge. Exactly one of any number of concurrent calls for the
    /// same pair succeeds; the others get [`ServiceError::AlreadyExists`].
    pub async fn create_edge(&self, edge: Edge) -> Result<(), ServiceError> {
        self.require_endpoints(&edge).await?;
        match self.storage.insert_edge(&edge).await {
            Ok(()) => Ok(()),
            Err(StorageError::AlreadyExists) => Err(ServiceError::AlreadyExists(edge)),
            Err(StorageError::ForeignKey) => Err(self.vanished_endpoint(&edge).await),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove an edge. Removing an absent edge is
    /// [`ServiceError::EdgeNotFound`] and changes nothing.
    pub async fn remove_edge(&self, edge: Edge) -> Result<(), ServiceError> {
        self.require_endpoints(&edge).await?;
        match self.storage.delete_edge(&edge).await? {
            0 => Err(ServiceError::EdgeNotFound(edge)),
            _ => Ok(()),
        }
    }

    pub async fn follow(&self, follower: UserId, followee: UserId) -> Result<(), ServiceError> {
        self.create_edge(Edge::follow(follower, followee)).await
    }

    pub async fn unfollow(&self, follower: UserId, followee: UserId) -> Result<(), ServiceError> {
        self.remove_edge(Edge::follow(follower, followee)).await
    }

    pub async fn like(&self, user: UserId, post: PostId) -> Result<(), ServiceError> {
        self.create_edge(Edge::like(user, post)).await
    }

    pub async fn unlike(&self, user: UserId, post: PostId) -> Result<(), ServiceError> {
        self.remove_edge(Edge::like(user, post)).await
    }

    async fn require_endpoints(&self, edge: &Edge) -> Result<(), ServiceError> {
        let subject = edge.subject();
        if self.storage.get_user(subject).await?.is_none() {
            return Err(ServiceError::SubjectNotFound {
                entity: EntityKind::User,
                id: subject.get(),
            });
        }
        let object_exists = match *edge {
            Edge::Follow { followee, .. } => self.storage.get_user(followee).await?.is_some(),
            Edge::Like { post, .. } => self.storage.get_post(post).await?.is_some(),
        };
        if !object_exists {
            return Err(ServiceError::ObjectNotFound {
                entity: edge.object_kind(),
                id: edge.object_id(),
            });
        }
        Ok(())
    }

    /// An endpoint disappeared between the existence check and the insert.
    async fn vanished_endpoint(&self, edge: &Edge) -> ServiceError {
        match self.require_endpoints(edge).await {
            Err(e) => e,
            Ok(()) => ServiceError::ObjectNotFound {
                entity: edge.object_kind(),
                id: edge.object_id(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::task::JoinSet;

    use super::*;
    use crate::service::test_support::{
        followers, following, graphs, likers, post, user, MISSING_POST, MISSING_USER,
    };

    #[tokio::test]
    async fn follow_twice_reports_already_exists() {
        for (backend, g) in graphs() {
            let a = user(&g, "a").await;
            let b = user(&g, "b").await;
            g.follow(a.id, b.id).await.unwrap();
            assert_eq!(
                g.follow(a.id, b.id).await.unwrap_err(),
                ServiceError::AlreadyExists(Edge::follow(a.id, b.id)),
                "{backend}"
            );
            assert_eq!(following(&g, a.id).await, vec![b.id], "{backend}");
        }
    }

    #[tokio::test]
    async fn create_remove_create_round_trip() {
        for (backend, g) in graphs() {
            let a = user(&g, "a").await;
            let p = post(&g, a.id, "t").await;
            let edge = Edge::like(a.id, p.id);

            g.create_edge(edge).await.unwrap();
            g.remove_edge(edge).await.unwrap();
            g.create_edge(edge).await.unwrap();
            assert_eq!(likers(&g, p.id).await, vec![a.id], "{backend}");
        }
    }

    #[tokio::test]
    async fn removing_absent_edge_is_edge_not_found() {
        for (backend, g) in graphs() {
            let a = user(&g, "a").await;
            let b = user(&g, "b").await;
            assert_eq!(
                g.unfollow(a.id, b.id).await.unwrap_err(),
                ServiceError::EdgeNotFound(Edge::follow(a.id, b.id)),
                "{backend}"
            );
            assert!(following(&g, a.id).await.is_empty(), "{backend}");
            assert!(followers(&g, b.id).await.is_empty(), "{backend}");
        }
    }

    #[tokio::test]
    async fn unfollow_twice_converges_to_absent() {
        for (backend, g) in graphs() {
            let a = user(&g, "a").await;
            let b = user(&g, "b").await;
            g.follow(a.id, b.id).await.unwrap();
            g.unfollow(a.id, b.id).await.unwrap();
            assert!(
                matches!(g.unfollow(a.id, b.id).await, Err(ServiceError::EdgeNotFound(_))),
                "{backend}"
            );
            assert!(following(&g, a.id).await.is_empty(), "{backend}");
        }
    }

    #[tokio::test]
    async fn like_by_unknown_user_is_subject_not_found() {
        for (backend, g) in graphs() {
            let a = user(&g, "a").await;
            let p = post(&g, a.id, "t").await;
            assert_eq!(
                g.like(MISSING_USER, p.id).await.unwrap_err(),
                ServiceError::SubjectNotFound {
                    entity: EntityKind::User,
                    id: 999
                },
                "{backend}"
            );
            assert!(likers(&g, p.id).await.is_empty(), "{backend}");
        }
    }

    #[tokio::test]
    async fn missing_objects_are_object_not_found() {
        for (backend, g) in graphs() {
            let a = user(&g, "a").await;
            assert_eq!(
                g.like(a.id, MISSING_POST).await.unwrap_err(),
                ServiceError::ObjectNotFound {
                    entity: EntityKind::Post,
                    id: 999
                },
                "{backend}"
            );
            assert_eq!(
                g.follow(a.id, MISSING_USER).await.unwrap_err(),
                ServiceError::ObjectNotFound {
                    entity: EntityKind::User,
                    id: 999
                },
                "{backend}"
            );
            // Removal checks endpoints first, too.
            assert!(
                matches!(
                    g.unlike(a.id, MISSING_POST).await,
                    Err(ServiceError::ObjectNotFound { .. })
                ),
                "{backend}"
            );
        }
    }

    #[tokio::test]
    async fn self_follow_and_self_like_are_permitted() {
        for (backend, g) in graphs() {
            let a = user(&g, "a").await;
            let p = post(&g, a.id, "mine").await;
            g.follow(a.id, a.id).await.unwrap();
            g.like(a.id, p.id).await.unwrap();
            assert_eq!(followers(&g, a.id).await, vec![a.id], "{backend}");
        }
    }

    #[tokio::test]
    async fn like_after_post_deleted_is_object_not_found() {
        for (backend, g) in graphs() {
            let a = user(&g, "a").await;
            let p = post(&g, a.id, "t").await;
            g.like(a.id, p.id).await.unwrap();
            g.delete_post(p.id).await.unwrap();
            assert!(
                matches!(g.like(a.id, p.id).await, Err(ServiceError::ObjectNotFound { .. })),
                "{backend}"
            );
            let graph = g.user_with_follow_graph(a.id).await.unwrap();
            assert!(graph.liked_post_ids.is_empty(), "{backend}");
        }
    }

    #[tokio::test]
    async fn concurrent_duplicate_follows_yield_exactly_one_success() {
        for (backend, g) in graphs() {
            let a = user(&g, "a").await;
            let b = user(&g, "b").await;
            let g = Arc::new(g);

            let mut set = JoinSet::new();
            for _ in 0..32 {
                let g = Arc::clone(&g);
                set.spawn(async move { g.follow(a.id, b.id).await });
            }

            let (mut ok, mut dup) = (0, 0);
            while let Some(res) = set.join_next().await {
                match res.unwrap() {
                    Ok(()) => ok += 1,
                    Err(ServiceError::AlreadyExists(_)) => dup += 1,
                    Err(e) => panic!("{backend}: unexpected {e:?}"),
                }
            }
            assert_eq!((ok, dup), (1, 31), "{backend}");
            assert_eq!(following(&g, a.id).await, vec![b.id], "{backend}");
        }
    }

    #[tokio::test]
    async fn concurrent_duplicate_likes_yield_exactly_one_success() {
        for (backend, g) in graphs() {
            let a = user(&g, "a").await;
            let p = post(&g, a.id, "t").await;
            let g = Arc::new(g);

            let mut set = JoinSet::new();
            for _ in 0..32 {
                let g = Arc::clone(&g);
                set.spawn(async move { g.like(a.id, p.id).await });
            }

            let mut ok = 0;
            while let Some(res) = set.join_next().await {
                if res.unwrap().is_ok() {
                    ok += 1;
                }
            }
            assert_eq!(ok, 1, "{backend}");
            assert_eq!(likers(&g, p.id).await, vec![a.id], "{backend}");
        }
    }
}
