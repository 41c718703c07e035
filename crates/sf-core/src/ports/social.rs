//! Posts, likes and follows. Each lives in its own backend table; row-level
//! security restricts writes to rows owned by the signed-in user.

use async_trait::async_trait;
use thiserror::Error;

use crate::ids::{PostId, UserId};
use crate::post::{NewPost, Post};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentStoreError {
    #[error("content access forbidden: {0}")]
    Forbidden(String),

    #[error("record already exists")]
    AlreadyExists,

    #[error("content store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed content record: {0}")]
    Malformed(String),

    #[error("content store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait PostStorePort: Send + Sync {
    async fn create_post(&self, post: &NewPost) -> Result<Post, ContentStoreError>;
}

/// At most one like per (post, user) pair.
#[async_trait]
pub trait LikeStorePort: Send + Sync {
    async fn has_liked(&self, post_id: &PostId, user_id: &UserId) -> Result<bool, ContentStoreError>;

    async fn add_like(&self, post_id: &PostId, user_id: &UserId) -> Result<(), ContentStoreError>;

    /// Removing a like that does not exist succeeds.
    async fn remove_like(&self, post_id: &PostId, user_id: &UserId)
        -> Result<(), ContentStoreError>;
}

#[async_trait]
pub trait FollowStorePort: Send + Sync {
    async fn is_following(
        &self,
        follower: &UserId,
        following: &UserId,
    ) -> Result<bool, ContentStoreError>;

    async fn follow(&self, follower: &UserId, following: &UserId) -> Result<(), ContentStoreError>;

    async fn unfollow(&self, follower: &UserId, following: &UserId)
        -> Result<(), ContentStoreError>;
}
