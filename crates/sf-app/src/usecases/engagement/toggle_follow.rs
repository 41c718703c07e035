use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use sf_core::ids::UserId;
use sf_core::ports::{ContentStoreError, FollowStorePort};

use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::usecases::session_guard::GuardHandle;

#[derive(Debug, thiserror::Error)]
pub enum ToggleFollowError {
    #[error("auth: Not authenticated")]
    NotAuthenticated,
    #[error("validation: you cannot follow yourself")]
    SelfFollow,
    #[error("failed to update follow: {0}")]
    Store(#[from] ContentStoreError),
}

/// Follow or unfollow another user, based on what the store currently records.
pub struct ToggleFollow {
    follows: Arc<dyn FollowStorePort>,
    guard: GuardHandle,
    retry: RetryPolicy,
}

impl ToggleFollow {
    pub fn new(follows: Arc<dyn FollowStorePort>, guard: GuardHandle, retry: RetryPolicy) -> Self {
        Self {
            follows,
            guard,
            retry,
        }
    }

    /// Returns whether the viewer follows `target` afterwards.
    pub async fn execute(&self, target: &UserId) -> Result<bool, ToggleFollowError> {
        let user = self
            .guard
            .snapshot()
            .user
            .ok_or(ToggleFollowError::NotAuthenticated)?;
        if &user.id == target {
            return Err(ToggleFollowError::SelfFollow);
        }

        let span = info_span!("usecase.toggle_follow.execute", follower = %user.id, following = %target);
        async {
            let following =
                retry_with_backoff(&self.retry, || self.follows.is_following(&user.id, target))
                    .await?;

            if following {
                retry_with_backoff(&self.retry, || self.follows.unfollow(&user.id, target)).await?;
                info!("unfollowed");
                return Ok(false);
            }

            match retry_with_backoff(&self.retry, || self.follows.follow(&user.id, target)).await {
                Ok(()) | Err(ContentStoreError::AlreadyExists) => {
                    info!("followed");
                    Ok(true)
                }
                Err(err) => Err(err.into()),
            }
        }
        .instrument(span)
        .await
    }
}
