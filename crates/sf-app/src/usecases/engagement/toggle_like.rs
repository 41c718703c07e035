use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info_span, warn, Instrument};

use sf_core::ids::{PostId, UserId};
use sf_core::post::LikeState;
use sf_core::ports::{ContentStoreError, LikeStorePort};

use crate::diagnostics::DiagnosticLog;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::usecases::session_guard::GuardHandle;

const LOG_CONTEXT: &str = "like_toggle";

#[derive(Debug, thiserror::Error)]
pub enum ToggleLikeError {
    #[error("auth: Not authenticated")]
    NotAuthenticated,
    #[error("failed to toggle like: {0}")]
    Store(#[from] ContentStoreError),
}

/// Optimistic like toggle.
///
/// The flipped state is published to the caller's channel before the backend
/// is touched; on failure the previous state is published again.
pub struct ToggleLike {
    likes: Arc<dyn LikeStorePort>,
    guard: GuardHandle,
    retry: RetryPolicy,
}

impl ToggleLike {
    pub fn new(likes: Arc<dyn LikeStorePort>, guard: GuardHandle, retry: RetryPolicy) -> Self {
        Self {
            likes,
            guard,
            retry,
        }
    }

    /// Toggle the viewer's like on `post_id`, keeping `state` in step. Returns the confirmed state.
    pub async fn execute(
        &self,
        post_id: &PostId,
        state: &watch::Sender<LikeState>,
    ) -> Result<LikeState, ToggleLikeError> {
        let previous = *state.borrow();
        let optimistic = previous.toggled();
        state.send_replace(optimistic);

        let span = info_span!("usecase.toggle_like.execute", %post_id, liked = optimistic.liked);
        let result = async {
            let user = self
                .guard
                .snapshot()
                .user
                .ok_or(ToggleLikeError::NotAuthenticated)?;
            if optimistic.liked {
                self.like(post_id, &user.id).await
            } else {
                retry_with_backoff(&self.retry, || self.likes.remove_like(post_id, &user.id))
                    .await
                    .map_err(ToggleLikeError::from)
            }
        }
        .instrument(span)
        .await;

        match result {
            Ok(()) => Ok(optimistic),
            Err(err) => {
                state.send_replace(previous);
                warn!(%post_id, error = %err, "like toggle failed, reverted");
                DiagnosticLog::global().error("Error toggling like", Some(&err), Some(LOG_CONTEXT));
                Err(err)
            }
        }
    }

    /// Insert the like unless it is already there.
    async fn like(&self, post_id: &PostId, user_id: &UserId) -> Result<(), ToggleLikeError> {
        let exists =
            retry_with_backoff(&self.retry, || self.likes.has_liked(post_id, user_id)).await?;
        if exists {
            debug!(%post_id, "like already recorded");
            return Ok(());
        }
        match retry_with_backoff(&self.retry, || self.likes.add_like(post_id, user_id)).await {
            Ok(()) | Err(ContentStoreError::AlreadyExists) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
