use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use sf_core::ports::{ProfileStoreError, ProfileStorePort};
use sf_core::profile::{Profile, ProfileEdit, ProfileValidationError};

use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::usecases::session_guard::{GuardError, GuardHandle};

#[derive(Debug, thiserror::Error)]
pub enum EditProfileError {
    #[error("auth: No authenticated user")]
    NotAuthenticated,
    #[error(transparent)]
    Validation(#[from] ProfileValidationError),
    #[error("failed to save profile: {0}")]
    Store(#[from] ProfileStoreError),
    #[error(transparent)]
    Guard(#[from] GuardError),
}

/// Use case for editing the signed-in user's name, bio and website.
pub struct EditProfile {
    profiles: Arc<dyn ProfileStorePort>,
    guard: GuardHandle,
    retry: RetryPolicy,
}

impl EditProfile {
    pub fn new(profiles: Arc<dyn ProfileStorePort>, guard: GuardHandle, retry: RetryPolicy) -> Self {
        Self {
            profiles,
            guard,
            retry,
        }
    }

    pub async fn execute(
        &self,
        name: &str,
        bio: Option<&str>,
        website: Option<&str>,
    ) -> Result<Profile, EditProfileError> {
        let user = self
            .guard
            .snapshot()
            .user
            .ok_or(EditProfileError::NotAuthenticated)?;
        let edit = ProfileEdit::new(name, bio, website)?;

        let span = info_span!("usecase.edit_profile.execute", user_id = %user.id);
        let profile = retry_with_backoff(&self.retry, || self.profiles.update_profile(&user.id, &edit))
            .instrument(span)
            .await?;

        info!(user_id = %profile.id, "profile saved");
        self.guard.profile_changed()?;
        Ok(profile)
    }
}
