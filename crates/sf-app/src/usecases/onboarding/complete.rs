use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};

use sf_core::ports::{ProfileStoreError, ProfileStorePort};
use sf_core::profile::{NewProfile, Profile, ProfileValidationError};

use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::usecases::session_guard::{GuardError, GuardHandle};

#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("auth: not signed in")]
    NotAuthenticated,
    #[error(transparent)]
    Validation(#[from] ProfileValidationError),
    #[error("failed to create profile: {0}")]
    Store(#[from] ProfileStoreError),
    #[error(transparent)]
    Guard(#[from] GuardError),
}

/// Use case for completing onboarding.
///
/// Creates the profile for the signed-in user, then asks the guard to resolve it
/// again so the user lands in the main app.
pub struct CompleteOnboarding {
    profiles: Arc<dyn ProfileStorePort>,
    guard: GuardHandle,
    retry: RetryPolicy,
}

impl CompleteOnboarding {
    pub fn new(profiles: Arc<dyn ProfileStorePort>, guard: GuardHandle, retry: RetryPolicy) -> Self {
        Self {
            profiles,
            guard,
            retry,
        }
    }

    pub async fn execute(&self, name: &str) -> Result<Profile, OnboardingError> {
        let snapshot = self.guard.snapshot();
        let user = snapshot.user.ok_or(OnboardingError::NotAuthenticated)?;
        let new_profile = NewProfile::new(user.id.clone(), name)?;

        let span = info_span!("usecase.complete_onboarding.execute", user_id = %user.id);
        let profile = async {
            let created = retry_with_backoff(&self.retry, || {
                self.profiles.create_profile(&new_profile)
            })
            .await;

            match created {
                Ok(profile) => Ok(profile),
                Err(ProfileStoreError::AlreadyExists) => {
                    warn!("profile already exists, reusing it");
                    self.profiles
                        .get_profile(&user.id)
                        .await?
                        .ok_or(OnboardingError::Store(ProfileStoreError::AlreadyExists))
                }
                Err(err) => Err(err.into()),
            }
        }
        .instrument(span)
        .await?;

        info!(user_id = %profile.id, "onboarding completed");
        self.guard.profile_changed()?;
        Ok(profile)
    }
}
