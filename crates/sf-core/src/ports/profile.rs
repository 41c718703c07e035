use async_trait::async_trait;
use thiserror::Error;

use crate::ids::UserId;
use crate::profile::{NewProfile, Profile, ProfileEdit};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileStoreError {
    /// 401/403 from the store: the caller's credentials are not accepted.
    #[error("profile access forbidden: {0}")]
    Forbidden(String),

    #[error("profile already exists")]
    AlreadyExists,

    #[error("profile store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed profile record: {0}")]
    Malformed(String),

    #[error("profile store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Profile store keyed by user id. Presence of a record denotes onboarding completion.
#[async_trait]
pub trait ProfileStorePort: Send + Sync {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileStoreError>;

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, ProfileStoreError>;

    async fn update_avatar_url(
        &self,
        user_id: &UserId,
        avatar_url: &str,
    ) -> Result<(), ProfileStoreError>;

    /// Write the editable fields and return the stored record.
    async fn update_profile(
        &self,
        user_id: &UserId,
        edit: &ProfileEdit,
    ) -> Result<Profile, ProfileStoreError>;
}
