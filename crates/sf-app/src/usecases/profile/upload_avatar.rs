use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use sf_core::media::{ImageUpload, UploadValidationError};
use sf_core::ports::{ClockPort, ObjectStoragePort, ProfileStoreError, ProfileStorePort, StorageError};

use crate::diagnostics::DiagnosticLog;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::usecases::session_guard::{GuardError, GuardHandle};

pub const AVATAR_BUCKET: &str = "avatars";

const LOG_CONTEXT: &str = "avatar_upload";

#[derive(Debug, thiserror::Error)]
pub enum UploadAvatarError {
    #[error(transparent)]
    Validation(#[from] UploadValidationError),
    #[error("auth: not signed in")]
    NotAuthenticated,
    #[error("avatar upload failed: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to save avatar url: {0}")]
    Profile(#[from] ProfileStoreError),
    #[error(transparent)]
    Guard(#[from] GuardError),
}

/// Use case for replacing the signed-in user's avatar.
pub struct UploadAvatar {
    storage: Arc<dyn ObjectStoragePort>,
    profiles: Arc<dyn ProfileStorePort>,
    clock: Arc<dyn ClockPort>,
    guard: GuardHandle,
    retry: RetryPolicy,
}

impl UploadAvatar {
    pub fn new(
        storage: Arc<dyn ObjectStoragePort>,
        profiles: Arc<dyn ProfileStorePort>,
        clock: Arc<dyn ClockPort>,
        guard: GuardHandle,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            storage,
            profiles,
            clock,
            guard,
            retry,
        }
    }

    /// Upload the image and point the profile at it. Returns the cache-busted public URL.
    pub async fn execute(
        &self,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, UploadAvatarError> {
        let image = ImageUpload::new(content_type, bytes)?;
        let user = self
            .guard
            .snapshot()
            .user
            .ok_or(UploadAvatarError::NotAuthenticated)?;

        let timestamp = self.clock.now_ms();
        let path = format!("{}/{}.{}", user.id, timestamp, image.extension());
        let span = info_span!("usecase.upload_avatar.execute", user_id = %user.id, %path, size = image.len());

        async {
            retry_with_backoff(&self.retry, || {
                self.storage.upload(
                    AVATAR_BUCKET,
                    &path,
                    image.bytes().to_vec(),
                    image.content_type(),
                    true,
                )
            })
            .await
            .inspect_err(|err| {
                DiagnosticLog::global().error("Avatar upload failed", Some(err), Some(LOG_CONTEXT))
            })?;

            let public_url = format!(
                "{}?v={}",
                self.storage.public_url(AVATAR_BUCKET, &path),
                timestamp
            );

            retry_with_backoff(&self.retry, || {
                self.profiles.update_avatar_url(&user.id, &public_url)
            })
            .await?;

            DiagnosticLog::global().info(
                format!("Avatar upload completed successfully: {public_url}"),
                Some(LOG_CONTEXT),
            );
            info!("avatar updated");
            self.guard.profile_changed()?;
            Ok(public_url)
        }
        .instrument(span)
        .await
    }
}
