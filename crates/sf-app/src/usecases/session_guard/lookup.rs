use tracing::{debug, error, warn};

use crate::retry::{retry_with_backoff, RetryPolicy};

use sf_core::auth::AuthError;
use sf_core::guard::ProfileLookup;
use sf_core::ids::UserId;
use sf_core::ports::{AuthProviderPort, ProfileStoreError, ProfileStorePort};

/// Resolve the profile for `user_id`, re-checking that a session still exists first.
///
/// Transient store failures are retried under `retry`; only an exhausted budget
/// reports [`ProfileLookup::Unavailable`].
pub(super) async fn resolve_profile(
    auth: &dyn AuthProviderPort,
    profiles: &dyn ProfileStorePort,
    user_id: &UserId,
    retry: &RetryPolicy,
) -> ProfileLookup {
    match auth.get_session().await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!(%user_id, "no session left at profile lookup");
            return ProfileLookup::SessionMissing;
        }
        Err(err) if err.is_session_fatal() => {
            error!(%user_id, error = %err, "session rejected during profile lookup");
            return ProfileLookup::Unauthorized(err);
        }
        Err(err) => {
            warn!(%user_id, error = %err, "session check failed during profile lookup");
            return ProfileLookup::Unavailable(err.to_string());
        }
    }

    match retry_with_backoff(retry, || profiles.get_profile(user_id)).await {
        Ok(Some(profile)) => {
            debug!(%user_id, "profile found");
            ProfileLookup::Found(profile)
        }
        Ok(None) => {
            debug!(%user_id, "no profile, onboarding incomplete");
            ProfileLookup::NotFound
        }
        Err(ProfileStoreError::Forbidden(message)) => {
            error!(%user_id, %message, "profile fetch forbidden");
            ProfileLookup::Unauthorized(AuthError::Forbidden(message))
        }
        Err(ProfileStoreError::Malformed(message)) => {
            warn!(%user_id, %message, "malformed profile record, treating as absent");
            ProfileLookup::Malformed(message)
        }
        Err(err) => {
            warn!(%user_id, error = %err, "profile fetch failed, holding current route");
            ProfileLookup::Unavailable(err.to_string())
        }
    }
}
