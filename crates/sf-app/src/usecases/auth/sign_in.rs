use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use sf_core::auth::{AuthError, Session};
use sf_core::ports::AuthProviderPort;

#[derive(Debug, thiserror::Error)]
pub enum SignInError {
    #[error("validation: Please enter your email and password")]
    MissingCredentials,
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Use case for email/password sign-in.
pub struct SignIn {
    auth: Arc<dyn AuthProviderPort>,
}

impl SignIn {
    pub fn new(auth: Arc<dyn AuthProviderPort>) -> Self {
        Self { auth }
    }

    pub async fn execute(&self, email: &str, password: &str) -> Result<Session, SignInError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(SignInError::MissingCredentials);
        }

        let span = info_span!("usecase.sign_in.execute");
        async {
            let session = self.auth.sign_in_with_password(email, password).await?;
            info!(user_id = %session.user_id(), "signed in");
            Ok(session)
        }
        .instrument(span)
        .await
    }
}
