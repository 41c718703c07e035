use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use sf_core::auth::{AuthError, Session};
use sf_core::ports::AuthProviderPort;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum SignUpError {
    #[error("validation: Please enter your name")]
    MissingName,
    #[error("validation: Please enter your email")]
    MissingEmail,
    #[error("validation: Password must be at least 6 characters")]
    PasswordTooShort,
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Use case for account registration.
///
/// Returns the new session when the backend confirms the account immediately;
/// `None` means the account waits for email confirmation.
pub struct SignUp {
    auth: Arc<dyn AuthProviderPort>,
}

impl SignUp {
    pub fn new(auth: Arc<dyn AuthProviderPort>) -> Self {
        Self { auth }
    }

    pub async fn execute(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<Session>, SignUpError> {
        if name.trim().is_empty() {
            return Err(SignUpError::MissingName);
        }
        let email = email.trim();
        if email.is_empty() {
            return Err(SignUpError::MissingEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(SignUpError::PasswordTooShort);
        }

        let session = self
            .auth
            .sign_up(email, password)
            .instrument(info_span!("usecase.sign_up.execute"))
            .await?;
        match &session {
            Some(session) => info!(user_id = %session.user_id(), "account created and signed in"),
            None => info!("account created, awaiting confirmation"),
        }
        Ok(session)
    }
}
