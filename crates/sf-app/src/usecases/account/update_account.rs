use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use sf_core::auth::{AuthError, UserAttributes, UserIdentity};
use sf_core::ports::AuthProviderPort;

use crate::usecases::auth::MIN_PASSWORD_LEN;

#[derive(Debug, thiserror::Error)]
pub enum UpdateAccountError {
    #[error("validation: New passwords do not match")]
    PasswordMismatch,
    #[error("validation: Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("validation: Please enter a new email address")]
    MissingEmail,
    #[error("validation: Please enter a phone number")]
    MissingPhone,
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Account settings backed by the auth service: password, email and phone.
pub struct UpdateAccount {
    auth: Arc<dyn AuthProviderPort>,
}

impl UpdateAccount {
    pub fn new(auth: Arc<dyn AuthProviderPort>) -> Self {
        Self { auth }
    }

    pub async fn change_password(
        &self,
        new_password: &str,
        confirmation: &str,
    ) -> Result<UserIdentity, UpdateAccountError> {
        if new_password != confirmation {
            return Err(UpdateAccountError::PasswordMismatch);
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(UpdateAccountError::PasswordTooShort);
        }
        self.apply("password", UserAttributes::password(new_password))
            .await
    }

    /// Request an email change. The address only switches once the link sent to it is followed.
    pub async fn change_email(&self, new_email: &str) -> Result<UserIdentity, UpdateAccountError> {
        let new_email = new_email.trim();
        if new_email.is_empty() {
            return Err(UpdateAccountError::MissingEmail);
        }
        self.apply("email", UserAttributes::email(new_email)).await
    }

    pub async fn change_phone(&self, new_phone: &str) -> Result<UserIdentity, UpdateAccountError> {
        let new_phone = new_phone.trim();
        if new_phone.is_empty() {
            return Err(UpdateAccountError::MissingPhone);
        }
        self.apply("phone", UserAttributes::phone(new_phone)).await
    }

    async fn apply(
        &self,
        field: &'static str,
        attributes: UserAttributes,
    ) -> Result<UserIdentity, UpdateAccountError> {
        let span = info_span!("usecase.update_account.execute", field);
        async {
            let user = self.auth.update_user(&attributes).await?;
            info!(user_id = %user.id, "account updated");
            Ok(user)
        }
        .instrument(span)
        .await
    }
}
