use super::SecretString;

/// Changes to the signed-in user's account. Unset fields stay untouched.
///
/// Email changes only take effect once the new address is verified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAttributes {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<SecretString>,
}

impl UserAttributes {
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn phone(phone: impl Into<String>) -> Self {
        Self {
            phone: Some(phone.into()),
            ..Self::default()
        }
    }

    pub fn password(password: impl Into<String>) -> Self {
        Self {
            password: Some(SecretString::new(password)),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none() && self.password.is_none()
    }
}
