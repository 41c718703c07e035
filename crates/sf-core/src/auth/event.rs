use serde::{Deserialize, Serialize};

use super::Session;

/// Kind of auth state change pushed by the auth provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    UserDeleted,
    PasswordRecovery,
}

impl AuthEventKind {
    /// Events after which no session may remain.
    pub fn ends_session(self) -> bool {
        matches!(self, Self::SignedOut | Self::UserDeleted)
    }
}

/// A single auth state change, carrying the session current after the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

impl AuthChange {
    pub fn new(kind: AuthEventKind, session: Option<Session>) -> Self {
        Self { kind, session }
    }

    pub fn signed_in(session: Session) -> Self {
        Self::new(AuthEventKind::SignedIn, Some(session))
    }

    pub fn signed_out() -> Self {
        Self::new(AuthEventKind::SignedOut, None)
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self::new(AuthEventKind::TokenRefreshed, Some(session))
    }
}
