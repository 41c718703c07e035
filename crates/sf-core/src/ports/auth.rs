//! Auth provider port.
//!
//! Mirrors the managed auth service client: session access, an ordered stream of
//! auth state changes, the sign-in/sign-up/sign-out commands and account updates.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::auth::{AuthChange, AuthError, Session, UserAttributes, UserIdentity};

#[async_trait]
pub trait AuthProviderPort: Send + Sync {
    /// Current session, refreshing it first if it is about to expire.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    /// Subscribe to auth state changes.
    ///
    /// Changes are delivered in the order the provider emits them.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<AuthChange>;

    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Session, AuthError>;

    /// Register a new account. Returns a session only when the backend confirms immediately.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError>;

    /// End the session locally and remotely.
    ///
    /// Must be idempotent: signing out without a session emits nothing.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Change email, phone or password of the signed-in user.
    ///
    /// Emits `USER_UPDATED` on success.
    async fn update_user(&self, attributes: &UserAttributes) -> Result<UserIdentity, AuthError>;
}
