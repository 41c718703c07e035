//! Client-held credential cache port
//!
//! Persists the current session between runs. Teardown clears it.

use async_trait::async_trait;

use crate::auth::Session;

#[async_trait]
pub trait CredentialStorePort: Send + Sync {
    async fn load(&self) -> anyhow::Result<Option<Session>>;

    async fn save(&self, session: &Session) -> anyhow::Result<()>;

    /// Remove any cached credentials. Clearing an empty cache is not an error.
    async fn clear(&self) -> anyhow::Result<()>;
}
