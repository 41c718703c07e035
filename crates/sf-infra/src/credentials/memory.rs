use std::sync::Mutex;

use async_trait::async_trait;
use sf_core::auth::Session;
use sf_core::ports::CredentialStorePort;

/// Process-local credential cache. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryCredentialStore {
    session: Mutex<Option<Session>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CredentialStorePort for MemoryCredentialStore {
    async fn load(&self) -> anyhow::Result<Option<Session>> {
        Ok(self.slot().clone())
    }

    async fn save(&self, session: &Session) -> anyhow::Result<()> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        *self.slot() = None;
        Ok(())
    }
}
