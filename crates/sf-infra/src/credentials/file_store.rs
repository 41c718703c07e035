//! File-based credential cache
//!
//! Persists the current session as JSON in the application data directory so a
//! restart resumes the session.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use sf_core::auth::Session;
use sf_core::ports::CredentialStorePort;

pub const DEFAULT_SESSION_FILE: &str = "session.json";

pub struct FileCredentialStore {
    session_file_path: PathBuf,
}

impl FileCredentialStore {
    /// Create store with custom file path
    pub fn new(session_file_path: PathBuf) -> Self {
        Self { session_file_path }
    }

    /// Create store with defaults
    pub fn with_defaults(base_dir: PathBuf) -> Self {
        Self {
            session_file_path: base_dir.join(DEFAULT_SESSION_FILE),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.session_file_path
    }

    async fn ensure_parent_dir(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.session_file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStorePort for FileCredentialStore {
    async fn load(&self) -> anyhow::Result<Option<Session>> {
        if !fs::try_exists(&self.session_file_path).await? {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.session_file_path).await?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let session: Session = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse cached session: {}", e))?;

        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> anyhow::Result<()> {
        self.ensure_parent_dir().await?;

        let json = serde_json::to_string_pretty(session)
            .map_err(|e| anyhow::anyhow!("Failed to serialize session: {}", e))?;

        let mut file = fs::File::create(&self.session_file_path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create session file: {}", e))?;

        file.write_all(json.as_bytes())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write session file: {}", e))?;

        file.sync_all()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to sync session file: {}", e))?;

        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        if fs::try_exists(&self.session_file_path).await? {
            fs::remove_file(&self.session_file_path).await?;
        }
        Ok(())
    }
}
