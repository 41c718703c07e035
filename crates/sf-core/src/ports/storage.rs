use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage authorization failed: {0}")]
    Unauthorized(String),

    #[error("payload exceeds the bucket size limit")]
    PayloadTooLarge,

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Object storage buckets (avatars, post media).
#[async_trait]
pub trait ObjectStoragePort: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), StorageError>;

    /// Public URL of an object in a public bucket.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
