use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, info_span, Instrument};

use sf_core::ports::{CredentialStorePort, ObjectStoragePort, StorageError};

use super::client::{error_parts, SupabaseHttp};

const OBJECT_CACHE_CONTROL: &str = "max-age=3600";

/// Object storage buckets served by the storage API.
pub struct SupabaseStorage {
    http: SupabaseHttp,
    credentials: Arc<dyn CredentialStorePort>,
}

impl SupabaseStorage {
    pub fn new(http: SupabaseHttp, credentials: Arc<dyn CredentialStorePort>) -> Self {
        Self { http, credentials }
    }
}

fn classify_failure(status: u16, message: String) -> StorageError {
    match status {
        401 | 403 => StorageError::Unauthorized(message),
        413 => StorageError::PayloadTooLarge,
        429 | 500..=599 => StorageError::Unavailable(format!("{status}: {message}")),
        _ => StorageError::Rejected { status, message },
    }
}

#[async_trait]
impl ObjectStoragePort for SupabaseStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), StorageError> {
        let size = bytes.len();
        let span = info_span!("infra.storage.upload", bucket, path, size);
        async move {
            let token = self.http.user_token(self.credentials.as_ref()).await;
            let response = self
                .http
                .request(
                    Method::POST,
                    &format!("storage/v1/object/{bucket}/{path}"),
                    token.as_deref(),
                )
                .header("content-type", content_type)
                .header("cache-control", OBJECT_CACHE_CONTROL)
                .header("x-upsert", if upsert { "true" } else { "false" })
                .body(bytes)
                .send()
                .await
                .map_err(|e| StorageError::Unavailable(e.to_string()))?;

            if !response.status().is_success() {
                let (status, message) = error_parts(response).await;
                return Err(classify_failure(status, message));
            }
            debug!("object stored");
            Ok(())
        }
        .instrument(span)
        .await
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.http
            .url(&format!("storage/v1/object/public/{bucket}/{path}"))
    }
}
