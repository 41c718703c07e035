//! Profile table access over the REST (PostgREST) endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, Response};
use serde_json::{json, Value};
use tracing::debug;

use sf_core::ids::UserId;
use sf_core::ports::{CredentialStorePort, ProfileStoreError, ProfileStorePort};
use sf_core::profile::{NewProfile, Profile, ProfileEdit};

use super::client::{error_parts, SupabaseHttp};

const PROFILES_PATH: &str = "rest/v1/profiles";

/// Row-level security scopes every request to the signed-in user, so requests
/// carry the cached user token rather than the public key.
pub struct RestProfileStore {
    http: SupabaseHttp,
    credentials: Arc<dyn CredentialStorePort>,
}

impl RestProfileStore {
    pub fn new(http: SupabaseHttp, credentials: Arc<dyn CredentialStorePort>) -> Self {
        Self { http, credentials }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<Response, ProfileStoreError> {
        let token = self.http.user_token(self.credentials.as_ref()).await;
        let request = build(self.http.request(method, path, token.as_deref()));
        let response = request
            .send()
            .await
            .map_err(|e| ProfileStoreError::Unavailable(e.to_string()))?;
        if response.status().is_success() {
            return Ok(response);
        }
        let (status, message) = error_parts(response).await;
        Err(classify_failure(status, message))
    }
}

fn classify_failure(status: u16, message: String) -> ProfileStoreError {
    match status {
        401 | 403 => ProfileStoreError::Forbidden(message),
        409 => ProfileStoreError::AlreadyExists,
        429 | 500..=599 => ProfileStoreError::Unavailable(format!("{status}: {message}")),
        _ => ProfileStoreError::Rejected { status, message },
    }
}

/// First row of a PostgREST array response.
async fn first_row(response: Response) -> Result<Option<Profile>, ProfileStoreError> {
    let rows: Vec<Value> = response
        .json()
        .await
        .map_err(|e| ProfileStoreError::Malformed(e.to_string()))?;
    match rows.into_iter().next() {
        None => Ok(None),
        Some(row) => serde_json::from_value(row)
            .map(Some)
            .map_err(|e| ProfileStoreError::Malformed(e.to_string())),
    }
}

#[async_trait]
impl ProfileStorePort for RestProfileStore {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileStoreError> {
        let path = format!("{PROFILES_PATH}?id=eq.{user_id}&select=*");
        let response = self.send(Method::GET, &path, |r| r).await?;
        let profile = first_row(response).await?;
        debug!(%user_id, found = profile.is_some(), "profile lookup");
        Ok(profile)
    }

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, ProfileStoreError> {
        let response = self
            .send(Method::POST, PROFILES_PATH, |r| {
                r.header("Prefer", "return=representation").json(profile)
            })
            .await?;
        first_row(response).await?.ok_or_else(|| {
            ProfileStoreError::Malformed("insert returned no representation".to_string())
        })
    }

    async fn update_avatar_url(
        &self,
        user_id: &UserId,
        avatar_url: &str,
    ) -> Result<(), ProfileStoreError> {
        let path = format!("{PROFILES_PATH}?id=eq.{user_id}");
        self.send(Method::PATCH, &path, |r| {
            r.json(&json!({ "avatar_url": avatar_url }))
        })
        .await?;
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        edit: &ProfileEdit,
    ) -> Result<Profile, ProfileStoreError> {
        // Upsert so an edit also repairs a missing row.
        let body = json!({
            "id": user_id,
            "name": edit.name,
            "bio": edit.bio,
            "website": edit.website,
            "updated_at": Utc::now(),
        });
        let response = self
            .send(Method::POST, PROFILES_PATH, |r| {
                r.header("Prefer", "resolution=merge-duplicates,return=representation")
                    .json(&body)
            })
            .await?;
        let profile = first_row(response).await?.ok_or_else(|| {
            ProfileStoreError::Malformed("upsert returned no representation".to_string())
        })?;
        debug!(%user_id, "profile updated");
        Ok(profile)
    }
}
