use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;
use sf_core::auth::SecretString;
use sf_core::ports::CredentialStorePort;
use tracing::warn;

/// Keys the backend services use for a human-readable error message, most specific first.
const ERROR_MESSAGE_KEYS: [&str; 4] = ["error_description", "msg", "message", "error"];

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: SecretString,
    pub timeout: Duration,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: SecretString::new(anon_key),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Shared HTTP plumbing: base URL, the public API key header, and error body decoding.
#[derive(Clone)]
pub struct SupabaseHttp {
    client: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
}

impl SupabaseHttp {
    pub fn new(config: &SupabaseConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Request carrying the API key, authorized as `bearer` or, without one, as the anonymous role.
    pub fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> RequestBuilder {
        let token = bearer.unwrap_or(self.anon_key.expose());
        self.client
            .request(method, self.url(path))
            .header("apikey", self.anon_key.expose())
            .bearer_auth(token)
    }

    /// Access token of the cached session, if any.
    pub async fn user_token(&self, credentials: &dyn CredentialStorePort) -> Option<String> {
        match credentials.load().await {
            Ok(session) => session.map(|s| s.access_token.expose().to_string()),
            Err(err) => {
                warn!(error = %err, "failed to read cached session, using anonymous role");
                None
            }
        }
    }
}

/// Status and best-effort message of a failed response.
pub(crate) async fn error_parts(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    (status, error_message(&body))
}

pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => ERROR_MESSAGE_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        _ => body.to_string(),
    }
}
