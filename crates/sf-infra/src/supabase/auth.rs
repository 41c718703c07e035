//! GoTrue-compatible auth provider.
//!
//! Holds the current session in memory, backed by the credential cache. Access
//! tokens close to expiry are refreshed on read; every change is pushed to
//! subscribers in the order it happened.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use sf_core::auth::{
    AuthChange, AuthError, AuthEventKind, SecretString, Session, UserAttributes, UserIdentity,
};
use sf_core::ports::{AuthProviderPort, CredentialStorePort};

use super::client::{error_parts, SupabaseHttp};

/// Refresh the access token when it expires within this many seconds.
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 60;

const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserPayload,
}

#[derive(Deserialize)]
struct UserPayload {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
}

impl UserPayload {
    fn into_identity(self) -> UserIdentity {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        UserIdentity {
            id: self.id.into(),
            email: non_empty(self.email),
            phone: non_empty(self.phone),
        }
    }
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| {
                now + Duration::seconds(self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS))
            });
        Session {
            access_token: SecretString::new(self.access_token),
            refresh_token: SecretString::new(self.refresh_token),
            expires_at,
            user: self.user.into_identity(),
        }
    }
}

#[derive(Default)]
struct SessionSlot {
    loaded: bool,
    session: Option<Session>,
}

pub struct GoTrueAuthProvider {
    http: SupabaseHttp,
    credentials: Arc<dyn CredentialStorePort>,
    refresh_margin: Duration,
    slot: tokio::sync::Mutex<SessionSlot>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<AuthChange>>>,
}

impl GoTrueAuthProvider {
    pub fn new(http: SupabaseHttp, credentials: Arc<dyn CredentialStorePort>) -> Self {
        Self {
            http,
            credentials,
            refresh_margin: Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS),
            slot: tokio::sync::Mutex::new(SessionSlot::default()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    fn emit(&self, change: AuthChange) {
        debug!(kind = ?change.kind, "auth state change");
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }

    async fn ensure_loaded(&self, slot: &mut SessionSlot) {
        if slot.loaded {
            return;
        }
        slot.session = match self.credentials.load().await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "cached session unreadable, starting signed out");
                None
            }
        };
        slot.loaded = true;
    }

    async fn persist(&self, session: &Session) {
        if let Err(err) = self.credentials.save(session).await {
            warn!(error = %err, "failed to cache session");
        }
    }

    async fn forget(&self) {
        if let Err(err) = self.credentials.clear().await {
            warn!(error = %err, "failed to clear cached session");
        }
    }

    async fn token_request(&self, grant_type: &str, body: Value) -> Result<Session, AuthError> {
        let path = format!("auth/v1/token?grant_type={grant_type}");
        let response = self
            .http
            .request(Method::POST, &path, None)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let (status, message) = error_parts(response).await;
            return Err(AuthError::from_response(status, message));
        }

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Malformed(e.to_string()))?;
        Ok(payload.into_session(Utc::now()))
    }

    async fn store_new_session(&self, session: &Session) {
        let mut slot = self.slot.lock().await;
        slot.loaded = true;
        slot.session = Some(session.clone());
        self.persist(session).await;
        self.emit(AuthChange::signed_in(session.clone()));
    }
}

#[async_trait]
impl AuthProviderPort for GoTrueAuthProvider {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let mut slot = self.slot.lock().await;
        self.ensure_loaded(&mut slot).await;

        let Some(current) = slot.session.clone() else {
            return Ok(None);
        };
        let now = Utc::now();
        if !current.expires_within(now, self.refresh_margin) {
            return Ok(Some(current));
        }

        let body = json!({ "refresh_token": current.refresh_token.expose() });
        match self.token_request("refresh_token", body).await {
            Ok(session) => {
                info!(user_id = %session.user_id(), "access token refreshed");
                self.persist(&session).await;
                slot.session = Some(session.clone());
                self.emit(AuthChange::token_refreshed(session.clone()));
                Ok(Some(session))
            }
            Err(err) if err.is_session_fatal() => {
                error!(error = %err, "refresh token rejected, ending session");
                slot.session = None;
                self.forget().await;
                self.emit(AuthChange::signed_out());
                Err(err)
            }
            Err(err) if !current.is_expired(now) => {
                warn!(error = %err, "token refresh failed, current token still valid");
                Ok(Some(current))
            }
            Err(err) => Err(err),
        }
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<AuthChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let body = json!({ "email": email, "password": password });
        let session = self.token_request("password", body).await?;
        self.store_new_session(&session).await;
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        let response = self
            .http
            .request(Method::POST, "auth/v1/signup", None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let (status, message) = error_parts(response).await;
            return Err(AuthError::from_response(status, message));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AuthError::Malformed(e.to_string()))?;
        if payload.get("access_token").is_none() {
            // Email confirmation pending: the user exists but holds no session yet.
            return Ok(None);
        }

        let tokens: TokenResponse =
            serde_json::from_value(payload).map_err(|e| AuthError::Malformed(e.to_string()))?;
        let session = tokens.into_session(Utc::now());
        self.store_new_session(&session).await;
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut slot = self.slot.lock().await;
        self.ensure_loaded(&mut slot).await;
        let previous = slot.session.take();

        if let Some(session) = &previous {
            let result = self
                .http
                .request(
                    Method::POST,
                    "auth/v1/logout",
                    Some(session.access_token.expose()),
                )
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => debug!("remote session revoked"),
                Ok(response) => {
                    let (status, message) = error_parts(response).await;
                    warn!(status, %message, "remote sign-out rejected");
                }
                Err(err) => warn!(error = %err, "remote sign-out failed"),
            }
        }

        self.forget().await;
        if previous.is_some() {
            self.emit(AuthChange::signed_out());
        }
        Ok(())
    }

    async fn update_user(&self, attributes: &UserAttributes) -> Result<UserIdentity, AuthError> {
        if attributes.is_empty() {
            return Err(AuthError::Validation("no account changes given".to_string()));
        }
        let session = self.get_session().await?.ok_or(AuthError::SessionNotFound)?;

        let mut body = serde_json::Map::new();
        if let Some(email) = &attributes.email {
            body.insert("email".into(), json!(email));
        }
        if let Some(phone) = &attributes.phone {
            body.insert("phone".into(), json!(phone));
        }
        if let Some(password) = &attributes.password {
            body.insert("password".into(), json!(password.expose()));
        }

        let response = self
            .http
            .request(Method::PUT, "auth/v1/user", Some(session.access_token.expose()))
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        if !response.status().is_success() {
            let (status, message) = error_parts(response).await;
            return Err(AuthError::from_response(status, message));
        }
        let user = response
            .json::<UserPayload>()
            .await
            .map_err(|e| AuthError::Malformed(e.to_string()))?
            .into_identity();

        let mut slot = self.slot.lock().await;
        let updated = match slot.session.as_mut() {
            // A sign-out or account switch may have landed while the request was in flight.
            Some(current) if current.user.id == user.id => {
                current.user = user.clone();
                Some(current.clone())
            }
            _ => None,
        };
        if let Some(updated) = updated {
            self.persist(&updated).await;
            info!(user_id = %user.id, "account updated");
            self.emit(AuthChange::new(AuthEventKind::UserUpdated, Some(updated)));
        }
        Ok(user)
    }
}
