//! Hand-written fakes shared by the session guard integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::{mpsc, Notify, Semaphore};

use sf_core::auth::{
    AuthChange, AuthError, AuthEventKind, SecretString, Session, UserAttributes, UserIdentity,
};
use sf_core::ids::UserId;
use sf_core::ports::{
    AuthProviderPort, NavigationError, NavigationPort, ProfileStoreError, ProfileStorePort,
};
use sf_core::profile::{NewProfile, Profile, ProfileEdit};

pub fn session(user: &str) -> Session {
    Session {
        access_token: SecretString::new(format!("access-{user}")),
        refresh_token: SecretString::new(format!("refresh-{user}")),
        expires_at: Utc::now() + Duration::hours(1),
        user: UserIdentity::new(user),
    }
}

pub fn profile(user: &str) -> Profile {
    Profile {
        id: UserId::new(user),
        name: format!("{user} name"),
        avatar_url: None,
        bio: None,
        website: None,
        created_at: None,
    }
}

#[derive(Default)]
pub struct FakeAuth {
    session: Mutex<Option<Session>>,
    session_error: Mutex<Option<AuthError>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<AuthChange>>>,
    pub sign_out_calls: AtomicUsize,
}

impl FakeAuth {
    pub fn with_session(session: Session) -> Arc<Self> {
        let auth = Self::default();
        *auth.session.lock().unwrap() = Some(session);
        Arc::new(auth)
    }

    pub fn signed_out() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_get_session(&self, error: AuthError) {
        *self.session_error.lock().unwrap() = Some(error);
    }

    /// Update the provider's session and push the change to subscribers.
    pub fn emit(&self, change: AuthChange) {
        *self.session.lock().unwrap() = change.session.clone();
        for tx in self.subscribers.lock().unwrap().iter() {
            let _ = tx.send(change.clone());
        }
    }
}

#[async_trait]
impl AuthProviderPort for FakeAuth {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        if let Some(err) = self.session_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.session.lock().unwrap().clone())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<AuthChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> Result<Session, AuthError> {
        let session = session("user-1");
        self.emit(AuthChange::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<Option<Session>, AuthError> {
        Ok(None)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        let had_session = self.session.lock().unwrap().is_some();
        if had_session {
            self.emit(AuthChange::signed_out());
        }
        Ok(())
    }

    async fn update_user(&self, attributes: &UserAttributes) -> Result<UserIdentity, AuthError> {
        let mut session = self
            .session
            .lock()
            .unwrap()
            .clone()
            .ok_or(AuthError::SessionNotFound)?;
        if let Some(phone) = &attributes.phone {
            session.user.phone = Some(phone.clone());
        }
        let user = session.user.clone();
        self.emit(AuthChange::new(AuthEventKind::UserUpdated, Some(session)));
        Ok(user)
    }
}

/// Profile store whose lookups can be held until the test releases them.
pub struct FakeProfiles {
    responses: Mutex<HashMap<UserId, Result<Option<Profile>, ProfileStoreError>>>,
    /// One-shot responses served before the standing ones.
    queued: Mutex<VecDeque<Result<Option<Profile>, ProfileStoreError>>>,
    gate: Option<Semaphore>,
    pub entered: Notify,
    pub calls: AtomicUsize,
}

impl FakeProfiles {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(None))
    }

    /// Lookups block until [`FakeProfiles::release`] is called.
    pub fn gated() -> Arc<Self> {
        Arc::new(Self::build(Some(Semaphore::new(0))))
    }

    fn build(gate: Option<Semaphore>) -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            queued: Mutex::new(VecDeque::new()),
            gate,
            entered: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn respond(&self, user: &str, response: Result<Option<Profile>, ProfileStoreError>) {
        self.responses
            .lock()
            .unwrap()
            .insert(UserId::new(user), response);
    }

    pub fn respond_once(&self, response: Result<Option<Profile>, ProfileStoreError>) {
        self.queued.lock().unwrap().push_back(response);
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStorePort for FakeProfiles {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if let Some(response) = self.queued.lock().unwrap().pop_front() {
            return response;
        }
        self.responses
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or(Ok(None))
    }

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, ProfileStoreError> {
        let created = Profile {
            id: profile.id.clone(),
            name: profile.name.clone(),
            avatar_url: None,
            bio: None,
            website: None,
            created_at: None,
        };
        self.respond(profile.id.as_str(), Ok(Some(created.clone())));
        Ok(created)
    }

    async fn update_avatar_url(&self, _user_id: &UserId, _url: &str) -> Result<(), ProfileStoreError> {
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        edit: &ProfileEdit,
    ) -> Result<Profile, ProfileStoreError> {
        let updated = Profile {
            id: user_id.clone(),
            name: edit.name.clone(),
            avatar_url: None,
            bio: edit.bio.clone(),
            website: edit.website.clone(),
            created_at: None,
        };
        self.respond(user_id.as_str(), Ok(Some(updated.clone())));
        Ok(updated)
    }
}

/// Navigator that records redirects. A sluggish one never updates its path.
pub struct RecordingNavigator {
    ready: AtomicBool,
    sluggish: bool,
    path: Mutex<String>,
    pub replaces: Mutex<Vec<String>>,
    pub ready_checks: AtomicUsize,
}

impl RecordingNavigator {
    pub fn at(path: &str) -> Arc<Self> {
        Arc::new(Self::build(path, true, false))
    }

    pub fn sluggish(path: &str) -> Arc<Self> {
        Arc::new(Self::build(path, true, true))
    }

    pub fn not_ready(path: &str) -> Arc<Self> {
        Arc::new(Self::build(path, false, false))
    }

    fn build(path: &str, ready: bool, sluggish: bool) -> Self {
        Self {
            ready: AtomicBool::new(ready),
            sluggish,
            path: Mutex::new(path.to_string()),
            replaces: Mutex::new(Vec::new()),
            ready_checks: AtomicUsize::new(0),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Simulate the user navigating on their own.
    pub fn navigate(&self, path: &str) {
        *self.path.lock().unwrap() = path.to_string();
    }

    pub fn replaces(&self) -> Vec<String> {
        self.replaces.lock().unwrap().clone()
    }

    pub fn ready_checks(&self) -> usize {
        self.ready_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NavigationPort for RecordingNavigator {
    async fn is_ready(&self) -> bool {
        self.ready_checks.fetch_add(1, Ordering::SeqCst);
        self.ready.load(Ordering::SeqCst)
    }

    async fn current_path(&self) -> String {
        self.path.lock().unwrap().clone()
    }

    async fn replace(&self, path: &str) -> Result<(), NavigationError> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(NavigationError::NotReady);
        }
        self.replaces.lock().unwrap().push(path.to_string());
        if !self.sluggish {
            *self.path.lock().unwrap() = path.to_string();
        }
        Ok(())
    }
}
