//! # Dependency Injection
//!
//! The only place that knows concrete adapters, sf-app use cases and the
//! configuration at once. It assembles; it does not decide.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use sf_app::usecases::{
    CompleteOnboarding, CreatePost, EditProfile, SignIn, SignUp, ToggleFollow, ToggleLike,
    UpdateAccount, UploadAvatar,
};
use sf_app::{
    DiagnosticLog, GuardConfig, GuardDeps, GuardError, GuardHandle, RetryPolicy, SessionGuard,
};
use sf_core::config::AppConfig;
use sf_core::ports::{
    AuthProviderPort, ClockPort, CredentialStorePort, FollowStorePort, LikeStorePort,
    NavigationPort, ObjectStoragePort, PostStorePort, ProfileStorePort,
};
use sf_infra::{
    FileCredentialStore, GoTrueAuthProvider, InMemoryNavigator, RestFollowStore, RestLikeStore,
    RestPostStore, RestProfileStore, SupabaseConfig, SupabaseHttp, SupabaseStorage, SystemClock,
    DEFAULT_REFRESH_MARGIN_SECS,
};

use super::config::{resolve_data_dir, validate, ConfigError};

/// Path the headless navigator starts on, before the guard first redirects.
pub const INITIAL_PATH: &str = "/";

pub type WiringResult<T> = Result<T, WiringError>;

#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client initialization failed: {0}")]
    HttpClient(String),
}

/// Running services. Dropping the handle set does not stop the guard; call
/// [`AppServices::shutdown`].
pub struct AppServices {
    pub guard: GuardHandle,
    pub navigator: Arc<InMemoryNavigator>,
    pub sign_in: SignIn,
    pub sign_up: SignUp,
    pub complete_onboarding: CompleteOnboarding,
    pub upload_avatar: UploadAvatar,
    pub edit_profile: EditProfile,
    pub update_account: UpdateAccount,
    pub create_post: CreatePost,
    pub toggle_like: ToggleLike,
    pub toggle_follow: ToggleFollow,
    guard_task: JoinHandle<()>,
}

impl AppServices {
    /// Mark navigation as mounted so the guard may start redirecting.
    pub fn mount_navigation(&self) -> Result<(), GuardError> {
        self.navigator.set_ready(true);
        self.guard.navigation_ready()
    }

    pub async fn shutdown(self) {
        if self.guard.shutdown().is_ok() {
            let _ = self.guard_task.await;
        }
    }
}

/// Build the adapters and start the session guard.
///
/// Must run inside a tokio runtime: the guard is spawned on it.
pub fn wire_services(config: &AppConfig) -> WiringResult<AppServices> {
    validate(config)?;
    DiagnosticLog::global().set_capacity(config.diagnostics_capacity);

    let data_dir = resolve_data_dir(config);
    let credentials: Arc<dyn CredentialStorePort> =
        Arc::new(FileCredentialStore::with_defaults(data_dir.clone()));

    let http = SupabaseHttp::new(&SupabaseConfig::new(
        config.backend_url.clone(),
        config.anon_key.clone(),
    ))
    .map_err(|e| WiringError::HttpClient(e.to_string()))?;

    // Bounded by `validate`.
    let refresh_margin = chrono::Duration::seconds(
        i64::try_from(config.refresh_margin_secs).unwrap_or(DEFAULT_REFRESH_MARGIN_SECS),
    );
    let auth: Arc<dyn AuthProviderPort> = Arc::new(
        GoTrueAuthProvider::new(http.clone(), credentials.clone())
            .with_refresh_margin(refresh_margin),
    );
    let profiles: Arc<dyn ProfileStorePort> =
        Arc::new(RestProfileStore::new(http.clone(), credentials.clone()));
    let storage: Arc<dyn ObjectStoragePort> =
        Arc::new(SupabaseStorage::new(http.clone(), credentials.clone()));
    let posts: Arc<dyn PostStorePort> =
        Arc::new(RestPostStore::new(http.clone(), credentials.clone()));
    let likes: Arc<dyn LikeStorePort> =
        Arc::new(RestLikeStore::new(http.clone(), credentials.clone()));
    let follows: Arc<dyn FollowStorePort> =
        Arc::new(RestFollowStore::new(http, credentials.clone()));
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock);
    let navigator = Arc::new(InMemoryNavigator::new(INITIAL_PATH));
    let navigation: Arc<dyn NavigationPort> = navigator.clone();

    let (guard, guard_task) = SessionGuard::new(
        GuardDeps {
            auth: auth.clone(),
            profiles: profiles.clone(),
            navigation,
            credentials,
        },
        GuardConfig::from_config(config),
    )
    .spawn();

    let retry = RetryPolicy::from_config(config);
    info!(
        backend = %config.backend_url,
        data_dir = %data_dir.display(),
        "services wired"
    );

    Ok(AppServices {
        sign_in: SignIn::new(auth.clone()),
        sign_up: SignUp::new(auth.clone()),
        update_account: UpdateAccount::new(auth),
        complete_onboarding: CompleteOnboarding::new(profiles.clone(), guard.clone(), retry),
        upload_avatar: UploadAvatar::new(
            storage.clone(),
            profiles.clone(),
            clock.clone(),
            guard.clone(),
            retry,
        ),
        edit_profile: EditProfile::new(profiles, guard.clone(), retry),
        create_post: CreatePost::new(storage, posts, clock, guard.clone(), retry),
        toggle_like: ToggleLike::new(likes, guard.clone(), retry),
        toggle_follow: ToggleFollow::new(follows, guard.clone(), retry),
        guard,
        navigator,
        guard_task,
    })
}
