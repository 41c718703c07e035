//! Session & route guard runtime.
//!
//! Drives [`GuardStateMachine`](sf_core::guard::GuardStateMachine) from a single
//! sequential input queue. Auth changes, profile lookup results, navigation
//! signals and deferred reconciliations are all messages on that queue, so state
//! is only ever mutated by the runtime task. Lookups run concurrently but report
//! back tagged with the generation that started them; stale results are dropped
//! by the state machine.

mod handle;
mod lookup;
mod runtime;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info_span, Instrument};

use sf_core::config::AppConfig;
use sf_core::guard::GuardState;
use sf_core::ports::{AuthProviderPort, CredentialStorePort, NavigationPort, ProfileStorePort};

use crate::retry::RetryPolicy;

pub use handle::GuardHandle;

use runtime::GuardRuntime;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("session guard is not running")]
    Stopped,
}

/// Deferred reconciliation settings used while navigation is not ready, plus
/// the retry budget for transient profile lookup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardConfig {
    pub redirect_max_attempts: u32,
    pub redirect_base_delay: Duration,
    pub lookup_retry: RetryPolicy,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            redirect_max_attempts: 5,
            redirect_base_delay: Duration::from_millis(50),
            lookup_retry: RetryPolicy::new(3, Duration::from_millis(50))
                .with_max_delay(Duration::from_secs(1))
                .with_jitter(Duration::from_millis(10)),
        }
    }
}

impl GuardConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            redirect_max_attempts: config.redirect_max_attempts,
            redirect_base_delay: Duration::from_millis(config.redirect_base_delay_ms),
            lookup_retry: RetryPolicy::from_config(config),
        }
    }
}

#[derive(Clone)]
pub struct GuardDeps {
    pub auth: Arc<dyn AuthProviderPort>,
    pub profiles: Arc<dyn ProfileStorePort>,
    pub navigation: Arc<dyn NavigationPort>,
    pub credentials: Arc<dyn CredentialStorePort>,
}

/// Messages processed by the guard runtime, one at a time.
pub(crate) enum GuardInput {
    Event(sf_core::guard::GuardEvent),
    NavigationReady,
    RouteChanged,
    Reconcile { attempt: u32 },
    Flush(tokio::sync::oneshot::Sender<()>),
    Shutdown,
}

impl GuardInput {
    fn name(&self) -> &'static str {
        use sf_core::guard::GuardEvent;
        match self {
            Self::Event(GuardEvent::SessionLoaded(_)) => "session_loaded",
            Self::Event(GuardEvent::SessionLoadFailed(_)) => "session_load_failed",
            Self::Event(GuardEvent::AuthChanged(_)) => "auth_changed",
            Self::Event(GuardEvent::ProfileResolved { .. }) => "profile_resolved",
            Self::Event(GuardEvent::ProfileInvalidated) => "profile_invalidated",
            Self::Event(GuardEvent::SignOutRequested) => "sign_out_requested",
            Self::NavigationReady => "navigation_ready",
            Self::RouteChanged => "route_changed",
            Self::Reconcile { .. } => "reconcile",
            Self::Flush(_) => "flush",
            Self::Shutdown => "shutdown",
        }
    }
}

pub struct SessionGuard {
    deps: GuardDeps,
    config: GuardConfig,
}

impl SessionGuard {
    pub fn new(deps: GuardDeps, config: GuardConfig) -> Self {
        Self { deps, config }
    }

    /// Start the guard on the current tokio runtime.
    ///
    /// The auth subscription is opened before the initial session fetch so no
    /// change emitted in between is lost.
    pub fn spawn(self) -> (GuardHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(GuardState::default().snapshot());

        let mut changes = self.deps.auth.subscribe();
        let forward_tx = tx.clone();
        let forwarder = tokio::spawn(
            async move {
                while let Some(change) = changes.recv().await {
                    let event = sf_core::guard::GuardEvent::AuthChanged(change);
                    if forward_tx.send(GuardInput::Event(event)).is_err() {
                        break;
                    }
                }
            }
            .instrument(info_span!("usecase.session_guard.auth_forwarder")),
        );

        let runtime = GuardRuntime::new(self.deps, self.config, tx.clone(), snapshot_tx);
        let join = tokio::spawn(runtime.run(rx, forwarder));

        (GuardHandle::new(tx, snapshot_rx), join)
    }
}

