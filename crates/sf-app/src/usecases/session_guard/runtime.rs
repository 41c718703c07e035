use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use sf_core::guard::{
    GuardAction, GuardEvent, GuardSnapshot, GuardState, GuardStateMachine, TeardownReason,
};
use sf_core::ids::UserId;
use sf_core::ports::NavigationError;
use sf_core::route::RouteDomain;

use super::lookup::resolve_profile;
use super::{GuardConfig, GuardDeps, GuardInput};

/// Owns the guard state. Lives on a single task; every mutation happens in [`Self::handle`].
pub(super) struct GuardRuntime {
    deps: GuardDeps,
    config: GuardConfig,
    state: GuardState,
    tx: mpsc::UnboundedSender<GuardInput>,
    snapshot_tx: watch::Sender<GuardSnapshot>,
    /// Bumped whenever the user navigates on their own.
    route_epoch: u64,
    /// Last redirect issued, with the route epoch it was issued in.
    last_redirect: Option<(RouteDomain, u64)>,
    /// A deferred reconciliation is already waiting on its timer.
    retry_scheduled: bool,
}

impl GuardRuntime {
    pub(super) fn new(
        deps: GuardDeps,
        config: GuardConfig,
        tx: mpsc::UnboundedSender<GuardInput>,
        snapshot_tx: watch::Sender<GuardSnapshot>,
    ) -> Self {
        Self {
            deps,
            config,
            state: GuardState::default(),
            tx,
            snapshot_tx,
            route_epoch: 0,
            last_redirect: None,
            retry_scheduled: false,
        }
    }

    pub(super) async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<GuardInput>,
        forwarder: JoinHandle<()>,
    ) {
        self.load_initial_session()
            .instrument(info_span!("usecase.session_guard.initialize"))
            .await;

        while let Some(input) = rx.recv().await {
            let span = info_span!("usecase.session_guard.dispatch", input = input.name());
            let keep_running = self.handle(input).instrument(span).await;
            if !keep_running {
                break;
            }
        }

        forwarder.abort();
        info!("session guard stopped");
    }

    async fn load_initial_session(&mut self) {
        let event = match self.deps.auth.get_session().await {
            Ok(session) => GuardEvent::SessionLoaded(session),
            Err(err) if err.is_session_fatal() => {
                error!(error = %err, "stored session rejected at startup");
                GuardEvent::SessionLoadFailed(err)
            }
            Err(err) => {
                warn!(error = %err, "session fetch failed at startup, continuing signed out");
                GuardEvent::SessionLoadFailed(err)
            }
        };
        self.apply(event).await;
    }

    async fn handle(&mut self, input: GuardInput) -> bool {
        match input {
            GuardInput::Event(event) => self.apply(event).await,
            GuardInput::NavigationReady => self.reconcile(0).await,
            GuardInput::RouteChanged => {
                self.route_epoch += 1;
                self.reconcile(0).await;
            }
            GuardInput::Reconcile { attempt } => {
                self.retry_scheduled = false;
                self.reconcile(attempt).await;
            }
            GuardInput::Flush(done) => {
                // The waiter may have given up; nothing to report then.
                let _ = done.send(());
            }
            GuardInput::Shutdown => return false,
        }
        true
    }

    async fn apply(&mut self, event: GuardEvent) {
        let from = self.state.desired_route();
        let (next, actions) = GuardStateMachine::transition(self.state.clone(), event);
        let changed = next != self.state;
        self.state = next;

        if changed {
            info!(
                from = ?from,
                to = ?self.state.desired_route(),
                generation = self.state.generation,
                "guard state transition"
            );
            self.snapshot_tx.send_replace(self.state.snapshot());
        } else {
            debug!("guard event ignored");
        }

        for action in actions {
            self.execute(action).await;
        }

        if changed {
            self.reconcile(0).await;
        }
    }

    async fn execute(&mut self, action: GuardAction) {
        match action {
            GuardAction::LookupProfile {
                generation,
                user_id,
            } => self.spawn_lookup(generation, user_id),
            GuardAction::TearDown { reason } => self.tear_down(reason).await,
        }
    }

    fn spawn_lookup(&self, generation: u64, user_id: UserId) {
        let auth = Arc::clone(&self.deps.auth);
        let profiles = Arc::clone(&self.deps.profiles);
        let tx = self.tx.clone();
        let retry = self.config.lookup_retry;
        let span = info_span!("usecase.session_guard.lookup_profile", generation, %user_id);

        tokio::spawn(
            async move {
                let lookup = resolve_profile(auth.as_ref(), profiles.as_ref(), &user_id, &retry).await;
                let event = GuardEvent::ProfileResolved { generation, lookup };
                if tx.send(GuardInput::Event(event)).is_err() {
                    debug!("guard stopped before profile lookup finished");
                }
            }
            .instrument(span),
        );
    }

    async fn tear_down(&self, reason: TeardownReason) {
        match &reason {
            TeardownReason::Unauthorized(err) => {
                error!(error = %err, "authorization failed, tearing down session")
            }
            TeardownReason::SessionMissing => error!("session missing, tearing down"),
            other => info!(reason = ?other, "tearing down session"),
        }

        // Revoke first: the provider needs the tokens it still holds.
        if reason.revokes_remote() {
            if let Err(err) = self.deps.auth.sign_out().await {
                error!(error = %err, "remote sign-out failed");
            }
        }
        if let Err(err) = self.deps.credentials.clear().await {
            error!(error = %err, "failed to clear cached credentials");
        }
    }

    /// Redirect to the desired domain if the current one differs.
    ///
    /// Issues at most one redirect per target until the user navigates again.
    async fn reconcile(&mut self, attempt: u32) {
        let Some(target) = self.state.desired_route() else {
            return;
        };

        let navigation = Arc::clone(&self.deps.navigation);
        if !navigation.is_ready().await {
            self.defer_reconcile(attempt);
            return;
        }

        let current = RouteDomain::from_path(&navigation.current_path().await);
        if current == target {
            return;
        }
        if self.last_redirect == Some((target, self.route_epoch)) {
            debug!(?target, "redirect already issued");
            return;
        }

        let path = target.entry_path();
        match navigation.replace(path).await {
            Ok(()) => {
                info!(from = ?current, to = ?target, path, "guard redirect");
                self.last_redirect = Some((target, self.route_epoch));
            }
            Err(NavigationError::NotReady) => self.defer_reconcile(attempt),
            Err(err) => warn!(error = %err, "guard redirect failed"),
        }
    }

    fn defer_reconcile(&mut self, attempt: u32) {
        if self.retry_scheduled {
            return;
        }
        if attempt >= self.config.redirect_max_attempts {
            warn!(
                attempts = attempt,
                "navigation still not ready, waiting for it to report ready"
            );
            return;
        }

        let delay = self
            .config
            .redirect_base_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        debug!(attempt, delay_ms = delay.as_millis() as u64, "navigation not ready, deferring");
        self.retry_scheduled = true;

        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(GuardInput::Reconcile {
                attempt: attempt + 1,
            });
        });
    }
}
