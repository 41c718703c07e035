use tokio::sync::{mpsc, oneshot, watch};

use sf_core::guard::{GuardEvent, GuardSnapshot};

use super::{GuardError, GuardInput};

/// Cloneable, read-only access to the guard plus the signals UI layers send it.
#[derive(Clone)]
pub struct GuardHandle {
    tx: mpsc::UnboundedSender<GuardInput>,
    snapshot_rx: watch::Receiver<GuardSnapshot>,
}

impl GuardHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<GuardInput>,
        snapshot_rx: watch::Receiver<GuardSnapshot>,
    ) -> Self {
        Self { tx, snapshot_rx }
    }

    fn send(&self, input: GuardInput) -> Result<(), GuardError> {
        self.tx.send(input).map_err(|_| GuardError::Stopped)
    }

    pub fn snapshot(&self) -> GuardSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GuardSnapshot> {
        self.snapshot_rx.clone()
    }

    /// The navigation layer is mounted and accepts redirects.
    pub fn navigation_ready(&self) -> Result<(), GuardError> {
        self.send(GuardInput::NavigationReady)
    }

    /// The user navigated; the current route domain may no longer match.
    pub fn route_changed(&self) -> Result<(), GuardError> {
        self.send(GuardInput::RouteChanged)
    }

    /// The profile was created or edited; resolve it again.
    pub fn profile_changed(&self) -> Result<(), GuardError> {
        self.send(GuardInput::Event(GuardEvent::ProfileInvalidated))
    }

    /// Tear the session down and wait until the teardown has been applied.
    pub async fn sign_out(&self) -> Result<(), GuardError> {
        self.send(GuardInput::Event(GuardEvent::SignOutRequested))?;
        self.flush().await
    }

    /// Wait until every input queued before this call has been processed.
    pub async fn flush(&self) -> Result<(), GuardError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(GuardInput::Flush(done_tx))?;
        done_rx.await.map_err(|_| GuardError::Stopped)
    }

    /// Wait for a snapshot matching `predicate`, then for the input that produced it
    /// to finish (including any redirect it issued).
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<GuardSnapshot, GuardError>
    where
        F: FnMut(&GuardSnapshot) -> bool,
    {
        let mut rx = self.snapshot_rx.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| GuardError::Stopped)?
            .clone();
        self.flush().await?;
        Ok(snapshot)
    }

    /// Wait until the guard has settled on a route domain.
    pub async fn settled(&self) -> Result<GuardSnapshot, GuardError> {
        self.wait_for(|s| !s.loading && s.route.is_some()).await
    }

    pub fn shutdown(&self) -> Result<(), GuardError> {
        self.send(GuardInput::Shutdown)
    }
}

#[cfg(test)]
impl GuardHandle {
    /// Handle over a fixed snapshot with no runtime behind it; inputs land in the returned receiver.
    pub(crate) fn detached(
        snapshot: GuardSnapshot,
    ) -> (Self, mpsc::UnboundedReceiver<GuardInput>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (_snapshot_tx, snapshot_rx) = watch::channel(snapshot);
        (Self::new(tx, snapshot_rx), rx)
    }
}
