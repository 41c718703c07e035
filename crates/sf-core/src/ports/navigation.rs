//!
//! Navigation port.
//!
//! The guard reads the current path and readiness, and issues `replace` redirects.

use async_trait::async_trait;

#[async_trait]
pub trait NavigationPort: Send + Sync {
    /// Whether the navigation layer is mounted and can accept redirects.
    async fn is_ready(&self) -> bool;

    /// Current path, e.g. `/(auth)/sign-in`.
    async fn current_path(&self) -> String;

    /// Replace the current stack with `path`.
    async fn replace(&self, path: &str) -> Result<(), NavigationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("navigation is not ready")]
    NotReady,

    #[error("redirect to {path} failed: {reason}")]
    RedirectFailed { path: String, reason: String },
}
