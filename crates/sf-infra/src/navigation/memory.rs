//! Headless navigation stack.
//!
//! Stands in for a UI router: tracks the current path, records redirects and
//! only accepts them once marked ready.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use sf_core::ports::{NavigationError, NavigationPort};

pub struct InMemoryNavigator {
    ready: AtomicBool,
    path: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl InMemoryNavigator {
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self {
            ready: AtomicBool::new(false),
            path: Mutex::new(initial_path.into()),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Move to `path` as if the user navigated there.
    pub fn navigate(&self, path: impl Into<String>) {
        *self.path.lock().unwrap_or_else(|e| e.into_inner()) = path.into();
    }

    pub fn path(&self) -> String {
        self.path.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Redirects issued through [`NavigationPort::replace`], oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl NavigationPort for InMemoryNavigator {
    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn current_path(&self) -> String {
        self.path()
    }

    async fn replace(&self, path: &str) -> Result<(), NavigationError> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(NavigationError::NotReady);
        }
        self.navigate(path);
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_string());
        Ok(())
    }
}
