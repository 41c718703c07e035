//! Client-held credential caches.

mod file_store;
mod memory;

pub use file_store::{FileCredentialStore, DEFAULT_SESSION_FILE};
pub use memory::MemoryCredentialStore;
