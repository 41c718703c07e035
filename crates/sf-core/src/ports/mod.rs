//! Port interfaces for the application layer
//!
//! Ports define the contract between the application logic (use cases)
//! and the managed backend, the navigation layer and local storage.
//! The backend itself (schema, RLS, realtime delivery, bucket policies) is an
//! external collaborator; these traits only capture what the client assumes of it.

pub mod auth;
mod clock;
pub mod credentials;
pub mod navigation;
pub mod profile;
pub mod social;
pub mod storage;

pub use auth::AuthProviderPort;
pub use clock::*;
pub use credentials::CredentialStorePort;
pub use navigation::{NavigationError, NavigationPort};
pub use profile::{ProfileStoreError, ProfileStorePort};
pub use social::{ContentStoreError, FollowStorePort, LikeStorePort, PostStorePort};
pub use storage::{ObjectStoragePort, StorageError};
