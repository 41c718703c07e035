//! # sf-core
//!
//! Core domain models and business logic for Snapfeed.
//!
//! This crate contains pure business logic without any infrastructure dependencies:
//! the session/profile/route model, posts and likes, the session guard state
//! machine and the ports that adapters implement.

// Public module exports
pub mod auth;
pub mod config;
pub mod guard;
pub mod ids;
pub mod media;
pub mod ports;
pub mod post;
pub mod profile;
pub mod route;

// Re-export commonly used types at the crate root
pub use auth::{
    AuthChange, AuthError, AuthEventKind, SecretString, Session, UserAttributes, UserIdentity,
};
pub use config::AppConfig;
pub use guard::{GuardAction, GuardEvent, GuardSnapshot, GuardState, GuardStateMachine};
pub use ids::{PostId, UserId};
pub use post::{LikeState, NewPost, Post};
pub use profile::{NewProfile, Profile, ProfileEdit};
pub use route::RouteDomain;
