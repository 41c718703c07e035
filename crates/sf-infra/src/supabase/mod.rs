//! Adapters for a Supabase-compatible managed backend.
//!
//! - auth: GoTrue (`/auth/v1`)
//! - profiles: PostgREST (`/rest/v1/profiles`)
//! - social: PostgREST (`/rest/v1/posts`, `likes`, `followers`)
//! - storage: Storage API (`/storage/v1/object`)

mod auth;
mod client;
mod profiles;
mod social;
mod storage;

pub use auth::{GoTrueAuthProvider, DEFAULT_REFRESH_MARGIN_SECS};
pub use client::{SupabaseConfig, SupabaseHttp};
pub use profiles::RestProfileStore;
pub use social::{RestFollowStore, RestLikeStore, RestPostStore};
pub use storage::SupabaseStorage;
