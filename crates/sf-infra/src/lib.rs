pub mod credentials;
pub mod navigation;
pub mod supabase;
pub mod time;

pub use credentials::{FileCredentialStore, MemoryCredentialStore};
pub use navigation::InMemoryNavigator;
pub use supabase::{
    GoTrueAuthProvider, RestFollowStore, RestLikeStore, RestPostStore, RestProfileStore,
    SupabaseConfig, SupabaseHttp, SupabaseStorage, DEFAULT_REFRESH_MARGIN_SECS,
};
pub use time::SystemClock;
