//! Authentication domain: sessions, identities and auth state changes.

mod account;
mod error;
mod event;
mod secret;
mod session;

pub use account::UserAttributes;
pub use error::AuthError;
pub use event::{AuthChange, AuthEventKind};
pub use secret::SecretString;
pub use session::{Session, UserIdentity};
