//! Credential use cases. The guard observes their outcome through the auth change stream.

mod sign_in;
mod sign_up;

pub use sign_in::{SignIn, SignInError};
pub use sign_up::{SignUp, SignUpError, MIN_PASSWORD_LEN};
