//! Business logic use cases
//!
//! The session guard owns session/profile/route state; the other use cases act
//! on the backend and let the guard observe the outcome.

pub mod account;
pub mod auth;
pub mod engagement;
pub mod onboarding;
pub mod post;
pub mod profile;
pub mod session_guard;

pub use account::{UpdateAccount, UpdateAccountError};
pub use auth::{SignIn, SignInError, SignUp, SignUpError};
pub use engagement::{ToggleFollow, ToggleFollowError, ToggleLike, ToggleLikeError};
pub use onboarding::{CompleteOnboarding, OnboardingError};
pub use post::{CreatePost, CreatePostError};
pub use profile::{EditProfile, EditProfileError, UploadAvatar, UploadAvatarError};
