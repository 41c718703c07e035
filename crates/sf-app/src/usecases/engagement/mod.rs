//! Likes and follows.

mod toggle_follow;
mod toggle_like;

pub use toggle_follow::{ToggleFollow, ToggleFollowError};
pub use toggle_like::{ToggleLike, ToggleLikeError};
