mod edit_profile;
mod upload_avatar;

pub use edit_profile::{EditProfile, EditProfileError};
pub use upload_avatar::{UploadAvatar, UploadAvatarError, AVATAR_BUCKET};
