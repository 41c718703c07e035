mod create_post;

pub use create_post::{CreatePost, CreatePostError};
