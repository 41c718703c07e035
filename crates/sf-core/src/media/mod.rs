//! Media upload validation.
//!
//! Validation failures are permanent: their messages are worded so that retry
//! classification never re-attempts them ("file type", "5MB"). Post media
//! shares the accepted types but has a larger size ceiling.

use thiserror::Error;

const MIB: usize = 1024 * 1024;

/// Avatar size ceiling (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * MIB;

/// Post media size ceiling (7 MiB).
pub const MAX_POST_UPLOAD_BYTES: usize = 7 * MIB;

/// Content types accepted for avatars and post media.
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadValidationError {
    #[error("Invalid file type. Please upload a JPEG, PNG, or GIF image. (got {content_type})")]
    UnsupportedFileType { content_type: String },
    #[error("File size must be less than {}MB (got {size} bytes)", .limit / MIB)]
    TooLarge { size: usize, limit: usize },
    #[error("validation: file is empty")]
    Empty,
}

/// A validated image ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    content_type: String,
    bytes: Vec<u8>,
}

impl ImageUpload {
    /// Validate an avatar image against the 5 MiB ceiling.
    pub fn new(content_type: &str, bytes: Vec<u8>) -> Result<Self, UploadValidationError> {
        Self::with_limit(content_type, bytes, MAX_UPLOAD_BYTES)
    }

    pub fn with_limit(
        content_type: &str,
        bytes: Vec<u8>,
        limit: usize,
    ) -> Result<Self, UploadValidationError> {
        let content_type = content_type.trim().to_ascii_lowercase();
        if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
            return Err(UploadValidationError::UnsupportedFileType { content_type });
        }
        if bytes.is_empty() {
            return Err(UploadValidationError::Empty);
        }
        if bytes.len() > limit {
            return Err(UploadValidationError::TooLarge {
                size: bytes.len(),
                limit,
            });
        }
        Ok(Self {
            content_type,
            bytes,
        })
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension matching the content type.
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            _ => "jpeg",
        }
    }
}

/// Guess a content type from a file name's extension.
pub fn content_type_for_path(path: &str) -> Option<&'static str> {
    let ext = path.rsplit('.').next()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}
