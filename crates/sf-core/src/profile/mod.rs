//! Profile domain.
//!
//! A profile's existence, not its content, marks onboarding as complete for a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::UserId;

/// Application-level record keyed by the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Public handle derived from the display name: `@` + lowercase name, whitespace removed.
    pub fn handle(&self) -> String {
        let compact: String = self
            .name
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        format!("@{compact}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileValidationError {
    #[error("validation: Please enter your name")]
    EmptyName,
    #[error("validation: name must be at most {max} characters")]
    NameTooLong { max: usize },
}

pub const MAX_NAME_LEN: usize = 50;

fn validated_name(name: &str) -> Result<String, ProfileValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ProfileValidationError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ProfileValidationError::NameTooLong { max: MAX_NAME_LEN });
    }
    Ok(name.to_string())
}

/// Profile creation payload produced by the onboarding flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    pub id: UserId,
    pub name: String,
}

impl NewProfile {
    /// Validate and normalize the display name (trimmed, non-empty).
    pub fn new(id: UserId, name: &str) -> Result<Self, ProfileValidationError> {
        Ok(Self {
            id,
            name: validated_name(name)?,
        })
    }
}

/// Editable profile fields. Blank bio or website clears the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileEdit {
    pub name: String,
    pub bio: Option<String>,
    pub website: Option<String>,
}

impl ProfileEdit {
    pub fn new(
        name: &str,
        bio: Option<&str>,
        website: Option<&str>,
    ) -> Result<Self, ProfileValidationError> {
        let optional = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Ok(Self {
            name: validated_name(name)?,
            bio: optional(bio),
            website: optional(website),
        })
    }
}
