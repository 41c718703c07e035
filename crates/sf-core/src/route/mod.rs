//! Route domains: the coarse screen groups the session guard redirects between.

use serde::{Deserialize, Serialize};

/// First path segment of the auth screen group.
pub const AUTH_SEGMENT: &str = "(auth)";
/// First path segment of the onboarding screen.
pub const ONBOARDING_SEGMENT: &str = "onboarding";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteDomain {
    Auth,
    Onboarding,
    Main,
}

impl RouteDomain {
    /// Derive the domain from the navigation stack's first segment.
    ///
    /// Anything outside the auth group and onboarding belongs to the main app.
    pub fn from_segment(segment: Option<&str>) -> Self {
        match segment {
            Some(AUTH_SEGMENT) => Self::Auth,
            Some(ONBOARDING_SEGMENT) => Self::Onboarding,
            _ => Self::Main,
        }
    }

    /// Derive the domain from a full path such as `/(auth)/sign-in`.
    pub fn from_path(path: &str) -> Self {
        Self::from_segment(path.split('/').find(|s| !s.is_empty()))
    }

    /// Route the guard replaces the stack with when redirecting into this domain.
    pub fn entry_path(self) -> &'static str {
        match self {
            Self::Auth => "/(auth)/sign-in",
            Self::Onboarding => "/onboarding",
            Self::Main => "/(tabs)",
        }
    }

    /// Domain required by a `(session present, profile present)` pair.
    pub fn required_for(has_session: bool, has_profile: bool) -> Self {
        match (has_session, has_profile) {
            (false, _) => Self::Auth,
            (true, false) => Self::Onboarding,
            (true, true) => Self::Main,
        }
    }
}
