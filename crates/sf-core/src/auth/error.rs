use thiserror::Error;

/// Message fragments the auth service uses for unrecoverable session failures.
const SESSION_FATAL_MARKERS: [&str; 4] = [
    "Invalid Refresh Token",
    "refresh_token_not_found",
    "session_not_found",
    "JWT expired",
];

/// Errors reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid Refresh Token: {0}")]
    InvalidRefreshToken(String),

    #[error("refresh_token_not_found")]
    RefreshTokenNotFound,

    #[error("session_not_found")]
    SessionNotFound,

    #[error("JWT expired")]
    JwtExpired,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid login credentials: {0}")]
    InvalidCredentials(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed auth response: {0}")]
    Malformed(String),

    #[error("auth service returned {status}: {message}")]
    Service { status: u16, message: String },
}

impl AuthError {
    /// Classify a failed auth-service response.
    pub fn from_response(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains("Invalid Refresh Token") {
            return Self::InvalidRefreshToken(message);
        }
        if message.contains("refresh_token_not_found") {
            return Self::RefreshTokenNotFound;
        }
        if message.contains("session_not_found") {
            return Self::SessionNotFound;
        }
        if message.contains("JWT expired") {
            return Self::JwtExpired;
        }
        match status {
            403 => Self::Forbidden(message),
            400 if message.contains("Invalid login credentials") => {
                Self::InvalidCredentials(message)
            }
            422 => Self::Validation(message),
            _ => Self::Service { status, message },
        }
    }

    /// Errors that invalidate the current session and force a teardown.
    pub fn is_session_fatal(&self) -> bool {
        match self {
            Self::InvalidRefreshToken(_)
            | Self::RefreshTokenNotFound
            | Self::SessionNotFound
            | Self::JwtExpired
            | Self::Forbidden(_) => true,
            Self::Service { status, message } => {
                *status == 403 || SESSION_FATAL_MARKERS.iter().any(|m| message.contains(m))
            }
            _ => false,
        }
    }

    /// Errors caused by the network or a struggling service; worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Service { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
