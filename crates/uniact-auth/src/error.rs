//! Error types for the auth core.

/// Auth errors.
///
/// `SessionStore::load`, `AuthGateway::authenticate` and the guards never
/// return these. They surface from token refresh, authenticated API calls
/// and storage construction.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Credentials rejected or token invalid.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Credentials failed local validation.
    #[error("invalid credentials: {message}")]
    InvalidCredentials { message: String },

    /// No refresh token is stored for the current session.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// Network error.
    #[error("network error: {message}")]
    Network { message: String },

    /// Non-success status not covered by a more specific variant.
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Invalid response from the API.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Durable storage error.
    #[error("storage error: {message}")]
    Storage { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl AuthError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidCredentials { .. } => 1,
            Self::HttpStatus { .. } => 1,

            Self::Config { .. } => 2,
            Self::Storage { .. } => 2,
            Self::InvalidResponse { .. } => 2,
            Self::Network { .. } => 2,

            Self::Unauthorized { .. } => 3,
            Self::NoRefreshToken => 3,
        }
    }

    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
