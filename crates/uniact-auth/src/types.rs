//! Identity, session record and configuration types.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Role of an authenticated principal.
///
/// Ordered least-privileged first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Staff,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Staff, Role::Admin];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }

    /// Strict parse; `None` for anything that is not a known role.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "staff" => Some(Role::Staff),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Parse a role received from the API.
    ///
    /// Missing or unrecognized values become `Student`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or(Role::Student)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The currently authenticated principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Opaque user id.
    pub id: String,

    /// University student/staff number.
    pub student_id: String,

    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, student_id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            student_id: student_id.into(),
            role,
            ..Default::default()
        }
    }

    /// Identity carried by a failed login.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.student_id.is_empty()
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    /// "First Last" when names are known, otherwise the student id.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.student_id.clone(),
        }
    }
}

/// Durable form of a session: identity plus bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub user: Identity,

    pub token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl SessionRecord {
    /// A record is usable only with both a user id and a token.
    pub fn is_well_formed(&self) -> bool {
        !self.user.id.trim().is_empty() && !self.token.trim().is_empty()
    }
}

/// Login credentials.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub student_id: String,
    pub password: String,
}

impl Credentials {
    pub fn new(student_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            password: password.into(),
        }
    }

    /// Check the 8-digit student number rule and a non-empty password.
    pub fn validate(&self) -> AuthResult<()> {
        let id = self.student_id.as_str();
        if id.len() != 8 || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AuthError::InvalidCredentials {
                message: "student ID must be exactly 8 digits".to_string(),
            });
        }
        if self.password.is_empty() {
            return Err(AuthError::InvalidCredentials {
                message: "password must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("student_id", &self.student_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL for the portal API.
    #[serde(default = "default_api_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Synthesize a local token when the login response carries none.
    #[serde(default = "default_allow_missing_token")]
    pub allow_missing_token: bool,

    /// Directory for the file-backed session store.
    #[serde(default)]
    pub session_dir: Option<PathBuf>,
}

fn default_api_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_allow_missing_token() -> bool {
    true
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            timeout_secs: default_timeout(),
            allow_missing_token: default_allow_missing_token(),
            session_dir: None,
        }
    }
}

impl AuthConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `UNIACT_API_URL` | API base URL |
    /// | `UNIACT_API_TIMEOUT` | Request timeout in seconds |
    /// | `UNIACT_ALLOW_MISSING_TOKEN` | Synthesize tokens the API omits |
    /// | `UNIACT_SESSION_DIR` | Session storage directory |
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("UNIACT_API_URL").unwrap_or_else(|_| default_api_url()),
            timeout_secs: std::env::var("UNIACT_API_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            allow_missing_token: std::env::var("UNIACT_ALLOW_MISSING_TOKEN")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or_else(default_allow_missing_token),
            session_dir: std::env::var_os("UNIACT_SESSION_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Allow or refuse token synthesis.
    pub fn with_allow_missing_token(mut self, allow: bool) -> Self {
        self.allow_missing_token = allow;
        self
    }

    /// Set the session directory.
    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = Some(dir.into());
        self
    }

    /// Base URL without a trailing slash, checked to be an http(s) URL.
    pub fn base_url(&self) -> AuthResult<String> {
        let parsed = url::Url::parse(self.url.trim()).map_err(|e| AuthError::Config {
            message: format!("invalid API URL '{}': {}", self.url, e),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AuthError::Config {
                message: format!("unsupported URL scheme: {}", parsed.scheme()),
            });
        }
        Ok(self.url.trim().trim_end_matches('/').to_string())
    }
}
