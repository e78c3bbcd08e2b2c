//! Auth gateway: credential exchange with the portal API.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs,
//! all response-shape handling in normalize.rs.
//!
//! # Endpoints
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | POST | `/auth/login` | `{ studentId, password }` |
//! | POST | `/auth/refresh` | `{ refreshToken }` |
//! | POST | `/auth/logout` | empty, bearer token |

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{AuthError, AuthResult};
use crate::session::SessionStore;
use crate::types::{AuthConfig, Credentials, Identity};

mod http;
mod normalize;

pub(crate) use http::HttpBackend;
use http::DEFAULT_UNAUTHORIZED;
use normalize::{parse_token_body, synthesize_token};

const USER_AGENT_VALUE: &str = concat!("uniact-auth/", env!("CARGO_PKG_VERSION"));

pub const LOGIN_PATH: &str = "/auth/login";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Result of a login attempt.
///
/// Failures carry an empty identity, an empty token and a message suitable
/// for showing next to the login form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub identity: Identity,
    pub token: String,
    pub error: Option<String>,
}

impl LoginOutcome {
    fn success(identity: Identity, token: String) -> Self {
        Self {
            identity,
            token,
            error: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            identity: Identity::empty(),
            token: String::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Turn an exchange error into the message shown on the login view.
fn login_failure_message(err: &AuthError) -> String {
    match err {
        AuthError::Unauthorized { message } if message == DEFAULT_UNAUTHORIZED => {
            "Invalid student ID or password".to_string()
        }
        AuthError::Unauthorized { message } => message.clone(),
        AuthError::HttpStatus { status, message } => {
            format!("Login failed (HTTP {}): {}", status, message)
        }
        AuthError::Network { .. } => {
            "Unable to reach the server. Please try again later.".to_string()
        }
        AuthError::InvalidResponse { message } => {
            format!("Unexpected response from server: {}", message)
        }
        other => other.to_string(),
    }
}

/// Exchanges credentials for a session.
#[derive(Debug, Clone)]
pub struct AuthGateway {
    pub(crate) http: HttpBackend,
    allow_missing_token: bool,
}

impl AuthGateway {
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| AuthError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http: HttpBackend {
                client,
                base_url: config.base_url()?,
            },
            allow_missing_token: config.allow_missing_token,
        })
    }

    pub fn from_env() -> AuthResult<Self> {
        Self::new(&AuthConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.http.base_url
    }

    /// Log in and, on success, save the session into `store`.
    ///
    /// Never fails: errors come back as a [`LoginOutcome`] with a message and
    /// leave `store` untouched. The student id format is expected to be
    /// checked by the caller (see [`Credentials::validate`]).
    pub async fn authenticate(
        &self,
        store: &mut SessionStore,
        credentials: &Credentials,
    ) -> LoginOutcome {
        debug!(student_id = %credentials.student_id, "authenticating");

        let payload = match self.exchange(credentials).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(student_id = %credentials.student_id, error = %e, "login failed");
                return LoginOutcome::failure(login_failure_message(&e));
            }
        };

        let Some(identity) = payload.identity else {
            warn!(student_id = %credentials.student_id, "login response has no user");
            return LoginOutcome::failure("Unexpected response from server: missing user");
        };

        let token = match payload.token {
            Some(token) => token,
            None if self.allow_missing_token => {
                warn!(user_id = %identity.id, "login response has no token, using a local placeholder");
                synthesize_token()
            }
            None => {
                warn!(user_id = %identity.id, "login response has no token");
                return LoginOutcome::failure("Unexpected response from server: missing token");
            }
        };

        store.save_with_refresh(identity.clone(), token.clone(), payload.refresh_token);
        info!(user_id = %identity.id, role = %identity.role, "logged in");
        LoginOutcome::success(identity, token)
    }

    async fn exchange(&self, credentials: &Credentials) -> AuthResult<normalize::TokenPayload> {
        let body = serde_json::to_value(credentials).map_err(|e| AuthError::InvalidCredentials {
            message: e.to_string(),
        })?;
        let response = self.http.post_json(LOGIN_PATH, &body, None).await?;
        parse_token_body(&response, Some(&credentials.student_id))
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Replaces the session record on success. A rejected refresh token ends
    /// the session.
    pub async fn refresh(&self, store: &mut SessionStore) -> AuthResult<String> {
        let Some(current) = store.identity().cloned() else {
            return Err(AuthError::Unauthorized {
                message: "no active session".to_string(),
            });
        };
        let refresh_token = store.refresh_token().ok_or(AuthError::NoRefreshToken)?;

        let response = match self
            .http
            .post_json(REFRESH_PATH, &json!({ "refreshToken": refresh_token }), None)
            .await
        {
            Ok(response) => response,
            Err(e @ AuthError::Unauthorized { .. }) => {
                warn!(user_id = %current.id, "refresh token rejected, ending session");
                store.clear();
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let payload = parse_token_body(&response, Some(&current.student_id))?;
        let token = payload.token.ok_or_else(|| AuthError::InvalidResponse {
            message: "refresh response has no token".to_string(),
        })?;
        let identity = payload.identity.unwrap_or(current);

        store.save_with_refresh(identity, token.clone(), payload.refresh_token);
        debug!("access token refreshed");
        Ok(token)
    }

    /// Tell the API the session is over (best effort) and clear `store`.
    pub async fn logout(&self, store: &mut SessionStore) {
        if let Some(token) = store.token() {
            if let Err(e) = self
                .http
                .post_json(LOGOUT_PATH, &json!({}), Some(token))
                .await
            {
                debug!(error = %e, "logout request failed, clearing local session anyway");
            }
        }
        store.clear();
    }
}
