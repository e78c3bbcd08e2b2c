//! HTTP layer: request building and status mapping.
//!
//! This is the ONLY place for status code handling. gateway/mod.rs and
//! client.rs never interpret status codes.

use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::error::{AuthError, AuthResult};

use super::normalize::error_message;

/// Message used for 401 responses that carry no explanation.
pub(crate) const DEFAULT_UNAUTHORIZED: &str = "invalid or expired token";

/// HTTP backend for the portal API (holds reqwest client and base URL).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
}

impl HttpBackend {
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST a JSON body; returns the decoded JSON response (`Null` when empty).
    pub(crate) async fn post_json(
        &self,
        path: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> AuthResult<Value> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let request = self.client.post(&url).json(body);
        self.send(request, bearer).await
    }

    /// GET a JSON resource.
    pub(crate) async fn get_json(&self, path: &str, bearer: Option<&str>) -> AuthResult<Value> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let request = self.client.get(&url);
        self.send(request, bearer).await
    }

    async fn send(
        &self,
        mut request: reqwest::RequestBuilder,
        bearer: Option<&str>,
    ) -> AuthResult<Value> {
        if let Some(token) = bearer {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await.map_err(|e| AuthError::Network {
            message: format!("failed to read response body: {}", e),
        })?;

        map_status(status, &text)?;

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| AuthError::InvalidResponse {
            message: format!("response is not JSON: {}", e),
        })
    }
}

fn map_status(status: StatusCode, body: &str) -> AuthResult<()> {
    match status.as_u16() {
        200..=299 => Ok(()),

        401 => Err(AuthError::Unauthorized {
            message: error_message(body).unwrap_or_else(|| DEFAULT_UNAUTHORIZED.to_string()),
        }),

        code => Err(AuthError::HttpStatus {
            status: code,
            message: error_message(body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            }),
        }),
    }
}
