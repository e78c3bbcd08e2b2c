//! Authenticated data requests against the portal API.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{AuthError, AuthResult};
use crate::gateway::AuthGateway;
use crate::session::SessionStore;

/// Sends bearer-authenticated requests for the current session.
///
/// A 401 triggers one refresh attempt and one retry. If the token cannot be
/// renewed or is still rejected, the session is cleared and
/// [`AuthError::Unauthorized`] is returned.
#[derive(Debug, Clone)]
pub struct ApiClient {
    gateway: AuthGateway,
}

impl ApiClient {
    pub fn new(gateway: AuthGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    /// GET `path` (relative to the API base URL) as JSON.
    pub async fn get_json(&self, store: &mut SessionStore, path: &str) -> AuthResult<Value> {
        let token = store
            .token()
            .map(String::from)
            .ok_or_else(|| AuthError::Unauthorized {
                message: "not logged in".to_string(),
            })?;

        match self.gateway.http.get_json(path, Some(&token)).await {
            Err(AuthError::Unauthorized { message }) => {
                debug!(path, "request unauthorized, attempting refresh");
                self.retry_after_refresh(store, path, message).await
            }
            other => other,
        }
    }

    /// GET `path` and decode into `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        store: &mut SessionStore,
        path: &str,
    ) -> AuthResult<T> {
        let value = self.get_json(store, path).await?;
        serde_json::from_value(value).map_err(|e| AuthError::InvalidResponse {
            message: format!("failed to decode {}: {}", path, e),
        })
    }

    async fn retry_after_refresh(
        &self,
        store: &mut SessionStore,
        path: &str,
        original: String,
    ) -> AuthResult<Value> {
        let token = match self.gateway.refresh(store).await {
            Ok(token) => token,
            Err(e @ (AuthError::NoRefreshToken | AuthError::Unauthorized { .. })) => {
                warn!(path, error = %e, "token cannot be renewed, ending session");
                store.clear();
                return Err(AuthError::Unauthorized { message: original });
            }
            Err(e) => return Err(e),
        };

        match self.gateway.http.get_json(path, Some(&token)).await {
            Err(AuthError::Unauthorized { message }) => {
                warn!(path, "refreshed token rejected, ending session");
                store.clear();
                Err(AuthError::Unauthorized { message })
            }
            other => other,
        }
    }
}
