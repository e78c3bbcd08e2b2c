//! Application-level auth context.
//!
//! One owned object passed by reference to whatever needs to know who is
//! logged in. Reads go through the query methods; the only mutations are
//! [`AuthContext::dispatch`] and the authenticated request helpers, which may
//! end a session whose token was rejected.

use std::sync::Arc;

use serde_json::Value;

use crate::client::ApiClient;
use crate::error::AuthResult;
use crate::gateway::AuthGateway;
use crate::guard::{self, GuardDecision};
use crate::session::{SessionState, SessionStore};
use crate::storage::{DurableStorage, FileStorage};
use crate::types::{AuthConfig, Credentials, Identity, Role};

/// State changes the context accepts.
#[derive(Debug, Clone)]
pub enum AuthAction {
    Login(Credentials),
    Logout,
}

/// What a dispatched action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    LoggedIn(Identity),
    LoginFailed(String),
    LoggedOut,
}

#[derive(Debug, Clone)]
pub struct AuthContext {
    session: SessionStore,
    api: ApiClient,
}

impl AuthContext {
    /// Build a context over `storage` and load any persisted session.
    pub fn new(config: &AuthConfig, storage: Arc<dyn DurableStorage>) -> AuthResult<Self> {
        let gateway = AuthGateway::new(config)?;
        Ok(Self {
            session: SessionStore::open(storage),
            api: ApiClient::new(gateway),
        })
    }

    /// Build a context with file storage at `config.session_dir` (or the
    /// default data directory).
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        let storage = match &config.session_dir {
            Some(dir) => FileStorage::with_dir(dir),
            None => FileStorage::new()?,
        };
        Self::new(config, Arc::new(storage))
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn has_role(&self, allowed: &[Role]) -> bool {
        self.session.has_role(allowed)
    }

    /// Route guard decision for navigating to `path`.
    pub fn guard(&self, path: &str) -> GuardDecision {
        guard::evaluate(&self.session, path)
    }

    pub fn gateway(&self) -> &AuthGateway {
        self.api.gateway()
    }

    pub async fn dispatch(&mut self, action: AuthAction) -> ActionResult {
        match action {
            AuthAction::Login(credentials) => {
                let outcome = self
                    .api
                    .gateway()
                    .authenticate(&mut self.session, &credentials)
                    .await;
                match outcome.error {
                    None => ActionResult::LoggedIn(outcome.identity),
                    Some(message) => ActionResult::LoginFailed(message),
                }
            }
            AuthAction::Logout => {
                self.api.gateway().logout(&mut self.session).await;
                ActionResult::LoggedOut
            }
        }
    }

    /// Authenticated GET against the API.
    pub async fn get_json(&mut self, path: &str) -> AuthResult<Value> {
        self.api.get_json(&mut self.session, path).await
    }

    /// Exchange the refresh token for a new access token.
    pub async fn refresh(&mut self) -> AuthResult<()> {
        self.api.gateway().refresh(&mut self.session).await.map(|_| ())
    }
}
