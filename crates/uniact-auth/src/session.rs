//! Session store: who is logged in right now.
//!
//! Two states, `Unauthenticated` (initial) and `Authenticated`. The in-memory
//! state is the source of truth after [`SessionStore::load`]; durable storage
//! is written wholesale on every transition so a reload sees the same state.
//!
//! None of the operations fail. Storage problems are logged and degrade to
//! the unauthenticated state.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::storage::DurableStorage;
use crate::types::{Identity, Role, SessionRecord};

/// Storage key for the session record.
pub const SESSION_KEY: &str = "auth_session";

/// Storage key for the independent refresh token entry.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(Identity),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            SessionState::Unauthenticated => None,
        }
    }
}

/// Holds the current session and mirrors it to durable storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    storage: Arc<dyn DurableStorage>,
    current: Option<SessionRecord>,
}

impl SessionStore {
    /// Create an unauthenticated store. Call [`load`](Self::load) to pick up
    /// a persisted session.
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self {
            storage,
            current: None,
        }
    }

    /// Create a store and immediately load any persisted session.
    pub fn open(storage: Arc<dyn DurableStorage>) -> Self {
        let mut store = Self::new(storage);
        store.load();
        store
    }

    /// Read the persisted record, discarding it if it is missing pieces.
    pub fn load(&mut self) -> SessionState {
        match self.read_record() {
            Some(record) => {
                debug!(user_id = %record.user.id, role = %record.user.role, "restored session");
                self.current = Some(record);
            }
            None => {
                self.wipe_storage();
                self.current = None;
            }
        }
        self.state()
    }

    fn read_record(&self) -> Option<SessionRecord> {
        let raw = match self.storage.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "failed to read session record");
                return None;
            }
        };

        let record: SessionRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "discarding malformed session record");
                return None;
            }
        };

        if !record.is_well_formed() {
            warn!("discarding session record without user or token");
            return None;
        }

        Some(record)
    }

    /// Persist a new session, keeping the stored refresh token when the
    /// same user is already signed in.
    pub fn save(&mut self, identity: Identity, token: impl Into<String>) {
        let refresh_token = self.carried_refresh_token(&identity);
        self.write(SessionRecord {
            user: identity,
            token: token.into(),
            refresh_token,
        });
    }

    /// Persist a new session with an explicit refresh token.
    ///
    /// `None` keeps the previously stored refresh token if it belongs to the
    /// same user, and drops it otherwise.
    pub fn save_with_refresh(
        &mut self,
        identity: Identity,
        token: impl Into<String>,
        refresh_token: Option<String>,
    ) {
        let refresh_token = refresh_token.or_else(|| self.carried_refresh_token(&identity));
        self.write(SessionRecord {
            user: identity,
            token: token.into(),
            refresh_token,
        });
    }

    fn carried_refresh_token(&self, identity: &Identity) -> Option<String> {
        match &self.current {
            Some(record) if record.user.id == identity.id => self.refresh_token(),
            Some(record) => {
                debug!(
                    previous = %record.user.id,
                    user_id = %identity.id,
                    "user changed, dropping refresh token"
                );
                None
            }
            None => None,
        }
    }

    fn write(&mut self, record: SessionRecord) {
        match serde_json::to_string(&record) {
            Ok(json) => {
                if let Err(e) = self.storage.set(SESSION_KEY, &json) {
                    warn!(error = %e, "failed to persist session record");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize session record"),
        }

        let refresh_result = match &record.refresh_token {
            Some(refresh) => serde_json::to_string(refresh)
                .map_err(|e| e.to_string())
                .and_then(|json| {
                    self.storage
                        .set(REFRESH_TOKEN_KEY, &json)
                        .map_err(|e| e.to_string())
                }),
            None => self
                .storage
                .remove(REFRESH_TOKEN_KEY)
                .map_err(|e| e.to_string()),
        };
        if let Err(e) = refresh_result {
            warn!(error = %e, "failed to persist refresh token entry");
        }

        info!(user_id = %record.user.id, role = %record.user.role, "session authenticated");
        self.current = Some(record);
    }

    /// Forget the session in memory and in storage.
    pub fn clear(&mut self) {
        self.wipe_storage();
        if let Some(previous) = self.current.take() {
            info!(user_id = %previous.user.id, "session cleared");
        }
    }

    fn wipe_storage(&self) {
        for key in [SESSION_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "failed to remove stored session data");
            }
        }
    }

    /// True iff authenticated with a role in `allowed`.
    pub fn has_role(&self, allowed: &[Role]) -> bool {
        self.identity()
            .map(|identity| allowed.contains(&identity.role))
            .unwrap_or(false)
    }

    pub fn state(&self) -> SessionState {
        match &self.current {
            Some(record) => SessionState::Authenticated(record.user.clone()),
            None => SessionState::Unauthenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.current.as_ref().map(|r| &r.user)
    }

    pub fn role(&self) -> Option<Role> {
        self.identity().map(|i| i.role)
    }

    /// Bearer token of the current session.
    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|r| r.token.as_str())
    }

    /// Refresh token, from the independent entry first, then the record.
    pub fn refresh_token(&self) -> Option<String> {
        let stored = match self.storage.get(REFRESH_TOKEN_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<String>(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "failed to read refresh token");
                None
            }
        };
        stored
            .filter(|t| !t.is_empty())
            .or_else(|| self.current.as_ref().and_then(|r| r.refresh_token.clone()))
    }
}
