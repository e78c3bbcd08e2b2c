//! Durable key/value storage for the session.
//!
//! Stands in for browser local storage. Values are whole strings and every
//! write replaces the previous value.
//!
//! # File layout
//!
//! ```text
//! ~/.local/share/uniact/session/
//!   auth_session.json    # SessionRecord
//!   refresh_token.json   # refresh token entry
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// Key/value storage that survives restarts.
pub trait DurableStorage: Send + Sync + fmt::Debug {
    /// Read a value; `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> AuthResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> AuthResult<()>;

    /// Remove a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> AuthResult<()>;
}

/// File-per-key storage in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage under the default data directory.
    ///
    /// Default: `<data_dir>/uniact/session`
    pub fn new() -> AuthResult<Self> {
        Ok(Self {
            dir: default_session_dir()?,
        })
    }

    /// Storage in a custom directory.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

pub(crate) fn default_session_dir() -> AuthResult<PathBuf> {
    let base = dirs::data_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| AuthError::Storage {
            message: "could not determine data directory".to_string(),
        })?;

    Ok(base.join("uniact").join("session"))
}

fn write_atomic(path: &Path, content: &str) -> AuthResult<()> {
    let temp_path = path.with_extension("tmp");

    fs::write(&temp_path, content).map_err(|e| AuthError::Storage {
        message: format!("failed to write temp file: {}", e),
    })?;

    fs::rename(&temp_path, path).map_err(|e| AuthError::Storage {
        message: format!("failed to rename temp file: {}", e),
    })?;

    Ok(())
}

impl DurableStorage for FileStorage {
    fn get(&self, key: &str) -> AuthResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuthError::Storage {
                message: format!("failed to read {}: {}", path.display(), e),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> AuthResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| AuthError::Storage {
            message: format!("failed to create session directory: {}", e),
        })?;
        write_atomic(&self.path_for(key), value)?;
        debug!(key, "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> AuthResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => {
                debug!(key, "removed value");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage {
                message: format!("failed to remove {}: {}", key, e),
            }),
        }
    }
}

/// In-memory storage.
///
/// Clones share the same map, so a second `SessionStore` built from a clone
/// behaves like a page reload over the same browser storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AuthResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries.lock().map_err(|_| AuthError::Storage {
            message: "memory storage lock poisoned".to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.lock().map(|m| m.is_empty()).unwrap_or(true)
    }
}

impl DurableStorage for MemoryStorage {
    fn get(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AuthResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AuthResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
