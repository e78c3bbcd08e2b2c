use super::args::*;

pub mod check;
mod dispatch;
pub mod get;
pub mod login;
pub mod session;

pub use dispatch::dispatch;

use anyhow::Context;
use uniact_auth::{AuthConfig, AuthContext};

/// Environment config with command-line overrides applied.
pub(crate) fn build_config(global: &GlobalArgs) -> AuthConfig {
    let mut config = AuthConfig::from_env();
    if let Some(url) = &global.api_url {
        config = config.with_url(url.clone());
    }
    if let Some(dir) = &global.session_dir {
        config = config.with_session_dir(dir.clone());
    }
    config
}

pub(crate) fn open_context(global: &GlobalArgs) -> anyhow::Result<AuthContext> {
    let config = build_config(global);
    AuthContext::from_config(&config).context("failed to open session")
}
