//! CLI command handlers.

pub mod auth;
pub mod browse;
pub mod config;

use anyhow::{Context, Result};
use imgdrive_core::api::ApiClient;
use imgdrive_core::config::Config;
use imgdrive_core::session::SessionManager;
use imgdrive_core::token::FileTokenStore;

/// Session backed by the token file in the imgdrive home.
fn session_manager(config: &Config) -> Result<SessionManager> {
    let base_url = config.resolve_api_url()?;
    let api = ApiClient::new(&base_url).context("create API client")?;
    Ok(SessionManager::new(api, FileTokenStore::from_home()))
}

/// Restores the stored session and fails unless it is authenticated.
async fn require_session(config: &Config) -> Result<SessionManager> {
    let mut session = session_manager(config)?;
    let outcome = session.initialize().await;
    if session.is_authenticated() {
        return Ok(session);
    }

    match outcome.error {
        Some(error) => anyhow::bail!("Not logged in: {error}"),
        None => anyhow::bail!("Not logged in. Run 'imgdrive login --username <NAME>' first."),
    }
}
