//! Login, registration and session commands.

use anyhow::{Context, Result};
use imgdrive_core::api::Credentials;
use imgdrive_core::config::Config;
use imgdrive_core::session::AuthOutcome;
use imgdrive_core::token::{FileTokenStore, TokenStore};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{require_session, session_manager};

pub async fn login(config: &Config, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password_line().await?,
    };

    let mut session = session_manager(config)?;
    tracing::debug!(api = session.api().base_url(), username, "login requested");
    let outcome = session.login(&Credentials::new(username, password)).await;
    report(&outcome)?;

    let name = session.user().map_or(username, |u| u.username.as_str());
    println!("Logged in as {name}.");
    Ok(())
}

pub async fn register(
    config: &Config,
    username: &str,
    password: &str,
    confirmation: &str,
) -> Result<()> {
    let mut session = session_manager(config)?;
    let outcome = session
        .register(&Credentials::new(username, password), confirmation)
        .await;
    report(&outcome)?;

    let name = session.user().map_or(username, |u| u.username.as_str());
    println!("Registered and logged in as {name}.");
    Ok(())
}

/// Drops the stored token. No request is made.
pub fn logout(config: &Config) -> Result<()> {
    let had_token = FileTokenStore::from_home()
        .load()
        .unwrap_or_default()
        .is_some();

    let mut session = session_manager(config)?;

    session.logout();
    tracing::debug!(had_token, "logout command");
    if had_token {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

pub async fn whoami(config: &Config) -> Result<()> {
    let session = require_session(config).await?;
    if let Some(user) = session.user() {
        println!("{}", user.username);
    }
    Ok(())
}

fn report(outcome: &AuthOutcome) -> Result<()> {
    if outcome.success {
        return Ok(());
    }
    let error = outcome.error.as_deref().unwrap_or("Authentication failed");
    tracing::warn!(error, "auth command failed");
    anyhow::bail!("{error}")
}

async fn read_password_line() -> Result<String> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("read password from stdin")?;

    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password is required (use --password, IMGDRIVE_PASSWORD, or stdin)");
    }
    Ok(password)
}
