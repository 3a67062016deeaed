//! # Configuration Module
//!
//! Runtime settings for the bot, resolved from the process environment
//! (optionally seeded from a `.env` file).

use anyhow::{bail, Result};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_FRONTEND_URL: &str = "http://127.0.0.1:3000";

/// Settings shared by the bot and the administrative binaries
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Telegram bot access token
    pub bot_token: String,
    /// Base URL of the backend HTTP API, without trailing slash
    pub backend_url: String,
    /// URL of the web mini application opened from the menu
    pub frontend_url: String,
}

impl Config {
    /// Load `.env` (if any) and resolve settings from the environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = match lookup("BOT_TOKEN") {
            Some(token) if !token.trim().is_empty() => token.trim().to_string(),
            _ => bail!("BOT_TOKEN must be set"),
        };

        let backend_url = non_empty(lookup("BACKEND_URL"))
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let frontend_url = non_empty(lookup("FRONTEND_URL"))
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string());

        Ok(Self {
            bot_token,
            backend_url: backend_url.trim_end_matches('/').to_string(),
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
