use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use novda_bot::bot::{self, BotContext};
use novda_bot::config::Config;
use novda_bot::session::{InMemorySessionStore, SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (and .env) first so RUST_LOG from .env applies
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(backend_url = %config.backend_url, "Starting Novda Telegram Bot");

    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let bot = Bot::new(&config.bot_token);
    let mut ctx = BotContext::new(config, sessions);
    let me = bot.get_me().await?;
    if let Some(username) = me.user.username.clone() {
        info!(username = %username, "Resolved bot identity");
        ctx = ctx.with_bot_username(username);
    }

    info!("Bot initialized, starting dispatcher");

    Dispatcher::builder(bot, bot::schema())
        .dependencies(dptree::deps![ctx])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
