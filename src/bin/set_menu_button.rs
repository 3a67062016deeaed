//! Point the bot's chat menu button at the web mini application.

use anyhow::{Context, Result};
use teloxide::prelude::*;
use teloxide::types::{MenuButton, WebAppInfo};

use novda_bot::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    let url = reqwest::Url::parse(&config.frontend_url)
        .with_context(|| format!("FRONTEND_URL is not a valid URL: {}", config.frontend_url))?;

    println!("Setting Menu Button for URL: {url}");

    let bot = Bot::new(&config.bot_token);
    bot.set_chat_menu_button()
        .menu_button(MenuButton::WebApp {
            text: "Open App".to_string(),
            web_app: WebAppInfo { url },
        })
        .await
        .context("setChatMenuButton failed")?;

    println!("Success! Menu button updated.");
    Ok(())
}
