//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: slash commands and dialog input from messages
//! - `callback_handler`: inline keyboard callback queries
//! - `dialogue_manager`: dialog prompts and backend submission
//! - `actions`: stateless shop and account actions
//! - `ui_builder`: keyboards and message formatting
//! - `context`: state shared by all handlers

pub mod actions;
pub mod callback_handler;
pub mod context;
pub mod dialogue_manager;
pub mod message_handler;
pub mod ui_builder;

use anyhow::Result;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode, UserId};
use tracing::error;

pub use callback_handler::{callback_handler, CallbackAction};
pub use context::BotContext;
pub use message_handler::{message_handler, Command};
pub use ui_builder::Reply;

/// Update routing: messages and callback queries, each with its own handler
pub fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler))
}

pub async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> Result<()> {
    let request = bot
        .send_message(chat_id, reply.text)
        .parse_mode(ParseMode::Html);
    match reply.keyboard {
        Some(keyboard) => request.reply_markup(keyboard).await?,
        None => request.await?,
    };
    Ok(())
}

pub async fn send_replies(bot: &Bot, chat_id: ChatId, replies: Vec<Reply>) -> Result<()> {
    for reply in replies {
        send_reply(bot, chat_id, reply).await?;
    }
    Ok(())
}

/// Send replies without failing the update: a delivery error is logged and
/// answered with the `fallback` message on a best-effort basis
pub async fn deliver_replies(
    bot: &Bot,
    chat_id: ChatId,
    user: UserId,
    replies: Vec<Reply>,
    fallback: &str,
) {
    if let Err(e) = send_replies(bot, chat_id, replies).await {
        error!(user_id = %user, error = %e, "Failed to deliver replies");
        if let Err(e) = send_reply(bot, chat_id, Reply::localized(fallback)).await {
            error!(user_id = %user, error = %e, "Failed to deliver fallback reply");
        }
    }
}
