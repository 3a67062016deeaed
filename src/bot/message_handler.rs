//! Message Handler module for processing incoming Telegram messages

use anyhow::{Context, Result};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, PhotoSize, User};
use tracing::{debug, error};

use crate::dialogue::{DialogInput, DialogKind, InputKind};

use super::actions;
use super::context::BotContext;
use super::dialogue_manager::{begin_dialog, cancel_dialog, handle_input};
use super::ui_builder::Reply;
use super::{deliver_replies, send_reply, send_replies};

/// Slash commands understood by the bot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Login,
    Register,
    Plant,
    Products,
    Cart,
    Me,
    Logout,
    Cancel,
}

impl Command {
    /// Parse `/name`, `/name@botname` or `/name args`; other text yields `None`.
    /// A `@botname` suffix must match `bot_username` when it is known.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = match (name.split_once('@'), bot_username) {
            (Some((name, addressee)), Some(own)) if addressee.eq_ignore_ascii_case(own) => name,
            (Some(_), Some(_)) => return None,
            (Some((name, _)), None) => name,
            (None, _) => name,
        };

        let command = match name {
            "start" => Self::Start,
            "login" => Self::Login,
            "register" => Self::Register,
            "plant" => Self::Plant,
            "products" => Self::Products,
            "cart" => Self::Cart,
            "me" => Self::Me,
            "logout" => Self::Logout,
            "cancel" => Self::Cancel,
            _ => return None,
        };
        Some(command)
    }
}

/// Where an incoming message goes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Command(Command),
    /// Slash text we do not handle; never treated as dialog input
    UnknownCommand,
    Dialog(InputKind),
    Ignore,
}

/// Decide how to handle a message from its text and the input the user's
/// dialog is waiting for
pub fn route(text: Option<&str>, bot_username: Option<&str>, expected: Option<InputKind>) -> Route {
    if let Some(text) = text.filter(|text| text.starts_with('/')) {
        return match Command::parse(text, bot_username) {
            Some(command) => Route::Command(command),
            None => Route::UnknownCommand,
        };
    }
    match expected {
        Some(kind) => Route::Dialog(kind),
        None => Route::Ignore,
    }
}

/// Run a command and collect its replies
pub async fn run_command(ctx: &BotContext, user: &User, command: Command) -> Vec<Reply> {
    match command {
        Command::Start => vec![actions::main_menu(ctx, user.id, &user.first_name)],
        Command::Login => vec![begin_dialog(ctx, user.id, DialogKind::Login)],
        Command::Register => vec![begin_dialog(ctx, user.id, DialogKind::Registration)],
        Command::Plant => vec![begin_dialog(ctx, user.id, DialogKind::Planting)],
        Command::Products => actions::products(ctx).await,
        Command::Cart => vec![actions::cart(ctx, user.id).await],
        Command::Me => vec![actions::profile(ctx, user.id).await],
        Command::Logout => vec![actions::logout(ctx, user.id).await],
        Command::Cancel => vec![cancel_dialog(ctx, user.id)],
    }
}

/// Download a Telegram file into memory
pub async fn download_file(bot: &Bot, file_id: FileId) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id).await.context("Failed to resolve file")?;
    let mut bytes = Vec::new();
    bot.download_file(&file.path, &mut bytes)
        .await
        .context("Failed to download file")?;
    Ok(bytes)
}

fn largest_photo(photos: &[PhotoSize]) -> Option<&PhotoSize> {
    photos
        .iter()
        .max_by_key(|photo| u64::from(photo.width) * u64::from(photo.height))
}

/// Reduce a message to dialog input; photos are only fetched when the
/// current step waits for one
async fn dialog_input(
    bot: &Bot,
    msg: &Message,
    expected: InputKind,
) -> Result<DialogInput> {
    if let Some(text) = msg.text() {
        return Ok(DialogInput::Text(text.to_string()));
    }
    if let Some(location) = msg.location() {
        return Ok(DialogInput::Location {
            latitude: location.latitude,
            longitude: location.longitude,
        });
    }
    if let Some(photo) = msg.photo().and_then(largest_photo) {
        if expected == InputKind::Image {
            let bytes = download_file(bot, photo.file.id.clone()).await?;
            return Ok(DialogInput::Image(bytes));
        }
    }
    Ok(DialogInput::Other)
}

async fn handle_command(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    user: &User,
    command: Command,
) -> Result<()> {
    debug!(user_id = %user.id, command = ?command, "Received command from user");
    let replies = run_command(ctx, user, command).await;

    if command == Command::Start {
        // The welcome menu must always produce an answer.
        deliver_replies(bot, msg.chat.id, user.id, replies, "error-start").await;
        return Ok(());
    }
    send_replies(bot, msg.chat.id, replies).await
}

async fn handle_dialog_message(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    user: &User,
    expected: InputKind,
) -> Result<()> {
    let input = match dialog_input(bot, msg, expected).await {
        Ok(input) => input,
        Err(e) => {
            error!(user_id = %user.id, error = %e, "Failed to download photo from user");
            return send_reply(bot, msg.chat.id, Reply::localized("plant-photo-download-failed"))
                .await;
        }
    };

    let replies = handle_input(ctx, user.id, &user.first_name, input).await;
    send_replies(bot, msg.chat.id, replies).await
}

pub async fn message_handler(bot: Bot, msg: Message, ctx: BotContext) -> Result<()> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };

    let expected = ctx.dialogs.expected_input(user.id);
    match route(msg.text(), ctx.bot_username.as_deref(), expected) {
        Route::Command(command) => handle_command(&bot, &msg, &ctx, &user, command).await,
        Route::Dialog(expected) => handle_dialog_message(&bot, &msg, &ctx, &user, expected).await,
        Route::UnknownCommand => {
            debug!(user_id = %user.id, "Ignoring unknown command");
            Ok(())
        }
        Route::Ignore => {
            debug!(user_id = %user.id, "Ignoring message outside of a dialog");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start", None), Some(Command::Start));
        assert_eq!(Command::parse("/me", None), Some(Command::Me));
        assert_eq!(Command::parse("/cancel@novda_bot", None), Some(Command::Cancel));
        assert_eq!(Command::parse("/login now", None), Some(Command::Login));
        assert_eq!(Command::parse("  /cart ", None), Some(Command::Cart));
    }

    #[test]
    fn test_unknown_commands_and_plain_text() {
        assert_eq!(Command::parse("/help", None), None);
        assert_eq!(Command::parse("login", None), None);
        assert_eq!(Command::parse("", None), None);
        assert_eq!(Command::parse("/", None), None);
    }

    #[test]
    fn test_commands_addressed_to_other_bots_are_ignored() {
        let own = Some("novda_bot");
        assert_eq!(Command::parse("/login@novda_bot", own), Some(Command::Login));
        assert_eq!(Command::parse("/login@Novda_Bot", own), Some(Command::Login));
        assert_eq!(Command::parse("/login@otherbot", own), None);
        assert_eq!(Command::parse("/login", own), Some(Command::Login));
        assert_eq!(
            route(Some("/login@otherbot"), own, Some(InputKind::Text)),
            Route::UnknownCommand
        );
    }

    #[test]
    fn test_slash_text_is_never_dialog_input() {
        let waiting = Some(InputKind::Text);
        assert_eq!(
            route(Some("/products"), None, waiting),
            Route::Command(Command::Products)
        );
        assert_eq!(route(Some("/foo"), None, waiting), Route::UnknownCommand);
        assert_eq!(route(Some("secret"), None, waiting), Route::Dialog(InputKind::Text));
        assert_eq!(route(None, None, Some(InputKind::Image)), Route::Dialog(InputKind::Image));
    }

    #[test]
    fn test_messages_outside_dialogs_are_ignored() {
        assert_eq!(route(Some("hello"), None, None), Route::Ignore);
        assert_eq!(route(None, None, None), Route::Ignore);
        assert_eq!(route(Some("/cart"), None, None), Route::Command(Command::Cart));
    }
}
