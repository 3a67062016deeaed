//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatId, UserId};
use tracing::{debug, warn};

use crate::dialogue::DialogKind;

use super::actions;
use super::context::BotContext;
use super::dialogue_manager::begin_dialog;
use super::deliver_replies;
use super::ui_builder::Reply;

/// Decoded inline button payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    Login,
    Register,
    PlantTree,
    Products,
    Cart,
    Profile,
    Tips,
    Pricing,
    Logout,
    Checkout,
    AddToCart(i64),
    IncreaseQuantity(i64),
    DecreaseQuantity(i64),
    RemoveLine(i64),
}

impl CallbackAction {
    /// Decode button data; unknown or malformed payloads yield `None`
    pub fn parse(data: &str) -> Option<Self> {
        let action = match data {
            "login" => Self::Login,
            "register" => Self::Register,
            "plant_tree" => Self::PlantTree,
            "products" => Self::Products,
            "cart" => Self::Cart,
            "profile" => Self::Profile,
            "tips" => Self::Tips,
            "pricing" => Self::Pricing,
            "logout" => Self::Logout,
            "checkout" => Self::Checkout,
            _ => {
                let (prefix, id) = data.split_once('_')?;
                let id: i64 = id.parse().ok()?;
                match prefix {
                    "add" => Self::AddToCart(id),
                    "inc" => Self::IncreaseQuantity(id),
                    "dec" => Self::DecreaseQuantity(id),
                    "del" => Self::RemoveLine(id),
                    _ => return None,
                }
            }
        };
        Some(action)
    }

    /// Button data understood by [`CallbackAction::parse`]
    pub fn encode(&self) -> String {
        match self {
            Self::Login => "login".to_string(),
            Self::Register => "register".to_string(),
            Self::PlantTree => "plant_tree".to_string(),
            Self::Products => "products".to_string(),
            Self::Cart => "cart".to_string(),
            Self::Profile => "profile".to_string(),
            Self::Tips => "tips".to_string(),
            Self::Pricing => "pricing".to_string(),
            Self::Logout => "logout".to_string(),
            Self::Checkout => "checkout".to_string(),
            Self::AddToCart(id) => format!("add_{id}"),
            Self::IncreaseQuantity(id) => format!("inc_{id}"),
            Self::DecreaseQuantity(id) => format!("dec_{id}"),
            Self::RemoveLine(id) => format!("del_{id}"),
        }
    }
}

/// Run the handler bound to `action` and collect its replies
pub async fn dispatch(ctx: &BotContext, user: UserId, action: CallbackAction) -> Vec<Reply> {
    match action {
        CallbackAction::Login => vec![begin_dialog(ctx, user, DialogKind::Login)],
        CallbackAction::Register => vec![begin_dialog(ctx, user, DialogKind::Registration)],
        CallbackAction::PlantTree => vec![begin_dialog(ctx, user, DialogKind::Planting)],
        CallbackAction::Products => actions::products(ctx).await,
        CallbackAction::Cart => vec![actions::cart(ctx, user).await],
        CallbackAction::Profile => vec![actions::profile(ctx, user).await],
        CallbackAction::Tips => vec![actions::tips()],
        CallbackAction::Pricing => vec![actions::pricing()],
        CallbackAction::Logout => vec![actions::logout(ctx, user).await],
        CallbackAction::Checkout => vec![actions::checkout(ctx, user).await],
        CallbackAction::AddToCart(product_id) => {
            vec![actions::add_to_cart(ctx, user, product_id).await]
        }
        CallbackAction::IncreaseQuantity(bucket_id) => {
            actions::change_quantity(ctx, user, bucket_id, 1).await
        }
        CallbackAction::DecreaseQuantity(bucket_id) => {
            actions::change_quantity(ctx, user, bucket_id, -1).await
        }
        CallbackAction::RemoveLine(bucket_id) => {
            actions::remove_line(ctx, user, bucket_id).await
        }
    }
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery, ctx: BotContext) -> Result<()> {
    // Answer the callback query first to remove the loading state
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    let data = q.data.as_deref().unwrap_or("");
    let Some(action) = CallbackAction::parse(data) else {
        debug!(user_id = %q.from.id, data, "Ignoring unknown callback data");
        return Ok(());
    };
    debug!(user_id = %q.from.id, action = ?action, "Received callback query from user");

    let chat_id = q
        .message
        .as_ref()
        .map(|msg| msg.chat().id)
        .unwrap_or_else(|| ChatId::from(q.from.id));

    let replies = dispatch(&ctx, q.from.id, action).await;
    deliver_replies(&bot, chat_id, q.from.id, replies, "error-generic").await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literals() {
        assert_eq!(CallbackAction::parse("login"), Some(CallbackAction::Login));
        assert_eq!(CallbackAction::parse("plant_tree"), Some(CallbackAction::PlantTree));
        assert_eq!(CallbackAction::parse("checkout"), Some(CallbackAction::Checkout));
    }

    #[test]
    fn test_parse_embedded_ids() {
        assert_eq!(CallbackAction::parse("add_42"), Some(CallbackAction::AddToCart(42)));
        assert_eq!(CallbackAction::parse("del_7"), Some(CallbackAction::RemoveLine(7)));
        assert_eq!(CallbackAction::parse("add_"), None);
        assert_eq!(CallbackAction::parse("add_x"), None);
        assert_eq!(CallbackAction::parse("buy_3"), None);
        assert_eq!(CallbackAction::parse(""), None);
    }

    #[test]
    fn test_encode_is_inverse_of_parse() {
        let actions = [
            CallbackAction::Login,
            CallbackAction::Register,
            CallbackAction::PlantTree,
            CallbackAction::Products,
            CallbackAction::Cart,
            CallbackAction::Profile,
            CallbackAction::Tips,
            CallbackAction::Pricing,
            CallbackAction::Logout,
            CallbackAction::Checkout,
            CallbackAction::AddToCart(42),
            CallbackAction::IncreaseQuantity(1),
            CallbackAction::DecreaseQuantity(2),
            CallbackAction::RemoveLine(3),
        ];
        for action in actions {
            assert_eq!(CallbackAction::parse(&action.encode()), Some(action));
        }
    }
}
