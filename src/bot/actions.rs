//! Stateless shop and account actions
//!
//! Each action reads the user's credential from the session store, makes
//! at most the backend calls it needs and returns the replies to send.
//! Privileged actions without a credential never reach the backend.

use teloxide::types::UserId;
use tracing::{info, warn};

use crate::api_client::DEFAULT_PAYMENT_METHOD;
use crate::models::CartSummary;

use super::context::BotContext;
use super::ui_builder::{self, Reply};

/// Number of products listed by the catalog command
pub const PRODUCTS_SHOWN: usize = 5;

pub fn main_menu(ctx: &BotContext, user: UserId, first_name: &str) -> Reply {
    let logged_in = ctx.sessions.credential(user).is_some();
    ui_builder::main_menu(first_name, logged_in, &ctx.config.frontend_url)
}

pub fn tips() -> Reply {
    Reply::localized("tips")
}

pub fn pricing() -> Reply {
    Reply::localized("pricing")
}

pub async fn products(ctx: &BotContext) -> Vec<Reply> {
    match ctx.api.products().await {
        Ok(products) if !products.is_empty() => products
            .iter()
            .take(PRODUCTS_SHOWN)
            .map(ui_builder::product_card)
            .collect(),
        _ => vec![Reply::localized("products-empty")],
    }
}

pub async fn add_to_cart(ctx: &BotContext, user: UserId, product_id: i64) -> Reply {
    let Some(token) = ctx.sessions.credential(user) else {
        return Reply::localized("login-first");
    };

    match ctx.api.add_to_cart(&token, product_id, 1).await {
        Ok(_) => {
            info!(user_id = %user, product_id, "Product added to cart");
            Reply::localized("cart-added")
        }
        Err(_) => Reply::localized("cart-add-failed"),
    }
}

pub async fn cart(ctx: &BotContext, user: UserId) -> Reply {
    let Some(token) = ctx.sessions.credential(user) else {
        return Reply::localized("login-first");
    };

    match ctx.api.cart_items(&token).await {
        Ok(items) if items.is_empty() => Reply::localized("cart-empty"),
        Ok(items) => ui_builder::cart_view(&CartSummary::from_items(&items)),
        Err(_) => Reply::localized("cart-load-failed"),
    }
}

/// Change a cart line by `delta` and show the refreshed cart
pub async fn change_quantity(
    ctx: &BotContext,
    user: UserId,
    bucket_id: i64,
    delta: i32,
) -> Vec<Reply> {
    let Some(token) = ctx.sessions.credential(user) else {
        return vec![Reply::localized("login-required")];
    };

    match ctx.api.update_cart_quantity(&token, bucket_id, delta).await {
        Ok(()) => vec![cart(ctx, user).await],
        Err(_) => vec![Reply::localized("cart-update-failed")],
    }
}

pub async fn remove_line(ctx: &BotContext, user: UserId, bucket_id: i64) -> Vec<Reply> {
    let Some(token) = ctx.sessions.credential(user) else {
        return vec![Reply::localized("login-required")];
    };

    match ctx.api.remove_from_cart(&token, bucket_id).await {
        Ok(()) => vec![cart(ctx, user).await],
        Err(_) => vec![Reply::localized("cart-update-failed")],
    }
}

pub async fn checkout(ctx: &BotContext, user: UserId) -> Reply {
    let Some(token) = ctx.sessions.credential(user) else {
        return Reply::localized("login-required");
    };

    match ctx.api.checkout(&token, DEFAULT_PAYMENT_METHOD).await {
        Ok(_) => {
            info!(user_id = %user, "Order placed");
            Reply::localized("checkout-success")
        }
        Err(_) => Reply::localized("checkout-failed"),
    }
}

pub async fn profile(ctx: &BotContext, user: UserId) -> Reply {
    let Some(token) = ctx.sessions.credential(user) else {
        return Reply::localized("login-required");
    };

    match ctx.api.profile(&token).await {
        Ok(profile) => ui_builder::profile_card(&profile),
        Err(_) => Reply::localized("profile-failed"),
    }
}

/// Invalidate the credential on the backend and forget it locally
pub async fn logout(ctx: &BotContext, user: UserId) -> Reply {
    let Some(token) = ctx.sessions.forget_credential(user) else {
        return Reply::localized("logout-not-logged-in");
    };

    if let Err(e) = ctx.api.logout(&token).await {
        warn!(user_id = %user, error = %e, "Backend logout failed, credential dropped anyway");
    }
    info!(user_id = %user, "User logged out");
    Reply::localized("logout-success")
}
