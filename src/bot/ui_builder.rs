//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo};
use teloxide::utils::html::escape;
use tracing::warn;

use crate::localization::{t, t_args};
use crate::models::{CartSummary, Product, Profile};

use super::callback_handler::CallbackAction;

/// One outgoing message: HTML text with an optional inline keyboard
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    /// Reply made of a single localized message
    pub fn localized(key: &str) -> Self {
        Self::text(t(key))
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    /// Callback data of every button in the keyboard, row by row
    pub fn button_data(&self) -> Vec<String> {
        use teloxide::types::InlineKeyboardButtonKind;

        self.keyboard
            .iter()
            .flat_map(|k| k.inline_keyboard.iter().flatten())
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }
}

fn button(label_key: &str, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(t(label_key), action.encode())
}

/// Amounts are always shown with two decimals
pub fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}

/// Welcome message and main menu, adapted to the login status
pub fn main_menu(first_name: &str, logged_in: bool, frontend_url: &str) -> Reply {
    let status = if logged_in {
        t("status-logged-in")
    } else {
        t("status-logged-out")
    };
    let text = t_args(
        "menu-greeting",
        &[("name", &escape(first_name)), ("status", &status)],
    );

    let mut rows = Vec::new();
    if logged_in {
        rows.push(vec![
            button("button-logout", CallbackAction::Logout),
            button("button-profile", CallbackAction::Profile),
        ]);
    } else {
        rows.push(vec![
            button("button-login", CallbackAction::Login),
            button("button-register", CallbackAction::Register),
        ]);
    }

    rows.push(vec![
        button("button-products", CallbackAction::Products),
        button("button-cart", CallbackAction::Cart),
    ]);

    match reqwest::Url::parse(frontend_url) {
        Ok(url) => rows.push(vec![InlineKeyboardButton::web_app(
            t("button-open-app"),
            WebAppInfo { url },
        )]),
        Err(e) => warn!(frontend_url, error = %e, "Invalid front-end URL, omitting app button"),
    }

    rows.push(vec![
        button("button-tips", CallbackAction::Tips),
        button("button-pricing", CallbackAction::Pricing),
    ]);

    // Worker permissions are only checked by the backend on submission.
    if logged_in {
        rows.push(vec![button("button-plant", CallbackAction::PlantTree)]);
    }

    Reply::text(text).with_keyboard(InlineKeyboardMarkup::new(rows))
}

/// Catalog entry with its "Add to Cart" button
pub fn product_card(product: &Product) -> Reply {
    let text = t_args(
        "product-card",
        &[
            ("name", &escape(&product.tree.name_en)),
            ("price", &escape(&product.price.to_string())),
            ("description", &escape(&product.tree.desc_en)),
        ],
    );
    let keyboard = InlineKeyboardMarkup::new(vec![vec![button(
        "button-add-to-cart",
        CallbackAction::AddToCart(product.id),
    )]]);
    Reply::text(text).with_keyboard(keyboard)
}

/// Cart listing with per-line controls and the checkout button
pub fn cart_view(summary: &CartSummary) -> Reply {
    let mut text = format!("{}\n\n", t("cart-title"));
    let mut rows = Vec::new();

    for line in &summary.lines {
        text.push_str(&t_args(
            "cart-line",
            &[
                ("name", &escape(&line.name)),
                ("quantity", &line.quantity.to_string()),
                ("total", &format_amount(line.line_total)),
            ],
        ));
        text.push('\n');

        if let Some(bucket_id) = line.bucket_id {
            rows.push(vec![
                button("button-decrease", CallbackAction::DecreaseQuantity(bucket_id)),
                button("button-increase", CallbackAction::IncreaseQuantity(bucket_id)),
                button("button-remove", CallbackAction::RemoveLine(bucket_id)),
            ]);
        }
    }

    text.push('\n');
    text.push_str(&t_args(
        "cart-total",
        &[("total", &format_amount(summary.total))],
    ));

    rows.push(vec![button("button-checkout", CallbackAction::Checkout)]);
    Reply::text(text).with_keyboard(InlineKeyboardMarkup::new(rows))
}

pub fn profile_card(profile: &Profile) -> Reply {
    Reply::text(t_args(
        "profile-card",
        &[
            ("name", &escape(&profile.name)),
            ("phone", &escape(&profile.phone_number)),
            ("region", &escape(&profile.region)),
        ],
    ))
}
