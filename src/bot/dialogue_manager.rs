//! Dialogue Manager module: turns dialog engine transitions into replies
//! and performs the backend submission when a dialog completes.

use chrono::Local;
use teloxide::types::UserId;
use teloxide::utils::html::escape;
use tracing::{info, warn};

use crate::dialogue::{Advance, DialogError, DialogInput, DialogKind, Submission};
use crate::localization::{t, t_args};

use super::actions;
use super::context::BotContext;
use super::ui_builder::Reply;

/// Start a dialog and return its first prompt
pub fn begin_dialog(ctx: &BotContext, user: UserId, kind: DialogKind) -> Reply {
    match ctx.dialogs.begin(kind, user) {
        Ok(step) => Reply::localized(step.prompt),
        Err(DialogError::Unauthenticated) => Reply::localized("login-required"),
        Err(DialogError::MissingField(_)) => Reply::localized("error-generic"),
    }
}

pub fn cancel_dialog(ctx: &BotContext, user: UserId) -> Reply {
    if ctx.dialogs.cancel(user) {
        info!(user_id = %user, "Dialog cancelled");
    }
    Reply::localized("dialog-cancelled")
}

/// Feed one message to the user's dialog; empty when no dialog is running
pub async fn handle_input(
    ctx: &BotContext,
    user: UserId,
    first_name: &str,
    input: DialogInput,
) -> Vec<Reply> {
    match ctx.dialogs.advance(user, input) {
        Advance::Idle => Vec::new(),
        Advance::Next(step) => vec![Reply::localized(step.prompt)],
        Advance::Reprompt(step) => vec![Reply::localized(step.reprompt)],
        Advance::Submit(submission) => submit(ctx, user, first_name, submission).await,
        Advance::Aborted(_) => vec![Reply::localized("error-generic")],
    }
}

/// Send a completed dialog to the backend
pub async fn submit(
    ctx: &BotContext,
    user: UserId,
    first_name: &str,
    submission: Submission,
) -> Vec<Reply> {
    match submission {
        Submission::Login { username, password } => {
            match ctx.api.login(&username, &password).await {
                Ok(tokens) => {
                    ctx.sessions.store_credential(user, tokens.access);
                    info!(user_id = %user, "User logged in");
                    vec![
                        Reply::localized("login-success"),
                        actions::main_menu(ctx, user, first_name),
                    ]
                }
                Err(_) => vec![Reply::localized("login-failed")],
            }
        }
        Submission::Registration(form) => match ctx.api.register(&form).await {
            Ok(tokens) => {
                ctx.sessions.store_credential(user, tokens.access);
                info!(user_id = %user, "User registered");
                vec![
                    Reply::localized("register-success"),
                    actions::main_menu(ctx, user, first_name),
                ]
            }
            Err(e) => {
                let text = match e.user_detail() {
                    Some(detail) => t_args("register-failed-detail", &[("detail", escape(detail))]),
                    None => t("register-failed"),
                };
                vec![Reply::text(text)]
            }
        },
        Submission::Planting(record) => {
            let Some(token) = ctx.sessions.credential(user) else {
                warn!(user_id = %user, "Credential vanished before planting submission");
                return vec![Reply::localized("login-required")];
            };

            let planted_at = Local::now()
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string();
            let bucket = record.bucket.clone();
            match ctx.api.plant_tree(&token, record, &planted_at).await {
                Ok(_) => {
                    info!(user_id = %user, bucket = %bucket, "Planting recorded");
                    vec![Reply::localized("plant-success")]
                }
                // The backend reports a bad bucket and a missing worker role alike.
                Err(_) => vec![Reply::localized("plant-failed")],
            }
        }
    }
}
