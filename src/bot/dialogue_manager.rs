//! Dialogue Manager module for handling dialogue state transitions

use anyhow::Result;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info, warn};

use crate::localization::{t, t_args};

use crate::dialogue::{
    parse_record_id, parse_yes_no, BotDialogue, BotDialogueState, CatalogKind, FormMode,
    RecordAction, RouterDraft, RouterField, TariffDraft, TariffField,
};

use crate::db::{
    admin_ids, create_feedback, create_router, create_tariff, delete_router, delete_tariff,
    get_router, get_tariff, list_routers, list_tariffs, update_router, update_tariff,
};

use super::ui_builder::{
    back_keyboard, confirmation_keyboard, format_router, format_tariff, main_keyboard,
    management_keyboard,
};

/// Localized text for a validation error code
pub fn validation_message(code: &str) -> String {
    t(&format!("validation-{code}"))
}

/// Question for a form field, with the stored value when editing
pub fn field_prompt(prompt_key: &str, current: Option<&str>) -> String {
    match current {
        Some(value) => format!(
            "{}\n{}",
            t(prompt_key),
            t_args("form-current-value", &[("value", value)])
        ),
        None => t(prompt_key),
    }
}

fn record_not_found(id: i32) -> String {
    let id = id.to_string();
    t_args("record-not-found", &[("id", id.as_str())])
}

async fn send_router_prompt(
    bot: &Bot,
    chat_id: ChatId,
    mode: FormMode,
    field: RouterField,
    draft: &RouterDraft,
) -> Result<()> {
    let current = mode.allows_skip().then(|| field.current_value(draft));
    bot.send_message(chat_id, field_prompt(field.prompt_key(), current.as_deref()))
        .reply_markup(back_keyboard())
        .await?;
    Ok(())
}

async fn send_tariff_prompt(
    bot: &Bot,
    chat_id: ChatId,
    mode: FormMode,
    field: TariffField,
    draft: &TariffDraft,
) -> Result<()> {
    let current = mode.allows_skip().then(|| field.current_value(draft));
    bot.send_message(chat_id, field_prompt(field.prompt_key(), current.as_deref()))
        .reply_markup(back_keyboard())
        .await?;
    Ok(())
}

/// Begin the router form at its first field
pub async fn start_router_form(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: BotDialogue,
    mode: FormMode,
    draft: RouterDraft,
) -> Result<()> {
    let field = RouterField::FIRST;
    send_router_prompt(bot, chat_id, mode, field, &draft).await?;
    dialogue
        .update(BotDialogueState::RouterForm { mode, field, draft })
        .await?;
    Ok(())
}

/// Begin the tariff form at its first field
pub async fn start_tariff_form(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: BotDialogue,
    mode: FormMode,
    draft: TariffDraft,
) -> Result<()> {
    let field = TariffField::FIRST;
    send_tariff_prompt(bot, chat_id, mode, field, &draft).await?;
    dialogue
        .update(BotDialogueState::TariffForm { mode, field, draft })
        .await?;
    Ok(())
}

/// Ask for the id of the record to edit or delete
pub async fn start_record_selection(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    pool: Arc<PgPool>,
    kind: CatalogKind,
    action: RecordAction,
) -> Result<()> {
    let cards: Vec<String> = match kind {
        CatalogKind::Router => list_routers(&pool)
            .await?
            .iter()
            .map(format_router)
            .collect(),
        CatalogKind::Tariff => list_tariffs(&pool)
            .await?
            .iter()
            .map(format_tariff)
            .collect(),
    };

    if cards.is_empty() {
        bot.send_message(msg.chat.id, t("no-records"))
            .reply_markup(management_keyboard(kind))
            .await?;
        return Ok(());
    }

    for card in cards {
        bot.send_message(msg.chat.id, card).await?;
    }
    bot.send_message(msg.chat.id, t("record-id-prompt"))
        .reply_markup(back_keyboard())
        .await?;
    dialogue
        .update(BotDialogueState::WaitingForRecordId { kind, action })
        .await?;
    Ok(())
}

/// Handle one answer of the router form
#[allow(clippy::too_many_arguments)]
pub async fn handle_router_form_input(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    pool: Arc<PgPool>,
    text: &str,
    mode: FormMode,
    field: RouterField,
    mut draft: RouterDraft,
) -> Result<()> {
    if let Err(code) = field.apply(&mut draft, text, mode) {
        bot.send_message(msg.chat.id, validation_message(code)).await?;
        // Keep dialogue active, user can try again
        return Ok(());
    }

    if let Some(next) = field.next() {
        send_router_prompt(bot, msg.chat.id, mode, next, &draft).await?;
        dialogue
            .update(BotDialogueState::RouterForm {
                mode,
                field: next,
                draft,
            })
            .await?;
        return Ok(());
    }

    let router = draft;
    let reply = match mode {
        FormMode::Add => match create_router(&pool, &router).await {
            Ok(id) => {
                info!(user_id = %msg.chat.id, router_id = id, "Router added");
                format!("{}\n{}", t("router-saved"), format_router(&router.with_id(id)))
            }
            Err(e) => {
                error!(user_id = %msg.chat.id, error = %e, "Failed to add router");
                t("error-database")
            }
        },
        FormMode::Edit { id } => match update_router(&pool, id, &router).await {
            Ok(true) => {
                info!(user_id = %msg.chat.id, router_id = id, "Router updated");
                let id_text = id.to_string();
                format!(
                    "{}\n{}",
                    t_args("router-updated", &[("id", id_text.as_str())]),
                    format_router(&router.with_id(id))
                )
            }
            Ok(false) => record_not_found(id),
            Err(e) => {
                error!(user_id = %msg.chat.id, error = %e, "Failed to update router");
                t("error-database")
            }
        },
    };

    bot.send_message(msg.chat.id, reply)
        .reply_markup(management_keyboard(CatalogKind::Router))
        .await?;
    dialogue.exit().await?;
    Ok(())
}

/// Handle one answer of the tariff form
#[allow(clippy::too_many_arguments)]
pub async fn handle_tariff_form_input(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    pool: Arc<PgPool>,
    text: &str,
    mode: FormMode,
    field: TariffField,
    mut draft: TariffDraft,
) -> Result<()> {
    if let Err(code) = field.apply(&mut draft, text, mode) {
        bot.send_message(msg.chat.id, validation_message(code)).await?;
        return Ok(());
    }

    if let Some(next) = field.next() {
        send_tariff_prompt(bot, msg.chat.id, mode, next, &draft).await?;
        dialogue
            .update(BotDialogueState::TariffForm {
                mode,
                field: next,
                draft,
            })
            .await?;
        return Ok(());
    }

    let tariff = draft;
    let reply = match mode {
        FormMode::Add => match create_tariff(&pool, &tariff).await {
            Ok(id) => {
                info!(user_id = %msg.chat.id, tariff_id = id, "Tariff added");
                format!("{}\n{}", t("tariff-saved"), format_tariff(&tariff.with_id(id)))
            }
            Err(e) => {
                error!(user_id = %msg.chat.id, error = %e, "Failed to add tariff");
                t("error-database")
            }
        },
        FormMode::Edit { id } => match update_tariff(&pool, id, &tariff).await {
            Ok(true) => {
                info!(user_id = %msg.chat.id, tariff_id = id, "Tariff updated");
                let id_text = id.to_string();
                format!(
                    "{}\n{}",
                    t_args("tariff-updated", &[("id", id_text.as_str())]),
                    format_tariff(&tariff.with_id(id))
                )
            }
            Ok(false) => record_not_found(id),
            Err(e) => {
                error!(user_id = %msg.chat.id, error = %e, "Failed to update tariff");
                t("error-database")
            }
        },
    };

    bot.send_message(msg.chat.id, reply)
        .reply_markup(management_keyboard(CatalogKind::Tariff))
        .await?;
    dialogue.exit().await?;
    Ok(())
}

/// Handle the record id typed for an edit or delete
pub async fn handle_record_id_input(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    pool: Arc<PgPool>,
    text: &str,
    kind: CatalogKind,
    action: RecordAction,
) -> Result<()> {
    let id = match parse_record_id(text) {
        Ok(id) => id,
        Err(code) => {
            bot.send_message(msg.chat.id, validation_message(code)).await?;
            return Ok(());
        }
    };

    match (kind, action) {
        (CatalogKind::Router, RecordAction::Edit) => match get_router(&pool, id).await? {
            Some(router) => {
                start_router_form(
                    bot,
                    msg.chat.id,
                    dialogue,
                    FormMode::Edit { id },
                    RouterDraft::from(router),
                )
                .await
            }
            None => {
                bot.send_message(msg.chat.id, record_not_found(id)).await?;
                Ok(())
            }
        },
        (CatalogKind::Tariff, RecordAction::Edit) => match get_tariff(&pool, id).await? {
            Some(tariff) => {
                start_tariff_form(
                    bot,
                    msg.chat.id,
                    dialogue,
                    FormMode::Edit { id },
                    TariffDraft::from(tariff),
                )
                .await
            }
            None => {
                bot.send_message(msg.chat.id, record_not_found(id)).await?;
                Ok(())
            }
        },
        (_, RecordAction::Delete) => {
            let card = match kind {
                CatalogKind::Router => get_router(&pool, id).await?.as_ref().map(format_router),
                CatalogKind::Tariff => get_tariff(&pool, id).await?.as_ref().map(format_tariff),
            };
            match card {
                Some(card) => {
                    bot.send_message(msg.chat.id, format!("{card}\n\n{}", t("delete-confirm")))
                        .reply_markup(confirmation_keyboard())
                        .await?;
                    dialogue
                        .update(BotDialogueState::ConfirmDelete { kind, id })
                        .await?;
                }
                None => {
                    bot.send_message(msg.chat.id, record_not_found(id)).await?;
                }
            }
            Ok(())
        }
    }
}

/// Handle the ДА/НЕТ answer to a delete confirmation
pub async fn handle_delete_confirmation(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    pool: Arc<PgPool>,
    text: &str,
    kind: CatalogKind,
    id: i32,
) -> Result<()> {
    let confirmed = match parse_yes_no(text) {
        Ok(confirmed) => confirmed,
        Err(code) => {
            bot.send_message(msg.chat.id, validation_message(code)).await?;
            return Ok(());
        }
    };

    let reply = if confirmed {
        let deleted = match kind {
            CatalogKind::Router => delete_router(&pool, id).await,
            CatalogKind::Tariff => delete_tariff(&pool, id).await,
        };
        match deleted {
            Ok(true) => {
                info!(user_id = %msg.chat.id, record_id = id, ?kind, "Record deleted");
                let id_text = id.to_string();
                t_args("delete-done", &[("id", id_text.as_str())])
            }
            Ok(false) => record_not_found(id),
            Err(e) => {
                error!(user_id = %msg.chat.id, error = %e, "Failed to delete record");
                t("error-database")
            }
        }
    } else {
        t("delete-cancelled")
    };

    bot.send_message(msg.chat.id, reply)
        .reply_markup(management_keyboard(kind))
        .await?;
    dialogue.exit().await?;
    Ok(())
}

/// Store a feedback message and relay it to every administrator
pub async fn handle_feedback_input(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    pool: Arc<PgPool>,
    text: &str,
) -> Result<()> {
    let user_id = msg.chat.id.0;
    let username = msg.from.as_ref().and_then(|user| user.username.clone());

    let reply = match create_feedback(&pool, user_id, username.as_deref(), text).await {
        Ok(_) => {
            let delivered = notify_admins(bot, &pool, user_id, username.as_deref(), text).await;
            if delivered > 0 {
                t("feedback-sent")
            } else {
                t("feedback-saved")
            }
        }
        Err(e) => {
            error!(user_id, error = %e, "Failed to store feedback");
            t("error-database")
        }
    };

    bot.send_message(msg.chat.id, reply)
        .reply_markup(main_keyboard())
        .await?;
    dialogue.exit().await?;
    Ok(())
}

/// Returns the number of administrators the notice reached
async fn notify_admins(
    bot: &Bot,
    pool: &PgPool,
    user_id: i64,
    username: Option<&str>,
    text: &str,
) -> usize {
    let admins = match admin_ids(pool).await {
        Ok(admins) => admins,
        Err(e) => {
            error!(error = %e, "Failed to list administrators");
            return 0;
        }
    };

    let fallback_username = t("feedback-no-username");
    let user_id_text = user_id.to_string();
    let notice = t_args(
        "feedback-admin-notice",
        &[
            ("username", username.unwrap_or(fallback_username.as_str())),
            ("user_id", user_id_text.as_str()),
            ("text", text),
        ],
    );

    let mut delivered = 0;
    for admin_id in admins {
        match bot.send_message(ChatId(admin_id), notice.clone()).await {
            Ok(_) => delivered += 1,
            Err(e) => warn!(admin_id, error = %e, "Can't deliver feedback to administrator"),
        }
    }
    delivered
}
