//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::KeyboardRemove;
use tracing::{debug, error, info};

use crate::localization::{t, t_args};

use crate::db::{
    get_or_create_user, is_admin, list_new_feedback, list_routers, list_tariffs,
    resolve_feedback, FeedbackStatus, FEEDBACK_LIST_LIMIT,
};

use crate::dialogue::{
    BotDialogue, BotDialogueState, CatalogKind, FormMode, RecordAction, RouterDraft, TariffDraft,
};

use super::dialogue_manager::{
    handle_delete_confirmation, handle_feedback_input, handle_record_id_input,
    handle_router_form_input, handle_tariff_form_input, start_record_selection,
    start_router_form, start_tariff_form,
};

use super::ui_builder::{
    admin_panel_keyboard, format_feedback, format_router, format_tariff, main_keyboard,
    management_keyboard,
};

use super::SupportResponder;

/// Exact text of the identity question
pub const WHO_ARE_YOU: &str = "Кто ты?";

/// Menu entries reachable from the reply keyboards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Feedback,
    ShowRouters,
    ShowTariffs,
    ManageRouters,
    ManageTariffs,
    AddRouter,
    EditRouter,
    DeleteRouter,
    AddTariff,
    EditTariff,
    DeleteTariff,
    Back,
}

impl MenuAction {
    const ALL: [(MenuAction, &'static str); 12] = [
        (MenuAction::Feedback, "button-feedback"),
        (MenuAction::ShowRouters, "button-routers"),
        (MenuAction::ShowTariffs, "button-tariffs"),
        (MenuAction::ManageRouters, "button-manage-routers"),
        (MenuAction::ManageTariffs, "button-manage-tariffs"),
        (MenuAction::AddRouter, "button-add-router"),
        (MenuAction::EditRouter, "button-edit-router"),
        (MenuAction::DeleteRouter, "button-delete-router"),
        (MenuAction::AddTariff, "button-add-tariff"),
        (MenuAction::EditTariff, "button-edit-tariff"),
        (MenuAction::DeleteTariff, "button-delete-tariff"),
        (MenuAction::Back, "button-back"),
    ];

    /// Recognize a keyboard button label
    pub fn from_text(text: &str) -> Option<MenuAction> {
        let text = text.trim();
        Self::ALL
            .iter()
            .find(|(_, key)| t(key) == text)
            .map(|(action, _)| *action)
    }

    pub fn requires_admin(self) -> bool {
        !matches!(
            self,
            MenuAction::Feedback
                | MenuAction::ShowRouters
                | MenuAction::ShowTariffs
                | MenuAction::Back
        )
    }
}

/// Parse `/reply <user_id> <text>`. Errors are localization keys of the reason.
pub fn parse_reply_command(text: &str) -> Result<(i64, String), &'static str> {
    let rest = text
        .strip_prefix("/reply")
        .ok_or("reply-reason-args")?
        .trim_start();
    let (id_part, reply) = rest
        .split_once(char::is_whitespace)
        .ok_or("reply-reason-args")?;
    let user_id = id_part.parse::<i64>().map_err(|_| "reply-reason-id")?;
    let reply = reply.trim();
    if reply.is_empty() {
        return Err("reply-reason-empty");
    }
    Ok((user_id, reply.to_string()))
}

/// Telegram id of the message author
fn sender_id(msg: &Message) -> i64 {
    msg.from
        .as_ref()
        .map(|user| user.id.0 as i64)
        .unwrap_or(msg.chat.id.0)
}

async fn sender_is_admin(pool: &PgPool, msg: &Message) -> bool {
    match is_admin(pool, sender_id(msg)).await {
        Ok(admin) => admin,
        Err(e) => {
            error!(user_id = %msg.chat.id, error = %e, "Failed to check admin status");
            false
        }
    }
}

async fn return_to_main_menu(bot: &Bot, msg: &Message, dialogue: BotDialogue) -> Result<()> {
    dialogue.exit().await?;
    bot.send_message(msg.chat.id, t("menu-main-return"))
        .reply_markup(main_keyboard())
        .await?;
    Ok(())
}

async fn handle_start(bot: &Bot, msg: &Message, pool: &PgPool) -> Result<()> {
    let user = msg.from.as_ref();
    let username = user.and_then(|u| u.username.clone());
    let full_name = user.map(|u| u.full_name());

    let greeting = match get_or_create_user(
        pool,
        sender_id(msg),
        username.as_deref(),
        full_name.as_deref(),
    )
    .await
    {
        Ok((_, true)) => t("start-welcome-new"),
        Ok((user, false)) if user.is_admin => t("start-welcome-admin"),
        Ok(_) => t("start-welcome-user"),
        Err(e) => {
            error!(user_id = %msg.chat.id, error = %e, "Failed to register user");
            t("error-database")
        }
    };

    bot.send_message(msg.chat.id, greeting)
        .reply_markup(main_keyboard())
        .await?;
    Ok(())
}

async fn show_catalog(bot: &Bot, msg: &Message, pool: &PgPool, kind: CatalogKind) -> Result<()> {
    let admin = sender_is_admin(pool, msg).await;
    let (cards, empty_key): (Vec<String>, &str) = match kind {
        CatalogKind::Router => (
            list_routers(pool).await?.iter().map(format_router).collect(),
            "routers-empty",
        ),
        CatalogKind::Tariff => (
            list_tariffs(pool).await?.iter().map(format_tariff).collect(),
            "tariffs-empty",
        ),
    };

    if cards.is_empty() {
        if admin {
            bot.send_message(
                msg.chat.id,
                format!("{} {}", t(empty_key), t("catalog-empty-admin-hint")),
            )
            .reply_markup(management_keyboard(kind))
            .await?;
        } else {
            bot.send_message(msg.chat.id, t(empty_key))
                .reply_markup(main_keyboard())
                .await?;
        }
        return Ok(());
    }

    let last = cards.len() - 1;
    for (i, card) in cards.into_iter().enumerate() {
        if admin && i == last {
            bot.send_message(msg.chat.id, card)
                .reply_markup(management_keyboard(kind))
                .await?;
        } else {
            bot.send_message(msg.chat.id, card).await?;
        }
    }
    Ok(())
}

async fn handle_reply_command(bot: &Bot, msg: &Message, pool: &PgPool, text: &str) -> Result<()> {
    if !sender_is_admin(pool, msg).await {
        bot.send_message(msg.chat.id, t("admin-only")).await?;
        return Ok(());
    }

    let (user_id, reply) = match parse_reply_command(text) {
        Ok(parsed) => parsed,
        Err(reason) => {
            let reason = t(reason);
            bot.send_message(msg.chat.id, t_args("reply-usage", &[("reason", reason.as_str())]))
                .await?;
            return Ok(());
        }
    };

    let delivered = match bot
        .send_message(
            ChatId(user_id),
            t_args("reply-to-user", &[("text", reply.as_str())]),
        )
        .await
    {
        Ok(_) => true,
        Err(e) => {
            error!(user_id, error = %e, "Can't deliver reply to user");
            false
        }
    };
    let status = if delivered {
        FeedbackStatus::Replied
    } else {
        FeedbackStatus::Failed
    };

    let user_id_text = user_id.to_string();
    let answer = match resolve_feedback(pool, user_id, sender_id(msg), &reply, status).await {
        Ok(0) => t_args(
            "reply-nothing-pending",
            &[("user_id", user_id_text.as_str())],
        ),
        Ok(updated) => {
            info!(user_id, updated, status = status.as_str(), "Feedback resolved");
            let key = if delivered {
                "reply-sent"
            } else {
                "reply-saved-not-sent"
            };
            t_args(key, &[("user_id", user_id_text.as_str())])
        }
        Err(e) => {
            error!(user_id, error = %e, "Failed to update feedback");
            t("error-database")
        }
    };
    bot.send_message(msg.chat.id, answer).await?;
    Ok(())
}

async fn handle_feedback_list(bot: &Bot, msg: &Message, pool: &PgPool) -> Result<()> {
    if !sender_is_admin(pool, msg).await {
        bot.send_message(msg.chat.id, t("admin-only")).await?;
        return Ok(());
    }

    let items = list_new_feedback(pool, FEEDBACK_LIST_LIMIT).await?;
    if items.is_empty() {
        bot.send_message(msg.chat.id, t("feedback-list-empty"))
            .reply_markup(main_keyboard())
            .await?;
        return Ok(());
    }
    for item in &items {
        bot.send_message(msg.chat.id, format_feedback(item)).await?;
    }
    Ok(())
}

async fn handle_menu_action(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    pool: Arc<PgPool>,
    action: MenuAction,
) -> Result<()> {
    if action.requires_admin() && !sender_is_admin(&pool, msg).await {
        bot.send_message(msg.chat.id, t("admin-only")).await?;
        return Ok(());
    }

    match action {
        MenuAction::Feedback => {
            bot.send_message(msg.chat.id, t("feedback-prompt"))
                .reply_markup(KeyboardRemove::new())
                .await?;
            dialogue.update(BotDialogueState::WaitingForFeedback).await?;
        }
        MenuAction::ShowRouters => show_catalog(bot, msg, &pool, CatalogKind::Router).await?,
        MenuAction::ShowTariffs => show_catalog(bot, msg, &pool, CatalogKind::Tariff).await?,
        MenuAction::ManageRouters => {
            bot.send_message(msg.chat.id, t("button-manage-routers"))
                .reply_markup(management_keyboard(CatalogKind::Router))
                .await?;
        }
        MenuAction::ManageTariffs => {
            bot.send_message(msg.chat.id, t("button-manage-tariffs"))
                .reply_markup(management_keyboard(CatalogKind::Tariff))
                .await?;
        }
        MenuAction::AddRouter => {
            start_router_form(bot, msg.chat.id, dialogue, FormMode::Add, RouterDraft::default())
                .await?
        }
        MenuAction::AddTariff => {
            start_tariff_form(bot, msg.chat.id, dialogue, FormMode::Add, TariffDraft::default())
                .await?
        }
        MenuAction::EditRouter => {
            start_record_selection(
                bot,
                msg,
                dialogue,
                pool,
                CatalogKind::Router,
                RecordAction::Edit,
            )
            .await?
        }
        MenuAction::DeleteRouter => {
            start_record_selection(
                bot,
                msg,
                dialogue,
                pool,
                CatalogKind::Router,
                RecordAction::Delete,
            )
            .await?
        }
        MenuAction::EditTariff => {
            start_record_selection(
                bot,
                msg,
                dialogue,
                pool,
                CatalogKind::Tariff,
                RecordAction::Edit,
            )
            .await?
        }
        MenuAction::DeleteTariff => {
            start_record_selection(
                bot,
                msg,
                dialogue,
                pool,
                CatalogKind::Tariff,
                RecordAction::Delete,
            )
            .await?
        }
        MenuAction::Back => return_to_main_menu(bot, msg, dialogue).await?,
    }
    Ok(())
}

async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    pool: Arc<PgPool>,
    responder: Arc<SupportResponder>,
    text: &str,
) -> Result<()> {
    debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message from user");

    // Leaving a flow takes precedence over its input
    if text == "/cancel" || MenuAction::from_text(text) == Some(MenuAction::Back) {
        return return_to_main_menu(bot, msg, dialogue).await;
    }

    // Check dialogue state first
    let dialogue_state = dialogue.get().await?;
    match dialogue_state {
        Some(BotDialogueState::WaitingForFeedback) => {
            return handle_feedback_input(bot, msg, dialogue, pool, text).await;
        }
        Some(BotDialogueState::RouterForm { mode, field, draft }) => {
            return handle_router_form_input(bot, msg, dialogue, pool, text, mode, field, draft)
                .await;
        }
        Some(BotDialogueState::TariffForm { mode, field, draft }) => {
            return handle_tariff_form_input(bot, msg, dialogue, pool, text, mode, field, draft)
                .await;
        }
        Some(BotDialogueState::WaitingForRecordId { kind, action }) => {
            return handle_record_id_input(bot, msg, dialogue, pool, text, kind, action).await;
        }
        Some(BotDialogueState::ConfirmDelete { kind, id }) => {
            return handle_delete_confirmation(bot, msg, dialogue, pool, text, kind, id).await;
        }
        Some(BotDialogueState::Start) | None => {
            // Continue with normal command handling
        }
    }

    if text == "/start" {
        return handle_start(bot, msg, &pool).await;
    }
    if text == "/admin" {
        if sender_is_admin(&pool, msg).await {
            bot.send_message(msg.chat.id, t("admin-panel"))
                .reply_markup(admin_panel_keyboard())
                .await?;
        } else {
            bot.send_message(msg.chat.id, t("admin-only")).await?;
        }
        return Ok(());
    }
    if text == "/reply" || text.starts_with("/reply ") {
        return handle_reply_command(bot, msg, &pool, text).await;
    }
    if text == "/feedback_list" {
        return handle_feedback_list(bot, msg, &pool).await;
    }
    if let Some(action) = MenuAction::from_text(text) {
        return handle_menu_action(bot, msg, dialogue, pool, action).await;
    }
    if text.trim() == WHO_ARE_YOU {
        bot.send_message(msg.chat.id, t("who-are-you")).await?;
        return Ok(());
    }
    if text.starts_with('/') {
        bot.send_message(msg.chat.id, t("unknown-command")).await?;
        return Ok(());
    }

    let reply = responder.respond(text).await;
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

async fn handle_unsupported_message(bot: &Bot, msg: &Message) -> Result<()> {
    debug!(user_id = %msg.chat.id, "Received unsupported message type from user");
    bot.send_message(msg.chat.id, t("non-text-hint")).await?;
    Ok(())
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    pool: Arc<PgPool>,
    responder: Arc<SupportResponder>,
    dialogue: BotDialogue,
) -> Result<()> {
    if let Some(text) = msg.text() {
        handle_text_message(&bot, &msg, dialogue, pool, responder, text).await?;
    } else {
        handle_unsupported_message(&bot, &msg).await?;
    }

    Ok(())
}
