//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{KeyboardButton, KeyboardMarkup};

use crate::db::{Feedback, Router, Tariff};
use crate::dialogue::{yes_no, CatalogKind, NONE_KEYWORD};
use crate::localization::{t, t_args};

/// Feedback text longer than this is cut in listings
pub const FEEDBACK_PREVIEW_CHARS: usize = 200;

fn column_keyboard(keys: &[&str]) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = keys
        .iter()
        .map(|key| vec![KeyboardButton::new(t(key))])
        .collect();
    KeyboardMarkup::new(rows)
        .resize_keyboard()
        .input_field_placeholder(t("menu-placeholder"))
}

/// Main menu shown to every user
pub fn main_keyboard() -> KeyboardMarkup {
    column_keyboard(&["button-feedback", "button-routers", "button-tariffs"])
}

pub fn admin_panel_keyboard() -> KeyboardMarkup {
    column_keyboard(&["button-manage-routers", "button-manage-tariffs", "button-back"])
}

/// Add / edit / delete menu for one catalog table
pub fn management_keyboard(kind: CatalogKind) -> KeyboardMarkup {
    match kind {
        CatalogKind::Router => column_keyboard(&[
            "button-add-router",
            "button-edit-router",
            "button-delete-router",
            "button-back",
        ]),
        CatalogKind::Tariff => column_keyboard(&[
            "button-add-tariff",
            "button-edit-tariff",
            "button-delete-tariff",
            "button-back",
        ]),
    }
}

pub fn confirmation_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(t("button-yes")),
        KeyboardButton::new(t("button-no")),
    ]])
    .resize_keyboard()
    .one_time_keyboard()
}

/// Keyboard with only the back button, shown while a form is active
pub fn back_keyboard() -> KeyboardMarkup {
    column_keyboard(&["button-back"])
}

pub fn format_router(router: &Router) -> String {
    let id = router.id.to_string();
    let cost = router.cost.to_string();
    let ports = router.lan_ports.to_string();
    t_args(
        "router-card",
        &[
            ("id", id.as_str()),
            ("name", router.model_name.as_str()),
            ("cost", cost.as_str()),
            ("mesh", yes_no(router.mesh)),
            ("gigabit", yes_no(router.gigabit)),
            ("band", yes_no(router.band_5ghz)),
            ("ports", ports.as_str()),
        ],
    )
}

pub fn format_tariff(tariff: &Tariff) -> String {
    let optional =
        |cost: Option<i32>| cost.map_or_else(|| NONE_KEYWORD.to_string(), |c| c.to_string());
    let id = tariff.id.to_string();
    let cost = tariff.monthly_cost.to_string();
    let cost_6 = optional(tariff.cost_6_months);
    let cost_12 = optional(tariff.cost_12_months);
    t_args(
        "tariff-card",
        &[
            ("id", id.as_str()),
            ("name", tariff.name.as_str()),
            ("cost", cost.as_str()),
            ("promotion", yes_no(tariff.promotion)),
            ("cost_6", cost_6.as_str()),
            ("cost_12", cost_12.as_str()),
        ],
    )
}

/// Shorten `text` to `max_chars` characters, marking the cut with "..."
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

pub fn format_feedback(feedback: &Feedback) -> String {
    let username = feedback
        .username
        .clone()
        .unwrap_or_else(|| t("feedback-no-username"));
    let id = feedback.id.to_string();
    let user_id = feedback.user_id.to_string();
    let date = feedback.created_at.format("%Y-%m-%d %H:%M").to_string();
    let text = preview(&feedback.message, FEEDBACK_PREVIEW_CHARS);
    t_args(
        "feedback-list-item",
        &[
            ("id", id.as_str()),
            ("username", username.as_str()),
            ("user_id", user_id.as_str()),
            ("date", date.as_str()),
            ("text", text.as_str()),
        ],
    )
}
