use chrono::{TimeZone, Utc};
use isp_support_bot::bot::message_handler::{parse_reply_command, MenuAction};
use isp_support_bot::bot::ui_builder::{
    admin_panel_keyboard, confirmation_keyboard, format_feedback, main_keyboard,
    management_keyboard, preview, FEEDBACK_PREVIEW_CHARS,
};
use isp_support_bot::db::Feedback;
use isp_support_bot::dialogue::CatalogKind;
use isp_support_bot::localization::init_localization;
use teloxide::types::KeyboardMarkup;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() {
        // Initialize localization if not already done
        let _ = init_localization();
    }

    fn labels(markup: &KeyboardMarkup) -> Vec<String> {
        markup
            .keyboard
            .iter()
            .flatten()
            .map(|button| button.text.clone())
            .collect()
    }

    /// Test the main menu offered to every user
    #[test]
    fn test_main_keyboard_layout() {
        setup_localization();
        let keyboard = main_keyboard();

        assert_eq!(
            labels(&keyboard),
            vec![
                "Обратная связь",
                "Оборудование в продаже",
                "Актуальные тарифные планы"
            ]
        );
        assert!(keyboard.resize_keyboard);
    }

    #[test]
    fn test_every_keyboard_button_is_a_menu_action() {
        setup_localization();
        let keyboards = [
            main_keyboard(),
            admin_panel_keyboard(),
            management_keyboard(CatalogKind::Router),
            management_keyboard(CatalogKind::Tariff),
        ];
        for keyboard in &keyboards {
            for label in labels(keyboard) {
                assert!(MenuAction::from_text(&label).is_some(), "unhandled button {label}");
            }
        }
    }

    #[test]
    fn test_management_keyboards_end_with_back() {
        setup_localization();
        for kind in [CatalogKind::Router, CatalogKind::Tariff] {
            let buttons = labels(&management_keyboard(kind));
            assert_eq!(buttons.len(), 4);
            assert_eq!(buttons.last().map(String::as_str), Some("Назад"));
        }
    }

    #[test]
    fn test_confirmation_keyboard_is_one_time() {
        setup_localization();
        let keyboard = confirmation_keyboard();
        assert_eq!(labels(&keyboard), vec!["ДА", "НЕТ"]);
        assert!(keyboard.one_time_keyboard);
    }

    #[test]
    fn test_feedback_listing_is_truncated() {
        setup_localization();
        let feedback = Feedback {
            id: 3,
            user_id: 777,
            username: None,
            message: "ы".repeat(FEEDBACK_PREVIEW_CHARS + 50),
            status: "new".to_string(),
            admin_id: None,
            reply_message: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
        };

        let text = format_feedback(&feedback);
        assert!(text.contains("777"));
        assert!(text.contains("нет username"));
        assert!(text.contains("2024-05-01 10:30"));
        assert!(text.contains(&preview(&feedback.message, FEEDBACK_PREVIEW_CHARS)));
        assert!(!text.contains(&feedback.message));
    }

    #[test]
    fn test_reply_command_keeps_multiline_text() {
        assert_eq!(
            parse_reply_command("/reply 10 Первая строка\nвторая"),
            Ok((10, "Первая строка\nвторая".to_string()))
        );
        assert_eq!(parse_reply_command("/reply"), Err("reply-reason-args"));
    }
}
