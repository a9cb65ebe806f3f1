//! # Localization Tests
//!
//! This module contains unit tests for the localization functionality,
//! testing message retrieval and formatting with various edge cases.

use isp_support_bot::localization::{t, t_args, LocalizationManager};
use std::collections::HashMap;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        // Create a new localization manager for each test
        LocalizationManager::new().expect("Failed to create localization manager")
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        let message = manager.get_message("button-feedback", None);
        assert_eq!(message, "Обратная связь");
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message("nonexistent-key", None);
        assert!(message.starts_with("Missing translation:"));
        assert!(!manager.has_message("nonexistent-key"));
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("user_id", "4242");

        let message = manager.get_message("reply-sent", Some(&args));
        assert!(message.contains("4242"));
        // No bidi isolation marks around arguments
        assert!(!message.contains('\u{2068}'));
    }

    #[test]
    fn test_get_message_with_args_slice() {
        let manager = setup_localization();

        let message = manager.get_message_with_args("record-not-found", &[("id", "17")]);
        assert!(message.contains("17"));
    }

    #[test]
    fn test_invalid_resource_is_rejected() {
        assert!(LocalizationManager::from_ftl("ru", "broken = { $").is_err());
        assert!(LocalizationManager::from_ftl("ru", "ok = fine").is_ok());
    }

    #[test]
    fn test_menu_buttons_have_translations() {
        let manager = setup_localization();

        for key in [
            "button-feedback",
            "button-routers",
            "button-tariffs",
            "button-manage-routers",
            "button-manage-tariffs",
            "button-back",
            "button-yes",
            "button-no",
        ] {
            assert!(manager.has_message(key), "missing {key}");
        }
    }

    #[test]
    fn test_global_helpers() {
        assert_eq!(t("who-are-you"), "я бот для обратной связи");
        let usage = t_args("reply-usage", &[("reason", "Недостаточно аргументов")]);
        assert!(usage.contains("Недостаточно аргументов"));
    }
}
