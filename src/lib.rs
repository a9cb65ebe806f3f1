//! # ISP Support Telegram Bot
//!
//! A Telegram bot for a regional internet provider. Free-text questions are
//! matched against an intent catalog after normalization and typo correction;
//! the bot also relays user feedback to administrators and serves the router
//! and tariff catalogs.

pub mod bot;
pub mod circuit_breaker;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod intent_catalog;
pub mod learning_store;
pub mod localization;
pub mod nlp_errors;
pub mod responder;
pub mod scorer;
pub mod text_processing;
pub mod typo_corrector;
