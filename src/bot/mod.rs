//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Routes commands, menu buttons and free-text questions
//! - `ui_builder`: Creates keyboards and formats catalog cards
//! - `dialogue_manager`: Drives the feedback and catalog management dialogues

use crate::db::PgLearningStore;
use crate::responder::Responder;

pub mod dialogue_manager;
pub mod message_handler;
pub mod ui_builder;

/// Responder wired to the Postgres learning tables
pub type SupportResponder = Responder<PgLearningStore>;

// Re-export main handler function for use in main.rs
pub use message_handler::message_handler;

pub use ui_builder::{format_router, format_tariff, main_keyboard};
