//! # Configuration Module
//!
//! This module defines configuration structures for the bot process and for
//! the intent-matching responder: confidence thresholds, typo-correction
//! cutoffs, and recovery settings for the learning store.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

// Constants for responder configuration
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;
pub const DEFAULT_CLOSE_MATCH_CUTOFF: f64 = 0.5;
pub const DEFAULT_FUZZY_RATIO_THRESHOLD: u8 = 50;
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Извините, я не понял. Уточните вопрос?";
/// Score given to a keyword-free category whose patterns do not fully match
pub const PATTERN_ONLY_SCORE: f64 = 0.5;

/// Thresholds used by the typo corrector
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionConfig {
    /// Minimum normalized edit similarity (0.0..=1.0) for a closest-match correction
    pub close_match_cutoff: f64,
    /// Fuzzy ratio (0..=100) that must be exceeded by the fallback correction
    pub fuzzy_ratio_threshold: u8,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            close_match_cutoff: DEFAULT_CLOSE_MATCH_CUTOFF,
            fuzzy_ratio_threshold: DEFAULT_FUZZY_RATIO_THRESHOLD,
        }
    }
}

/// Recovery configuration for learning-store writes
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRecoveryConfig {
    /// Consecutive failures before writes are suspended
    pub circuit_breaker_threshold: u32,
    /// Seconds to wait before writes are attempted again
    pub circuit_breaker_reset_secs: u64,
}

impl Default for StoreRecoveryConfig {
    fn default() -> Self {
        Self {
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60, // 1 minute
        }
    }
}

/// Configuration structure for the responder
#[derive(Debug, Clone, PartialEq)]
pub struct ResponderConfig {
    /// A category must score strictly above this to answer
    pub confidence_threshold: f64,
    /// Reply used when no category is confident enough
    pub fallback_message: String,
    /// Typo-correction cutoffs
    pub correction: CorrectionConfig,
    /// Learning-store recovery settings
    pub recovery: StoreRecoveryConfig,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            correction: CorrectionConfig::default(),
            recovery: StoreRecoveryConfig::default(),
        }
    }
}

/// Process-level configuration read from the environment
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub database_url: String,
    /// Replaces the embedded knowledge base when set
    pub knowledge_base_path: Option<PathBuf>,
    /// Emit logs as JSON lines
    pub json_logs: bool,
    pub responder: ResponderConfig,
}

impl BotConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .ok_or_else(|| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

        let defaults = ResponderConfig::default();
        let responder = ResponderConfig {
            confidence_threshold: parse_or(
                &lookup,
                "CONFIDENCE_THRESHOLD",
                defaults.confidence_threshold,
            )?,
            fallback_message: lookup("FALLBACK_MESSAGE").unwrap_or(defaults.fallback_message),
            correction: CorrectionConfig {
                close_match_cutoff: parse_or(
                    &lookup,
                    "CLOSE_MATCH_CUTOFF",
                    defaults.correction.close_match_cutoff,
                )?,
                fuzzy_ratio_threshold: parse_or(
                    &lookup,
                    "FUZZY_RATIO_THRESHOLD",
                    defaults.correction.fuzzy_ratio_threshold,
                )?,
            },
            recovery: StoreRecoveryConfig {
                circuit_breaker_threshold: parse_or(
                    &lookup,
                    "STORE_FAILURE_THRESHOLD",
                    defaults.recovery.circuit_breaker_threshold,
                )?,
                circuit_breaker_reset_secs: parse_or(
                    &lookup,
                    "STORE_RESET_SECS",
                    defaults.recovery.circuit_breaker_reset_secs,
                )?,
            },
        };

        if !(0.0..=1.0).contains(&responder.confidence_threshold) {
            return Err(anyhow!("CONFIDENCE_THRESHOLD must be within 0.0..=1.0"));
        }
        if !(0.0..=1.0).contains(&responder.correction.close_match_cutoff) {
            return Err(anyhow!("CLOSE_MATCH_CUTOFF must be within 0.0..=1.0"));
        }
        if responder.correction.fuzzy_ratio_threshold > 100 {
            return Err(anyhow!("FUZZY_RATIO_THRESHOLD must be within 0..=100"));
        }

        Ok(Self {
            bot_token,
            database_url,
            knowledge_base_path: lookup("KNOWLEDGE_BASE_PATH").map(PathBuf::from),
            json_logs: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            responder,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw}")),
        None => Ok(default),
    }
}
