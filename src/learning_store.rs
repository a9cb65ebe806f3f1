//! # Learning Store Module
//!
//! Durable records the responder learns from: observed typos and queries it
//! could not answer. Writes are insert-or-increment keyed on the natural key
//! of each record, and must be atomic per row.

use anyhow::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Observed misspelling of a dictionary word
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TypoEntry {
    pub correct_word: String,
    pub typo: String,
    pub frequency: i32,
}

/// Message text the responder had no confident answer for
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UnrecognizedQuery {
    pub query: String,
    pub frequency: i32,
}

/// Storage for typo and unrecognized-query learning data
pub trait LearningStore: Send + Sync {
    /// Insert `(correct_word, typo)` at frequency 1 or increment its frequency
    fn record_typo(&self, correct_word: &str, typo: &str)
        -> impl Future<Output = Result<()>> + Send;

    /// Insert `query` at frequency 1 or increment its frequency
    fn record_unrecognized(&self, query: &str) -> impl Future<Output = Result<()>> + Send;

    /// Read every persisted typo entry
    fn load_typos(&self) -> impl Future<Output = Result<Vec<TypoEntry>>> + Send;
}

/// Process-local store, used in tests and when learning data need not survive restarts
#[derive(Debug, Clone, Default)]
pub struct InMemoryLearningStore {
    typos: Arc<Mutex<HashMap<(String, String), i32>>>,
    unrecognized: Arc<Mutex<HashMap<String, i32>>>,
}

impl InMemoryLearningStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn typo_frequency(&self, correct_word: &str, typo: &str) -> Option<i32> {
        self.typos
            .lock()
            .await
            .get(&(correct_word.to_string(), typo.to_string()))
            .copied()
    }

    pub async fn unrecognized_frequency(&self, query: &str) -> Option<i32> {
        self.unrecognized.lock().await.get(query).copied()
    }
}

impl LearningStore for InMemoryLearningStore {
    async fn record_typo(&self, correct_word: &str, typo: &str) -> Result<()> {
        let mut typos = self.typos.lock().await;
        *typos
            .entry((correct_word.to_string(), typo.to_string()))
            .or_insert(0) += 1;
        Ok(())
    }

    async fn record_unrecognized(&self, query: &str) -> Result<()> {
        let mut unrecognized = self.unrecognized.lock().await;
        *unrecognized.entry(query.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn load_typos(&self) -> Result<Vec<TypoEntry>> {
        let mut entries: Vec<TypoEntry> = self
            .typos
            .lock()
            .await
            .iter()
            .map(|((correct_word, typo), frequency)| TypoEntry {
                correct_word: correct_word.clone(),
                typo: typo.clone(),
                frequency: *frequency,
            })
            .collect();
        entries.sort_by(|a, b| (&a.correct_word, &a.typo).cmp(&(&b.correct_word, &b.typo)));
        Ok(entries)
    }
}
