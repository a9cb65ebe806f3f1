//! # Responder Module
//!
//! Picks an answer for a free-form message. Every `(category, pattern)` pair
//! of the catalog is scored against the message, prepared once; the single
//! best pair wins (first seen on ties) and must score strictly above the
//! confidence threshold. Otherwise the message is recorded as unrecognized and
//! the fallback text is returned.
//!
//! Learning-data writes are best-effort: failures are logged and never change
//! the reply.

use anyhow::Result;
use rand::seq::SliceRandom;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::ResponderConfig;
use crate::intent_catalog::IntentCatalog;
use crate::learning_store::LearningStore;
use crate::nlp_errors::NlpError;
use crate::scorer::{PreparedText, Scorer};

/// Location and score of a scored `(category, pattern)` pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch {
    pub category_index: usize,
    pub pattern_index: usize,
    pub score: f64,
}

/// Result of scoring one message against the whole catalog
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub prepared: PreparedText,
    pub best: Option<BestMatch>,
}

impl Evaluation {
    /// Best match if it clears `threshold`
    pub fn confident(&self, threshold: f64) -> Option<BestMatch> {
        self.best.filter(|best| best.score > threshold)
    }
}

/// Reduce candidates to the first maximum.
///
/// A later candidate replaces the current best only with a strictly greater score.
pub fn select_best<I>(candidates: I) -> Option<BestMatch>
where
    I: IntoIterator<Item = BestMatch>,
{
    let mut best: Option<BestMatch> = None;
    for candidate in candidates {
        if best.is_none_or(|current| candidate.score > current.score) {
            best = Some(candidate);
        }
    }
    best
}

/// Score `text` against every pattern of every non-catch-all category
pub fn evaluate(scorer: &Scorer, text: &str) -> Evaluation {
    let prepared = scorer.prepare(text);
    let catalog = scorer.catalog();

    let candidates = catalog
        .categories()
        .iter()
        .enumerate()
        .filter(|(_, category)| !category.catch_all)
        .flat_map(|(category_index, category)| {
            let prepared = &prepared;
            category
                .patterns
                .iter()
                .enumerate()
                .map(move |(pattern_index, pattern)| BestMatch {
                    category_index,
                    pattern_index,
                    score: scorer.score_prepared(prepared, pattern, &category.keyword_lemmas),
                })
        });
    let best = select_best(candidates);

    if let Some(best) = best {
        debug!(
            category = %catalog.categories()[best.category_index].name,
            score = best.score,
            "Best category"
        );
    }
    Evaluation { prepared, best }
}

fn choose_response(catalog: &IntentCatalog, best: BestMatch) -> Option<String> {
    catalog
        .get(best.category_index)?
        .responses
        .choose(&mut rand::thread_rng())
        .cloned()
}

/// Intent-matching responder over a learning store
pub struct Responder<S> {
    scorer: Arc<Scorer>,
    store: S,
    breaker: CircuitBreaker,
    config: ResponderConfig,
}

impl<S: LearningStore> Responder<S> {
    pub fn new(scorer: Arc<Scorer>, store: S, config: ResponderConfig) -> Self {
        let breaker = CircuitBreaker::new(config.recovery.clone());
        Self {
            scorer,
            store,
            breaker,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Score `text` without touching the store
    pub fn evaluate(&self, text: &str) -> Evaluation {
        evaluate(&self.scorer, text)
    }

    /// Produce a reply for `text`. Never fails; the worst case is the fallback message.
    pub async fn respond(&self, text: &str) -> String {
        let scorer = Arc::clone(&self.scorer);
        let owned = text.to_string();
        let evaluation =
            match tokio::task::spawn_blocking(move || evaluate(&scorer, &owned)).await {
                Ok(evaluation) => evaluation,
                Err(e) => {
                    error!(error = %e, "Scoring task failed");
                    return self.config.fallback_message.clone();
                }
            };

        for learned in &evaluation.prepared.learned {
            self.guarded_write(
                "typo",
                self.store.record_typo(&learned.correct_word, &learned.typo),
            )
            .await;
        }

        if let Some(best) = evaluation.confident(self.config.confidence_threshold) {
            if let Some(response) = choose_response(self.scorer.catalog(), best) {
                return response;
            }
        }

        info!(
            target: "unrecognized",
            query = %text,
            best_score = evaluation.best.map(|b| b.score),
            "No confident answer"
        );
        self.guarded_write("unrecognized query", self.store.record_unrecognized(text))
            .await;
        self.config.fallback_message.clone()
    }

    async fn guarded_write<F>(&self, kind: &'static str, write: F)
    where
        F: Future<Output = Result<()>>,
    {
        if self.breaker.is_open() {
            warn!(kind, "Learning store circuit open, skipping write");
            return;
        }
        match write.await.map_err(NlpError::from) {
            Ok(()) => self.breaker.record_success(),
            Err(e) => {
                self.breaker.record_failure();
                error!(kind, error = %e, "Failed to persist learning data");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(category_index: usize, score: f64) -> BestMatch {
        BestMatch {
            category_index,
            pattern_index: 0,
            score,
        }
    }

    #[test]
    fn test_select_best_keeps_first_maximum() {
        let best = select_best(vec![
            candidate(0, 0.5),
            candidate(1, 1.0),
            candidate(2, 1.0),
            candidate(3, 0.2),
        ]);
        assert_eq!(best.map(|b| b.category_index), Some(1));
    }

    #[test]
    fn test_select_best_of_nothing() {
        assert_eq!(select_best(Vec::new()), None);
    }

    #[test]
    fn test_threshold_is_strict() {
        let evaluation = Evaluation {
            prepared: PreparedText {
                text: String::new(),
                tokens: Vec::new(),
                learned: Vec::new(),
            },
            best: Some(candidate(0, 0.7)),
        };
        assert!(evaluation.confident(0.7).is_none());
        assert!(evaluation.confident(0.69).is_some());
    }
}
