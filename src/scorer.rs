//! # Scorer Module
//!
//! Confidence of one `(pattern, keywords)` pair for a message, in `0.0..=1.0`.
//!
//! A full regex match over the raw message scores 1.0. Otherwise the score is
//! the share of the category's lemmatized keywords present among the
//! message's corrected tokens. Keyword-free categories score a fixed 0.5.

use std::sync::Arc;
use tracing::{debug, trace};

use crate::config::PATTERN_ONLY_SCORE;
use crate::intent_catalog::{IntentCatalog, IntentPattern};
use crate::text_processing::TextNormalizer;
use crate::typo_corrector::{LearnedTypo, TypoCorrector};

/// A message normalized and corrected once, ready to be scored against every pattern
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedText {
    /// Message text as received, used for full-pattern matching
    pub text: String,
    /// Corrected content tokens
    pub tokens: Vec<String>,
    /// Corrections found by similarity that should be persisted
    pub learned: Vec<LearnedTypo>,
}

/// Scores messages against catalog patterns
#[derive(Clone)]
pub struct Scorer {
    normalizer: TextNormalizer,
    corrector: TypoCorrector,
    catalog: Arc<IntentCatalog>,
}

impl Scorer {
    pub fn new(
        normalizer: TextNormalizer,
        corrector: TypoCorrector,
        catalog: Arc<IntentCatalog>,
    ) -> Self {
        Self {
            normalizer,
            corrector,
            catalog,
        }
    }

    pub fn catalog(&self) -> &IntentCatalog {
        &self.catalog
    }

    /// Normalize `text` and correct each token against the catalog dictionary
    pub fn prepare(&self, text: &str) -> PreparedText {
        let dictionary = self.catalog.dictionary();
        let mut tokens = Vec::new();
        let mut learned = Vec::new();

        for token in self.normalizer.normalize(text) {
            let correction = self.corrector.correct(&token, dictionary);
            tokens.push(correction.word().to_string());
            if let Some(typo) = correction.into_learned() {
                learned.push(typo);
            }
        }

        debug!(?tokens, learned = learned.len(), "Prepared message");
        PreparedText {
            text: text.to_string(),
            tokens,
            learned,
        }
    }

    /// Score a prepared message against one pattern and a category's keyword lemmas
    pub fn score_prepared(
        &self,
        prepared: &PreparedText,
        pattern: &IntentPattern,
        keyword_lemmas: &[String],
    ) -> f64 {
        if pattern.full_match(&prepared.text) {
            trace!(pattern = pattern.source(), "Full pattern match");
            return 1.0;
        }
        keyword_overlap(&prepared.tokens, keyword_lemmas)
    }

    /// Score raw `text` against a pattern source and keywords as written.
    ///
    /// Never fails: an invalid pattern or an unusable keyword yields 0.0.
    pub fn score(&self, text: &str, pattern: &str, keywords: &[String]) -> f64 {
        let pattern = match IntentPattern::compile(pattern) {
            Ok(pattern) => pattern,
            Err(e) => {
                debug!(error = %e, "Pattern failed to compile, scoring 0.0");
                return 0.0;
            }
        };

        let mut keyword_lemmas = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            match self.normalizer.lemmatize_keyword(keyword) {
                Ok(Some(lemma)) => keyword_lemmas.push(lemma),
                Ok(None) => {}
                Err(e) => {
                    debug!(
                        error = %e,
                        keyword = %keyword,
                        "Keyword lemmatization failed, scoring 0.0"
                    );
                    return 0.0;
                }
            }
        }

        let prepared = self.prepare(text);
        self.score_prepared(&prepared, &pattern, &keyword_lemmas)
    }
}

/// Fraction of `keyword_lemmas` present in `tokens`, or the pattern-only score when there are none
pub fn keyword_overlap(tokens: &[String], keyword_lemmas: &[String]) -> f64 {
    if keyword_lemmas.is_empty() {
        return PATTERN_ONLY_SCORE;
    }
    let matched = keyword_lemmas
        .iter()
        .filter(|lemma| tokens.iter().any(|token| token == *lemma))
        .count();
    (matched as f64 / keyword_lemmas.len() as f64).min(1.0)
}
