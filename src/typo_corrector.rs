//! # Typo Corrector Module
//!
//! Maps an observed token to the dictionary word the user most likely meant.
//!
//! Strategies are tried in order and the first hit wins:
//!
//! 1. The token is already a dictionary word
//! 2. The token is a known misspelling (static table plus persisted typos)
//! 3. Closest dictionary word by normalized edit similarity
//! 4. Best fuzzy ratio over the dictionary
//!
//! Strategies 3 and 4 produce a [`LearnedTypo`] that the caller persists.
//! Ties go to the earliest word in dictionary order.

use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::CorrectionConfig;
use crate::learning_store::TypoEntry;
use crate::text_processing::TextNormalizer;

/// Frequent misspellings observed by support staff, keyed by the intended word
pub const STATIC_TYPOS: &[(&str, &[&str])] = &[
    ("привет", &["прифет", "приветт", "приветик", "привт"]),
    (
        "видеонаблюдение",
        &["видионаблюдение", "видео наблюдение", "виденаблюдение", "видио наблюдение"],
    ),
    ("камера", &["комера", "камерра", "кмера"]),
    ("телефония", &["телифония", "телефони", "телифоня"]),
    ("ip телефония", &["ип телефония", "ip тилифония", "айпи телефония"]),
    ("iptv", &["иптв", "ip tv", "айпитиви", "ип тв"]),
    ("телевизор", &["тиливизор", "теливзор", "телевизир"]),
    (
        "интернет",
        &["интеренет", "интрнет", "интернетт", "инетрнет", "интернетик"],
    ),
    ("настройка", &["настрокйа", "настройк", "настроика"]),
    ("подключение", &["подключенние", "подключние", "подклюение"]),
    ("тариф", &["тариффы", "тарифи", "тариф", "тарифы"]),
    ("качество", &["качесттво", "качство", "качетво"]),
    ("сигнал", &["сигнл", "сгнал", "сигналл"]),
];

/// How a learned correction was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionMethod {
    CloseMatch,
    FuzzyRatio,
}

/// A newly discovered `(correct_word, typo)` pair
#[derive(Debug, Clone, PartialEq)]
pub struct LearnedTypo {
    pub correct_word: String,
    pub typo: String,
    pub method: CorrectionMethod,
    /// Similarity in 0.0..=1.0 for close matches, 0..=100 for fuzzy ratio
    pub similarity: f64,
}

/// Outcome of correcting one token
#[derive(Debug, Clone, PartialEq)]
pub enum Correction {
    /// Token is already a dictionary word
    Exact(String),
    /// Token is a known misspelling
    KnownTypo { word: String, typo: String },
    /// Token was resolved by similarity and should be persisted
    Learned(LearnedTypo),
    /// No plausible dictionary word
    Unrecognized(String),
}

impl Correction {
    /// The word to use in place of the token
    pub fn word(&self) -> &str {
        match self {
            Correction::Exact(word) => word,
            Correction::KnownTypo { word, .. } => word,
            Correction::Learned(learned) => &learned.correct_word,
            Correction::Unrecognized(token) => token,
        }
    }

    pub fn learned(&self) -> Option<&LearnedTypo> {
        match self {
            Correction::Learned(learned) => Some(learned),
            _ => None,
        }
    }

    pub fn into_learned(self) -> Option<LearnedTypo> {
        match self {
            Correction::Learned(learned) => Some(learned),
            _ => None,
        }
    }
}

/// Typo corrector over an immutable typo table
#[derive(Debug, Clone)]
pub struct TypoCorrector {
    /// typo -> correct word
    typo_map: HashMap<String, String>,
    config: CorrectionConfig,
}

impl TypoCorrector {
    /// Create a corrector with an empty typo table
    pub fn new(config: CorrectionConfig) -> Self {
        Self {
            typo_map: HashMap::new(),
            config,
        }
    }

    /// Add the built-in misspellings, reduced to the same base forms as message tokens.
    ///
    /// Multi-word entries are skipped since tokens never contain whitespace.
    pub fn with_static_typos(mut self, normalizer: &TextNormalizer) -> Self {
        for (correct_word, typos) in STATIC_TYPOS {
            let Some(correct_lemma) = lemma_of_single_word(normalizer, correct_word) else {
                debug!(correct_word, "Skipping multi-word typo group");
                continue;
            };
            for typo in typos.iter() {
                let Some(typo_lemma) = lemma_of_single_word(normalizer, typo) else {
                    continue;
                };
                if typo_lemma != correct_lemma {
                    self.typo_map
                        .entry(typo_lemma)
                        .or_insert_with(|| correct_lemma.clone());
                }
            }
        }
        self
    }

    /// Merge persisted typo rows. Entries already present keep their mapping.
    pub fn with_persisted_typos(mut self, entries: &[TypoEntry]) -> Self {
        for entry in entries {
            if entry.typo == entry.correct_word {
                continue;
            }
            self.typo_map
                .entry(entry.typo.clone())
                .or_insert_with(|| entry.correct_word.clone());
        }
        self
    }

    pub fn known_typo_count(&self) -> usize {
        self.typo_map.len()
    }

    /// Correct a single token against an ordered reference dictionary
    ///
    /// # Examples
    ///
    /// ```rust
    /// use isp_support_bot::config::CorrectionConfig;
    /// use isp_support_bot::typo_corrector::{Correction, TypoCorrector};
    ///
    /// let corrector = TypoCorrector::new(CorrectionConfig::default());
    /// let dictionary = vec!["интернет".to_string(), "камера".to_string()];
    ///
    /// assert_eq!(corrector.correct("интернетт", &dictionary).word(), "интернет");
    /// assert!(matches!(corrector.correct("камера", &dictionary), Correction::Exact(_)));
    /// ```
    pub fn correct(&self, token: &str, dictionary: &[String]) -> Correction {
        if dictionary.iter().any(|word| word == token) {
            return Correction::Exact(token.to_string());
        }

        if let Some(word) = self.typo_map.get(token) {
            debug!(token, word = %word, "Corrected using typo dictionary");
            return Correction::KnownTypo {
                word: word.clone(),
                typo: token.to_string(),
            };
        }

        if let Some((word, similarity)) =
            closest_match(token, dictionary, self.config.close_match_cutoff)
        {
            debug!(token, word = %word, similarity, "Corrected using closest match");
            return Correction::Learned(LearnedTypo {
                correct_word: word.to_string(),
                typo: token.to_string(),
                method: CorrectionMethod::CloseMatch,
                similarity,
            });
        }

        if let Some((word, ratio)) =
            best_fuzzy_match(token, dictionary, self.config.fuzzy_ratio_threshold)
        {
            debug!(token, word = %word, ratio, "Corrected using fuzzy ratio");
            return Correction::Learned(LearnedTypo {
                correct_word: word.to_string(),
                typo: token.to_string(),
                method: CorrectionMethod::FuzzyRatio,
                similarity: f64::from(ratio),
            });
        }

        info!(target: "unrecognized", token, "Unrecognized token");
        Correction::Unrecognized(token.to_string())
    }
}

fn lemma_of_single_word(normalizer: &TextNormalizer, word: &str) -> Option<String> {
    let cleaned = TextNormalizer::clean(word);
    let mut parts = cleaned.split_whitespace();
    let first = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    normalizer.lemmatize_word(first).ok()
}

/// Dictionary word with the highest normalized edit similarity, if it reaches `cutoff`
pub fn closest_match<'a>(
    token: &str,
    dictionary: &'a [String],
    cutoff: f64,
) -> Option<(&'a str, f64)> {
    let mut best: Option<(&'a str, f64)> = None;
    for word in dictionary {
        let similarity = strsim::normalized_levenshtein(token, word);
        if similarity >= cutoff && best.is_none_or(|(_, best_sim)| similarity > best_sim) {
            best = Some((word.as_str(), similarity));
        }
    }
    best
}

/// Dictionary word with the highest fuzzy ratio, if it exceeds `threshold`
pub fn best_fuzzy_match<'a>(
    token: &str,
    dictionary: &'a [String],
    threshold: u8,
) -> Option<(&'a str, u8)> {
    let mut best: Option<(&'a str, u8)> = None;
    for word in dictionary {
        let ratio = fuzzy_ratio(token, word);
        if ratio > threshold && best.is_none_or(|(_, best_ratio)| ratio > best_ratio) {
            best = Some((word.as_str(), ratio));
        }
    }
    best
}

/// Character-level similarity on a 0..=100 scale: `2 * LCS / (len_a + len_b)`.
pub fn fuzzy_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }

    // Single-row LCS table
    let mut row = vec![0usize; b.len() + 1];
    for ca in &a {
        let mut diagonal = 0;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    let lcs = row[b.len()];

    ((200 * lcs) as f64 / total as f64).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_fuzzy_ratio_bounds() {
        assert_eq!(fuzzy_ratio("камера", "камера"), 100);
        assert_eq!(fuzzy_ratio("abc", "xyz"), 0);
        assert_eq!(fuzzy_ratio("", ""), 100);
        // LCS "abc" of lengths 4 and 3 -> 6/7
        assert_eq!(fuzzy_ratio("abcd", "abc"), 86);
    }

    #[test]
    fn test_dictionary_word_is_returned_unchanged() {
        let corrector = TypoCorrector::new(CorrectionConfig::default());
        let dict = dictionary(&["интернет", "камера"]);
        assert_eq!(
            corrector.correct("камера", &dict),
            Correction::Exact("камера".to_string())
        );
    }

    #[test]
    fn test_known_typo_is_not_learned_again() {
        let corrector = TypoCorrector::new(CorrectionConfig::default()).with_persisted_typos(&[
            TypoEntry {
                correct_word: "интернет".to_string(),
                typo: "инет".to_string(),
                frequency: 3,
            },
        ]);
        let correction = corrector.correct("инет", &dictionary(&["камера"]));
        assert_eq!(correction.word(), "интернет");
        assert!(correction.learned().is_none());
    }

    #[test]
    fn test_close_match_ties_go_to_first_word() {
        let corrector = TypoCorrector::new(CorrectionConfig::default());
        // "кот" is one edit away from both
        let correction = corrector.correct("кот", &dictionary(&["кит", "кош", "кол"]));
        let learned = correction.learned().unwrap();
        assert_eq!(learned.correct_word, "кит");
        assert_eq!(learned.method, CorrectionMethod::CloseMatch);
    }

    #[test]
    fn test_fuzzy_fallback_when_edit_similarity_too_low() {
        let config = CorrectionConfig {
            close_match_cutoff: 0.95,
            fuzzy_ratio_threshold: 50,
        };
        let corrector = TypoCorrector::new(config);
        let correction = corrector.correct("подклчение", &dictionary(&["подключение"]));
        let learned = correction.learned().unwrap();
        assert_eq!(learned.method, CorrectionMethod::FuzzyRatio);
        assert_eq!(learned.correct_word, "подключение");
    }

    #[test]
    fn test_no_match_returns_token() {
        let corrector = TypoCorrector::new(CorrectionConfig::default());
        let correction = corrector.correct("asdkjhasd", &dictionary(&["интернет", "камера"]));
        assert_eq!(correction, Correction::Unrecognized("asdkjhasd".to_string()));
    }

    #[test]
    fn test_static_typos_are_lemmatized() {
        let normalizer = TextNormalizer::new();
        let corrector =
            TypoCorrector::new(CorrectionConfig::default()).with_static_typos(&normalizer);
        assert!(corrector.known_typo_count() > 0);

        let camera = normalizer.lemmatize_word("камера").unwrap();
        let typo = normalizer.lemmatize_word("кмера").unwrap();
        let correction = corrector.correct(&typo, &[]);
        assert_eq!(correction.word(), camera);
    }
}
