//! # Text Processing Module
//!
//! This module turns raw user messages into the content tokens the intent
//! scorer works with.
//!
//! ## Pipeline
//!
//! - Remove every character that is neither a word character nor whitespace
//! - Lowercase (and fold `ё` into `е`)
//! - Split into tokens
//! - Drop stop-words and tokens of two characters or fewer
//! - Reduce each remaining token to its base form through a [`Lemmatizer`]
//!
//! Normalization never fails from the caller's point of view: any error is
//! logged and the message is treated as having no content tokens.

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, trace};

use crate::nlp_errors::NlpError;

/// Tokens with this many characters or fewer are discarded
pub const MAX_DISCARDED_TOKEN_LEN: usize = 2;

lazy_static! {
    static ref NON_WORD_REGEX: Regex =
        Regex::new(r"[^\w\s]").expect("Punctuation pattern should be valid");
}

/// Russian function words excluded from keyword matching.
///
/// Interrogatives ("как", "когда", "сколько") are not listed: knowledge-base
/// keywords use them.
pub const RUSSIAN_STOP_WORDS: &[&str] = &[
    "а", "без", "более", "бы", "был", "была", "были", "было", "быть", "в", "вам", "вас", "весь",
    "во", "вот", "все", "всего", "всех", "вы", "где", "да", "даже", "для", "до", "его", "ее",
    "ей", "ему", "если", "есть", "еще", "же", "за", "здесь", "и", "из", "или", "им", "их", "к",
    "ко", "кто", "ли", "либо", "мне", "может", "мы", "на", "над", "надо", "наш", "не", "него",
    "нее", "нет", "ни", "них", "но", "ну", "о", "об", "однако", "он", "она", "они", "оно", "от",
    "очень", "по", "под", "после", "при", "про", "с", "со", "так", "также", "такой", "там",
    "те", "тем", "то", "того", "тоже", "той", "только", "том", "ты", "у", "уже", "хотя", "чего",
    "чей", "чем", "что", "чтобы", "чье", "эта", "эти", "это", "этого", "этой", "этот", "я",
    "меня", "мой", "моя", "мои", "ваш", "ваша", "ваши", "свой", "себе", "тебе", "тебя", "нам",
    "нас", "ним", "ней", "будет", "будут", "пожалуйста", "вообще",
];

/// Reduces an inflected word to its base form
pub trait Lemmatizer: Send + Sync {
    /// Return the base form of a single lowercase word
    fn lemmatize(&self, word: &str) -> Result<String, NlpError>;
}

/// Lemmatizer backed by the Snowball Russian stemmer.
///
/// Stems are used as base forms: both user tokens and catalog keywords go
/// through the same reduction, so inflected variants meet on the same string.
pub struct SnowballLemmatizer {
    stemmer: Stemmer,
}

impl SnowballLemmatizer {
    pub fn russian() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::Russian),
        }
    }
}

impl Default for SnowballLemmatizer {
    fn default() -> Self {
        Self::russian()
    }
}

impl Lemmatizer for SnowballLemmatizer {
    fn lemmatize(&self, word: &str) -> Result<String, NlpError> {
        if word.chars().any(char::is_whitespace) {
            return Err(NlpError::Lemmatization(format!(
                "expected a single word, got '{word}'"
            )));
        }
        Ok(self.stemmer.stem(word).into_owned())
    }
}

/// Text normalizer producing lemmatized content tokens
#[derive(Clone)]
pub struct TextNormalizer {
    lemmatizer: Arc<dyn Lemmatizer>,
    stop_words: HashSet<&'static str>,
}

impl TextNormalizer {
    /// Create a normalizer using the Russian Snowball lemmatizer and stop-word list
    pub fn new() -> Self {
        Self::with_lemmatizer(Arc::new(SnowballLemmatizer::russian()))
    }

    /// Create a normalizer with a custom lemmatizer
    pub fn with_lemmatizer(lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        Self {
            lemmatizer,
            stop_words: RUSSIAN_STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Lowercase, strip punctuation and fold `ё`
    pub fn clean(text: &str) -> String {
        NON_WORD_REGEX
            .replace_all(&text.to_lowercase(), "")
            .replace('ё', "е")
    }

    /// Check whether a lowercase token is a stop-word
    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Normalize a message into lemmatized content tokens.
    ///
    /// Returns an empty vector when the message has no content words or when
    /// lemmatization fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use isp_support_bot::text_processing::TextNormalizer;
    ///
    /// let normalizer = TextNormalizer::new();
    /// let tokens = normalizer.normalize("Не работает интернет!");
    /// assert!(tokens.contains(&"интернет".to_string()));
    /// ```
    pub fn normalize(&self, text: &str) -> Vec<String> {
        match self.try_normalize(text) {
            Ok(tokens) => {
                trace!(?tokens, "Normalized message");
                tokens
            }
            Err(e) => {
                error!(error = %e, "Text preprocessing failed, treating message as empty");
                Vec::new()
            }
        }
    }

    fn try_normalize(&self, text: &str) -> Result<Vec<String>, NlpError> {
        let cleaned = Self::clean(text);
        cleaned
            .split_whitespace()
            .filter(|token| token.chars().count() > MAX_DISCARDED_TOKEN_LEN)
            .filter(|token| !self.is_stop_word(token))
            .map(|token| self.lemmatizer.lemmatize(token))
            .collect()
    }

    /// Lemmatize a catalog keyword.
    ///
    /// Phrases are represented by the base form of their first word. Returns
    /// `Ok(None)` when nothing word-like is left after cleanup.
    pub fn lemmatize_keyword(&self, keyword: &str) -> Result<Option<String>, NlpError> {
        let cleaned = Self::clean(keyword);
        match cleaned.split_whitespace().next() {
            Some(first) => {
                let lemma = self.lemmatizer.lemmatize(first)?;
                debug!(keyword, lemma = %lemma, "Lemmatized keyword");
                Ok(Some(lemma))
            }
            None => Ok(None),
        }
    }

    /// Lemmatize a single already-clean word
    pub fn lemmatize_word(&self, word: &str) -> Result<String, NlpError> {
        self.lemmatizer.lemmatize(word)
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
