//! # Intent Catalog Module
//!
//! The ordered set of FAQ categories the responder can answer. Each category
//! carries full-match regex patterns, expected keywords (kept both as written
//! and lemmatized), and candidate responses. The catalog is built once at
//! startup and is read-only afterwards.

use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use crate::nlp_errors::NlpError;
use crate::text_processing::TextNormalizer;

/// Knowledge base shipped with the bot
pub const EMBEDDED_KNOWLEDGE_BASE: &str = include_str!("../data/knowledge_base.json");

/// Category as written in the knowledge-base file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IntentDefinition {
    pub name: String,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub responses: Vec<String>,
    /// Marks the last-resort bucket that matches any input
    #[serde(default)]
    pub catch_all: bool,
}

impl IntentDefinition {
    fn same_content(&self, other: &IntentDefinition) -> bool {
        self.patterns == other.patterns
            && self.keywords == other.keywords
            && self.responses == other.responses
            && self.catch_all == other.catch_all
    }
}

/// Regex pattern anchored to the whole input, case-insensitive
#[derive(Debug, Clone)]
pub struct IntentPattern {
    source: String,
    regex: Regex,
}

impl IntentPattern {
    pub fn compile(source: &str) -> Result<Self, NlpError> {
        let regex = Regex::new(&format!(r"(?i)\A(?:{source})\z"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// True when the pattern matches the entire text
    pub fn full_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// A compiled knowledge-base category
#[derive(Debug, Clone)]
pub struct IntentCategory {
    pub name: String,
    pub patterns: Vec<IntentPattern>,
    /// Keywords as written
    pub keywords: Vec<String>,
    /// Lemmatized keywords, index-aligned with `keywords`
    pub keyword_lemmas: Vec<String>,
    pub responses: Vec<String>,
    pub catch_all: bool,
}

impl IntentCategory {
    /// Build a category, lemmatizing its keywords with `normalizer`
    pub fn compile(
        definition: IntentDefinition,
        normalizer: &TextNormalizer,
    ) -> Result<Self, NlpError> {
        if definition.patterns.is_empty() {
            return Err(NlpError::Catalog(format!(
                "category '{}' has no patterns",
                definition.name
            )));
        }
        if definition.responses.is_empty() && !definition.catch_all {
            return Err(NlpError::Catalog(format!(
                "category '{}' has no responses",
                definition.name
            )));
        }

        let patterns = definition
            .patterns
            .iter()
            .map(|source| {
                IntentPattern::compile(source).map_err(|e| {
                    NlpError::Catalog(format!("category '{}': {e}", definition.name))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut keywords = Vec::with_capacity(definition.keywords.len());
        let mut keyword_lemmas = Vec::with_capacity(definition.keywords.len());
        for keyword in definition.keywords {
            match normalizer.lemmatize_keyword(&keyword)? {
                Some(lemma) => {
                    keywords.push(keyword);
                    keyword_lemmas.push(lemma);
                }
                None => {
                    warn!(
                        category = %definition.name,
                        keyword = %keyword,
                        "Ignoring keyword without word characters"
                    );
                }
            }
        }

        Ok(Self {
            name: definition.name,
            patterns,
            keywords,
            keyword_lemmas,
            responses: definition.responses,
            catch_all: definition.catch_all,
        })
    }
}

/// Ordered, immutable collection of intent categories
#[derive(Debug, Clone)]
pub struct IntentCatalog {
    categories: Vec<IntentCategory>,
    /// Union of keyword lemmas in catalog order, used as the typo-correction dictionary
    dictionary: Vec<String>,
}

impl IntentCatalog {
    /// Load the knowledge base compiled into the binary
    pub fn embedded(normalizer: &TextNormalizer) -> Result<Self, NlpError> {
        Self::from_json(EMBEDDED_KNOWLEDGE_BASE, normalizer)
    }

    /// Load a knowledge base from a JSON file
    pub fn from_path(path: &Path, normalizer: &TextNormalizer) -> Result<Self, NlpError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NlpError::Catalog(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&content, normalizer)
    }

    pub fn from_json(json: &str, normalizer: &TextNormalizer) -> Result<Self, NlpError> {
        let definitions: Vec<IntentDefinition> = serde_json::from_str(json)?;
        Self::from_definitions(definitions, normalizer)
    }

    /// Compile definitions in order, collapsing exact duplicates
    pub fn from_definitions(
        definitions: Vec<IntentDefinition>,
        normalizer: &TextNormalizer,
    ) -> Result<Self, NlpError> {
        let mut unique: Vec<IntentDefinition> = Vec::with_capacity(definitions.len());
        for definition in definitions {
            if let Some(existing) = unique.iter().find(|d| d.same_content(&definition)) {
                warn!(
                    category = %definition.name,
                    duplicate_of = %existing.name,
                    "Dropping duplicate knowledge-base category"
                );
                continue;
            }
            unique.push(definition);
        }

        let catch_all_count = unique.iter().filter(|d| d.catch_all).count();
        if catch_all_count > 1 {
            return Err(NlpError::Catalog(format!(
                "expected at most one catch-all category, found {catch_all_count}"
            )));
        }

        let categories = unique
            .into_iter()
            .map(|definition| IntentCategory::compile(definition, normalizer))
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::new();
        let dictionary: Vec<String> = categories
            .iter()
            .flat_map(|category| category.keyword_lemmas.iter())
            .filter(|lemma| seen.insert(lemma.as_str()))
            .cloned()
            .collect();

        if dictionary.is_empty() {
            return Err(NlpError::Dictionary(
                "knowledge base declares no keywords".to_string(),
            ));
        }

        info!(
            categories = categories.len(),
            dictionary_words = dictionary.len(),
            "Intent catalog loaded"
        );

        Ok(Self {
            categories,
            dictionary,
        })
    }

    pub fn categories(&self) -> &[IntentCategory] {
        &self.categories
    }

    pub fn get(&self, index: usize) -> Option<&IntentCategory> {
        self.categories.get(index)
    }

    pub fn find(&self, name: &str) -> Option<&IntentCategory> {
        self.categories.iter().find(|category| category.name == name)
    }

    pub fn catch_all(&self) -> Option<&IntentCategory> {
        self.categories.iter().find(|category| category.catch_all)
    }

    /// Reference dictionary for typo correction
    pub fn dictionary(&self) -> &[String] {
        &self.dictionary
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
