use anyhow::{anyhow, Result};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use isp_support_bot::config::{
    CorrectionConfig, ResponderConfig, StoreRecoveryConfig, DEFAULT_FALLBACK_MESSAGE,
};
use isp_support_bot::intent_catalog::IntentCatalog;
use isp_support_bot::learning_store::{InMemoryLearningStore, LearningStore, TypoEntry};
use isp_support_bot::responder::Responder;
use isp_support_bot::scorer::Scorer;
use isp_support_bot::text_processing::TextNormalizer;
use isp_support_bot::typo_corrector::TypoCorrector;

const SMALL_CATALOG: &str = r#"[
    {
        "name": "router_setup",
        "patterns": ["(.*)роутер(.*)"],
        "keywords": ["роутер", "настройка"],
        "responses": ["Инструкция по настройке роутера"]
    },
    {
        "name": "help",
        "patterns": ["помощь"],
        "responses": ["Чем помочь?"]
    },
    {
        "name": "anything",
        "patterns": [".*"],
        "responses": ["Не понял"],
        "catch_all": true
    }
]"#;

fn build_responder<S: LearningStore>(
    catalog: IntentCatalog,
    store: S,
    config: ResponderConfig,
) -> (Arc<IntentCatalog>, Responder<S>) {
    let normalizer = TextNormalizer::new();
    let corrector = TypoCorrector::new(CorrectionConfig::default()).with_static_typos(&normalizer);
    let catalog = Arc::new(catalog);
    let scorer = Scorer::new(normalizer, corrector, Arc::clone(&catalog));
    let responder = Responder::new(Arc::new(scorer), store, config);
    (catalog, responder)
}

fn embedded_responder() -> (Arc<IntentCatalog>, Responder<InMemoryLearningStore>) {
    let catalog = IntentCatalog::embedded(&TextNormalizer::new()).unwrap();
    build_responder(catalog, InMemoryLearningStore::new(), ResponderConfig::default())
}

fn responses_of(catalog: &IntentCatalog, name: &str) -> Vec<String> {
    catalog
        .find(name)
        .map(|category| category.responses.clone())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_greeting_is_answered() -> Result<()> {
    let (catalog, responder) = embedded_responder();

    let reply = responder.respond("Привет").await;
    assert!(responses_of(&catalog, "greeting").contains(&reply));

    Ok(())
}

#[tokio::test]
async fn test_connection_cost_question() -> Result<()> {
    let (_, responder) = embedded_responder();

    let reply = responder.respond("скока стоит подключение").await;
    assert!(reply.starts_with("Стоимость подключения"), "got: {reply}");

    Ok(())
}

#[tokio::test]
async fn test_gibberish_gets_fallback_and_is_recorded() -> Result<()> {
    let (_, responder) = embedded_responder();

    let reply = responder.respond("asdkjhasd").await;
    assert_eq!(reply, DEFAULT_FALLBACK_MESSAGE);
    assert_eq!(responder.store().unrecognized_frequency("asdkjhasd").await, Some(1));

    responder.respond("asdkjhasd").await;
    assert_eq!(responder.store().unrecognized_frequency("asdkjhasd").await, Some(2));

    Ok(())
}

#[tokio::test]
async fn test_learned_typo_is_persisted_per_message() -> Result<()> {
    let (_, responder) = embedded_responder();

    responder.respond("интернед").await;
    responder.respond("интернед").await;
    assert_eq!(
        responder.store().typo_frequency("интернет", "интернед").await,
        Some(2)
    );

    // Known misspellings are corrected without being learned again
    responder.respond("интернетт").await;
    assert_eq!(
        responder.store().typo_frequency("интернет", "интернетт").await,
        None
    );

    Ok(())
}

#[tokio::test]
async fn test_catalog_loaded_from_file() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(SMALL_CATALOG.as_bytes())?;

    let catalog = IntentCatalog::from_path(file.path(), &TextNormalizer::new())?;
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.catch_all().map(|c| c.name.as_str()), Some("anything"));

    let (_, responder) =
        build_responder(catalog, InMemoryLearningStore::new(), ResponderConfig::default());

    assert_eq!(
        responder.respond("Настройка роутеров").await,
        "Инструкция по настройке роутера"
    );
    assert_eq!(responder.respond("Помощь").await, "Чем помочь?");

    Ok(())
}

#[tokio::test]
async fn test_catch_all_never_answers() -> Result<()> {
    let catalog = IntentCatalog::from_json(SMALL_CATALOG, &TextNormalizer::new())?;
    let (_, responder) =
        build_responder(catalog, InMemoryLearningStore::new(), ResponderConfig::default());

    // Half of the keywords and the pattern-only category both stay at 0.5
    let evaluation = responder.evaluate("настройка");
    let best = evaluation.best.expect("catalog has scored categories");
    assert!((best.score - 0.5).abs() < f64::EPSILON);
    assert!(evaluation.confident(0.7).is_none());

    assert_eq!(responder.respond("настройка").await, DEFAULT_FALLBACK_MESSAGE);
    assert_eq!(responder.store().unrecognized_frequency("настройка").await, Some(1));

    Ok(())
}

#[tokio::test]
async fn test_scores_stay_in_unit_interval() -> Result<()> {
    let (_, responder) = embedded_responder();

    for text in ["", "!!!", "не работает интернет", "тарифы и акции", "qwerty"] {
        let evaluation = responder.evaluate(text);
        if let Some(best) = evaluation.best {
            assert!((0.0..=1.0).contains(&best.score), "{text}: {}", best.score);
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_custom_fallback_message() -> Result<()> {
    let catalog = IntentCatalog::from_json(SMALL_CATALOG, &TextNormalizer::new())?;
    let config = ResponderConfig {
        fallback_message: "Попробуйте спросить иначе".to_string(),
        ..ResponderConfig::default()
    };
    let (_, responder) = build_responder(catalog, InMemoryLearningStore::new(), config);

    assert_eq!(responder.respond("qwerty").await, "Попробуйте спросить иначе");

    Ok(())
}

/// Store whose writes always fail, counting attempts
#[derive(Default, Clone)]
struct FailingStore {
    attempts: Arc<AtomicUsize>,
}

impl LearningStore for FailingStore {
    async fn record_typo(&self, _correct_word: &str, _typo: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("database is down"))
    }

    async fn record_unrecognized(&self, _query: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("database is down"))
    }

    async fn load_typos(&self) -> Result<Vec<TypoEntry>> {
        Err(anyhow!("database is down"))
    }
}

#[tokio::test]
async fn test_store_failures_do_not_change_replies() -> Result<()> {
    let catalog = IntentCatalog::from_json(SMALL_CATALOG, &TextNormalizer::new())?;
    let store = FailingStore::default();
    let attempts = Arc::clone(&store.attempts);
    let config = ResponderConfig {
        recovery: StoreRecoveryConfig {
            circuit_breaker_threshold: 2,
            circuit_breaker_reset_secs: 3600,
        },
        ..ResponderConfig::default()
    };
    let (_, responder) = build_responder(catalog, store, config);

    for _ in 0..4 {
        assert_eq!(responder.respond("qwerty").await, DEFAULT_FALLBACK_MESSAGE);
    }
    assert_eq!(responder.respond("помощь").await, "Чем помочь?");

    // Writes stop once the circuit opens
    assert_eq!(attempts.load(Ordering::SeqCst), 2);

    Ok(())
}
