use anyhow::{Context, Result};
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use isp_support_bot::bot;
use isp_support_bot::config::BotConfig;
use isp_support_bot::db::{self, PgLearningStore};
use isp_support_bot::dialogue::BotDialogueState;
use isp_support_bot::intent_catalog::IntentCatalog;
use isp_support_bot::learning_store::LearningStore;
use isp_support_bot::localization::init_localization;
use isp_support_bot::responder::Responder;
use isp_support_bot::scorer::Scorer;
use isp_support_bot::text_processing::TextNormalizer;
use isp_support_bot::typo_corrector::TypoCorrector;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;
    init_tracing(config.json_logs);

    info!("Starting ISP support bot");

    init_localization()?;

    info!("Connecting to database");
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    db::init_database_schema(&pool).await?;

    let normalizer = TextNormalizer::new();
    let catalog = match &config.knowledge_base_path {
        Some(path) => IntentCatalog::from_path(path, &normalizer)
            .with_context(|| format!("Failed to load knowledge base {}", path.display()))?,
        None => IntentCatalog::embedded(&normalizer)?,
    };
    info!(
        categories = catalog.len(),
        dictionary_words = catalog.dictionary().len(),
        "Intent catalog loaded"
    );

    let store = PgLearningStore::new(pool.clone());
    let persisted = match store.load_typos().await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Failed to load learned typos, starting with static ones");
            Vec::new()
        }
    };
    let corrector = TypoCorrector::new(config.responder.correction.clone())
        .with_static_typos(&normalizer)
        .with_persisted_typos(&persisted);
    info!(known_typos = corrector.known_typo_count(), "Typo corrector ready");

    let scorer = Arc::new(Scorer::new(normalizer, corrector, Arc::new(catalog)));
    let responder = Arc::new(Responder::new(scorer, store, config.responder.clone()));
    let pool = Arc::new(pool);

    let bot = Bot::new(config.bot_token);

    info!("Bot initialized, starting dispatcher");

    let handler = Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<BotDialogueState>, BotDialogueState>()
        .endpoint(bot::message_handler);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![
            InMemStorage::<BotDialogueState>::new(),
            pool,
            responder
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
