use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPool;
use tracing::{debug, info};

use crate::learning_store::{LearningStore, TypoEntry, UnrecognizedQuery};

/// Represents a bot user
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Router offered for sale
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Router {
    pub id: i32,
    pub model_name: String,
    pub cost: i32,
    pub mesh: bool,
    pub gigabit: bool,
    pub band_5ghz: bool,
    pub lan_ports: i32,
}

/// Router fields without the database id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewRouter {
    pub model_name: String,
    pub cost: i32,
    pub mesh: bool,
    pub gigabit: bool,
    pub band_5ghz: bool,
    pub lan_ports: i32,
}

impl NewRouter {
    /// The router as stored under `id`
    pub fn with_id(&self, id: i32) -> Router {
        Router {
            id,
            model_name: self.model_name.clone(),
            cost: self.cost,
            mesh: self.mesh,
            gigabit: self.gigabit,
            band_5ghz: self.band_5ghz,
            lan_ports: self.lan_ports,
        }
    }
}

impl From<Router> for NewRouter {
    fn from(router: Router) -> Self {
        Self {
            model_name: router.model_name,
            cost: router.cost,
            mesh: router.mesh,
            gigabit: router.gigabit,
            band_5ghz: router.band_5ghz,
            lan_ports: router.lan_ports,
        }
    }
}

/// Internet tariff plan
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Tariff {
    pub id: i32,
    pub name: String,
    pub monthly_cost: i32,
    pub cost_6_months: Option<i32>,
    pub cost_12_months: Option<i32>,
    pub promotion: bool,
}

/// Tariff fields without the database id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTariff {
    pub name: String,
    pub monthly_cost: i32,
    pub cost_6_months: Option<i32>,
    pub cost_12_months: Option<i32>,
    pub promotion: bool,
}

impl NewTariff {
    /// The tariff as stored under `id`
    pub fn with_id(&self, id: i32) -> Tariff {
        Tariff {
            id,
            name: self.name.clone(),
            monthly_cost: self.monthly_cost,
            cost_6_months: self.cost_6_months,
            cost_12_months: self.cost_12_months,
            promotion: self.promotion,
        }
    }
}

impl From<Tariff> for NewTariff {
    fn from(tariff: Tariff) -> Self {
        Self {
            name: tariff.name,
            monthly_cost: tariff.monthly_cost,
            cost_6_months: tariff.cost_6_months,
            cost_12_months: tariff.cost_12_months,
            promotion: tariff.promotion,
        }
    }
}

/// Processing state of a feedback message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackStatus {
    New,
    Replied,
    Failed,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::New => "new",
            FeedbackStatus::Replied => "replied",
            FeedbackStatus::Failed => "failed",
        }
    }
}

/// Feedback message left by a user for the administrators
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Feedback {
    pub id: i32,
    pub user_id: i64,
    pub username: Option<String>,
    pub message: String,
    pub status: String,
    pub admin_id: Option<i64>,
    pub reply_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Maximum number of feedback items listed at once
pub const FEEDBACK_LIST_LIMIT: i64 = 50;

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            telegram_id BIGINT PRIMARY KEY,
            username VARCHAR(255),
            full_name VARCHAR(255),
            is_admin BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS routers (
            id SERIAL PRIMARY KEY,
            model_name VARCHAR(255) NOT NULL,
            cost INTEGER NOT NULL,
            mesh BOOLEAN NOT NULL DEFAULT FALSE,
            gigabit BOOLEAN NOT NULL DEFAULT FALSE,
            band_5ghz BOOLEAN NOT NULL DEFAULT FALSE,
            lan_ports INTEGER NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create routers table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS tariffs (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            monthly_cost INTEGER NOT NULL,
            cost_6_months INTEGER,
            cost_12_months INTEGER,
            promotion BOOLEAN NOT NULL DEFAULT FALSE
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create tariffs table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS feedback (
            id SERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL,
            username VARCHAR(255),
            message TEXT NOT NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'new',
            admin_id BIGINT,
            reply_message TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create feedback table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS feedback_user_status_idx ON feedback (user_id, status)",
    )
    .execute(pool)
    .await
    .context("Failed to create feedback index")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS typos (
            correct_word TEXT NOT NULL,
            typo TEXT NOT NULL,
            frequency INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY (correct_word, typo)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create typos table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS unrecognized_queries (
            query TEXT PRIMARY KEY,
            frequency INTEGER NOT NULL DEFAULT 1
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create unrecognized_queries table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Register a user on first contact. Returns the stored user and whether it was just created.
pub async fn get_or_create_user(
    pool: &PgPool,
    telegram_id: i64,
    username: Option<&str>,
    full_name: Option<&str>,
) -> Result<(User, bool)> {
    if let Some(user) = get_user(pool, telegram_id).await? {
        return Ok((user, false));
    }

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (telegram_id, username, full_name, is_admin)
         VALUES ($1, $2, $3, FALSE)
         ON CONFLICT (telegram_id) DO UPDATE SET telegram_id = EXCLUDED.telegram_id
         RETURNING telegram_id, username, full_name, is_admin, created_at",
    )
    .bind(telegram_id)
    .bind(username)
    .bind(full_name)
    .fetch_one(pool)
    .await
    .context("Failed to insert new user")?;

    info!(telegram_id, "Registered new user");
    Ok((user, true))
}

pub async fn get_user(pool: &PgPool, telegram_id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT telegram_id, username, full_name, is_admin, created_at
         FROM users WHERE telegram_id = $1",
    )
    .bind(telegram_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read user")?;
    Ok(user)
}

/// Check administrator rights. Unknown users are not administrators.
pub async fn is_admin(pool: &PgPool, telegram_id: i64) -> Result<bool> {
    let flag: Option<bool> =
        sqlx::query_scalar("SELECT is_admin FROM users WHERE telegram_id = $1")
            .bind(telegram_id)
            .fetch_optional(pool)
            .await
            .context("Failed to check admin status")?;
    Ok(flag.unwrap_or(false))
}

pub async fn set_admin(pool: &PgPool, telegram_id: i64, is_admin: bool) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET is_admin = $1 WHERE telegram_id = $2")
        .bind(is_admin)
        .bind(telegram_id)
        .execute(pool)
        .await
        .context("Failed to update admin status")?;
    Ok(result.rows_affected() > 0)
}

pub async fn admin_ids(pool: &PgPool) -> Result<Vec<i64>> {
    let ids =
        sqlx::query_scalar("SELECT telegram_id FROM users WHERE is_admin ORDER BY telegram_id")
            .fetch_all(pool)
            .await
            .context("Failed to list administrators")?;
    Ok(ids)
}

pub async fn list_routers(pool: &PgPool) -> Result<Vec<Router>> {
    let routers = sqlx::query_as::<_, Router>(
        "SELECT id, model_name, cost, mesh, gigabit, band_5ghz, lan_ports
         FROM routers ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list routers")?;
    Ok(routers)
}

pub async fn get_router(pool: &PgPool, id: i32) -> Result<Option<Router>> {
    let router = sqlx::query_as::<_, Router>(
        "SELECT id, model_name, cost, mesh, gigabit, band_5ghz, lan_ports
         FROM routers WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to read router")?;
    Ok(router)
}

pub async fn create_router(pool: &PgPool, router: &NewRouter) -> Result<i32> {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO routers (model_name, cost, mesh, gigabit, band_5ghz, lan_ports)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id",
    )
    .bind(&router.model_name)
    .bind(router.cost)
    .bind(router.mesh)
    .bind(router.gigabit)
    .bind(router.band_5ghz)
    .bind(router.lan_ports)
    .fetch_one(pool)
    .await
    .context("Failed to insert router")?;

    info!(router_id = id, model = %router.model_name, "Router created");
    Ok(id)
}

pub async fn update_router(pool: &PgPool, id: i32, router: &NewRouter) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE routers
         SET model_name = $1, cost = $2, mesh = $3, gigabit = $4, band_5ghz = $5, lan_ports = $6
         WHERE id = $7",
    )
    .bind(&router.model_name)
    .bind(router.cost)
    .bind(router.mesh)
    .bind(router.gigabit)
    .bind(router.band_5ghz)
    .bind(router.lan_ports)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update router")?;

    debug!(router_id = id, rows = result.rows_affected(), "Router update");
    Ok(result.rows_affected() > 0)
}

pub async fn delete_router(pool: &PgPool, id: i32) -> Result<bool> {
    let result = sqlx::query("DELETE FROM routers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete router")?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_tariffs(pool: &PgPool) -> Result<Vec<Tariff>> {
    let tariffs = sqlx::query_as::<_, Tariff>(
        "SELECT id, name, monthly_cost, cost_6_months, cost_12_months, promotion
         FROM tariffs ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list tariffs")?;
    Ok(tariffs)
}

pub async fn get_tariff(pool: &PgPool, id: i32) -> Result<Option<Tariff>> {
    let tariff = sqlx::query_as::<_, Tariff>(
        "SELECT id, name, monthly_cost, cost_6_months, cost_12_months, promotion
         FROM tariffs WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to read tariff")?;
    Ok(tariff)
}

pub async fn create_tariff(pool: &PgPool, tariff: &NewTariff) -> Result<i32> {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO tariffs (name, monthly_cost, cost_6_months, cost_12_months, promotion)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(&tariff.name)
    .bind(tariff.monthly_cost)
    .bind(tariff.cost_6_months)
    .bind(tariff.cost_12_months)
    .bind(tariff.promotion)
    .fetch_one(pool)
    .await
    .context("Failed to insert tariff")?;

    info!(tariff_id = id, name = %tariff.name, "Tariff created");
    Ok(id)
}

pub async fn update_tariff(pool: &PgPool, id: i32, tariff: &NewTariff) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE tariffs
         SET name = $1, monthly_cost = $2, cost_6_months = $3, cost_12_months = $4, promotion = $5
         WHERE id = $6",
    )
    .bind(&tariff.name)
    .bind(tariff.monthly_cost)
    .bind(tariff.cost_6_months)
    .bind(tariff.cost_12_months)
    .bind(tariff.promotion)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update tariff")?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_tariff(pool: &PgPool, id: i32) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tariffs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete tariff")?;
    Ok(result.rows_affected() > 0)
}

pub async fn create_feedback(
    pool: &PgPool,
    user_id: i64,
    username: Option<&str>,
    message: &str,
) -> Result<i32> {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO feedback (user_id, username, message, status)
         VALUES ($1, $2, $3, 'new')
         RETURNING id",
    )
    .bind(user_id)
    .bind(username)
    .bind(message)
    .fetch_one(pool)
    .await
    .context("Failed to insert feedback")?;

    info!(feedback_id = id, user_id, "Feedback stored");
    Ok(id)
}

/// Most recent unanswered feedback, newest first
pub async fn list_new_feedback(pool: &PgPool, limit: i64) -> Result<Vec<Feedback>> {
    let items = sqlx::query_as::<_, Feedback>(
        "SELECT id, user_id, username, message, status, admin_id, reply_message, created_at
         FROM feedback WHERE status = 'new'
         ORDER BY created_at DESC, id DESC
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list feedback")?;
    Ok(items)
}

/// Close every unanswered feedback item of `user_id`. Returns the number of items updated.
pub async fn resolve_feedback(
    pool: &PgPool,
    user_id: i64,
    admin_id: i64,
    reply_message: &str,
    status: FeedbackStatus,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE feedback
         SET status = $1, admin_id = $2, reply_message = $3
         WHERE user_id = $4 AND status = 'new'",
    )
    .bind(status.as_str())
    .bind(admin_id)
    .bind(reply_message)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to update feedback status")?;
    Ok(result.rows_affected())
}

/// Most frequent unrecognized queries, for reviewing knowledge-base gaps
pub async fn top_unrecognized_queries(pool: &PgPool, limit: i64) -> Result<Vec<UnrecognizedQuery>> {
    let queries = sqlx::query_as::<_, UnrecognizedQuery>(
        "SELECT query, frequency FROM unrecognized_queries
         ORDER BY frequency DESC, query
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list unrecognized queries")?;
    Ok(queries)
}

/// Learning store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgLearningStore {
    pool: PgPool,
}

impl PgLearningStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl LearningStore for PgLearningStore {
    async fn record_typo(&self, correct_word: &str, typo: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO typos (correct_word, typo, frequency) VALUES ($1, $2, 1)
             ON CONFLICT (correct_word, typo) DO UPDATE SET frequency = typos.frequency + 1",
        )
        .bind(correct_word)
        .bind(typo)
        .execute(&self.pool)
        .await
        .context("Failed to record typo")?;
        debug!(correct_word, typo, "Typo recorded");
        Ok(())
    }

    async fn record_unrecognized(&self, query: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO unrecognized_queries (query, frequency) VALUES ($1, 1)
             ON CONFLICT (query) DO UPDATE SET frequency = unrecognized_queries.frequency + 1",
        )
        .bind(query)
        .execute(&self.pool)
        .await
        .context("Failed to record unrecognized query")?;
        Ok(())
    }

    async fn load_typos(&self) -> Result<Vec<TypoEntry>> {
        let entries = sqlx::query_as::<_, TypoEntry>(
            "SELECT correct_word, typo, frequency FROM typos ORDER BY correct_word, typo",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load typos")?;
        info!(count = entries.len(), "Loaded persisted typos");
        Ok(entries)
    }
}
