use crate::domain::{ModifiedCount, StoreError, VideoKey, ViewStore};
use async_trait::async_trait;
use nutype::nutype;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::{info, instrument};

/// How long a pool checkout may wait before the store is considered unavailable
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Name of the table holding view counters
#[nutype(
    validate(predicate = |name: &str| is_sql_identifier(name)),
    derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, AsRef, Display)
)]
pub struct ViewsTable(String);

impl Default for ViewsTable {
    fn default() -> Self {
        Self::try_new("video_views").expect("Default table name is valid")
    }
}

fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_well && name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Postgres-backed view store
///
/// Each counter is a row `(video_key, views)`. Increments are a single
/// `INSERT ... ON CONFLICT DO UPDATE` so concurrent calls never lose updates.
pub struct PgViewStore {
    pool: PgPool,
    table: ViewsTable,
    increment_sql: String,
    views_sql: String,
}

impl PgViewStore {
    pub fn new(pool: PgPool, table: ViewsTable) -> Self {
        // `xmax = 0` only holds for a row this statement inserted.
        let increment_sql = format!(
            "INSERT INTO {table} (video_key, views) VALUES ($1, 1) \
             ON CONFLICT (video_key) DO UPDATE SET views = {table}.views + 1 \
             RETURNING (xmax = 0) AS inserted"
        );
        let views_sql = format!("SELECT views FROM {table} WHERE video_key = $1");

        Self {
            pool,
            table,
            increment_sql,
            views_sql,
        }
    }

    /// Connect, verify the connection and make sure the counter table exists.
    #[instrument(skip(url))]
    pub async fn connect(
        url: &str,
        max_connections: u32,
        table: ViewsTable,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await?;

        let store = Self::new(pool, table);
        store.health_check().await?;
        store.ensure_schema().await?;
        info!(table = %store.table, "Connected to view store");

        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<(), StoreError> {
        let row = sqlx::query("SELECT 1 as health_check")
            .fetch_one(&self.pool)
            .await?;

        let health_check: i32 = row.try_get("health_check")?;

        if health_check == 1 {
            Ok(())
        } else {
            Err(StoreError::Unavailable(
                "Database health check failed".to_string(),
            ))
        }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             video_key TEXT PRIMARY KEY, \
             views BIGINT NOT NULL DEFAULT 0)",
            self.table
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ViewStore for PgViewStore {
    async fn increment_views(&self, key: &VideoKey) -> Result<ModifiedCount, StoreError> {
        let inserted: bool = sqlx::query_scalar(&self.increment_sql)
            .bind(key.as_ref())
            .fetch_one(&self.pool)
            .await?;

        Ok(ModifiedCount::new(if inserted { 0 } else { 1 }))
    }

    async fn views(&self, key: &VideoKey) -> Result<Option<i64>, StoreError> {
        let views: Option<i64> = sqlx::query_scalar(&self.views_sql)
            .bind(key.as_ref())
            .fetch_optional(&self.pool)
            .await?;

        Ok(views)
    }
}
