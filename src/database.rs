// src/database.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;
use tracing::info;

use crate::types::{CvRecord, StatusCheck, CV_DOCUMENT_KIND};

/// Listing cap for status checks.
const STATUS_LIST_LIMIT: i64 = 1000;

#[derive(Debug)]
pub struct DatabaseConfig {
    pub database_path: PathBuf,
    pub pool: Option<SqlitePool>,
}

impl DatabaseConfig {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            database_path,
            pool: None,
        }
    }

    /// Initialize the database connection pool
    pub async fn init_pool(&mut self) -> Result<()> {
        if let Some(parent) = self.database_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", self.database_path.display());
        self.init_pool_with_url(&database_url).await
    }

    /// Connect to an explicit SQLite URL. In-memory databases get a
    /// single-connection pool so every query sees the same schema.
    pub async fn init_pool_with_url(&mut self, database_url: &str) -> Result<()> {
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to SQLite database")?;
        self.pool = Some(pool);

        info!("Database connection pool initialized: {}", database_url);
        Ok(())
    }

    /// Get the database pool
    pub fn pool(&self) -> Result<&SqlitePool> {
        self.pool
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Database pool not initialized. Call init_pool() first."))
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        let pool = self.pool()?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cv_documents (
                kind TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS status_checks (
                id TEXT PRIMARY KEY,
                client_name TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}

/// Accessor for the singleton CV document.
pub struct CvDocumentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CvDocumentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch the stored CV payload, or `None` before the first save.
    pub async fn fetch(&self) -> Result<Option<serde_json::Value>> {
        let row = sqlx::query(
            r#"
            SELECT payload
            FROM cv_documents
            WHERE kind = ?
            "#,
        )
        .bind(CV_DOCUMENT_KIND)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => {
                let payload: String = row.try_get("payload")?;
                let value = serde_json::from_str(&payload)
                    .context("Stored CV payload is not valid JSON")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Replace-or-insert the singleton record, stamping `updated_at`.
    /// Last writer wins; there is no merge or concurrency check.
    pub async fn upsert(&self, record: &CvRecord) -> Result<DateTime<Utc>> {
        let updated_at = Utc::now();

        let mut payload = serde_json::to_value(record).context("Failed to serialize CV record")?;
        if let Some(doc) = payload.as_object_mut() {
            doc.insert(
                "updated_at".to_string(),
                serde_json::Value::String(updated_at.to_rfc3339()),
            );
        }
        let payload_text = payload.to_string();

        sqlx::query(
            r#"
            INSERT INTO cv_documents (kind, payload, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(kind) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(CV_DOCUMENT_KIND)
        .bind(payload_text)
        .bind(updated_at)
        .execute(self.pool)
        .await?;

        info!("CV document upserted");
        Ok(updated_at)
    }
}

/// Append-only store for health-check pings.
pub struct StatusCheckRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StatusCheckRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, check: &StatusCheck) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO status_checks (id, client_name, timestamp)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&check.id)
        .bind(&check.client_name)
        .bind(check.timestamp)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<StatusCheck>> {
        let checks = sqlx::query_as::<_, StatusCheck>(
            r#"
            SELECT id, client_name, timestamp
            FROM status_checks
            ORDER BY timestamp ASC
            LIMIT ?
            "#,
        )
        .bind(STATUS_LIST_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(checks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_db() -> DatabaseConfig {
        let mut config = DatabaseConfig::new(PathBuf::from(":memory:"));
        config
            .init_pool_with_url("sqlite::memory:")
            .await
            .expect("in-memory pool");
        config.migrate().await.expect("migrations");
        config
    }

    #[tokio::test]
    async fn fetch_before_save_returns_none() {
        let db = memory_db().await;
        let repo = CvDocumentRepository::new(db.pool().unwrap());
        assert!(repo.fetch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_then_fetch_round_trips() {
        let db = memory_db().await;
        let repo = CvDocumentRepository::new(db.pool().unwrap());

        let mut record = CvRecord::default();
        record.name = "Ana Horvat".to_string();
        record.email = "ana@example.com".to_string();
        record.skills_en = vec!["Teaching".to_string(), "Translation".to_string()];

        repo.upsert(&record).await.unwrap();

        let stored = repo.fetch().await.unwrap().expect("document present");
        assert_eq!(stored["name"], "Ana Horvat");
        assert_eq!(stored["email"], "ana@example.com");
        assert_eq!(stored["skills_en"][1], "Translation");
        assert!(stored["updated_at"].as_str().unwrap().contains('T'));
    }

    #[tokio::test]
    async fn upsert_is_last_writer_wins() {
        let db = memory_db().await;
        let repo = CvDocumentRepository::new(db.pool().unwrap());

        let mut first = CvRecord::default();
        first.name = "First".to_string();
        repo.upsert(&first).await.unwrap();

        let mut second = CvRecord::default();
        second.name = "Second".to_string();
        repo.upsert(&second).await.unwrap();

        let stored = repo.fetch().await.unwrap().unwrap();
        assert_eq!(stored["name"], "Second");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cv_documents")
            .fetch_one(db.pool().unwrap())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn empty_record_saves_cleanly() {
        let db = memory_db().await;
        let repo = CvDocumentRepository::new(db.pool().unwrap());
        repo.upsert(&CvRecord::default()).await.unwrap();
        let stored = repo.fetch().await.unwrap().unwrap();
        assert_eq!(stored["experience_hr"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn status_checks_append_and_list() {
        let db = memory_db().await;
        let repo = StatusCheckRepository::new(db.pool().unwrap());

        repo.append(&StatusCheck::new("probe-a".to_string()))
            .await
            .unwrap();
        repo.append(&StatusCheck::new("probe-b".to_string()))
            .await
            .unwrap();

        let checks = repo.list().await.unwrap();
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().any(|c| c.client_name == "probe-a"));
        assert!(checks.iter().all(|c| !c.id.is_empty()));
    }
}
