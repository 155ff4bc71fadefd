//! SQLite record store
//!
//! Emulates the managed table store on a local file so the client can
//! run without network access. Each item is one row holding its
//! attribute map as tagged JSON. Filters are evaluated client-side,
//! the same way the managed store applies them after reading.

use sqlx::{Pool, Row, Sqlite, SqlitePool};
use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;

use super::record::{Filter, Record, record_key};
use super::store::RecordStore;
use crate::error::AppError;
use crate::metrics::observe_store_operation;

/// Database connection pool wrapper.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

fn decode_attributes(table: &str, raw: &str) -> Result<Record, AppError> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::MalformedRecord(format!("undecodable row in {table}: {e}")))
}

impl SqliteStore {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the file and its parent directory if needed and runs
    /// migrations.
    ///
    /// # Errors
    /// Returns error if the path is not UTF-8, the pool cannot be
    /// opened or a migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        if path.to_str().is_none() {
            return Err(AppError::Config(format!(
                "database path must be valid UTF-8: {}",
                path.display()
            )));
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Database(e.into())
            })?;

        tracing::info!(path = %path.display(), "Record database connected and migrated");

        Ok(Self { pool })
    }

    /// Close the pool, waiting for open connections to finish
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get(&self, table: &str, key: &str) -> Result<Option<Record>, AppError> {
        let started = Instant::now();
        let row = sqlx::query("SELECT attributes FROM records WHERE table_name = ? AND record_key = ?")
            .bind(table)
            .bind(key)
            .fetch_optional(&self.pool)
            .await;

        let row = match row {
            Ok(row) => row,
            Err(error) => {
                observe_store_operation("get", table, "error", started.elapsed());
                return Err(error.into());
            }
        };
        observe_store_operation("get", table, "success", started.elapsed());

        row.map(|row| {
            let raw: String = row.get("attributes");
            decode_attributes(table, &raw)
        })
        .transpose()
    }

    async fn scan(&self, table: &str, filter: &Filter) -> Result<Vec<Record>, AppError> {
        let started = Instant::now();
        let rows = sqlx::query("SELECT attributes FROM records WHERE table_name = ? ORDER BY seq")
            .bind(table)
            .fetch_all(&self.pool)
            .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(error) => {
                observe_store_operation("scan", table, "error", started.elapsed());
                return Err(error.into());
            }
        };
        observe_store_operation("scan", table, "success", started.elapsed());

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.get("attributes");
            match decode_attributes(table, &raw) {
                Ok(record) if filter.matches(&record) => records.push(record),
                Ok(_) => {}
                Err(error) => tracing::warn!(%error, "Skipping row during scan"),
            }
        }
        Ok(records)
    }

    async fn put(&self, table: &str, record: Record) -> Result<(), AppError> {
        let key = record_key(&record)
            .ok_or_else(|| AppError::MalformedRecord(format!("put into {table} without `id`")))?
            .to_string();
        let attributes = serde_json::to_string(&record)
            .map_err(|e| AppError::Unknown(format!("failed to encode record: {e}")))?;

        let started = Instant::now();
        let result = sqlx::query(
            r#"
            INSERT INTO records (table_name, record_key, attributes, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(table_name, record_key) DO UPDATE SET
                attributes = excluded.attributes,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(table)
        .bind(&key)
        .bind(&attributes)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                observe_store_operation("put", table, "success", started.elapsed());
                Ok(())
            }
            Err(error) => {
                observe_store_operation("put", table, "error", started.elapsed());
                Err(error.into())
            }
        }
    }
}
