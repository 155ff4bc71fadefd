//! In-process record store
//!
//! Tables are insertion-ordered vectors behind a tokio `RwLock`.
//! Used for tests and for running without any backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::record::{Filter, Record, record_key};
use super::store::RecordStore;
use crate::error::AppError;

/// Volatile record store
#[derive(Default, Clone)]
pub struct MemoryStore {
    /// Table name -> records in insertion order
    tables: Arc<RwLock<HashMap<String, Vec<Record>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held in `table`
    pub async fn len(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Append a record without key checks
    ///
    /// Lets tests and fixtures plant records that a real store could
    /// hand back but `put` would refuse, such as items without an `id`.
    pub async fn insert_raw(&self, table: &str, record: Record) {
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .push(record);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, table: &str, key: &str) -> Result<Option<Record>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .and_then(|records| records.iter().find(|r| record_key(r) == Some(key)))
            .cloned())
    }

    async fn scan(&self, table: &str, filter: &Filter) -> Result<Vec<Record>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| filter.matches(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put(&self, table: &str, record: Record) -> Result<(), AppError> {
        let key = record_key(&record)
            .ok_or_else(|| AppError::MalformedRecord(format!("put into {table} without `id`")))?
            .to_string();

        let mut tables = self.tables.write().await;
        let records = tables.entry(table.to_string()).or_default();
        match records
            .iter_mut()
            .find(|existing| record_key(existing) == Some(key.as_str()))
        {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }
}
