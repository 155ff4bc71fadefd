//! Record store abstraction
//!
//! The table store is an external collaborator. Services only see this
//! trait; backends live in `memory.rs`, `database.rs` and
//! `crate::storage`.

use async_trait::async_trait;

use super::record::{Filter, Record};
use crate::error::AppError;

/// Attribute-map store addressed by the `id` partition key
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Single-key lookup
    ///
    /// `Ok(None)` means the key does not exist.
    async fn get(&self, table: &str, key: &str) -> Result<Option<Record>, AppError>;

    /// Scan a table, keeping records that match `filter`
    ///
    /// Only the first result batch is returned; continuation is never
    /// followed. Records come back in store order.
    async fn scan(&self, table: &str, filter: &Filter) -> Result<Vec<Record>, AppError>;

    /// Insert or replace the record under its `id`
    async fn put(&self, table: &str, record: Record) -> Result<(), AppError>;
}
