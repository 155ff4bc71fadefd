//! Data layer module
//!
//! Handles record access and session caching:
//! - Record store trait and local backends (memory, SQLite)
//! - Record mapping to typed models
//! - Session cache (volatile)

mod cache;
mod database;
mod mapper;
mod memory;
mod models;
mod record;
mod store;

pub use cache::SessionCache;
pub use database::SqliteStore;
pub use mapper::{Item, map_scan};
pub(crate) use mapper::{CHAT_ID, FRIEND_ID, USER_ID};
pub use memory::MemoryStore;
pub use models::*;
pub use record::{AttributeValue, Filter, KEY_ATTRIBUTE, Record, record_key, string_attribute};
pub use store::RecordStore;

#[cfg(test)]
pub use store::MockRecordStore;
