//! Common test utilities for E2E tests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use friendsync::FriendSync;
use friendsync::config::{
    AppConfig, DynamoDbConfig, LoggingConfig, SqliteConfig, StoreBackend, StoreConfig,
    TableConfig,
};
use friendsync::data::{Filter, Friend, Item, MemoryStore, Record, RecordStore, User};
use friendsync::error::AppError;

/// Test configuration for the given backend
pub fn test_config(backend: StoreBackend, sqlite: SqliteConfig) -> AppConfig {
    AppConfig {
        store: StoreConfig {
            backend,
            sqlite,
            dynamodb: DynamoDbConfig::default(),
        },
        tables: TableConfig::default(),
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
    }
}

/// Memory store that can be told to fail directory scans
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_user_scans: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn fail_user_scans(&self, fail: bool) {
        self.fail_user_scans.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn get(&self, table: &str, key: &str) -> Result<Option<Record>, AppError> {
        self.inner.get(table, key).await
    }

    async fn scan(&self, table: &str, filter: &Filter) -> Result<Vec<Record>, AppError> {
        if table == "User" && self.fail_user_scans.load(Ordering::SeqCst) {
            return Err(AppError::Transport(
                "RequestLimitExceeded: throughput exceeds the account limit".to_string(),
            ));
        }
        self.inner.scan(table, filter).await
    }

    async fn put(&self, table: &str, record: Record) -> Result<(), AppError> {
        self.inner.put(table, record).await
    }
}

/// Client over a flaky in-memory store
pub fn flaky_client() -> (FriendSync, FlakyStore) {
    let store = FlakyStore::default();
    let config = test_config(StoreBackend::Memory, SqliteConfig::default());
    (FriendSync::with_store(config, Arc::new(store.clone())), store)
}

/// Seed users in the given order
pub async fn seed_users(store: &dyn RecordStore, ids: &[&str]) {
    for id in ids {
        store
            .put("User", User::new(*id).with_username(format!("name-{id}")).to_record())
            .await
            .unwrap();
    }
}

/// Seed directed edges
pub async fn seed_edges(store: &dyn RecordStore, edges: &[(&str, &str)]) {
    for (owner, target) in edges {
        store
            .put("Friend", Friend::new(*owner, *target).to_record())
            .await
            .unwrap();
    }
}

/// Ids of a cached list
pub fn ids(users: &[Arc<User>]) -> Vec<String> {
    users.iter().map(|u| u.id.clone()).collect()
}
