//! friendsync - friend directory sync over a managed NoSQL table store
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - DirectoryService: resolve → scan → partition → cache     │
//! │  - RelationshipResolver: friend ids of a user               │
//! │  - MessageService: chat messages                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - RecordStore trait + record mapping                       │
//! │  - Memory / SQLite (sqlx) backends                          │
//! │  - SessionCache (volatile)                                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Storage (managed)                          │
//! │  - DynamoDB via the AWS SDK                                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `service`: Refresh pipelines and record operations
//! - `data`: Records, models, local stores and the session cache
//! - `storage`: DynamoDB record store
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;
pub mod storage;

use std::sync::Arc;

/// Wired-up client for one signed-in user
///
/// Owns the record store handle, the services built on it and the
/// session cache they refresh.
pub struct FriendSync {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Record store backend
    pub store: Arc<dyn data::RecordStore>,

    /// Friend/potential-friend lists of this session
    pub session: data::SessionCache,

    /// Refresh pipelines, edges and user lookups
    pub directory: service::DirectoryService,

    /// Chat messages
    pub messages: service::MessageService,
}

impl FriendSync {
    /// Initialize from configuration
    ///
    /// Connects the configured store backend and builds the services.
    ///
    /// # Errors
    /// Returns error if the store cannot be opened
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!(backend = ?config.store.backend, "Initializing record store...");

        let store: Arc<dyn data::RecordStore> = match config.store.backend {
            config::StoreBackend::Memory => {
                tracing::warn!("Using in-memory record store; data is lost on exit");
                Arc::new(data::MemoryStore::new())
            }
            config::StoreBackend::Sqlite => {
                Arc::new(data::SqliteStore::connect(&config.store.sqlite.path).await?)
            }
            config::StoreBackend::Dynamodb => {
                Arc::new(storage::DynamoStore::new(&config.store.dynamodb)?)
            }
        };

        Ok(Self::with_store(config, store))
    }

    /// Build on an existing store
    pub fn with_store(config: config::AppConfig, store: Arc<dyn data::RecordStore>) -> Self {
        let directory = service::DirectoryService::new(
            store.clone(),
            config.tables.users.clone(),
            config.tables.friends.clone(),
        );
        let messages = service::MessageService::new(store.clone(), config.tables.messages.clone());

        Self {
            config: Arc::new(config),
            store,
            session: data::SessionCache::new(),
            directory,
            messages,
        }
    }

    /// Refresh the friend list of `user_id` into this session
    pub async fn refresh_friend_list(&self, user_id: &str) -> Result<(), error::AppError> {
        self.directory
            .refresh_friend_list(&self.session, user_id)
            .await
    }

    /// Refresh the potential-friend list of `user_id` into this session
    pub async fn refresh_potential_friend_list(
        &self,
        user_id: &str,
    ) -> Result<(), error::AppError> {
        self.directory
            .refresh_potential_friend_list(&self.session, user_id)
            .await
    }
}
