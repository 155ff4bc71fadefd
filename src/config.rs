//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub tables: TableConfig,
    pub logging: LoggingConfig,
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Which backend to talk to
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub sqlite: SqliteConfig,
    #[serde(default)]
    pub dynamodb: DynamoDbConfig,
}

/// Store backend selector
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Volatile in-process tables
    #[default]
    Memory,
    /// Local SQLite file
    Sqlite,
    /// Managed DynamoDB tables
    Dynamodb,
}

/// Local SQLite store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/friendsync.db"),
        }
    }
}

/// DynamoDB configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DynamoDbConfig {
    /// AWS region (e.g., "us-east-1")
    #[serde(default = "default_region")]
    pub region: String,
    /// Endpoint override, e.g. "http://localhost:8000" for DynamoDB Local
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Session token for temporary credentials
    pub session_token: Option<String>,
}

impl Default for DynamoDbConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
        }
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Table names
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    /// User directory (default: "User")
    pub users: String,
    /// Friend edges (default: "Friend")
    pub friends: String,
    /// Chat messages (default: "Message")
    pub messages: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            users: "User".to_string(),
            friends: "Friend".to_string(),
            messages: "Message".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (FRIENDSYNC__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("store.backend", "memory")?
            .set_default("store.sqlite.path", "data/friendsync.db")?
            .set_default("store.dynamodb.region", "us-east-1")?
            .set_default("tables.users", "User")?
            .set_default("tables.friends", "Friend")?
            .set_default("tables.messages", "Message")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (FRIENDSYNC__*)
            .add_source(
                Environment::with_prefix("FRIENDSYNC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        for (name, value) in [
            ("tables.users", &self.tables.users),
            ("tables.friends", &self.tables.friends),
            ("tables.messages", &self.tables.messages),
        ] {
            if value.trim().is_empty() {
                return Err(crate::error::AppError::Config(format!(
                    "{name} must not be empty"
                )));
            }
        }

        if self.store.backend == StoreBackend::Dynamodb {
            let dynamodb = &self.store.dynamodb;
            if dynamodb.access_key_id.is_none() || dynamodb.secret_access_key.is_none() {
                return Err(crate::error::AppError::Config(
                    "store.dynamodb.access_key_id and store.dynamodb.secret_access_key are required when store.backend=dynamodb"
                        .to_string(),
                ));
            }
            if dynamodb.region.trim().is_empty() {
                return Err(crate::error::AppError::Config(
                    "store.dynamodb.region must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
