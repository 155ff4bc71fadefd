//! Error types for friendsync
//!
//! Every fallible operation returns `AppError`. Store backends map
//! their native failures onto the tagged variants below so callers
//! can tell a missing key from a network failure.

use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Transport or store failure (network, auth, throttling, bad response)
    #[error("Store transport error: {0}")]
    Transport(String),

    /// Single-key lookup found nothing
    #[error("Record not found: {table}/{key}")]
    NotFound { table: String, key: String },

    /// Record is missing a required attribute or holds the wrong type
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Caller supplied an invalid argument
    #[error("Validation error: {0}")]
    Validation(String),

    /// Local SQLite store error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything the backends could not classify
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Short label used for logging and the error metric
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Transport(_) => "transport",
            AppError::NotFound { .. } => "not_found",
            AppError::MalformedRecord(_) => "malformed_record",
            AppError::Validation(_) => "validation",
            AppError::Database(_) => "database",
            AppError::Config(_) => "config",
            AppError::Unknown(_) => "unknown",
        }
    }

    /// Numeric error code
    ///
    /// Codes are stable and grouped: 1xx caller errors, 2xx store errors,
    /// 3xx local failures.
    pub fn code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 100,
            AppError::NotFound { .. } => 104,
            AppError::Transport(_) => 200,
            AppError::MalformedRecord(_) => 201,
            AppError::Unknown(_) => 299,
            AppError::Database(_) => 300,
            AppError::Config(_) => 301,
        }
    }

    pub(crate) fn record(&self) {
        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[self.kind()]).inc();
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinct_from_transport() {
        let missing = AppError::NotFound {
            table: "User".to_string(),
            key: "u9".to_string(),
        };
        let transport = AppError::Transport("connection reset".to_string());

        assert_eq!(missing.kind(), "not_found");
        assert_eq!(transport.kind(), "transport");
        assert_ne!(missing.code(), transport.code());
        assert_eq!(missing.to_string(), "Record not found: User/u9");
    }

    #[test]
    fn config_error_converts() {
        let err: AppError = config::ConfigError::Message("bad value".to_string()).into();
        assert!(matches!(err, AppError::Config(message) if message.contains("bad value")));
    }
}
