//! Relationship resolver
//!
//! Looks up the outgoing friend edges of a user.

use std::sync::Arc;

use crate::data::{FRIEND_ID, Filter, RecordStore, USER_ID, string_attribute};
use crate::error::AppError;

/// Resolves a user's friend ids from the friend-edge table
pub struct RelationshipResolver {
    store: Arc<dyn RecordStore>,
    friends_table: String,
}

impl RelationshipResolver {
    /// Create new resolver over `friends_table`
    pub fn new(store: Arc<dyn RecordStore>, friends_table: impl Into<String>) -> Self {
        Self {
            store,
            friends_table: friends_table.into(),
        }
    }

    /// Get the ids of everyone `user_id` has befriended
    ///
    /// Scans the edge table filtered on `user_id`. Edges missing either
    /// end are skipped. No edges at all is an empty list, not an error.
    ///
    /// # Errors
    /// `Validation` for an empty id; store errors are passed through
    /// unchanged and never retried
    pub async fn resolve_friend_ids(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        if user_id.is_empty() {
            return Err(AppError::Validation("user id cannot be empty".to_string()));
        }

        let records = self
            .store
            .scan(&self.friends_table, &Filter::equals(USER_ID, user_id))
            .await?;

        let total = records.len();
        let friend_ids: Vec<String> = records
            .iter()
            .filter(|record| string_attribute(record, USER_ID).is_some())
            .filter_map(|record| string_attribute(record, FRIEND_ID))
            .map(str::to_string)
            .collect();

        if friend_ids.len() < total {
            tracing::debug!(
                user_id = %user_id,
                skipped = total - friend_ids.len(),
                "Skipped incomplete friend edges"
            );
        }
        tracing::debug!(user_id = %user_id, count = friend_ids.len(), "Resolved friend ids");

        Ok(friend_ids)
    }
}
