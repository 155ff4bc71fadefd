//! Data models
//!
//! Typed views of the three tables. New ids are ULIDs.

use serde::{Deserialize, Serialize};

use super::record::Record;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// User
// =============================================================================

/// A directory entry
///
/// Created by the registration flow elsewhere; read-only here.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    /// Remaining profile attributes, carried through untouched
    pub attributes: Record,
}

impl User {
    /// User with only an id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
            email: None,
            attributes: Record::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

// =============================================================================
// Friend
// =============================================================================

/// Directed friendship edge `user_id -> friend_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Friend {
    pub id: String,
    /// Owner of the edge
    pub user_id: String,
    /// Target of the edge
    pub friend_id: String,
}

impl Friend {
    /// New edge with a freshly generated id
    pub fn new(user_id: impl Into<String>, friend_id: impl Into<String>) -> Self {
        Self {
            id: EntityId::new().0,
            user_id: user_id.into(),
            friend_id: friend_id.into(),
        }
    }
}

// =============================================================================
// Message
// =============================================================================

/// A chat message. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub message_text: Option<String>,
    /// Reference to a full-size image
    pub message_image: Option<String>,
    /// Reference to the image thumbnail
    pub message_image_preview: Option<String>,
    pub sender_id: String,
    /// Send time as stored; format is not validated
    pub date_sent: String,
}
