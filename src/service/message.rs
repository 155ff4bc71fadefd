//! Message service
//!
//! Stores chat messages and lists the messages of a chat.

use std::sync::Arc;

use crate::data::{CHAT_ID, EntityId, Filter, Item, Message, RecordStore, map_scan};
use crate::error::AppError;

/// Message service
pub struct MessageService {
    store: Arc<dyn RecordStore>,
    messages_table: String,
}

impl MessageService {
    /// Create new message service
    pub fn new(store: Arc<dyn RecordStore>, messages_table: impl Into<String>) -> Self {
        Self {
            store,
            messages_table: messages_table.into(),
        }
    }

    /// Compose and store a new message
    ///
    /// # Arguments
    /// * `chat_id` - Chat the message belongs to
    /// * `sender_id` - Author
    /// * `text` - Message body, if any
    /// * `image` - `(image, preview)` references, if any
    ///
    /// # Returns
    /// The stored message, with a fresh id and `date_sent` set to now
    pub async fn send_message(
        &self,
        chat_id: &str,
        sender_id: &str,
        text: Option<String>,
        image: Option<(String, String)>,
    ) -> Result<Message, AppError> {
        if chat_id.is_empty() || sender_id.is_empty() {
            return Err(AppError::Validation(
                "chat id and sender id are required".to_string(),
            ));
        }
        if text.is_none() && image.is_none() {
            return Err(AppError::Validation(
                "message needs text or an image".to_string(),
            ));
        }

        let (message_image, message_image_preview) = match image {
            Some((image, preview)) => (Some(image), Some(preview)),
            None => (None, None),
        };

        let message = Message {
            id: EntityId::new().0,
            chat_id: chat_id.to_string(),
            message_text: text,
            message_image,
            message_image_preview,
            sender_id: sender_id.to_string(),
            date_sent: chrono::Utc::now().to_rfc3339(),
        };

        self.save_message(&message).await?;
        Ok(message)
    }

    /// Store a message built by the caller
    pub async fn save_message(&self, message: &Message) -> Result<(), AppError> {
        self.store
            .put(&self.messages_table, message.to_record())
            .await?;

        tracing::debug!(
            message_id = %message.id,
            chat_id = %message.chat_id,
            "Message saved"
        );
        Ok(())
    }

    /// Get all messages of a chat, in store order
    ///
    /// Only the first scan batch is read. Malformed messages are
    /// skipped.
    pub async fn messages_for_chat(&self, chat_id: &str) -> Result<Vec<Message>, AppError> {
        if chat_id.is_empty() {
            return Err(AppError::Validation("chat id cannot be empty".to_string()));
        }

        let records = self
            .store
            .scan(&self.messages_table, &Filter::equals(CHAT_ID, chat_id))
            .await?;
        Ok(map_scan(&self.messages_table, records))
    }
}
