//! Record mapping
//!
//! Conversions between raw attribute maps and the typed models.
//! Pure functions; a missing required attribute is a
//! `MalformedRecord` error and it is up to the caller whether to skip it.

use super::models::{Friend, Message, User};
use super::record::{AttributeValue, KEY_ATTRIBUTE, Record, string_attribute};
use crate::error::AppError;

/// A model that can be stored as a record
pub trait Item: Sized {
    /// Short model name used in error messages
    const KIND: &'static str;

    fn from_record(record: &Record) -> Result<Self, AppError>;

    fn to_record(&self) -> Record;
}

fn required(record: &Record, kind: &str, name: &str) -> Result<String, AppError> {
    string_attribute(record, name)
        .map(str::to_string)
        .ok_or_else(|| AppError::MalformedRecord(format!("{kind} record has no string `{name}`")))
}

fn optional(record: &Record, name: &str) -> Option<String> {
    string_attribute(record, name).map(str::to_string)
}

fn put_string(record: &mut Record, name: &str, value: &str) {
    record.insert(name.to_string(), AttributeValue::S(value.to_string()));
}

fn put_optional(record: &mut Record, name: &str, value: Option<&String>) {
    if let Some(value) = value {
        put_string(record, name, value);
    }
}

const USERNAME: &str = "username";
const EMAIL: &str = "email";

impl Item for User {
    const KIND: &'static str = "user";

    fn from_record(record: &Record) -> Result<Self, AppError> {
        let id = required(record, Self::KIND, KEY_ATTRIBUTE)?;
        let attributes = record
            .iter()
            .filter(|(name, _)| !matches!(name.as_str(), KEY_ATTRIBUTE | USERNAME | EMAIL))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(User {
            id,
            username: optional(record, USERNAME),
            email: optional(record, EMAIL),
            attributes,
        })
    }

    fn to_record(&self) -> Record {
        let mut record = self.attributes.clone();
        put_string(&mut record, KEY_ATTRIBUTE, &self.id);
        put_optional(&mut record, USERNAME, self.username.as_ref());
        put_optional(&mut record, EMAIL, self.email.as_ref());
        record
    }
}

pub(crate) const USER_ID: &str = "user_id";
pub(crate) const FRIEND_ID: &str = "friend_id";

impl Item for Friend {
    const KIND: &'static str = "friend";

    fn from_record(record: &Record) -> Result<Self, AppError> {
        Ok(Friend {
            id: required(record, Self::KIND, KEY_ATTRIBUTE)?,
            user_id: required(record, Self::KIND, USER_ID)?,
            friend_id: required(record, Self::KIND, FRIEND_ID)?,
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new();
        put_string(&mut record, KEY_ATTRIBUTE, &self.id);
        put_string(&mut record, USER_ID, &self.user_id);
        put_string(&mut record, FRIEND_ID, &self.friend_id);
        record
    }
}

pub(crate) const CHAT_ID: &str = "chat_id";
const MESSAGE_TEXT: &str = "message_text";
const MESSAGE_IMAGE: &str = "message_image";
/// Stored spelling of the preview attribute; existing tables use it
const MESSAGE_IMAGE_PREVIEW: &str = "mesage_image_preview";
const SENDER_ID: &str = "sender_id";
const DATE_SENT: &str = "date_sent";

impl Item for Message {
    const KIND: &'static str = "message";

    fn from_record(record: &Record) -> Result<Self, AppError> {
        Ok(Message {
            id: required(record, Self::KIND, KEY_ATTRIBUTE)?,
            chat_id: required(record, Self::KIND, CHAT_ID)?,
            message_text: optional(record, MESSAGE_TEXT),
            message_image: optional(record, MESSAGE_IMAGE),
            message_image_preview: optional(record, MESSAGE_IMAGE_PREVIEW),
            sender_id: required(record, Self::KIND, SENDER_ID)?,
            date_sent: required(record, Self::KIND, DATE_SENT)?,
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new();
        put_string(&mut record, KEY_ATTRIBUTE, &self.id);
        put_string(&mut record, CHAT_ID, &self.chat_id);
        put_optional(&mut record, MESSAGE_TEXT, self.message_text.as_ref());
        put_optional(&mut record, MESSAGE_IMAGE, self.message_image.as_ref());
        put_optional(
            &mut record,
            MESSAGE_IMAGE_PREVIEW,
            self.message_image_preview.as_ref(),
        );
        put_string(&mut record, SENDER_ID, &self.sender_id);
        put_string(&mut record, DATE_SENT, &self.date_sent);
        record
    }
}

/// Map every record of a scan, dropping the ones that do not map
///
/// Order of the input is preserved. Dropped records are logged and
/// counted against `table`.
pub fn map_scan<T: Item>(table: &str, records: Vec<Record>) -> Vec<T> {
    let mut items = Vec::with_capacity(records.len());
    for record in records {
        match T::from_record(&record) {
            Ok(item) => items.push(item),
            Err(error) => {
                tracing::debug!(table = %table, %error, "Skipping malformed {}", T::KIND);
                crate::metrics::SKIPPED_RECORDS_TOTAL
                    .with_label_values(&[table])
                    .inc();
            }
        }
    }
    items
}
