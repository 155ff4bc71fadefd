//! Service layer
//!
//! Contains the refresh pipelines and record operations.
//! Services orchestrate the record store and the session cache.

mod directory;
mod message;
mod relationship;

pub use directory::DirectoryService;
pub use message::MessageService;
pub use relationship::RelationshipResolver;
