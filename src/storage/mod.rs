//! Storage for parent messages and their recorded thread replies
//!
//! `messages` is written by an external ingestion path; this service only
//! reads it. `replies` is insert-only from here.

mod models;
mod sqlite;

pub use models::ThreadReply;
pub use sqlite::{MessageStore, StorageError, StorageResult};
