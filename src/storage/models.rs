//! Database models for recorded thread replies

use chrono::{SecondsFormat, Utc};

/// One reply row, linked to a `messages.id`
#[derive(Debug, Clone)]
pub struct ThreadReply {
    /// Id of the parent message the thread points back to
    pub message_id: i64,
    /// Display text of the reply
    pub reply_content: String,
    /// When the reply was recorded (RFC 3339, UTC, second precision)
    pub reply_at: String,
}

impl ThreadReply {
    /// Create a reply stamped with the current time
    pub fn new(message_id: i64, reply_content: String) -> Self {
        Self {
            message_id,
            reply_content,
            reply_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
