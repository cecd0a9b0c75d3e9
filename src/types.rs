//! Wire types for the Slack Events API

use serde::Deserialize;

/// Top-level payload of `POST /slack/events`
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    /// `url_verification` or `event_callback`
    #[serde(rename = "type")]
    pub kind: String,

    /// Present on `url_verification` handshakes
    #[serde(default)]
    pub challenge: Option<String>,

    /// Present on `event_callback` payloads
    #[serde(default)]
    pub event: Option<MessageEvent>,
}

/// Inner event object of an `event_callback`
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Set on edits, deletes, joins and other non-plain messages
    #[serde(default)]
    pub subtype: Option<String>,

    /// Set when the sender is a bot — ignore those
    #[serde(default)]
    pub bot_id: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub channel: Option<String>,

    /// Timestamp of this message, unique within the channel
    #[serde(default)]
    pub ts: Option<String>,

    /// Timestamp of the thread root; present only on threaded messages
    #[serde(default)]
    pub thread_ts: Option<String>,
}

impl MessageEvent {
    /// Whether this event is a threaded reply worth recording: a plain user
    /// message in `target_channel` whose `thread_ts` points at another
    /// message (the thread root carries `thread_ts == ts`).
    pub fn is_thread_reply_in(&self, target_channel: &str) -> bool {
        if self.kind != "message" || self.subtype.is_some() || self.bot_id.is_some() {
            return false;
        }
        if self.channel.as_deref() != Some(target_channel) {
            return false;
        }
        match (self.thread_ts.as_deref(), self.ts.as_deref()) {
            (Some(thread_ts), Some(ts)) => thread_ts != ts,
            _ => false,
        }
    }
}
