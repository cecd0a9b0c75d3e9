//! Slack Web API client
//!
//! Fetches the root message of a thread via `conversations.replies` and
//! extracts the correlation token embedded in its display text.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

/// Timeout for calls to the Slack Web API.
const API_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack Web API client
#[derive(Clone)]
pub struct SlackApiClient {
    api_base: String,
    bot_token: String,
    http_client: Client,
}

/// Response from `conversations.replies`
#[derive(Debug, Deserialize)]
struct RepliesResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<ThreadMessage>,
}

/// A single message within a thread
#[derive(Debug, Deserialize)]
struct ThreadMessage {
    #[serde(default)]
    text: Option<String>,
}

impl SlackApiClient {
    /// Create a new Slack API client
    pub fn new(api_base: impl Into<String>, bot_token: impl Into<String>) -> Self {
        let api_base: String = api_base.into();
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            http_client: Client::builder().timeout(API_TIMEOUT).build().unwrap(),
        }
    }

    /// Fetch the display text of a thread's root message
    ///
    /// `conversations.replies` called with the thread timestamp and
    /// `limit=1` returns the root as the first message. Transport errors,
    /// non-success statuses, API-level failures and empty results are all
    /// logged and reported as `None`.
    pub async fn fetch_thread_parent_text(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> Option<String> {
        let url = format!("{}/conversations.replies", self.api_base);

        let response = match self
            .http_client
            .get(&url)
            .bearer_auth(&self.bot_token)
            .query(&[("channel", channel), ("ts", thread_ts), ("limit", "1")])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Slack conversations.replies request failed: {}", e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Slack conversations.replies returned {}", status);
            return None;
        }

        let payload: RepliesResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to parse conversations.replies response: {}", e);
                return None;
            }
        };

        if !payload.ok {
            warn!(
                "Slack conversations.replies error: {}",
                payload.error.as_deref().unwrap_or("unknown")
            );
            return None;
        }

        match payload.messages.into_iter().next().and_then(|m| m.text) {
            Some(text) => {
                debug!("Fetched parent message for thread {}", thread_ts);
                Some(text)
            }
            None => {
                warn!("Thread {} returned no parent message text", thread_ts);
                None
            }
        }
    }
}

/// Pull the correlation token out of a parent message's display text.
///
/// Upstream embeds the token in bracket-delimited, backtick-quoted syntax,
/// e.g. ``"Deploy finished [`abc123`]"``. Everything after the last `[` is
/// taken, backticks and `]` are stripped, and the remainder trimmed. Text
/// without a `[` degrades to the whole trimmed string, which will almost
/// never match a stored message; the upstream formatting convention is the
/// only thing holding this link together.
pub fn extract_correlation_token(text: &str) -> String {
    let tail = match text.rfind('[') {
        Some(idx) => &text[idx + 1..],
        None => text,
    };
    tail.chars()
        .filter(|c| *c != '`' && *c != ']')
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_extract_bracketed_token() {
        assert_eq!(extract_correlation_token("Some msg [`abc123`]"), "abc123");
    }

    #[test]
    fn test_extract_takes_last_bracket() {
        assert_eq!(
            extract_correlation_token("queue [build] done [`xyz`]"),
            "xyz"
        );
    }

    #[test]
    fn test_extract_without_bracket_degrades_to_whole_string() {
        // Known gap: no delimiter means the whole text is treated as the
        // token, which in practice matches nothing.
        assert_eq!(extract_correlation_token("  no delimiter here "), "no delimiter here");
    }

    #[test]
    fn test_extract_strips_quoting_and_whitespace() {
        assert_eq!(extract_correlation_token("x [ `tok-9` ] "), "tok-9");
    }

    #[tokio::test]
    async fn test_fetch_parent_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/conversations.replies")
                    .query_param("channel", "C1")
                    .query_param("ts", "111.222")
                    .query_param("limit", "1");
                then.status(200).json_body(serde_json::json!({
                    "ok": true,
                    "messages": [{"text": "Some msg [`abc123`]"}]
                }));
            })
            .await;

        let client = SlackApiClient::new(server.base_url(), "xoxb-test");
        let text = client.fetch_thread_parent_text("C1", "111.222").await;

        mock.assert_async().await;
        assert_eq!(text.as_deref(), Some("Some msg [`abc123`]"));
    }

    #[tokio::test]
    async fn test_fetch_api_error_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/conversations.replies");
                then.status(200)
                    .json_body(serde_json::json!({"ok": false, "error": "thread_not_found"}));
            })
            .await;

        let client = SlackApiClient::new(server.base_url(), "xoxb-test");
        assert!(client.fetch_thread_parent_text("C1", "1.2").await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_empty_thread_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/conversations.replies");
                then.status(200)
                    .json_body(serde_json::json!({"ok": true, "messages": []}));
            })
            .await;

        let client = SlackApiClient::new(server.base_url(), "xoxb-test");
        assert!(client.fetch_thread_parent_text("C1", "1.2").await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_http_error_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/conversations.replies");
                then.status(500);
            })
            .await;

        let client = SlackApiClient::new(server.base_url(), "xoxb-test");
        assert!(client.fetch_thread_parent_text("C1", "1.2").await.is_none());
    }
}
