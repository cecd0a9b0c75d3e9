//! Configuration management

use anyhow::{Context, Result};

/// Service configuration, loaded from the environment once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Slack signing secret for webhook signature verification
    pub signing_secret: String,

    /// Bot User OAuth token for Slack Web API calls (xoxb-...)
    pub bot_token: String,

    /// Channel whose thread replies are recorded
    pub target_channel: String,

    /// Database connection URL, e.g. `sqlite://replies.db`
    pub database_url: String,

    /// Webhook server bind address
    pub listen_addr: String,

    /// Slack Web API base URL (tests point this at a local mock)
    pub api_base: String,

    /// Enable debug mode (log raw event payloads)
    pub debug_mode: bool,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_api_base() -> String {
    "https://slack.com/api".to_string()
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            signing_secret: std::env::var("SLACK_SIGNING_SECRET")
                .context("SLACK_SIGNING_SECRET is required")?,
            bot_token: std::env::var("SLACK_BOT_TOKEN").context("SLACK_BOT_TOKEN is required")?,
            target_channel: std::env::var("SLACK_TARGET_CHANNEL")
                .context("SLACK_TARGET_CHANNEL is required")?,
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL is required")?,
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| default_listen_addr()),
            api_base: std::env::var("SLACK_API_BASE").unwrap_or_else(|_| default_api_base()),
            debug_mode: std::env::var("DEBUG_MODE").is_ok(),
        })
    }
}
