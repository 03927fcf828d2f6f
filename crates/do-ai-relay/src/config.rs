// SPDX-License-Identifier: MIT

//! `clap::Args` for the `do-ai relay` subcommand, shaped like the teacher's
//! `coop_mux::config::MuxConfig`.

use clap::Args;

#[derive(Debug, Clone, Args)]
pub struct RelayConfig {
    /// Address to listen on, `host:port`.
    #[arg(long, default_value = "127.0.0.1:8787", env = "DO_AI_RELAY_LISTEN")]
    pub listen: String,

    /// Bearer token required of every non-exempt request. Empty disables auth.
    #[arg(long, env = "DO_AI_RELAY_TOKEN")]
    pub token: Option<String>,

    /// Sessions with `updated_at` older than this many seconds are offline.
    #[arg(long, default_value_t = 30, env = "DO_AI_RELAY_STALE_SECS")]
    pub stale_secs: u64,

    /// Idle-seconds threshold past which an "idle exceeded" alert fires.
    #[arg(long, default_value_t = 600, env = "DO_AI_RELAY_IDLE_ALERT_SECS")]
    pub idle_alert_secs: u64,

    /// Comma-separated case-insensitive substrings of `last_text` that
    /// trigger a "keyword matched" alert.
    #[arg(long, env = "DO_AI_RELAY_ALERT_KEYWORDS")]
    pub alert_keywords: Option<String>,

    /// Minimum seconds between repeat alerts for the same key.
    #[arg(long, default_value_t = 300, env = "DO_AI_RELAY_ALERT_COOLDOWN_SECS")]
    pub alert_cooldown_secs: u64,

    /// Webhook URLs to notify on alert (comma-separated).
    #[arg(long, env = "DO_AI_RELAY_WEBHOOKS")]
    pub webhooks: Option<String>,

    /// Messaging-bot `sendMessage` endpoint (e.g. a Telegram bot API URL).
    #[arg(long, env = "DO_AI_RELAY_BOT_URL")]
    pub bot_url: Option<String>,

    /// Chat id passed to the messaging-bot endpoint.
    #[arg(long, env = "DO_AI_RELAY_BOT_CHAT_ID")]
    pub bot_chat_id: Option<String>,
}

impl RelayConfig {
    pub fn alert_keywords(&self) -> Vec<String> {
        self.alert_keywords
            .as_deref()
            .map(|s| s.split(',').map(|k| k.trim().to_lowercase()).filter(|k| !k.is_empty()).collect())
            .unwrap_or_default()
    }

    pub fn webhook_urls(&self) -> Vec<String> {
        self.webhooks
            .as_deref()
            .map(|s| s.split(',').map(|u| u.trim().to_owned()).filter(|u| !u.is_empty()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
