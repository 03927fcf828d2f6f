// SPDX-License-Identifier: MIT

//! Alert fan-out to webhooks and a messaging bot (§4.7). Dispatch is
//! best-effort, off the request path, with a 5s per-delivery deadline and
//! no retry. Grounded on the teacher's `reqwest` usage in
//! `cli::mux_client` (bounded-timeout client, fire-and-log errors).

use std::time::Duration;

use serde_json::json;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default)]
pub struct Notifier {
    webhook_urls: Vec<String>,
    bot_url: Option<String>,
    bot_chat_id: Option<String>,
}

impl Notifier {
    pub fn new(webhook_urls: Vec<String>, bot_url: Option<String>, bot_chat_id: Option<String>) -> Self {
        Self { webhook_urls, bot_url, bot_chat_id }
    }

    pub fn is_configured(&self) -> bool {
        !self.webhook_urls.is_empty() || self.bot_url.is_some()
    }

    /// Fire `title`/`message` at every configured destination. Intended to
    /// be spawned off the caller's task so a slow or unreachable
    /// destination never delays an HTTP response.
    pub async fn dispatch(&self, title: &str, message: &str) {
        let Ok(client) = reqwest::Client::builder().timeout(DELIVERY_TIMEOUT).build() else {
            tracing::debug!("notifier: failed to build http client");
            return;
        };

        for url in &self.webhook_urls {
            let body = json!({ "title": title, "message": message, "text": message });
            if let Err(e) = client.post(url).json(&body).send().await {
                tracing::debug!(url = %url, err = %e, "notifier: webhook delivery failed");
            }
        }

        if let Some(ref bot_url) = self.bot_url {
            let body = json!({ "chat_id": self.bot_chat_id, "text": message });
            if let Err(e) = client.post(bot_url).json(&body).send().await {
                tracing::debug!(url = %bot_url, err = %e, "notifier: bot delivery failed");
            }
        }
    }
}

/// One derived condition worth notifying about (§4.6 "Alerts"); `key` is
/// the stable cooldown-gate identity.
pub struct Alert {
    pub key: String,
    pub title: String,
    pub message: String,
}

/// Derive zero or more alerts from a freshly-upserted session (§4.6).
pub fn evaluate(
    session: &do_ai_proto::Session,
    idle_threshold_secs: u64,
    keywords: &[String],
) -> Vec<Alert> {
    use do_ai_proto::SessionState;

    let mut alerts = Vec::new();

    if session.state == SessionState::Running && session.idle_seconds >= idle_threshold_secs {
        alerts.push(Alert {
            key: format!("idle:{}", session.session_id),
            title: format!("{} idle", session.session_name),
            message: format!(
                "session {} has been idle for {}s",
                session.session_id, session.idle_seconds
            ),
        });
    }

    let haystack = session.last_text.to_lowercase();
    for kw in keywords {
        if !kw.is_empty() && haystack.contains(kw.as_str()) {
            alerts.push(Alert {
                key: format!("keyword:{}:{}", session.session_id, kw),
                title: format!("{} matched \"{kw}\"", session.session_name),
                message: session.last_text.clone(),
            });
        }
    }

    if session.state == SessionState::Exited && session.exit_code.unwrap_or(0) != 0 {
        alerts.push(Alert {
            key: format!("exit:{}", session.session_id),
            title: format!("{} exited non-zero", session.session_name),
            message: format!("session {} exited with code {:?}", session.session_id, session.exit_code),
        });
    }

    alerts
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
