// SPDX-License-Identifier: MIT

use super::*;

fn base() -> RelayConfig {
    RelayConfig {
        listen: "127.0.0.1:8787".into(),
        token: None,
        stale_secs: 30,
        idle_alert_secs: 600,
        alert_keywords: None,
        alert_cooldown_secs: 300,
        webhooks: None,
        bot_url: None,
        bot_chat_id: None,
    }
}

#[test]
fn alert_keywords_split_trim_lowercase_and_drop_empty() {
    let cfg = RelayConfig { alert_keywords: Some(" Error ,, PANIC".into()), ..base() };
    assert_eq!(cfg.alert_keywords(), vec!["error".to_string(), "panic".to_string()]);
}

#[test]
fn webhook_urls_split_and_trim() {
    let cfg = RelayConfig { webhooks: Some("http://a, http://b".into()), ..base() };
    assert_eq!(cfg.webhook_urls(), vec!["http://a".to_string(), "http://b".to_string()]);
}

#[test]
fn empty_lists_default_to_empty_vec() {
    let cfg = base();
    assert!(cfg.alert_keywords().is_empty());
    assert!(cfg.webhook_urls().is_empty());
}
