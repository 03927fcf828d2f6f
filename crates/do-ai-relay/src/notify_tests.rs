// SPDX-License-Identifier: MIT

use super::*;
use do_ai_proto::{Session, SessionState};

fn base_session() -> Session {
    Session {
        session_id: "s1".into(),
        session_name: "codex".into(),
        host: String::new(),
        cwd: String::new(),
        command: String::new(),
        state: SessionState::Running,
        exit_code: None,
        started_at: 0,
        updated_at: 0,
        last_output_at: 0,
        last_kick_at: 0,
        idle_seconds: 0,
        kick_count: 0,
        last_text: String::new(),
    }
}

#[test]
fn idle_alert_fires_when_threshold_reached() {
    let s = Session { idle_seconds: 600, ..base_session() };
    let alerts = evaluate(&s, 600, &[]);
    assert!(alerts.iter().any(|a| a.key == "idle:s1"));
}

#[test]
fn idle_alert_does_not_fire_for_non_running_state() {
    let s = Session { idle_seconds: 9999, state: SessionState::Stopping, ..base_session() };
    let alerts = evaluate(&s, 600, &[]);
    assert!(!alerts.iter().any(|a| a.key.starts_with("idle:")));
}

#[test]
fn keyword_match_is_case_insensitive_substring() {
    let s = Session { last_text: "Fatal ERROR in worker".into(), ..base_session() };
    let alerts = evaluate(&s, u64::MAX, &["error".to_string()]);
    assert!(alerts.iter().any(|a| a.key == "keyword:s1:error"));
}

#[test]
fn exit_alert_only_for_nonzero_code() {
    let clean = Session { state: SessionState::Exited, exit_code: Some(0), ..base_session() };
    assert!(evaluate(&clean, u64::MAX, &[]).is_empty());

    let failed = Session { state: SessionState::Exited, exit_code: Some(1), ..base_session() };
    let alerts = evaluate(&failed, u64::MAX, &[]);
    assert!(alerts.iter().any(|a| a.key == "exit:s1"));
}

#[test]
fn notifier_is_configured_reflects_webhooks_or_bot() {
    assert!(!Notifier::default().is_configured());
    assert!(Notifier::new(vec!["http://x".into()], None, None).is_configured());
    assert!(Notifier::new(vec![], Some("http://bot".into()), None).is_configured());
}
