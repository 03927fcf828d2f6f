// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn kick_fires_once_both_thresholds_are_met() {
    assert!(kick_due(10, 20_000, 5_000, 0));
    assert!(!kick_due(10, 20_000, 15_000, 0)); // since_out = 5s < 10s
}

#[test]
fn kick_disabled_when_idle_is_zero() {
    assert!(!kick_due(0, 1_000_000, 0, 0));
}

#[test]
fn kick_respects_since_kick_after_a_previous_injection() {
    // last_injection_ms = 18_000, now = 20_000 -> since_kick = 2s, below idle.
    assert!(!kick_due(10, 20_000, 0, 18_000));
    // now = 30_000 -> since_kick = 12s, at/above idle; since_out also satisfied.
    assert!(kick_due(10, 30_000, 0, 18_000));
}

#[test]
fn first_kick_is_not_suppressed_by_a_zero_last_injection_sentinel() {
    // last_injection_ms == 0 means "never kicked", not "kicked at epoch".
    assert!(kick_due(5, 10_000, 0, 0));
}

#[test]
fn calibration_kick_fires_every_kth() {
    assert!(!is_calibration_kick(1, 5));
    assert!(!is_calibration_kick(4, 5));
    assert!(is_calibration_kick(5, 5));
    assert!(is_calibration_kick(10, 5));
}

#[test]
fn calibration_disabled_when_period_is_zero() {
    assert!(!is_calibration_kick(5, 0));
}

fn test_info() -> SessionInfo {
    SessionInfo {
        session_id: "s1".into(),
        session_name: "codex".into(),
        host: "host1".into(),
        cwd: "/tmp".into(),
        command_line: "codex".into(),
        started_at: 1000,
        message_main: "main".into(),
        message_calib: "calib".into(),
        calib_period: 5,
    }
}

#[test]
fn build_session_reports_running_state_with_no_exit_code() {
    let shared = Shared::new();
    let session = build_session(&test_info(), &shared, SessionState::Running, None);
    assert_eq!(session.session_id, "s1");
    assert_eq!(session.state, SessionState::Running);
    assert!(session.exit_code.is_none());
    assert!(session.invariants_hold());
}

#[test]
fn build_session_reports_exited_state_with_exit_code() {
    let shared = Shared::new();
    let session = build_session(&test_info(), &shared, SessionState::Exited, Some(0));
    assert_eq!(session.state, SessionState::Exited);
    assert_eq!(session.exit_code, Some(0));
    assert!(session.invariants_hold());
}

#[test]
fn build_session_idle_seconds_tracks_last_meaningful_output() {
    let shared = Shared::new();
    shared.last_meaningful_output_ms.store(now_ms().saturating_sub(5_000), Ordering::Relaxed);
    let session = build_session(&test_info(), &shared, SessionState::Running, None);
    assert!(session.idle_seconds >= 4 && session.idle_seconds <= 6);
}

#[test]
fn terminal_size_never_returns_a_zero_dimension() {
    let (cols, rows) = terminal_size();
    assert!(cols > 0);
    assert!(rows > 0);
}

#[test]
fn hostname_is_never_empty() {
    assert!(!hostname().is_empty());
}
