// SPDX-License-Identifier: MIT

use super::*;
use serial_test::serial;

#[test]
fn codex_defaults_to_plain_cr() {
    assert_eq!(default_submit_mode("/usr/local/bin/codex"), SubmitMode::Cr);
}

#[test]
fn other_agents_default_to_cr_plus_ctrl_enter() {
    assert_eq!(default_submit_mode("claude"), SubmitMode::EnterPlusCtrl);
}

#[test]
fn submit_mode_parses_all_enumerated_values() {
    for (s, expected) in [
        ("enter", SubmitMode::Enter),
        ("enter-lf", SubmitMode::EnterLf),
        ("lf", SubmitMode::Lf),
        ("cr", SubmitMode::Cr),
        ("ctrl-enter", SubmitMode::CtrlEnter),
        ("csi-enter", SubmitMode::CsiEnter),
        ("alt-enter", SubmitMode::AltEnter),
        ("enter+ctrl", SubmitMode::EnterPlusCtrl),
        ("enter+alt", SubmitMode::EnterPlusAlt),
        ("all", SubmitMode::All),
    ] {
        assert_eq!(SubmitMode::parse(s), Some(expected));
    }
    assert_eq!(SubmitMode::parse("bogus"), None);
}

#[test]
fn clear_mode_parses_backspace_with_count() {
    assert_eq!(ClearMode::parse("backspace:3"), Some(ClearMode::Backspace(3)));
    assert_eq!(ClearMode::parse("backspace:3").unwrap().bytes(), vec![0x08, 0x08, 0x08]);
}

#[test]
fn build_wraps_payload_in_bracketed_paste_and_chunks_it() {
    let policy = InjectionPolicy::new("claude");
    let plan = policy.build(&"x".repeat(100));
    let joined: Vec<u8> = plan.payload_chunks.concat();
    assert!(joined.starts_with(b"\x1b[200~"));
    assert!(joined.ends_with(b"\x1b[201~"));
    assert!(plan.payload_chunks.len() > 1);
    assert!(plan.payload_chunks.iter().all(|c| c.len() <= 64));
}

#[test]
fn codex_defaults_to_unframed_payload() {
    let policy = InjectionPolicy::new("codex");
    let plan = policy.build("hello");
    let joined: Vec<u8> = plan.payload_chunks.concat();
    assert_eq!(joined, b"hello");
}

#[test]
#[serial]
fn bracketed_paste_env_override_forces_framing_for_cr_only_targets() {
    std::env::set_var("DO_AI_BRACKETED_PASTE", "1");
    let policy = InjectionPolicy::from_env("codex");
    std::env::remove_var("DO_AI_BRACKETED_PASTE");
    let plan = policy.build("hello");
    let joined: Vec<u8> = plan.payload_chunks.concat();
    assert!(joined.starts_with(b"\x1b[200~"));
}

#[test]
#[serial]
fn bracketed_paste_env_override_disables_framing_for_tui_targets() {
    std::env::set_var("DO_AI_BRACKETED_PASTE", "0");
    let policy = InjectionPolicy::from_env("claude");
    std::env::remove_var("DO_AI_BRACKETED_PASTE");
    let plan = policy.build("hello");
    let joined: Vec<u8> = plan.payload_chunks.concat();
    assert_eq!(joined, b"hello");
}

#[test]
fn build_includes_submit_and_fallback_by_default() {
    let policy = InjectionPolicy::new("claude");
    let plan = policy.build("hello");
    assert_eq!(plan.submit_writes, vec![b"\r".to_vec(), b"\x1b[13;5u".to_vec()]);
    assert_eq!(plan.fallback, Some(vec![b'\r']));
}

#[test]
#[serial]
fn disabled_submission_yields_no_submit_or_fallback_writes() {
    std::env::set_var("DO_AI_SUBMIT", "0");
    let policy = InjectionPolicy::from_env("claude");
    std::env::remove_var("DO_AI_SUBMIT");
    let plan = policy.build("hello");
    assert!(plan.submit_writes.is_empty());
    assert!(plan.fallback.is_none());
}

#[test]
#[serial]
fn no_duplicate_submit_list_suppresses_fallback() {
    std::env::set_var("DO_AI_NO_DUPLICATE_SUBMIT", "claude,gemini");
    let policy = InjectionPolicy::from_env("claude");
    std::env::remove_var("DO_AI_NO_DUPLICATE_SUBMIT");
    let plan = policy.build("hello");
    assert!(plan.fallback.is_none());
    assert!(!plan.submit_writes.is_empty());
}
