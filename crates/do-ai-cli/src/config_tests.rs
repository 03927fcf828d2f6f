// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn bare_integer_is_seconds() {
    assert_eq!(parse_duration_token("5"), Some(Duration::from_secs(5)));
}

#[test]
fn single_unit_suffix() {
    assert_eq!(parse_duration_token("5s"), Some(Duration::from_secs(5)));
    assert_eq!(parse_duration_token("5min"), Some(Duration::from_secs(300)));
}

#[test]
fn compound_single_token_sums_units() {
    assert_eq!(parse_duration_token("2m30s"), Some(Duration::from_secs(150)));
}

#[test]
fn invalid_token_is_none() {
    assert_eq!(parse_duration_token("claude"), None);
    assert_eq!(parse_duration_token(""), None);
    assert_eq!(parse_duration_token("5x"), None);
}

#[test]
fn idle_prefix_consumes_zero_tokens_when_first_is_invalid() {
    let argv = vec!["claude".to_string(), "--flag".to_string()];
    let (idle, consumed) = parse_idle_prefix(&argv);
    assert_eq!(idle, None);
    assert_eq!(consumed, 0);
}

#[test]
fn idle_prefix_consumes_one_token() {
    let argv = vec!["5min".to_string(), "claude".to_string()];
    let (idle, consumed) = parse_idle_prefix(&argv);
    assert_eq!(idle, Some(Duration::from_secs(300)));
    assert_eq!(consumed, 1);
}

#[test]
fn idle_prefix_sums_two_tokens() {
    let argv = vec!["5min".to_string(), "10s".to_string(), "claude".to_string()];
    let (idle, consumed) = parse_idle_prefix(&argv);
    assert_eq!(idle, Some(Duration::from_secs(310)));
    assert_eq!(consumed, 2);
}

#[test]
fn idle_prefix_explicit_zero_is_some_not_none() {
    let argv = vec!["0".to_string(), "claude".to_string()];
    let (idle, consumed) = parse_idle_prefix(&argv);
    assert_eq!(idle, Some(Duration::ZERO));
    assert_eq!(consumed, 1);
}

#[test]
fn runtime_config_defaults_when_nothing_overrides() {
    let args = Args {
        relay_url: None,
        relay_strict: false,
        relay_token: None,
        heartbeat_interval: None,
        flush_interval_ms: None,
        pull_interval: None,
        calib_period: None,
        message_main: None,
        message_calib: None,
        submit_mode: None,
        clear_mode: None,
        inject_chunk_size: None,
        term: "xterm-256color".to_string(),
        log_format: "text".to_string(),
        command: vec!["claude".to_string()],
    };
    let cfg = RuntimeConfig::build(args, Some(Duration::from_secs(60)), FileConfig::default());
    assert_eq!(cfg.idle, Duration::from_secs(60));
    assert_eq!(cfg.relay_url, DEFAULT_RELAY_URL);
    assert_eq!(cfg.calib_period, DEFAULT_CALIBRATION_PERIOD);
    assert!(cfg.message_main.contains("{LOCK_FILE}"));
}

#[test]
fn runtime_config_falls_back_to_file_idle_when_argv_has_none() {
    let args = Args {
        relay_url: None,
        relay_strict: false,
        relay_token: None,
        heartbeat_interval: None,
        flush_interval_ms: None,
        pull_interval: None,
        calib_period: None,
        message_main: None,
        message_calib: None,
        submit_mode: None,
        clear_mode: None,
        inject_chunk_size: None,
        term: "xterm-256color".to_string(),
        log_format: "text".to_string(),
        command: vec!["claude".to_string()],
    };
    let file = FileConfig { idle: Some("90s".to_string()), message_main: None, message_calib: None };
    let cfg = RuntimeConfig::build(args, None, file);
    assert_eq!(cfg.idle, Duration::from_secs(90));
}

#[test]
fn runtime_config_carries_relay_strict_through() {
    let args = Args {
        relay_url: None,
        relay_strict: true,
        relay_token: None,
        heartbeat_interval: None,
        flush_interval_ms: None,
        pull_interval: None,
        calib_period: None,
        message_main: None,
        message_calib: None,
        submit_mode: None,
        clear_mode: None,
        inject_chunk_size: None,
        term: "xterm-256color".to_string(),
        log_format: "text".to_string(),
        command: vec!["claude".to_string()],
    };
    let cfg = RuntimeConfig::build(args, Some(Duration::from_secs(60)), FileConfig::default());
    assert!(cfg.relay_strict);
}

#[test]
fn runtime_config_falls_back_to_built_in_idle_when_nothing_sets_it() {
    let args = Args {
        relay_url: None,
        relay_strict: false,
        relay_token: None,
        heartbeat_interval: None,
        flush_interval_ms: None,
        pull_interval: None,
        calib_period: None,
        message_main: None,
        message_calib: None,
        submit_mode: None,
        clear_mode: None,
        inject_chunk_size: None,
        term: "xterm-256color".to_string(),
        log_format: "text".to_string(),
        command: vec!["claude".to_string()],
    };
    let cfg = RuntimeConfig::build(args, None, FileConfig::default());
    assert_eq!(cfg.idle, Duration::from_secs(DEFAULT_IDLE_SECS));
}

#[test]
fn runtime_config_honors_explicit_zero_idle_instead_of_falling_back() {
    let args = Args {
        relay_url: None,
        relay_strict: false,
        relay_token: None,
        heartbeat_interval: None,
        flush_interval_ms: None,
        pull_interval: None,
        calib_period: None,
        message_main: None,
        message_calib: None,
        submit_mode: None,
        clear_mode: None,
        inject_chunk_size: None,
        term: "xterm-256color".to_string(),
        log_format: "text".to_string(),
        command: vec!["claude".to_string()],
    };
    let file = FileConfig { idle: Some("90s".to_string()), message_main: None, message_calib: None };
    let cfg = RuntimeConfig::build(args, Some(Duration::ZERO), file);
    assert_eq!(cfg.idle, Duration::ZERO);
}
