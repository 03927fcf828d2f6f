// SPDX-License-Identifier: MIT

//! Supervisor configuration: CLI flags (`clap::Parser`, grounded on the
//! teacher's `coop::config::Config`), the optional YAML config file (§6),
//! and the hand-rolled idle-duration token parser that `clap` cannot
//! natively express.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:8787";
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 220;
pub const DEFAULT_PULL_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_CALIBRATION_PERIOD: u32 = 5;
/// Built-in idle threshold when neither argv nor the config file set one
/// (open question resolved in `DESIGN.md`: the source disagreed between a
/// few documented defaults; this picks the 3-minute value).
pub const DEFAULT_IDLE_SECS: u64 = 180;
pub const DEFAULT_MESSAGE_MAIN: &str =
    "Please continue working on the task. Delete {LOCK_FILE} to stop these reminders.";
pub const DEFAULT_MESSAGE_CALIB: &str =
    "(calibration ping) Still here — delete {LOCK_FILE} to stop these reminders.";

/// `clap::Parser` flags for the default (supervisor) invocation. The
/// leading `idle` token(s) are peeled off by [`parse_idle_prefix`] before
/// the remaining argv reaches this parser (clap has no positional-prefix
/// escape hatch for "zero, one, or two duration tokens").
#[derive(Debug, Parser)]
#[command(name = "do-ai", version, about = "Transparent PTY supervisor for interactive CLI AI agents")]
pub struct Args {
    /// Relay base URL; a local default is substituted when unset.
    #[arg(long, env = "DO_AI_RELAY_URL")]
    pub relay_url: Option<String>,

    /// Disable the "fall back to the default relay when a configured local
    /// URL is unreachable" behavior (§4.3, §9 "Reachability probe").
    #[arg(long, env = "DO_AI_RELAY_STRICT")]
    pub relay_strict: bool,

    /// Bearer token sent to the relay.
    #[arg(long, env = "DO_AI_RELAY_TOKEN")]
    pub relay_token: Option<String>,

    /// Minimum seconds between heartbeat POSTs.
    #[arg(long, env = "DO_AI_HEARTBEAT_INTERVAL")]
    pub heartbeat_interval: Option<u64>,

    /// Output batch flush delay in milliseconds.
    #[arg(long, env = "DO_AI_FLUSH_INTERVAL_MS")]
    pub flush_interval_ms: Option<u64>,

    /// Minimum seconds between control-command pulls.
    #[arg(long, env = "DO_AI_PULL_INTERVAL")]
    pub pull_interval: Option<u64>,

    /// Every Kth kick uses the calibration message instead of the main one.
    #[arg(long, env = "DO_AI_CALIB_PERIOD")]
    pub calib_period: Option<u32>,

    /// Override the main idle-kick message (supports `{LOCK_FILE}`).
    #[arg(long, env = "DO_AI_MESSAGE_MAIN")]
    pub message_main: Option<String>,

    /// Override the calibration idle-kick message (supports `{LOCK_FILE}`).
    #[arg(long, env = "DO_AI_MESSAGE_CALIB")]
    pub message_calib: Option<String>,

    /// Submit mode override: enter, enter-lf, lf, cr, ctrl-enter, csi-enter,
    /// alt-enter, enter+ctrl, enter+alt, all.
    #[arg(long, env = "DO_AI_SUBMIT_MODE")]
    pub submit_mode: Option<String>,

    /// Pre-input clear mode: ctrl-u, ctrl-a-ctrl-k, esc-2k, backspace:N.
    #[arg(long, env = "DO_AI_CLEAR_MODE")]
    pub clear_mode: Option<String>,

    /// Injection chunk size in bytes.
    #[arg(long, env = "DO_AI_INJECT_CHUNK_SIZE")]
    pub inject_chunk_size: Option<usize>,

    /// TERM environment variable passed to the child.
    #[arg(long, env = "TERM", default_value = "xterm-256color")]
    pub term: String,

    /// Log output format: text or json.
    #[arg(long, env = "DO_AI_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Command to run inside the PTY.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Args {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.command.is_empty() {
            anyhow::bail!("no command given to run under the supervisor");
        }
        Ok(())
    }
}

/// Fields recognized in the optional YAML config file (§6).
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub idle: Option<String>,
    pub message_main: Option<String>,
    pub message_calib: Option<String>,
}

/// Search order: `DO_AI_CONFIG` env, `./do-ai.yaml[.yml]`, XDG config home,
/// `~/.do-ai.yaml`. A missing file at every candidate path is not an
/// error; a present-but-malformed file is.
pub fn load_file_config() -> anyhow::Result<FileConfig> {
    for candidate in candidate_paths() {
        if candidate.is_file() {
            let text = std::fs::read_to_string(&candidate)
                .map_err(|e| anyhow::anyhow!("reading {}: {e}", candidate.display()))?;
            let parsed: FileConfig = serde_yaml::from_str(&text)
                .map_err(|e| anyhow::anyhow!("parsing {}: {e}", candidate.display()))?;
            return Ok(parsed);
        }
    }
    Ok(FileConfig::default())
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(p) = std::env::var("DO_AI_CONFIG") {
        out.push(PathBuf::from(p));
    }
    out.push(PathBuf::from("do-ai.yaml"));
    out.push(PathBuf::from("do-ai.yml"));
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        out.push(Path::new(&xdg).join("do-ai").join("config.yaml"));
    } else if let Ok(home) = std::env::var("HOME") {
        out.push(Path::new(&home).join(".config").join("do-ai").join("config.yaml"));
    }
    if let Ok(home) = std::env::var("HOME") {
        out.push(Path::new(&home).join(".do-ai.yaml"));
    }
    out
}

/// The fully merged, ready-to-use configuration: CLI/env override file,
/// file overrides built-in defaults.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub idle: Duration,
    pub message_main: String,
    pub message_calib: String,
    pub relay_url: String,
    pub relay_strict: bool,
    pub relay_token: Option<String>,
    pub heartbeat_interval: Duration,
    pub flush_interval: Duration,
    pub pull_interval: Duration,
    pub calib_period: u32,
    pub submit_mode: Option<String>,
    pub clear_mode: Option<String>,
    pub inject_chunk_size: usize,
    pub term: String,
    pub log_format: String,
    pub command: Vec<String>,
}

impl RuntimeConfig {
    /// `idle_from_argv` is `Some` only when the operator supplied an explicit
    /// leading idle token (including `Some(Duration::ZERO)` for `do-ai 0
    /// <command>`, which disables kicks outright rather than falling
    /// through to the file/built-in default).
    pub fn build(args: Args, idle_from_argv: Option<Duration>, file: FileConfig) -> Self {
        let idle = idle_from_argv.unwrap_or_else(|| {
            file.idle
                .as_deref()
                .and_then(parse_duration_token)
                .unwrap_or(Duration::from_secs(DEFAULT_IDLE_SECS))
        });

        Self {
            idle,
            message_main: args
                .message_main
                .or(file.message_main)
                .unwrap_or_else(|| DEFAULT_MESSAGE_MAIN.to_string()),
            message_calib: args
                .message_calib
                .or(file.message_calib)
                .unwrap_or_else(|| DEFAULT_MESSAGE_CALIB.to_string()),
            relay_url: args.relay_url.unwrap_or_else(|| DEFAULT_RELAY_URL.to_string()),
            relay_strict: args.relay_strict,
            relay_token: args.relay_token,
            heartbeat_interval: Duration::from_secs(
                args.heartbeat_interval.unwrap_or(DEFAULT_HEARTBEAT_INTERVAL_SECS),
            ),
            flush_interval: Duration::from_millis(
                args.flush_interval_ms.unwrap_or(DEFAULT_FLUSH_INTERVAL_MS),
            ),
            pull_interval: Duration::from_secs(args.pull_interval.unwrap_or(DEFAULT_PULL_INTERVAL_SECS)),
            calib_period: args.calib_period.unwrap_or(DEFAULT_CALIBRATION_PERIOD).max(1),
            submit_mode: args.submit_mode,
            clear_mode: args.clear_mode,
            inject_chunk_size: args.inject_chunk_size.unwrap_or(64).max(1),
            term: args.term,
            log_format: args.log_format,
            command: args.command,
        }
    }
}

/// Peels zero, one, or two leading duration tokens off `tokens`, returning
/// the summed duration and how many tokens were consumed. An invalid
/// leading token consumes zero tokens and leaves `tokens` untouched (the
/// command is assumed to start there instead) — see §6. The duration is
/// `None` when nothing was consumed, distinguishing "no idle token given"
/// from an explicit `do-ai 0 <command>` (§4 kick rule `idle > 0`: an
/// explicit zero must disable kicks, not fall through to the file/built-in
/// default).
pub fn parse_idle_prefix(tokens: &[String]) -> (Option<Duration>, usize) {
    let mut total = Duration::ZERO;
    let mut consumed = 0;
    for token in tokens.iter().take(2) {
        match parse_duration_token(token) {
            Some(d) => {
                total += d;
                consumed += 1;
            }
            None => break,
        }
    }
    if consumed == 0 {
        (None, 0)
    } else {
        (Some(total), consumed)
    }
}

/// Parses one duration token: a bare integer (seconds), or a run of
/// `<number><unit>` pairs summed together (`2m30s`, `5min`). Units: `s` /
/// `sec` / `secs`, `m` / `min` / `mins`, `h` / `hr` / `hrs`.
pub fn parse_duration_token(token: &str) -> Option<Duration> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if token.chars().all(|c| c.is_ascii_digit()) {
        return token.parse::<u64>().ok().map(Duration::from_secs);
    }

    let bytes = token.as_bytes();
    let mut i = 0;
    let mut total = Duration::ZERO;
    let mut matched_any = false;
    while i < bytes.len() {
        let num_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == num_start {
            return None;
        }
        let number: u64 = token[num_start..i].parse().ok()?;

        let unit_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
            i += 1;
        }
        if i == unit_start {
            return None;
        }
        let unit = &token[unit_start..i];
        let secs = match unit {
            "s" | "sec" | "secs" => number,
            "m" | "min" | "mins" => number * 60,
            "h" | "hr" | "hrs" => number * 3600,
            _ => return None,
        };
        total += Duration::from_secs(secs);
        matched_any = true;
    }
    matched_any.then_some(total)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
