// SPDX-License-Identifier: MIT

//! Wire types shared between the `do-ai` supervisor (reporter client) and
//! the relay service (HTTP handlers). Kept in one crate so neither side
//! hand-duplicates the JSON shape.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a supervised session, as observed by the relay.
///
/// Invariant: once a session leaves `Running` it never returns to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Running,
    Stopping,
    Exited,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Exited => "exited",
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Running
    }
}

/// Heartbeat / session snapshot, posted by the reporter and stored verbatim
/// (modulo server-filled fields) by the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub session_name: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub state: SessionState,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub started_at: u64,
    #[serde(default)]
    pub updated_at: u64,
    #[serde(default)]
    pub last_output_at: u64,
    #[serde(default)]
    pub last_kick_at: u64,
    #[serde(default)]
    pub idle_seconds: u64,
    #[serde(default)]
    pub kick_count: u64,
    #[serde(default)]
    pub last_text: String,
}

impl Session {
    /// §3 invariant: `state == exited` implies an exit code is present.
    pub fn invariants_hold(&self) -> bool {
        self.state != SessionState::Exited || self.exit_code.is_some()
    }
}

/// An ordered per-session output record. `seq` is process-wide monotonic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputEvent {
    pub seq: u64,
    pub session_id: String,
    pub text: String,
    pub ts: u64,
}

/// `{id, session_id, input, submit, action, source, created_at}` per §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlCommand {
    pub id: String,
    pub session_id: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub submit: bool,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub created_at: u64,
}

/// Normalize a raw `action` string to the two values the spec recognizes:
/// `""` or `"terminate"` (case-insensitive, trimmed). `"stop"` is accepted
/// as a terminate synonym (P10).
pub fn normalize_action(action: &str) -> String {
    let trimmed = action.trim();
    if trimmed.eq_ignore_ascii_case("terminate") || trimmed.eq_ignore_ascii_case("stop") {
        "terminate".to_owned()
    } else {
        String::new()
    }
}

impl ControlCommand {
    /// A command is applicable iff `action == terminate ∨ submit ∨ input ≠ ""`.
    pub fn is_applicable(&self) -> bool {
        self.action == "terminate" || self.submit || !self.input.is_empty()
    }

    pub fn is_terminate(&self) -> bool {
        self.action == "terminate"
    }
}

/// A segment of a styled screen line: a maximal run of cells sharing one
/// style. `fg`/`bg` are empty strings (not omitted) when unset, matching
/// the wire contract relied on by observers that diff style runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSegment {
    pub text: String,
    #[serde(default)]
    pub fg: String,
    #[serde(default)]
    pub bg: String,
    #[serde(skip_serializing_if = "is_false", default)]
    pub bold: bool,
    #[serde(skip_serializing_if = "is_false", default)]
    pub italic: bool,
    #[serde(skip_serializing_if = "is_false", default)]
    pub underline: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyledLine {
    pub segments: Vec<StyleSegment>,
}

// -- HTTP request/response bodies (§6) ---------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
    pub count: usize,
    pub ts: u64,
    pub online_only: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutputListResponse {
    pub events: Vec<OutputEvent>,
    pub count: usize,
    pub cursor: u64,
    pub has_more_before: bool,
    pub ts: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutputScreenResponse {
    pub session_id: String,
    pub lines: Vec<String>,
    pub styled_lines: Vec<StyledLine>,
    pub content: String,
    pub line_count: usize,
    pub cursor_row: u16,
    pub cursor_col: u16,
    pub revision: u64,
    pub truncated: bool,
    pub ts: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ControlSendRequest {
    pub session_id: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub submit: bool,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ControlPullResponse {
    pub commands: Vec<ControlCommand>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutputPushRequest {
    pub session_id: String,
    #[serde(default)]
    pub lines: Vec<String>,
    /// Base64-encoded raw byte chunks.
    #[serde(default)]
    pub raw_chunks: Vec<String>,
    #[serde(default)]
    pub ts: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutputPushResponse {
    pub created: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}
