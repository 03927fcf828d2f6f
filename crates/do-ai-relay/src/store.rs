// SPDX-License-Identifier: MIT

//! The in-memory session registry (§3, §4.4). Grounded on the teacher's
//! `coop_mux::state::MuxState`: one `tokio::sync::RwLock<HashMap<...>>`
//! protecting every mutable session record, with the global output `seq`
//! counter assigned as an atomic while the writer lock is held so strict
//! monotonicity (§5 "Ordering guarantees") is preserved regardless of
//! which session the event belongs to.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use do_ai_proto::{ControlCommand, OutputEvent, Session, SessionState};
use do_ai_screen::ScreenModel;
use parking_lot::Mutex;
use tokio::sync::RwLock;

const EVENTS_CAP: usize = 3000;
const RAW_CHUNKS_CAP: usize = 120;
const COMMAND_QUEUE_CAP: usize = 100;
const COMMAND_PULL_HARD_CAP: usize = 20;
const LINE_CHAR_CAP: usize = 1024;

fn now_unix() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_secs()
}

struct SessionRecord {
    session: Session,
    events: VecDeque<OutputEvent>,
    raw_chunks: VecDeque<String>,
    screen: ScreenModel,
    commands: VecDeque<ControlCommand>,
}

impl SessionRecord {
    fn new(session: Session) -> Self {
        Self {
            session,
            events: VecDeque::new(),
            raw_chunks: VecDeque::new(),
            screen: ScreenModel::new(),
            commands: VecDeque::new(),
        }
    }
}

/// A point-in-time screen read, the store-level counterpart of
/// `do_ai_screen::ScreenSnapshot` with the session id attached.
pub struct ScreenRead {
    pub session_id: String,
    pub lines: Vec<String>,
    pub styled_lines: Vec<Vec<(String, do_ai_screen::Style)>>,
    pub cursor_row: u16,
    pub cursor_col: u16,
    pub revision: u64,
    pub truncated: bool,
}

/// Result of an output-event page read (§4.4 "Output reads").
pub struct OutputPage {
    pub events: Vec<OutputEvent>,
    pub has_more_before: bool,
}

pub struct RelayStore {
    token: Option<String>,
    sessions: RwLock<HashMap<String, SessionRecord>>,
    seq: AtomicU64,
    notify_gate: Mutex<HashMap<String, Instant>>,
}

impl RelayStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
            sessions: RwLock::new(HashMap::new()),
            seq: AtomicU64::new(1),
            notify_gate: Mutex::new(HashMap::new()),
        }
    }

    pub fn config_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// `upsert(heartbeat)` overwrites the entry indexed by `session_id`.
    pub async fn upsert(&self, heartbeat: Session) {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&heartbeat.session_id) {
            Some(existing) => existing.session = heartbeat,
            None => {
                sessions.insert(heartbeat.session_id.clone(), SessionRecord::new(heartbeat));
            }
        }
    }

    /// `markStopping(id, source)`: no-op if absent or not running.
    pub async fn mark_stopping(&self, id: &str, source: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(record) = sessions.get_mut(id) {
            if record.session.state == SessionState::Running {
                record.session.state = SessionState::Stopping;
                record.session.updated_at = now_unix();
                record.session.last_text = format!("[stopping: requested by {source}]");
            }
        }
    }

    /// Sorted online-first, then by `updated_at` descending.
    pub async fn list(&self, stale_seconds: u64, only_online: bool) -> Vec<Session> {
        let now = now_unix();
        let sessions = self.sessions.read().await;
        let mut out: Vec<Session> = sessions
            .values()
            .map(|r| r.session.clone())
            .filter(|s| !only_online || is_online(s, now, stale_seconds))
            .collect();
        out.sort_by(|a, b| {
            let a_online = is_online(a, now, stale_seconds);
            let b_online = is_online(b, now, stale_seconds);
            b_online.cmp(&a_online).then(b.updated_at.cmp(&a.updated_at))
        });
        out
    }

    /// `append`: sanitize lines, synthesize raw bytes when absent, assign
    /// `seq`s, push `OutputEvent`s, and feed the screen model (§4.4).
    pub async fn append(&self, session_id: &str, lines: &[String], raw_chunks: &[Vec<u8>], ts: u64) -> usize {
        let mut sessions = self.sessions.write().await;
        let record = sessions
            .entry(session_id.to_owned())
            .or_insert_with(|| SessionRecord::new(blank_session(session_id)));

        let mut created = 0usize;
        for line in lines {
            let cleaned = sanitize_line(line);
            if cleaned.is_empty() {
                continue;
            }
            let seq = self.seq.fetch_add(1, Ordering::SeqCst);
            push_capped(&mut record.events, OutputEvent { seq, session_id: session_id.to_owned(), text: cleaned, ts }, EVENTS_CAP);
            created += 1;
        }

        let effective_raw: Vec<Vec<u8>> = if raw_chunks.is_empty() && !lines.is_empty() {
            lines.iter().map(|l| format!("{l}\n").into_bytes()).collect()
        } else {
            raw_chunks.to_vec()
        };

        for chunk in &effective_raw {
            record.screen.feed(chunk);
            push_capped(&mut record.raw_chunks, BASE64.encode(chunk), RAW_CHUNKS_CAP);
        }

        record.session.last_output_at = ts;
        record.session.updated_at = ts.max(record.session.updated_at);
        created
    }

    /// `getScreen(sessionId, limit)` (§4.4 "Screen reads").
    pub async fn get_screen(&self, session_id: &str, limit: usize) -> Option<ScreenRead> {
        let sessions = self.sessions.read().await;
        let record = sessions.get(session_id)?;
        let snap = record.screen.snapshot(limit);
        Some(ScreenRead {
            session_id: session_id.to_owned(),
            lines: snap.lines,
            styled_lines: snap.styled_lines,
            cursor_row: snap.cursor.row,
            cursor_col: snap.cursor.col,
            revision: snap.revision,
            truncated: snap.truncated,
        })
    }

    /// `list(sessionId, after, before, limit, tail)` (§4.4 "Output reads").
    pub async fn list_output(
        &self,
        session_id: &str,
        after: u64,
        before: u64,
        limit: usize,
        tail: bool,
    ) -> OutputPage {
        let sessions = self.sessions.read().await;
        let Some(record) = sessions.get(session_id) else {
            return OutputPage { events: Vec::new(), has_more_before: false };
        };
        let limit = limit.max(1);
        let all = &record.events;

        if tail {
            let start = all.len().saturating_sub(limit);
            let events: Vec<OutputEvent> = all.iter().skip(start).cloned().collect();
            return OutputPage { events, has_more_before: start > 0 };
        }

        if before > 0 {
            let end = all.iter().position(|e| e.seq >= before).unwrap_or(all.len());
            let start = end.saturating_sub(limit);
            let events: Vec<OutputEvent> = all.iter().skip(start).take(end - start).cloned().collect();
            return OutputPage { events, has_more_before: start > 0 };
        }

        let start = all.iter().position(|e| e.seq > after).unwrap_or(all.len());
        let events: Vec<OutputEvent> = all.iter().skip(start).take(limit).collect::<Vec<_>>().into_iter().cloned().collect();
        let consumed = start + events.len();
        OutputPage { events, has_more_before: consumed < all.len() }
    }

    /// `enqueue(cmd)`, capped at [`COMMAND_QUEUE_CAP`] per session.
    pub async fn enqueue_command(&self, cmd: ControlCommand) {
        let mut sessions = self.sessions.write().await;
        let record = sessions
            .entry(cmd.session_id.clone())
            .or_insert_with(|| SessionRecord::new(blank_session(&cmd.session_id)));
        push_capped(&mut record.commands, cmd, COMMAND_QUEUE_CAP);
    }

    /// `pull(sessionId, limit)`: removes and returns up to `limit`
    /// (hard-capped at [`COMMAND_PULL_HARD_CAP`]) commands, FIFO.
    pub async fn pull_commands(&self, session_id: &str, limit: usize) -> Vec<ControlCommand> {
        let limit = limit.min(COMMAND_PULL_HARD_CAP).max(1);
        let mut sessions = self.sessions.write().await;
        let Some(record) = sessions.get_mut(session_id) else {
            return Vec::new();
        };
        let n = limit.min(record.commands.len());
        record.commands.drain(..n).collect()
    }

    /// `allowNotify(key, cooldown)`.
    pub fn allow_notify(&self, key: &str, cooldown: std::time::Duration) -> bool {
        let mut gate = self.notify_gate.lock();
        let now = Instant::now();
        let allow = match gate.get(key) {
            Some(last) => now.duration_since(*last) >= cooldown,
            None => true,
        };
        if allow {
            gate.insert(key.to_owned(), now);
        }
        allow
    }

    pub async fn exists(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }
}

fn is_online(s: &Session, now: u64, stale_seconds: u64) -> bool {
    s.state == SessionState::Running && now.saturating_sub(s.updated_at) <= stale_seconds
}

fn push_capped<T>(queue: &mut VecDeque<T>, item: T, cap: usize) {
    queue.push_back(item);
    while queue.len() > cap {
        queue.pop_front();
    }
}

/// A bare session record used when output or a control command arrives
/// before the first heartbeat (§4.4 "allocates a screen model on first use").
fn blank_session(session_id: &str) -> Session {
    Session {
        session_id: session_id.to_owned(),
        session_name: String::new(),
        host: String::new(),
        cwd: String::new(),
        command: String::new(),
        state: SessionState::Running,
        exit_code: None,
        started_at: now_unix(),
        updated_at: now_unix(),
        last_output_at: 0,
        last_kick_at: 0,
        idle_seconds: 0,
        kick_count: 0,
        last_text: String::new(),
    }
}

/// Clean a raw line for `OutputEvent.text`: strip ANSI, suppress isolated
/// "B" runes (§4.5), trim, cap at [`LINE_CHAR_CAP`] characters, drop-if-blank
/// handled by the caller.
fn sanitize_line(line: &str) -> String {
    let stripped = do_ai_screen::strip::strip_ansi_once(line.as_bytes());
    let text = String::from_utf8_lossy(&stripped);
    let suppressed = do_ai_screen::strip::suppress_isolated_b(&text);
    let trimmed = suppressed.trim();
    trimmed.chars().take(LINE_CHAR_CAP).collect()
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
