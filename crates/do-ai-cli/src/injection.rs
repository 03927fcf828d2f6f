// SPDX-License-Identifier: MIT

//! Submission payload selection, bracketed-paste framing, and chunked
//! pacing (§4.2).

use std::collections::HashSet;
use std::time::Duration;

/// Operator-selectable submission mode (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    Enter,
    EnterLf,
    Lf,
    Cr,
    CtrlEnter,
    CsiEnter,
    AltEnter,
    EnterPlusCtrl,
    EnterPlusAlt,
    All,
}

impl SubmitMode {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "enter" => Self::Enter,
            "enter-lf" => Self::EnterLf,
            "lf" => Self::Lf,
            "cr" => Self::Cr,
            "ctrl-enter" => Self::CtrlEnter,
            "csi-enter" => Self::CsiEnter,
            "alt-enter" => Self::AltEnter,
            "enter+ctrl" => Self::EnterPlusCtrl,
            "enter+alt" => Self::EnterPlusAlt,
            "all" => Self::All,
            _ => return None,
        })
    }

    /// The distinct byte sequences this mode writes, in order, each
    /// followed by the standard inter-write gap used elsewhere in this
    /// module (callers decide the gap).
    pub fn writes(&self) -> Vec<&'static [u8]> {
        const CTRL_ENTER: &[u8] = b"\x1b[13;5u";
        const ALT_ENTER: &[u8] = b"\x1b\r";
        match self {
            Self::Enter | Self::Cr => vec![b"\r"],
            Self::EnterLf => vec![b"\r\n"],
            Self::Lf => vec![b"\n"],
            Self::CtrlEnter | Self::CsiEnter => vec![CTRL_ENTER],
            Self::AltEnter => vec![ALT_ENTER],
            Self::EnterPlusCtrl => vec![b"\r", CTRL_ENTER],
            Self::EnterPlusAlt => vec![b"\r", ALT_ENTER],
            Self::All => vec![b"\r", CTRL_ENTER, ALT_ENTER],
        }
    }
}

/// Pre-input clearing sequence (§4.2, Windows pre-clear).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearMode {
    CtrlU,
    CtrlACtrlK,
    Esc2k,
    Backspace(usize),
}

impl ClearMode {
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(n) = s.strip_prefix("backspace:") {
            return n.parse().ok().map(Self::Backspace);
        }
        Some(match s {
            "ctrl-u" => Self::CtrlU,
            "ctrl-a-ctrl-k" => Self::CtrlACtrlK,
            "esc-2k" => Self::Esc2k,
            _ => return None,
        })
    }

    pub fn bytes(&self) -> Vec<u8> {
        match self {
            Self::CtrlU => vec![0x15; 5],
            Self::CtrlACtrlK => {
                let mut v = vec![0x01]; // Ctrl-A: start of line
                v.push(0x0b); // Ctrl-K: kill to end of line
                v
            }
            Self::Esc2k => b"\x1b[2K".to_vec(),
            Self::Backspace(n) => vec![0x08; *n],
        }
    }
}

/// The name a command is recognized under when a target-specific default
/// applies (last path component of `argv[0]`, §4.2/§9 "process-wide
/// statics" note — threaded explicitly here rather than read globally).
fn command_name(argv0: &str) -> &str {
    argv0.rsplit(['/', '\\']).next().unwrap_or(argv0)
}

/// Commands whose submit default is plain `CR` rather than `CR` + Ctrl-Enter.
const CR_ONLY_DEFAULT: &[&str] = &["codex"];

fn default_submit_mode(argv0: &str) -> SubmitMode {
    if CR_ONLY_DEFAULT.contains(&command_name(argv0)) {
        SubmitMode::Cr
    } else {
        SubmitMode::EnterPlusCtrl
    }
}

/// Targets recognized as bracketed-paste-aware TUI agents (§4.2 "recognized
/// TUI agents"). The `CR_ONLY_DEFAULT` commands are plain line-mode agents,
/// not bracketed-paste TUIs, so they default to unframed payload writes.
fn default_bracketed_paste(argv0: &str) -> bool {
    !CR_ONLY_DEFAULT.contains(&command_name(argv0))
}

/// A fully-resolved injection: what to write, in order, with the delays
/// between each step (§4.1 `inject`).
pub struct InjectionPlan {
    pub clear: Option<Vec<u8>>,
    /// Bracketed-paste-framed, chunk-sized writes of the payload text.
    pub payload_chunks: Vec<Vec<u8>>,
    pub chunk_delay: Duration,
    pub submit_delay: Duration,
    pub submit_writes: Vec<Vec<u8>>,
    pub fallback_delay: Duration,
    pub fallback: Option<Vec<u8>>,
}

pub struct InjectionPolicy {
    submit_mode: Option<SubmitMode>, // None: DO_AI_SUBMIT=0, submission disabled
    bracketed_paste: bool,
    chunk_size: usize,
    chunk_delay: Duration,
    submit_delay: Duration,
    fallback_delay: Duration,
    fallback_count: usize,
    clear_mode: Option<ClearMode>,
    no_duplicate_submit: HashSet<String>,
}

impl InjectionPolicy {
    pub fn new(target_argv0: &str) -> Self {
        Self {
            submit_mode: Some(default_submit_mode(target_argv0)),
            bracketed_paste: default_bracketed_paste(target_argv0),
            chunk_size: 64,
            chunk_delay: Duration::from_millis(2),
            submit_delay: Duration::from_millis(100),
            fallback_delay: Duration::from_millis(150),
            fallback_count: if cfg!(windows) { 5 } else { 1 },
            clear_mode: None,
            no_duplicate_submit: HashSet::new(),
        }
    }

    /// Apply environment overrides (§6 env var semantics).
    pub fn from_env(target_argv0: &str) -> Self {
        Self::resolve(target_argv0, None, None, None)
    }

    /// Like [`from_env`](Self::from_env), but CLI-sourced overrides (already
    /// merged with their own `env = "..."` fallback by clap) take precedence
    /// over the raw environment read for the three fields clap can express.
    /// `DO_AI_SUBMIT=0` and `DO_AI_NO_DUPLICATE_SUBMIT` have no CLI flag and
    /// are always read straight from the environment.
    pub fn resolve(
        target_argv0: &str,
        submit_mode: Option<&str>,
        clear_mode: Option<&str>,
        chunk_size: Option<usize>,
    ) -> Self {
        let mut policy = Self::new(target_argv0);

        if std::env::var("DO_AI_SUBMIT").as_deref() == Ok("0") {
            policy.submit_mode = None;
        } else if let Some(mode) = submit_mode.or(std::env::var("DO_AI_SUBMIT_MODE").ok().as_deref()) {
            if let Some(parsed) = SubmitMode::parse(mode) {
                policy.submit_mode = Some(parsed);
            }
        }

        if let Some(clear) = clear_mode.or(std::env::var("DO_AI_CLEAR_MODE").ok().as_deref()) {
            policy.clear_mode = ClearMode::parse(clear);
        }

        if let Some(size) = chunk_size.or(std::env::var("DO_AI_INJECT_CHUNK_SIZE").ok().and_then(|s| s.parse().ok()))
        {
            policy.chunk_size = size;
        }

        if let Ok(flag) = std::env::var("DO_AI_BRACKETED_PASTE") {
            match flag.as_str() {
                "0" => policy.bracketed_paste = false,
                "1" => policy.bracketed_paste = true,
                _ => {}
            }
        }

        if let Ok(list) = std::env::var("DO_AI_NO_DUPLICATE_SUBMIT") {
            policy.no_duplicate_submit = list.split(',').map(|s| s.trim().to_owned()).collect();
            policy.no_duplicate_submit.retain(|s| !s.is_empty());
        }

        let name = command_name(target_argv0);
        if policy.no_duplicate_submit.contains(name) {
            policy.fallback_count = 0;
        }

        policy
    }

    /// Build the full write plan for one kick (§4.1 `inject`).
    pub fn build(&self, payload: &str) -> InjectionPlan {
        let clear = self.clear_mode.map(|m| m.bytes());

        let body: Vec<u8> = if self.bracketed_paste {
            let mut v = b"\x1b[200~".to_vec();
            v.extend_from_slice(payload.as_bytes());
            v.extend_from_slice(b"\x1b[201~");
            v
        } else {
            payload.as_bytes().to_vec()
        };
        let payload_chunks = body.chunks(self.chunk_size.max(1)).map(|c| c.to_vec()).collect();

        let submit_writes = match self.submit_mode {
            Some(mode) => mode.writes().into_iter().map(|b| b.to_vec()).collect(),
            None => Vec::new(),
        };

        let fallback = if self.fallback_count > 0 && self.submit_mode.is_some() {
            Some(vec![b'\r'; self.fallback_count])
        } else {
            None
        };

        InjectionPlan {
            clear,
            payload_chunks,
            chunk_delay: self.chunk_delay,
            submit_delay: self.submit_delay,
            submit_writes,
            fallback_delay: self.fallback_delay,
            fallback,
        }
    }
}

#[cfg(test)]
#[path = "injection_tests.rs"]
mod tests;
