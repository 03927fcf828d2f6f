// SPDX-License-Identifier: MIT

//! Supervisor-side error kinds (§7). The relay has its own typed errors in
//! `do-ai-relay::error`; these are specific to the CLI/startup boundary.

use std::fmt;

/// Top-level failure classes, each carrying the process exit code it maps
/// to (§7, §6 "Exit codes").
#[derive(Debug)]
pub enum SupervisorError {
    /// Bad CLI, missing command, no TTY. Exit 2.
    Usage(String),
    /// PTY allocation or raw-mode switch failed. Exit 1.
    Startup(String),
}

impl SupervisorError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::Startup(_) => 1,
        }
    }
}

impl fmt::Display for SupervisorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(msg) => write!(f, "usage error: {msg}"),
            Self::Startup(msg) => write!(f, "startup error: {msg}"),
        }
    }
}

impl std::error::Error for SupervisorError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
