// SPDX-License-Identifier: MIT

//! The `do-ai` supervisor: wraps a child process in a PTY, keeps it
//! progressing via idle-triggered prompt injection, and mirrors its screen
//! to a relay service for remote observers.

pub mod config;
pub mod dsr;
pub mod error;
pub mod injection;
pub mod lifeline;
pub mod meaningful;
pub mod pty;
pub mod relay_cmd;
pub mod reporter;
pub mod run;
pub mod stdin_norm;
pub mod supervisor;
pub mod timefmt;
