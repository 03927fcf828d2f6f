// SPDX-License-Identifier: MIT

//! The PTY interface is treated as opaque per the system boundary: a
//! single POSIX implementation via `forkpty`, no cross-platform backend
//! abstraction (platform-specific PTY/terminal wrappers are an external
//! collaborator, not part of this core).

pub mod nbio;
pub mod rawmode;
pub mod spawn;

pub use rawmode::RawModeGuard;
pub use spawn::{ExitStatus, PtySession};
