// SPDX-License-Identifier: MIT

//! Puts the local controlling terminal (stdin) into raw mode for the
//! supervisor's lifetime, restoring the previous attributes on drop.

use std::os::fd::BorrowedFd;

use nix::sys::termios::{self, SetArg, Termios};

pub struct RawModeGuard {
    fd: i32,
    original: Termios,
}

impl RawModeGuard {
    /// Switch `fd` (typically stdin, fd 0) into raw mode. Fails with a
    /// `StartupError` (§7) if `fd` is not a TTY.
    pub fn enable(fd: i32) -> anyhow::Result<Self> {
        // SAFETY: fd is a valid, open file descriptor for the duration of
        // this call (stdin for the process lifetime).
        let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
        let original = termios::tcgetattr(borrowed)?;
        let mut raw = original.clone();
        termios::cfmakeraw(&mut raw);
        termios::tcsetattr(borrowed, SetArg::TCSANOW, &raw)?;
        Ok(Self { fd, original })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // SAFETY: same fd as `enable`, still open at drop time.
        let borrowed = unsafe { BorrowedFd::borrow_raw(self.fd) };
        let _ = termios::tcsetattr(borrowed, SetArg::TCSANOW, &self.original);
    }
}
