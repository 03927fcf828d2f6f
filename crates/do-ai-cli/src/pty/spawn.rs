// SPDX-License-Identifier: MIT

//! Spawns the wrapped child inside a PTY via `forkpty`. Grounded on the
//! teacher's `pty/spawn.rs`, trimmed to the single POSIX backend this
//! system needs (no `Backend` trait — see `pty/mod.rs`) and extended with
//! an explicit graceful-terminate sequence (§4.1, §5 "Cancellation").

use std::ffi::CString;
use std::time::Duration;

use anyhow::Context;
use nix::libc;
use nix::pty::{forkpty, ForkptyResult, Winsize};
use nix::sys::signal::{killpg, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{execvp, setsid, ForkResult, Pid};
use tokio::io::unix::AsyncFd;

use super::nbio::{read_chunk, set_nonblocking, write_all, PtyFd};

/// Exit status of the wrapped child.
#[derive(Debug, Clone, Copy)]
pub struct ExitStatus {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl ExitStatus {
    /// The process exit code per §6: the child's code if present, 1 if it
    /// died to a signal instead.
    pub fn code_or_default(&self) -> i32 {
        self.code.unwrap_or(1)
    }
}

pub struct PtySession {
    master: AsyncFd<PtyFd>,
    child_pid: Pid,
}

impl PtySession {
    /// `argv` must have at least one element (the program to run).
    // forkpty requires unsafe: post-fork child is partially initialized.
    #[allow(unsafe_code)]
    pub fn spawn(argv: &[String], cols: u16, rows: u16, term: &str) -> anyhow::Result<Self> {
        anyhow::ensure!(!argv.is_empty(), "no command given");

        let winsize = Winsize { ws_col: cols, ws_row: rows, ws_xpixel: 0, ws_ypixel: 0 };

        // SAFETY: forkpty is unsafe because the child is partially
        // initialized until it execs; we exec or exit immediately below.
        let result = unsafe { forkpty(&winsize, None) }.context("forkpty failed")?;
        let ForkptyResult { master, fork_result } = result;

        match fork_result {
            ForkResult::Child => {
                let _ = setsid();
                std::env::set_var("TERM", term);

                let c_args: Vec<CString> = argv
                    .iter()
                    .map(|s| CString::new(s.as_bytes()))
                    .collect::<Result<_, _>>()
                    .unwrap_or_default();
                if c_args.is_empty() {
                    std::process::exit(127);
                }
                let _ = execvp(&c_args[0], &c_args);
                // execvp only returns on failure.
                std::process::exit(127);
            }
            ForkResult::Parent { child } => {
                set_nonblocking(&master)?;
                let afd = AsyncFd::new(PtyFd(master)).context("AsyncFd::new failed")?;
                Ok(Self { master: afd, child_pid: child })
            }
        }
    }

    pub async fn read_chunk(&self, buf: &mut [u8]) -> std::io::Result<usize> {
        match read_chunk(&self.master, buf).await {
            Ok(n) => Ok(n),
            Err(e) if e.raw_os_error() == Some(libc::EIO) => Ok(0),
            Err(e) => Err(e),
        }
    }

    pub async fn write_all(&self, data: &[u8]) -> std::io::Result<()> {
        write_all(&self.master, data).await
    }

    pub fn child_pid(&self) -> i32 {
        self.child_pid.as_raw()
    }

    /// Graceful shutdown (§4.1, §5): SIGTERM to the child's process group,
    /// then SIGKILL after `grace` if it hasn't exited.
    pub async fn terminate(&self, grace: Duration) -> anyhow::Result<ExitStatus> {
        let pid = self.child_pid;
        let _ = killpg(pid, Signal::SIGTERM);

        let deadline = tokio::time::sleep(grace);
        tokio::pin!(deadline);
        let reaped = tokio::task::spawn_blocking(move || try_wait_nonblocking(pid, grace));
        tokio::select! {
            result = reaped => {
                if let Ok(Some(status)) = result {
                    return Ok(status);
                }
            }
            _ = &mut deadline => {}
        }

        let _ = killpg(pid, Signal::SIGKILL);
        tokio::task::spawn_blocking(move || wait_for_exit(pid)).await.context("join wait thread")?
    }

    /// Fire-and-forget variant of [`terminate`](Self::terminate) for callers
    /// that don't own reaping (the remote `action=terminate` path on the
    /// ticker task): signals only, never calls `waitpid`. Reaping stays the
    /// exclusive job of the PTY-read task's EOF handler, which always calls
    /// the real `terminate` afterward and would otherwise race this call for
    /// the child's zombie (a second `waitpid` on an already-reaped pid
    /// returns `ECHILD`).
    pub fn request_terminate(&self, grace: Duration) {
        let pid = self.child_pid;
        tokio::spawn(async move {
            let _ = killpg(pid, Signal::SIGTERM);
            tokio::time::sleep(grace).await;
            let _ = killpg(pid, Signal::SIGKILL);
        });
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        // Best-effort fallback if the caller never called `terminate`.
        let _ = killpg(self.child_pid, Signal::SIGTERM);
        std::thread::sleep(Duration::from_millis(50));
        let _ = killpg(self.child_pid, Signal::SIGKILL);
        let _ = waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG));
    }
}

fn try_wait_nonblocking(pid: Pid, budget: Duration) -> Option<ExitStatus> {
    let start = std::time::Instant::now();
    loop {
        match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(_, code)) => return Some(ExitStatus { code: Some(code), signal: None }),
            Ok(WaitStatus::Signaled(_, sig, _)) => {
                return Some(ExitStatus { code: None, signal: Some(sig as i32) })
            }
            Ok(WaitStatus::StillAlive) => {
                if start.elapsed() >= budget {
                    return None;
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Ok(_) => continue,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(_) => return None,
        }
    }
}

fn wait_for_exit(pid: Pid) -> anyhow::Result<ExitStatus> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ExitStatus { code: Some(code), signal: None }),
            Ok(WaitStatus::Signaled(_, sig, _)) => {
                return Ok(ExitStatus { code: None, signal: Some(sig as i32) })
            }
            Ok(_) => continue,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => anyhow::bail!("waitpid failed: {e}"),
        }
    }
}
