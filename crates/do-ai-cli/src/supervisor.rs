// SPDX-License-Identifier: MIT

//! Orchestrates the child PTY, idle-triggered injection, DSR, stdin/stdout
//! relay, and reporter traffic (§4.1, §5). Three concurrent tasks share
//! the PTY master and a small set of atomics, generalizing the teacher's
//! `attach.rs` task layout (blocking-thread stdin reader feeding an mpsc
//! channel, synchronous stdout writes, a `tokio::select!` event loop) from
//! a WebSocket transport to a forked child PTY plus an HTTP reporter.

use std::io::Write;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use do_ai_proto::{ControlCommand, Session, SessionState};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::config::RuntimeConfig;
use crate::dsr::DsrResponder;
use crate::error::SupervisorError;
use crate::injection::InjectionPolicy;
use crate::lifeline;
use crate::meaningful::MeaningfulFilter;
use crate::pty::{ExitStatus, PtySession, RawModeGuard};
use crate::reporter::ReporterClient;
use crate::stdin_norm::StdinNormalizer;

/// Grace period between SIGTERM and SIGKILL for child termination (§5).
const TERMINATE_GRACE: Duration = Duration::from_millis(500);
const DEFAULT_COLS: u16 = 80;
const DEFAULT_ROWS: u16 = 24;
const TICK_PERIOD: Duration = Duration::from_secs(1);
/// Poll period for the DSR debounce check (§4.1 "DSR handling" asks for a
/// 50ms debounce window; this must be finer-grained than the 1s idle tick).
const DSR_POLL_PERIOD: Duration = Duration::from_millis(10);

fn now_ms() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

fn now_unix() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// `TIOCGWINSZ` on stdout; grounded on the teacher's `attach.rs::terminal_size`.
#[allow(unsafe_code)]
fn terminal_size() -> (u16, u16) {
    let fd = std::io::stdout().as_raw_fd();
    let mut ws = nix::libc::winsize { ws_row: 0, ws_col: 0, ws_xpixel: 0, ws_ypixel: 0 };
    // SAFETY: TIOCGWINSZ ioctl reads terminal size into a winsize struct.
    // fd is stdout, valid for the process lifetime; ws is a properly
    // initialized stack variable with the correct layout for this ioctl.
    let ret = unsafe { nix::libc::ioctl(fd, nix::libc::TIOCGWINSZ, &mut ws) };
    if ret == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        (ws.ws_col, ws.ws_row)
    } else {
        (DEFAULT_COLS, DEFAULT_ROWS)
    }
}

fn hostname() -> String {
    let mut buf = [0u8; 256];
    match nix::unistd::gethostname(&mut buf) {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(_) => "unknown".to_owned(),
    }
}

/// Timestamps and counters touched from more than one task (§5): always
/// accessed through atomics, never behind a lock shared with blocking I/O.
struct Shared {
    last_meaningful_output_ms: AtomicU64,
    last_injection_ms: AtomicU64,
    kick_count: AtomicU64,
    lifeline_alive: AtomicBool,
    dsr: Mutex<DsrResponder>,
}

impl Shared {
    fn new() -> Arc<Self> {
        let now = now_ms();
        Arc::new(Self {
            last_meaningful_output_ms: AtomicU64::new(now),
            last_injection_ms: AtomicU64::new(0),
            kick_count: AtomicU64::new(0),
            lifeline_alive: AtomicBool::new(true),
            dsr: Mutex::new(DsrResponder::new()),
        })
    }
}

/// Static facts about the session, fixed at startup.
struct SessionInfo {
    session_id: String,
    session_name: String,
    host: String,
    cwd: String,
    command_line: String,
    started_at: u64,
    message_main: String,
    message_calib: String,
    calib_period: u32,
}

fn build_session(info: &SessionInfo, shared: &Shared, state: SessionState, exit_code: Option<i32>) -> Session {
    let now = now_unix();
    let last_output_at = shared.last_meaningful_output_ms.load(Ordering::Relaxed) / 1000;
    let last_kick_at = shared.last_injection_ms.load(Ordering::Relaxed) / 1000;
    let idle_seconds = now.saturating_sub(last_output_at);
    Session {
        session_id: info.session_id.clone(),
        session_name: info.session_name.clone(),
        host: info.host.clone(),
        cwd: info.cwd.clone(),
        command: info.command_line.clone(),
        state,
        exit_code,
        started_at: info.started_at,
        updated_at: now,
        last_output_at,
        last_kick_at,
        idle_seconds,
        kick_count: shared.kick_count.load(Ordering::Relaxed),
        last_text: String::new(),
    }
}

/// Run the supervisor to completion: launch `config.command` under a PTY,
/// relay I/O, inject on idleness, and report to the relay. Blocks until the
/// child exits; returns its exit code (§4.1 `run`).
pub async fn run(config: RuntimeConfig) -> Result<i32, SupervisorError> {
    if !nix::unistd::isatty(std::io::stdin().as_raw_fd()).unwrap_or(false) {
        return Err(SupervisorError::Usage("stdin is not a tty".into()));
    }

    let (cols, rows) = terminal_size();
    let pty = PtySession::spawn(&config.command, cols, rows, &config.term)
        .map_err(|e| SupervisorError::Startup(format!("spawning child: {e}")))?;
    let pty = Arc::new(pty);

    let raw_guard = RawModeGuard::enable(std::io::stdin().as_raw_fd())
        .map_err(|e| SupervisorError::Startup(format!("entering raw mode: {e}")))?;

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let lifeline_path =
        lifeline::write(&cwd).map_err(|e| SupervisorError::Startup(format!("lifeline file: {e}")))?;

    let session_id = uuid::Uuid::new_v4().to_string();
    let info = Arc::new(SessionInfo {
        session_id: session_id.clone(),
        session_name: config.command.first().cloned().unwrap_or_default(),
        host: hostname(),
        cwd: cwd.display().to_string(),
        command_line: config.command.join(" "),
        started_at: now_unix(),
        message_main: lifeline::substitute(&config.message_main, &lifeline_path),
        message_calib: lifeline::substitute(&config.message_calib, &lifeline_path),
        calib_period: config.calib_period,
    });

    let policy = Arc::new(InjectionPolicy::resolve(
        config.command.first().map(String::as_str).unwrap_or(""),
        config.submit_mode.as_deref(),
        config.clear_mode.as_deref(),
        Some(config.inject_chunk_size),
    ));

    let relay_url =
        crate::reporter::resolve_relay_url(&config.relay_url, crate::config::DEFAULT_RELAY_URL, config.relay_strict)
            .await;

    let reporter = ReporterClient::new(
        relay_url,
        config.relay_token.clone(),
        session_id.clone(),
        config.heartbeat_interval,
        config.flush_interval,
        config.pull_interval,
    );

    let shared = Shared::new();

    let startup_session = build_session(&info, &shared, SessionState::Running, None);
    reporter.heartbeat(&startup_session, true).await;

    let (exit_tx, exit_rx) = oneshot::channel::<ExitStatus>();

    let read_task = spawn_pty_reader(pty.clone(), shared.clone(), reporter.clone(), exit_tx);
    let stdin_task = spawn_stdin_forwarder(pty.clone(), shared.clone());
    let dsr_task = spawn_dsr_checker(pty.clone(), shared.clone());

    let result =
        run_ticker(pty.clone(), shared, info, policy, reporter.clone(), config.idle, &lifeline_path, exit_rx).await;

    // Cancellation is implicit (§5): dropping the PTY closes the master,
    // which unblocks the two I/O tasks' blocked reads. Abort them directly
    // once the ticker has concluded so the process doesn't wait on stdin.
    read_task.abort();
    stdin_task.abort();
    dsr_task.abort();
    drop(raw_guard);
    drop(pty);

    result
}

fn spawn_pty_reader(
    pty: Arc<PtySession>,
    shared: Arc<Shared>,
    reporter: Arc<ReporterClient>,
    exit_tx: oneshot::Sender<ExitStatus>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = [0u8; 8192];
        let mut filter = MeaningfulFilter::new();
        let mut stdout = std::io::stdout();
        loop {
            match pty.read_chunk(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let chunk = &buf[..n];
                    let _ = stdout.write_all(chunk);
                    let _ = stdout.flush();
                    if filter.feed(chunk) {
                        shared.last_meaningful_output_ms.store(now_ms(), Ordering::Relaxed);
                    }
                    shared.dsr.lock().on_child_output(chunk);
                    reporter.enqueue_output(chunk);
                }
                Err(_) => break,
            }
        }
        // Sole reaper (§9): a natural exit shows up here as EOF too, and
        // `terminate` on an already-dead child is a harmless kill-then-reap.
        let status = pty.terminate(TERMINATE_GRACE).await.unwrap_or(ExitStatus { code: Some(1), signal: None });
        let _ = exit_tx.send(status);
    })
}

/// Poll the DSR debounce state at [`DSR_POLL_PERIOD`] (finer than the 1s
/// idle tick, §4.1/§9 "DSR debouncing": a single scheduled one-shot check,
/// resettable on an observed genuine reply).
fn spawn_dsr_checker(pty: Arc<PtySession>, shared: Arc<Shared>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(DSR_POLL_PERIOD);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Some(reply) = shared.dsr.lock().check() {
                let _ = pty.write_all(reply).await;
            }
        }
    })
}

fn spawn_stdin_forwarder(pty: Arc<PtySession>, shared: Arc<Shared>) -> tokio::task::JoinHandle<()> {
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(64);
    // Grounded on the teacher's `attach.rs`: a dedicated blocking thread for
    // stdin (tokio has no portable non-blocking stdin) feeding an mpsc
    // channel drained by the async side.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut handle = stdin.lock();
        let mut buf = [0u8; 4096];
        loop {
            match std::io::Read::read(&mut handle, &mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.blocking_send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    tokio::spawn(async move {
        let mut normalizer = StdinNormalizer::from_env();
        while let Some(chunk) = rx.recv().await {
            shared.dsr.lock().on_local_input(&chunk);
            let normalized = normalizer.feed(&chunk);
            if pty.write_all(&normalized).await.is_err() {
                break;
            }
        }
    })
}

/// Write an [`InjectionPlan`](crate::injection::InjectionPlan) to the PTY in
/// order, honoring its inter-step delays (§4.1 `inject`).
async fn perform_injection(pty: &PtySession, policy: &InjectionPolicy, payload: &str) {
    let plan = policy.build(payload);
    if let Some(clear) = &plan.clear {
        let _ = pty.write_all(clear).await;
    }
    for chunk in &plan.payload_chunks {
        let _ = pty.write_all(chunk).await;
        tokio::time::sleep(plan.chunk_delay).await;
    }
    if !plan.submit_writes.is_empty() {
        tokio::time::sleep(plan.submit_delay).await;
        for write in &plan.submit_writes {
            let _ = pty.write_all(write).await;
        }
    }
    if let Some(fallback) = &plan.fallback {
        tokio::time::sleep(plan.fallback_delay).await;
        let _ = pty.write_all(fallback).await;
    }
}

/// Apply one pulled remote command (§4.1 `handleRemoteCommand`).
async fn handle_remote_command(pty: &PtySession, policy: &InjectionPolicy, cmd: &ControlCommand) {
    if cmd.is_terminate() {
        pty.request_terminate(TERMINATE_GRACE);
        return;
    }
    if !cmd.is_applicable() {
        return;
    }
    let plan = policy.build(&cmd.input);
    if !cmd.input.is_empty() {
        for chunk in &plan.payload_chunks {
            let _ = pty.write_all(chunk).await;
            tokio::time::sleep(plan.chunk_delay).await;
        }
    }
    if cmd.submit && !plan.submit_writes.is_empty() {
        for write in &plan.submit_writes {
            let _ = pty.write_all(write).await;
        }
    }
}

/// Pure idle-kick decision (§4.1 "Idle algorithm"). `last_injection_ms == 0`
/// means no kick has fired yet, which must not itself suppress the first one.
fn kick_due(idle_secs: u64, now_ms: u64, last_meaningful_output_ms: u64, last_injection_ms: u64) -> bool {
    if idle_secs == 0 {
        return false;
    }
    let since_out = now_ms.saturating_sub(last_meaningful_output_ms) / 1000;
    let since_kick =
        if last_injection_ms == 0 { u64::MAX } else { now_ms.saturating_sub(last_injection_ms) / 1000 };
    since_out >= idle_secs && since_kick >= idle_secs
}

/// Every `calib_period`-th kick (1-indexed, `kick_count` already incremented
/// for the current kick) uses the calibration message.
fn is_calibration_kick(kick_count: u64, calib_period: u32) -> bool {
    calib_period > 0 && kick_count % calib_period as u64 == 0
}

#[allow(clippy::too_many_arguments)]
async fn run_ticker(
    pty: Arc<PtySession>,
    shared: Arc<Shared>,
    info: Arc<SessionInfo>,
    policy: Arc<InjectionPolicy>,
    reporter: Arc<ReporterClient>,
    idle: Duration,
    lifeline_path: &Path,
    mut exit_rx: oneshot::Receiver<ExitStatus>,
) -> Result<i32, SupervisorError> {
    let idle_secs = idle.as_secs();
    let mut interval = tokio::time::interval(TICK_PERIOD);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            status = &mut exit_rx => {
                let status = status.unwrap_or(ExitStatus { code: Some(1), signal: None });
                let session = build_session(&info, &shared, SessionState::Exited, Some(status.code_or_default()));
                reporter.heartbeat(&session, true).await;
                return Ok(status.code_or_default());
            }
            _ = interval.tick() => {
                if shared.lifeline_alive.load(Ordering::Relaxed) && !lifeline::exists(lifeline_path) {
                    shared.lifeline_alive.store(false, Ordering::Relaxed);
                }

                if shared.lifeline_alive.load(Ordering::Relaxed) {
                    let now = now_ms();
                    let last_out = shared.last_meaningful_output_ms.load(Ordering::Relaxed);
                    let last_injection = shared.last_injection_ms.load(Ordering::Relaxed);
                    if kick_due(idle_secs, now, last_out, last_injection) {
                        shared.last_injection_ms.store(now, Ordering::Relaxed);
                        let kick_count = shared.kick_count.fetch_add(1, Ordering::Relaxed) + 1;
                        let message = if is_calibration_kick(kick_count, info.calib_period) {
                            &info.message_calib
                        } else {
                            &info.message_main
                        };
                        perform_injection(&pty, &policy, message).await;
                    }
                }

                let session = build_session(&info, &shared, SessionState::Running, None);
                reporter.heartbeat(&session, false).await;

                for cmd in reporter.pull_commands().await {
                    handle_remote_command(&pty, &policy, &cmd).await;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
