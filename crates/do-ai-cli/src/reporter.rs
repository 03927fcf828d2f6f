// SPDX-License-Identifier: MIT

//! Outbound heartbeat, output batching, and control-command pull (§4.3).
//! Grounded on the teacher's `cli::mux_client` (bounded-timeout `reqwest`
//! client, dual auth headers, retry-free best-effort sends) and the
//! teacher's `test_support.rs` use of `parking_lot::Mutex` for a pending
//! buffer that is never held across an `.await`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use do_ai_proto::{ControlCommand, ControlPullResponse, OutputPushRequest, Session};
use parking_lot::Mutex;

const OUTPUT_LINE_CAP: usize = 240;
const RAW_CHUNK_CAP: usize = 120;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);
const PROBE_TIMEOUT: Duration = Duration::from_millis(300);

fn now_unix() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_secs()
}

fn now_millis() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

#[derive(Default)]
struct PendingOutput {
    lines: VecDeque<String>,
    raw_chunks: VecDeque<Vec<u8>>,
    flush_scheduled: bool,
}

fn push_capped<T>(queue: &mut VecDeque<T>, item: T, cap: usize) {
    queue.push_back(item);
    while queue.len() > cap {
        queue.pop_front();
    }
}

/// Talks to the relay on behalf of one supervised session (§4.3).
pub struct ReporterClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    session_id: String,
    heartbeat_interval: Duration,
    flush_interval: Duration,
    pull_interval: Duration,
    last_heartbeat_ms: AtomicU64,
    last_pull_ms: AtomicU64,
    pending: Mutex<PendingOutput>,
}

impl ReporterClient {
    pub fn new(
        base_url: String,
        token: Option<String>,
        session_id: String,
        heartbeat_interval: Duration,
        flush_interval: Duration,
        pull_interval: Duration,
    ) -> Arc<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Arc::new(Self {
            client,
            base_url,
            token,
            session_id,
            heartbeat_interval,
            flush_interval,
            pull_interval,
            last_heartbeat_ms: AtomicU64::new(0),
            last_pull_ms: AtomicU64::new(0),
            pending: Mutex::new(PendingOutput::default()),
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(t) if !t.is_empty() => builder.bearer_auth(t).header("X-Relay-Token", t),
            _ => builder,
        }
    }

    /// Coalesced to at most one POST per `heartbeat_interval`, unless
    /// `force` (used for the synchronous final heartbeat on child exit).
    pub async fn heartbeat(&self, session: &Session, force: bool) {
        let now = now_millis();
        if !force {
            let last = self.last_heartbeat_ms.load(Ordering::Relaxed);
            if now.saturating_sub(last) < self.heartbeat_interval.as_millis() as u64 {
                return;
            }
        }
        self.last_heartbeat_ms.store(now, Ordering::Relaxed);

        let url = format!("{}/api/v1/heartbeat", self.base_url);
        let req = self.request(self.client.post(url)).json(session);
        if let Err(e) = req.send().await {
            tracing::debug!(err = %e, "reporter: heartbeat failed");
        }
    }

    /// Buffer a chunk of child output. Schedules a flush `flush_interval`
    /// after the first buffered write in the current window; subsequent
    /// writes before that flush fires are merged into the same batch.
    pub fn enqueue_output(self: &Arc<Self>, raw: &[u8]) {
        let mut should_spawn = false;
        {
            let mut pending = self.pending.lock();
            for line in String::from_utf8_lossy(raw).split('\n') {
                let line = line.strip_suffix('\r').unwrap_or(line);
                if !line.is_empty() {
                    push_capped(&mut pending.lines, line.to_owned(), OUTPUT_LINE_CAP);
                }
            }
            push_capped(&mut pending.raw_chunks, raw.to_vec(), RAW_CHUNK_CAP);
            if !pending.flush_scheduled {
                pending.flush_scheduled = true;
                should_spawn = true;
            }
        }

        if should_spawn {
            let this = self.clone();
            let delay = self.flush_interval;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                this.flush().await;
            });
        }
    }

    async fn flush(&self) {
        let (lines, raw_chunks) = {
            let mut pending = self.pending.lock();
            pending.flush_scheduled = false;
            (pending.lines.drain(..).collect::<Vec<_>>(), pending.raw_chunks.drain(..).collect::<Vec<_>>())
        };
        if lines.is_empty() && raw_chunks.is_empty() {
            return;
        }

        let body = OutputPushRequest {
            session_id: self.session_id.clone(),
            lines,
            raw_chunks: raw_chunks.iter().map(|c| BASE64.encode(c)).collect(),
            ts: now_unix(),
        };

        let url = format!("{}/api/v1/output/push", self.base_url);
        let req = self.request(self.client.post(url)).json(&body);
        // Failures drop the batch; it is never re-queued (§4.3).
        if let Err(e) = req.send().await {
            tracing::debug!(err = %e, "reporter: output flush failed");
        }
    }

    /// At most one pull per `pull_interval`. Returns an empty vec both when
    /// throttled and when the request itself fails.
    pub async fn pull_commands(&self) -> Vec<ControlCommand> {
        let now = now_millis();
        let last = self.last_pull_ms.load(Ordering::Relaxed);
        if now.saturating_sub(last) < self.pull_interval.as_millis() as u64 {
            return Vec::new();
        }
        self.last_pull_ms.store(now, Ordering::Relaxed);

        let url = format!("{}/api/v1/control/pull?session_id={}", self.base_url, self.session_id);
        let req = self.request(self.client.get(url));
        match req.send().await {
            Ok(resp) => match resp.json::<ControlPullResponse>().await {
                Ok(body) => body.commands,
                Err(e) => {
                    tracing::debug!(err = %e, "reporter: pull decode failed");
                    Vec::new()
                }
            },
            Err(e) => {
                tracing::debug!(err = %e, "reporter: pull failed");
                Vec::new()
            }
        }
    }
}

/// §4.3 "Lifecycle": when the configured relay URL points at a local host
/// and strict mode is off, probe it before committing to it, substituting
/// `default_url` on failure. Strict mode (or a non-local URL) never
/// substitutes — the configured value is used as-is (§9 "Reachability
/// probe": "expose a strict mode that never substitutes").
pub async fn resolve_relay_url(configured: &str, default_url: &str, strict: bool) -> String {
    if strict || !is_local_url(configured) {
        return configured.to_owned();
    }
    if probe_reachable(configured).await {
        configured.to_owned()
    } else {
        tracing::debug!(url = configured, "reporter: local relay unreachable, falling back to default");
        default_url.to_owned()
    }
}

/// True if `url`'s host component is a loopback/local hostname.
fn is_local_url(url: &str) -> bool {
    match host_port(url) {
        Some(hostport) => {
            let host = hostport.split(':').next().unwrap_or("");
            matches!(host, "localhost" | "127.0.0.1" | "::1" | "0.0.0.0")
        }
        None => false,
    }
}

fn host_port(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    Some(rest.split('/').next().unwrap_or(rest))
}

async fn probe_reachable(url: &str) -> bool {
    let Some(hostport) = host_port(url) else {
        return true;
    };
    let target = if hostport.contains(':') { hostport.to_owned() } else { format!("{hostport}:80") };
    match tokio::time::timeout(PROBE_TIMEOUT, tokio::net::TcpStream::connect(&target)).await {
        Ok(Ok(_)) => true,
        _ => false,
    }
}

#[cfg(test)]
#[path = "reporter_tests.rs"]
mod tests;
