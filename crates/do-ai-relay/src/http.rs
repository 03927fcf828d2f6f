// SPDX-License-Identifier: MIT

//! HTTP handlers (§4.6). One function per route, grounded on the
//! teacher's `coop_mux::transport::http` shape (typed request/response
//! structs, `State<Arc<RelayStore>>`, `IntoResponse` everywhere).

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use do_ai_proto::{
    normalize_action, ControlCommand, ControlPullResponse, ControlSendRequest, HealthResponse,
    OutputEvent, OutputListResponse, OutputPushRequest, OutputPushResponse, OutputScreenResponse,
    Session, SessionListResponse, StyleSegment, StyledLine,
};

use crate::error::RelayError;
use crate::notify;
use crate::store::RelayStore;
use crate::RelayConfig;

const CONTROL_INPUT_CAP: usize = 4096;
const OUTPUT_LIST_DEFAULT_LIMIT: usize = 200;
const OUTPUT_LIST_MAX_LIMIT: usize = 400;
const SCREEN_DEFAULT_LIMIT: usize = 220;
const SCREEN_MAX_LIMIT: usize = 600;
const SCREEN_MIN_LIMIT: usize = 10;
const PULL_DEFAULT_LIMIT: usize = 8;
const PULL_MAX_LIMIT: usize = 20;

pub const DASHBOARD_HTML: &str = include_str!("dashboard.html");

fn now_unix() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// Parse a query-string numeric field. Missing is `default`; present but
/// non-numeric is a `400 InvalidRequest` (§7 "non-numeric pagination").
fn parse_numeric_query(
    params: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<u64, axum::response::Response> {
    match params.get(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<u64>().map_err(|_| {
            RelayError::InvalidRequest.to_http_response(format!("{key} must be numeric")).into_response()
        }),
    }
}

fn truthy(params: &HashMap<String, String>, key: &str) -> bool {
    matches!(params.get(key).map(String::as_str), Some("1") | Some("true"))
}

// -- GET /healthz -------------------------------------------------------------

pub async fn healthz() -> impl IntoResponse {
    Json(HealthResponse { ok: true })
}

// -- GET / ----------------------------------------------------------------------

pub async fn dashboard() -> impl IntoResponse {
    Html(DASHBOARD_HTML)
}

// -- fallback: any path not matched by a route above (§7 NotFound) --------------

pub async fn not_found() -> axum::response::Response {
    RelayError::NotFound.to_http_response("no such endpoint").into_response()
}

/// Rewrites axum's default empty-bodied `405` into the `{error:{...}}` shape
/// used by every other error response, with the offending method named in
/// the message (§7 MethodNotAllowed). Must run closer to routing than the
/// auth layer so it sees the response axum's `MethodRouter` produced.
pub async fn rewrite_method_not_allowed(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = req.method().clone();
    let resp = next.run(req).await;
    if resp.status() == axum::http::StatusCode::METHOD_NOT_ALLOWED {
        return RelayError::MethodNotAllowed.to_http_response(format!("method {method} not allowed")).into_response();
    }
    resp
}

// -- POST /api/v1/heartbeat ----------------------------------------------------

pub async fn heartbeat(
    State(store): State<Arc<RelayStore>>,
    State(config): State<Arc<RelayConfig>>,
    Json(mut session): Json<Session>,
) -> axum::response::Response {
    if session.session_id.trim().is_empty() {
        return RelayError::InvalidRequest.to_http_response("session_id is required").into_response();
    }
    if session.host.trim().is_empty() {
        session.host = "unknown".to_owned();
    }

    let snapshot = session.clone();
    store.upsert(session).await;

    let keywords = config.alert_keywords();
    let notifier = notify::Notifier::new(config.webhook_urls(), config.bot_url.clone(), config.bot_chat_id.clone());
    let alerts = notify::evaluate(&snapshot, config.idle_alert_secs, &keywords);
    let cooldown = std::time::Duration::from_secs(config.alert_cooldown_secs);
    for alert in alerts {
        if store.allow_notify(&alert.key, cooldown) && notifier.is_configured() {
            let notifier = notifier.clone();
            tokio::spawn(async move {
                notifier.dispatch(&alert.title, &alert.message).await;
            });
        }
    }

    Json(serde_json::json!({ "ok": true })).into_response()
}

// -- GET /api/v1/sessions -------------------------------------------------------

pub async fn list_sessions(
    State(store): State<Arc<RelayStore>>,
    State(config): State<Arc<RelayConfig>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let all = truthy(&params, "all");
    let sessions = store.list(config.stale_secs, !all).await;
    Json(SessionListResponse { count: sessions.len(), sessions, ts: now_unix(), online_only: !all })
}

// -- POST /api/v1/control/send -------------------------------------------------

pub async fn control_send(
    State(store): State<Arc<RelayStore>>,
    Json(req): Json<ControlSendRequest>,
) -> axum::response::Response {
    if req.session_id.trim().is_empty() {
        return RelayError::InvalidRequest.to_http_response("session_id is required").into_response();
    }
    let action = normalize_action(req.action.as_deref().unwrap_or(""));
    if req.action.as_deref().is_some_and(|a| !a.trim().is_empty()) && action.is_empty() {
        return RelayError::InvalidRequest
            .to_http_response("action must be empty or \"terminate\"")
            .into_response();
    }

    let input: String = req.input.chars().take(CONTROL_INPUT_CAP).collect();
    let cmd = ControlCommand {
        id: uuid::Uuid::new_v4().to_string(),
        session_id: req.session_id.clone(),
        input,
        submit: req.submit,
        action: action.clone(),
        source: req.source,
        created_at: now_unix(),
    };

    if !cmd.is_applicable() {
        return RelayError::InvalidRequest
            .to_http_response("one of input, submit, action is required")
            .into_response();
    }

    store.enqueue_command(cmd).await;
    if action == "terminate" {
        store.mark_stopping(&req.session_id, "control").await;
    }

    Json(serde_json::json!({ "ok": true })).into_response()
}

// -- GET /api/v1/control/pull ---------------------------------------------------

pub async fn control_pull(
    State(store): State<Arc<RelayStore>>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let Some(session_id) = params.get("session_id").cloned() else {
        return RelayError::InvalidRequest.to_http_response("session_id is required").into_response();
    };
    let limit = match parse_numeric_query(&params, "limit", PULL_DEFAULT_LIMIT as u64) {
        Ok(v) => (v as usize).clamp(1, PULL_MAX_LIMIT),
        Err(resp) => return resp,
    };

    let commands = store.pull_commands(&session_id, limit).await;
    Json(ControlPullResponse { commands }).into_response()
}

// -- POST /api/v1/output/push --------------------------------------------------

pub async fn output_push(
    State(store): State<Arc<RelayStore>>,
    Json(req): Json<OutputPushRequest>,
) -> axum::response::Response {
    if req.session_id.trim().is_empty() {
        return RelayError::InvalidRequest.to_http_response("session_id is required").into_response();
    }

    let raw_chunks: Vec<Vec<u8>> = req.raw_chunks.iter().filter_map(|b64| BASE64.decode(b64).ok()).collect();
    let ts = if req.ts == 0 { now_unix() } else { req.ts };
    let created = store.append(&req.session_id, &req.lines, &raw_chunks, ts).await;

    Json(OutputPushResponse { created }).into_response()
}

// -- GET /api/v1/output/list ----------------------------------------------------

pub async fn output_list(
    State(store): State<Arc<RelayStore>>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let Some(session_id) = params.get("session_id").cloned() else {
        return RelayError::InvalidRequest.to_http_response("session_id is required").into_response();
    };
    let tail = truthy(&params, "tail");
    let before = match parse_numeric_query(&params, "before", 0) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let after = match parse_numeric_query(&params, "after", 0) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let limit = match parse_numeric_query(&params, "limit", OUTPUT_LIST_DEFAULT_LIMIT as u64) {
        Ok(v) => (v as usize).clamp(1, OUTPUT_LIST_MAX_LIMIT),
        Err(resp) => return resp,
    };

    let page = store.list_output(&session_id, after, before, limit, tail).await;
    let cursor = page.events.last().map(|e: &OutputEvent| e.seq).unwrap_or(after);
    Json(OutputListResponse {
        count: page.events.len(),
        events: page.events,
        cursor,
        has_more_before: page.has_more_before,
        ts: now_unix(),
    })
    .into_response()
}

// -- GET /api/v1/output/screen --------------------------------------------------

pub async fn output_screen(
    State(store): State<Arc<RelayStore>>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let Some(session_id) = params.get("session_id").cloned() else {
        return RelayError::InvalidRequest.to_http_response("session_id is required").into_response();
    };
    let limit = match parse_numeric_query(&params, "limit", SCREEN_DEFAULT_LIMIT as u64) {
        Ok(v) => (v as usize).clamp(SCREEN_MIN_LIMIT, SCREEN_MAX_LIMIT),
        Err(resp) => return resp,
    };

    let Some(screen) = store.get_screen(&session_id, limit).await else {
        return RelayError::NotFound.to_http_response("session not found").into_response();
    };

    let styled_lines: Vec<StyledLine> = screen
        .styled_lines
        .into_iter()
        .map(|segments| StyledLine {
            segments: segments
                .into_iter()
                .map(|(text, style)| StyleSegment {
                    text,
                    fg: style.fg.unwrap_or_default(),
                    bg: style.bg.unwrap_or_default(),
                    bold: style.bold,
                    italic: style.italic,
                    underline: style.underline,
                })
                .collect(),
        })
        .collect();
    let content = screen.lines.join("\n");

    Json(OutputScreenResponse {
        session_id: screen.session_id,
        line_count: screen.lines.len(),
        lines: screen.lines,
        styled_lines,
        content,
        cursor_row: screen.cursor_row,
        cursor_col: screen.cursor_col,
        revision: screen.revision,
        truncated: screen.truncated,
        ts: now_unix(),
    })
    .into_response()
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
