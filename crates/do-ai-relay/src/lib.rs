// SPDX-License-Identifier: MIT

//! The relay service: an in-memory session registry fronted by a small
//! HTTP API (§4). Grounded on the teacher's `coop_mux` crate — same shape
//! (`RunConfig` + `State<Arc<_>>` + `build_router` + `run`), generalized
//! from a PTY-proxying mux to a heartbeat/output/control relay.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod notify;
pub mod store;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::RelayConfig;
pub use store::RelayStore;

/// Shared state handed to every handler. Two independent `State<T>`
/// extractors (`Arc<RelayStore>`, `Arc<RelayConfig>`) are derived from this
/// via [`FromRef`], so handlers only ask for the piece they need.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RelayStore>,
    pub config: Arc<RelayConfig>,
}

impl FromRef<AppState> for Arc<RelayStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Arc<RelayConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

/// Build the axum `Router` with every route from §4.6, auth middleware,
/// permissive CORS (the relay is consumed by browser dashboards as well as
/// the reporter client), and request tracing.
pub fn build_router(store: Arc<RelayStore>, config: Arc<RelayConfig>) -> Router {
    let state = AppState { store: store.clone(), config };

    Router::new()
        .route("/healthz", get(http::healthz))
        .route("/", get(http::dashboard))
        .route("/api/v1/heartbeat", post(http::heartbeat))
        .route("/api/v1/sessions", get(http::list_sessions))
        .route("/api/v1/control/send", post(http::control_send))
        .route("/api/v1/control/pull", get(http::control_pull))
        .route("/api/v1/output/push", post(http::output_push))
        .route("/api/v1/output/list", get(http::output_list))
        .route("/api/v1/output/screen", get(http::output_screen))
        .fallback(http::not_found)
        .layer(middleware::from_fn(http::rewrite_method_not_allowed))
        .layer(middleware::from_fn_with_state(store, auth::auth_layer))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the relay until the process receives a shutdown signal.
pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    let token = config.token.clone();
    let store = Arc::new(RelayStore::new(token));
    let config = Arc::new(config);

    let router = build_router(store, config.clone());
    let listener = TcpListener::bind(&config.listen).await?;
    tracing::info!(addr = %config.listen, "do-ai relay listening");

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sig = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        sig.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
