//! HTTP control socket: read and update the live settings, query the last
//! status snapshot and long-poll the next one.

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use futures::FutureExt;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use thermod::{SettingsPatch, TimetableError};

use crate::state::Shared;

pub fn router(shared: Arc<Shared>) -> Router {
    Router::new()
        .route(
            "/settings",
            get(get_settings).post(post_settings).fallback(not_implemented),
        )
        .route("/heating", get(get_status).fallback(not_implemented))
        .route("/status", get(get_status).fallback(not_implemented))
        .route("/monitor", get(get_monitor).fallback(not_implemented))
        .fallback(not_found)
        .layer(middleware::from_fn(catch_unhandled))
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Serves the control socket until the shutdown future resolves.
pub async fn serve(
    listener: tokio::net::TcpListener,
    shared: Arc<Shared>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(
        listener,
        router(shared).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

async fn get_settings(State(shared): State<Arc<Shared>>) -> Response {
    // The lock gives a coherent snapshot even though this is a pure read.
    let daemon = shared.daemon.lock().await;
    Json(daemon.timetable.settings().clone()).into_response()
}

async fn post_settings(
    State(shared): State<Arc<Shared>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Bytes,
) -> Response {
    let patch: SettingsPatch = match serde_json::from_slice(&body) {
        Ok(patch) => patch,
        Err(err) => {
            warn!(
                "('{}', {}) cannot update settings: {err}",
                addr.ip(),
                addr.port()
            );
            let message = if err.is_data() {
                "incomplete or invalid JSON-encoded settings"
            } else {
                "invalid JSON syntax"
            };
            return bad_request(message, err.to_string());
        }
    };

    if patch.is_empty() {
        warn!(
            "('{}', {}) cannot update settings: the request contains no data",
            addr.ip(),
            addr.port()
        );
        return bad_request("no settings provided", String::new());
    }

    let mut daemon = shared.daemon.lock().await;
    let result = daemon.timetable.update(patch);
    drop(daemon);

    match result {
        Ok(()) => {
            // The notify is what makes the change visible within one
            // wake-up instead of a full interval.
            shared.wakeup.notify_one();
            info!("('{}', {}) settings updated", addr.ip(), addr.port());
            StatusCode::OK.into_response()
        }
        Err(TimetableError::Io(err)) => {
            error!(
                "('{}', {}) cannot save new settings to filesystem: {err}",
                addr.ip(),
                addr.port()
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "cannot save new settings to filesystem",
                    "explain": err.to_string(),
                })),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                "('{}', {}) cannot update settings: {err}",
                addr.ip(),
                addr.port()
            );
            bad_request("incomplete or invalid JSON-encoded settings", err.to_string())
        }
    }
}

async fn get_status(State(shared): State<Arc<Shared>>) -> Response {
    let daemon = shared.daemon.lock().await;
    Json(daemon.last_status.clone()).into_response()
}

#[derive(Debug, Deserialize)]
struct MonitorParams {
    #[serde(default)]
    name: Option<String>,
}

/// Long-poll: hold the connection until the next status publication, return
/// that snapshot and close. Monitors re-subscribe by issuing a new request.
async fn get_monitor(
    State(shared): State<Arc<Shared>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(params): Query<MonitorParams>,
) -> Response {
    let monitor = params.name.unwrap_or_else(|| addr.ip().to_string());
    debug!(
        "('{}', {}) monitor `{monitor}` waiting for the next status",
        addr.ip(),
        addr.port()
    );

    let mut rx = shared.status.subscribe();
    if rx.changed().await.is_err() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "the daemon is shutting down"})),
        )
            .into_response();
    }

    let status = rx.borrow().clone();
    debug!(
        "('{}', {}) sending status to monitor `{monitor}`",
        addr.ip(),
        addr.port()
    );
    Json(status).into_response()
}

async fn not_found(ConnectInfo(addr): ConnectInfo<SocketAddr>, req: Request) -> Response {
    warn!(
        "('{}', {}) invalid request \"{} {}\" received",
        addr.ip(),
        addr.port(),
        req.method(),
        req.uri().path()
    );
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "invalid request"})),
    )
        .into_response()
}

async fn not_implemented(ConnectInfo(addr): ConnectInfo<SocketAddr>, req: Request) -> Response {
    warn!(
        "('{}', {}) method \"{}\" not implemented",
        addr.ip(),
        addr.port(),
        req.method()
    );
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(json!({"error": format!("method {} not implemented", req.method())})),
    )
        .into_response()
}

fn bad_request(message: &str, explain: String) -> Response {
    let body = if explain.is_empty() {
        json!({"error": message})
    } else {
        json!({"error": message, "explain": explain})
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// Last line of defence: a panicking handler becomes a 500 response and a
/// critical log line instead of a dropped connection.
async fn catch_unhandled(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(_panic) => {
            error!(
                "('{}', {}) the {} request produced an unhandled panic exception",
                addr.ip(),
                addr.port(),
                method
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "unhandled exception"})),
            )
                .into_response()
        }
    }
}
