// Copyright 2026 PESU Auth Contributors
// SPDX-License-Identifier: MIT

//! HTTP REST API.
//!
//! `POST /authenticate` validates the body, runs one authentication attempt
//! on its own task, and returns the result stamped with the current time.
//! Rejected logins are still 200; only malformed requests are 400.

use crate::config::ServerConfig;
use crate::timestamp;
use crate::validate::{self, ValidatedRequest};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pesu_auth::{AuthenticationResult, PortalClient};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::AbortHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// State shared by all handlers.
pub struct AppState {
    pub portal: Arc<PortalClient>,
    /// Caps authentication attempts in flight.
    pub permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(portal: PortalClient, max_concurrent: usize) -> Self {
        Self {
            portal: Arc::new(portal),
            permits: Arc::new(Semaphore::new(max_concurrent)),
        }
    }
}

/// Aborts the task when dropped. If the client goes away mid-request the
/// handler future is dropped, which tears down the portal session.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Build the axum Router with all REST endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/authenticate", post(authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn start(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let state = Arc::new(AppState::new(
        PortalClient::new(config.portal.clone()),
        config.max_concurrent,
    ));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        portal = %config.portal.base_url,
        timeout_ms = config.portal.timeout_ms,
        max_concurrent = config.max_concurrent,
        "PESU Auth API listening on http://{addr}"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

// ── Handlers ────────────────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn authenticate(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let timestamp = timestamp::now_ist();
    let request_id = Uuid::new_v4();

    let request = match validate::parse_request(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!(%request_id, error = %e, "could not validate request data");
            return reply(
                StatusCode::BAD_REQUEST,
                json!({
                    "status": false,
                    "message": format!("Could not validate request data: {e}"),
                    "timestamp": timestamp,
                }),
            );
        }
    };

    let span = info_span!(
        "authenticate",
        %request_id,
        identifier = %request.credentials.identifier,
        profile = request.profile,
    );

    let outcome = run_authentication(&state, request).instrument(span).await;
    if let Err(message) = &outcome {
        error!(%request_id, error = %message, "error authenticating user");
    }
    attempt_reply(outcome, timestamp)
}

/// Run one attempt on its own task, holding a permit for its duration.
///
/// Dropping the returned future aborts the task, which drops the session.
async fn run_authentication(
    state: &AppState,
    request: ValidatedRequest,
) -> Result<AuthenticationResult, String> {
    let permit = Arc::clone(&state.permits)
        .acquire_owned()
        .await
        .map_err(|e| e.to_string())?;
    let portal = Arc::clone(&state.portal);

    let task = tokio::spawn(
        async move {
            let _permit = permit;
            portal
                .authenticate(&request.credentials, request.profile, request.fields.as_ref())
                .await
        }
        .in_current_span(),
    );
    let _guard = AbortOnDrop(task.abort_handle());

    let result = task.await.map_err(|e| e.to_string())?;
    info!(status = result.status, message = %result.message, "returning auth result");
    Ok(result)
}

/// Map a finished attempt to its reply. Rejected logins are still 200; an
/// attempt that never produced a result is 500.
pub fn attempt_reply(outcome: Result<AuthenticationResult, String>, timestamp: String) -> Response {
    let body = outcome.and_then(|result| serde_json::to_value(&result).map_err(|e| e.to_string()));
    match body {
        Ok(mut body) => {
            if let Some(obj) = body.as_object_mut() {
                obj.insert("timestamp".to_string(), Value::String(timestamp));
            }
            reply(StatusCode::OK, body)
        }
        Err(message) => reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "status": false,
                "message": format!("Error authenticating user: {message}"),
                "timestamp": timestamp,
            }),
        ),
    }
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}
