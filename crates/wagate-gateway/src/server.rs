// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server built on axum.
//!
//! Sets up the webhook routes, operator API, dashboard WebSocket, and
//! shared state.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use wagate_core::{GatewayError, ProviderGateway};
use wagate_engine::{BroadcastQueue, ContactRouter, Engine, EventHub};
use wagate_storage::Database;

use crate::handlers;
use crate::ws;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub router: Arc<ContactRouter>,
    pub db: Database,
    /// The send-logging outbox.
    pub provider: Arc<dyn ProviderGateway>,
    pub hub: EventHub,
    pub broadcast: BroadcastQueue,
    /// Webhook challenge verification token.
    pub verify_token: String,
}

/// Assemble the full route tree.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/messages", get(handlers::messages::list))
        .route("/send", post(handlers::messages::send))
        .route("/contacts", get(handlers::contacts::list).post(handlers::contacts::create))
        .route(
            "/contacts/{wa_id}",
            axum::routing::put(handlers::contacts::update).delete(handlers::contacts::delete),
        )
        .route("/contacts/export", get(handlers::contacts::export))
        .route(
            "/automation/rules",
            get(handlers::automation::list_rules).post(handlers::automation::create_rule),
        )
        .route(
            "/automation/rules/{id}",
            axum::routing::put(handlers::automation::update_rule)
                .delete(handlers::automation::delete_rule),
        )
        .route(
            "/automation/rules/{id}/toggle",
            post(handlers::automation::toggle_rule),
        )
        .route("/automation/logs", get(handlers::automation::list_logs))
        .route("/automation/analytics", get(handlers::automation::analytics))
        .route("/flows", get(handlers::flows::list).post(handlers::flows::save))
        .route(
            "/flows/{id}",
            get(handlers::flows::get).delete(handlers::flows::delete),
        )
        .route("/sessions", get(handlers::sessions::list))
        .route(
            "/sessions/{id}/terminate",
            post(handlers::sessions::terminate),
        )
        .route("/media", get(handlers::media::list).post(handlers::media::upload))
        .route(
            "/media/{id}",
            get(handlers::media::retrieve_url).delete(handlers::media::delete),
        )
        .route("/templates", get(handlers::templates::list))
        .route("/templates/sync", post(handlers::templates::sync))
        .route("/broadcast", post(handlers::templates::broadcast));

    Router::new()
        .route(
            "/webhook",
            get(handlers::webhook::verify).post(handlers::webhook::receive),
        )
        .nest("/api", api)
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the cancellation token fires.
///
/// A failed bind is fatal and surfaces to the caller (non-zero exit).
pub async fn start_server(
    host: &str,
    port: u16,
    state: AppState,
    cancel: CancellationToken,
) -> Result<(), GatewayError> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| GatewayError::Server {
            message: format!("failed to bind to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!(addr = addr.as_str(), "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| GatewayError::Server {
            message: format!("server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
