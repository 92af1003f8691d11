// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook verification and message ingestion.
//!
//! `POST /webhook` answers 200 as soon as the message is persisted and
//! enqueued; downstream flow/rule processing is fire-and-forget on the
//! contact's worker queue.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, info};

use wagate_engine::WebhookPayload;

use crate::server::AppState;

/// `GET /webhook` -- provider challenge verification.
pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let outcome = check_challenge(&params, &state.verify_token);
    if outcome.0 == StatusCode::OK {
        info!("webhook verified");
    }
    outcome.into_response()
}

/// Pure challenge check: 200 with the challenge body on a token match,
/// 403 on mismatch, 400 when parameters are missing.
pub fn check_challenge(
    params: &HashMap<String, String>,
    verify_token: &str,
) -> (StatusCode, String) {
    let mode = params.get("hub.mode").map(String::as_str).unwrap_or("");
    let token = params
        .get("hub.verify_token")
        .map(String::as_str)
        .unwrap_or("");
    let challenge = params
        .get("hub.challenge")
        .map(String::as_str)
        .unwrap_or("");

    if mode.is_empty() || token.is_empty() {
        return (StatusCode::BAD_REQUEST, String::new());
    }
    if mode == "subscribe" && token == verify_token {
        (StatusCode::OK, challenge.to_string())
    } else {
        (StatusCode::FORBIDDEN, String::new())
    }
}

/// `POST /webhook` -- ingest a provider event.
///
/// Returns 200 even when the envelope carries nothing actionable; a body
/// that fails to parse as JSON is rejected with 400 by the extractor.
pub async fn receive(State(state): State<AppState>, Json(payload): Json<WebhookPayload>) -> Response {
    match state.engine.ingest(&payload).await {
        Ok(Some(message)) => {
            state.router.dispatch(message).await;
        }
        Ok(None) => {}
        Err(e) => {
            // Processing is async from the provider's point of view; never
            // bounce the webhook.
            error!(error = %e, "webhook ingest failed");
        }
    }
    StatusCode::OK.into_response()
}
