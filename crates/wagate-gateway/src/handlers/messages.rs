// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard message log and operator sends.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use wagate_storage::queries::messages;

use crate::handlers::{error_json, internal_error};
use crate::server::AppState;

const DEFAULT_LIMIT: i64 = 200;

/// `GET /api/messages`
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let limit = params
        .get("limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_LIMIT);
    match messages::list_recent(&state.db, limit).await {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub to: String,
    pub content: String,
}

/// `POST /api/send` -- operator text send through the outbox.
pub async fn send(State(state): State<AppState>, Json(body): Json<SendRequest>) -> Response {
    if body.to.is_empty() {
        return error_json(StatusCode::BAD_REQUEST, "recipient required");
    }
    match state.provider.send_text(&body.to, &body.content).await {
        Ok(()) => Json(serde_json::json!({"status": "Message sent"})).into_response(),
        Err(e) => internal_error(e),
    }
}
