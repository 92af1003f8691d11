// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session listing and operator termination.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use wagate_storage::queries::sessions;

use crate::handlers::{error_json, internal_error};
use crate::server::AppState;

/// `GET /api/sessions` -- optionally filtered by `?status=`.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let status = params.get("status").map(String::as_str);
    match sessions::list(&state.db, status).await {
        Ok(sessions) => Json(sessions).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `POST /api/sessions/{id}/terminate` -- operator-initiated termination.
///
/// The next inbound message from the contact then finds no active session.
pub async fn terminate(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match sessions::get(&state.db, id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_json(StatusCode::NOT_FOUND, "Session not found"),
        Err(e) => return internal_error(e),
    }
    match sessions::terminate(&state.db, id).await {
        Ok(()) => {
            state.hub.publish(
                "session_update",
                serde_json::json!({"session_id": id, "status": "terminated"}),
            );
            Json(serde_json::json!({"status": "terminated"})).into_response()
        }
        Err(e) => internal_error(e),
    }
}
