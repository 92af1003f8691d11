// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the webhook and operator API.

pub mod automation;
pub mod contacts;
pub mod flows;
pub mod media;
pub mod messages;
pub mod sessions;
pub mod templates;
pub mod webhook;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use wagate_core::GatewayError;

/// A JSON error body with an explicit status.
pub(crate) fn error_json(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({"error": message}))).into_response()
}

/// A 500 carrying the error's display form.
pub(crate) fn internal_error(err: GatewayError) -> Response {
    tracing::error!(error = %err, "request failed");
    error_json(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
}
