// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template cache, provider sync, and queued broadcast.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use wagate_core::types::TemplateRecord;
use wagate_engine::BroadcastJob;
use wagate_storage::queries::templates;

use crate::handlers::{error_json, internal_error};
use crate::server::AppState;

/// `GET /api/templates` -- the local cache.
pub async fn list(State(state): State<AppState>) -> Response {
    match templates::list(&state.db).await {
        Ok(templates) => Json(templates).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `POST /api/templates/sync` -- pull templates from the provider into the
/// local cache.
pub async fn sync(State(state): State<AppState>) -> Response {
    let raw = match state.provider.get_templates().await {
        Ok(raw) => raw,
        Err(e) => return internal_error(e),
    };

    let Some(data) = raw.get("data").and_then(|d| d.as_array()) else {
        return Json(serde_json::json!({"status": "No templates found", "count": 0}))
            .into_response();
    };

    let mut synced = 0usize;
    for item in data {
        let Some(id) = item.get("id").and_then(|v| v.as_str()) else {
            continue;
        };
        let record = TemplateRecord {
            id: id.to_string(),
            name: str_field(item, "name"),
            language: str_field(item, "language"),
            category: str_field(item, "category"),
            status: str_field(item, "status"),
            components: item
                .get("components")
                .map(|c| c.to_string())
                .unwrap_or_else(|| "[]".to_string()),
        };
        match templates::upsert(&state.db, &record).await {
            Ok(()) => synced += 1,
            Err(e) => warn!(template = record.name.as_str(), error = %e, "template sync failed"),
        }
    }

    Json(serde_json::json!({"status": "Templates synced", "count": synced})).into_response()
}

fn str_field(value: &serde_json::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    pub template_name: String,
    pub language: String,
    pub contacts: Vec<String>,
}

/// `POST /api/broadcast` -- enqueue a template broadcast.
pub async fn broadcast(
    State(state): State<AppState>,
    Json(body): Json<BroadcastRequest>,
) -> Response {
    if body.template_name.is_empty() || body.contacts.is_empty() {
        return error_json(StatusCode::BAD_REQUEST, "template_name and contacts required");
    }

    let total = body.contacts.len();
    let queued = state.broadcast.enqueue(BroadcastJob {
        template_name: body.template_name,
        language: if body.language.is_empty() {
            "en_US".to_string()
        } else {
            body.language
        },
        contacts: body.contacts,
    });

    if queued {
        (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({"status": "Broadcast queued", "total": total})),
        )
            .into_response()
    } else {
        error_json(StatusCode::SERVICE_UNAVAILABLE, "broadcast queue full")
    }
}
