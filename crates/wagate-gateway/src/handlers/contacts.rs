// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact CRUD and CSV export.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use wagate_storage::queries::contacts;

use crate::handlers::{error_json, internal_error};
use crate::server::AppState;

/// `GET /api/contacts`
pub async fn list(State(state): State<AppState>) -> Response {
    match contacts::list(&state.db).await {
        Ok(contacts) => Json(contacts).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub wa_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: String,
}

/// `POST /api/contacts`
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateContactRequest>,
) -> Response {
    if body.wa_id.is_empty() {
        return error_json(StatusCode::BAD_REQUEST, "wa_id required");
    }
    let name = if body.name.is_empty() { body.wa_id.clone() } else { body.name };
    match contacts::upsert(&state.db, &body.wa_id, &name, &body.tags).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"status": "Contact created", "wa_id": body.wa_id})),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: String,
}

/// `PUT /api/contacts/{wa_id}`
pub async fn update(
    State(state): State<AppState>,
    Path(wa_id): Path<String>,
    Json(body): Json<UpdateContactRequest>,
) -> Response {
    match contacts::upsert(&state.db, &wa_id, &body.name, &body.tags).await {
        Ok(()) => Json(serde_json::json!({"status": "Contact updated"})).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `DELETE /api/contacts/{wa_id}`
pub async fn delete(State(state): State<AppState>, Path(wa_id): Path<String>) -> Response {
    match contacts::delete(&state.db, &wa_id).await {
        Ok(true) => Json(serde_json::json!({"status": "Contact deleted"})).into_response(),
        Ok(false) => error_json(StatusCode::NOT_FOUND, "Contact not found"),
        Err(e) => internal_error(e),
    }
}

/// `GET /api/contacts/export` -- CSV download.
pub async fn export(State(state): State<AppState>) -> Response {
    let contacts = match contacts::list(&state.db).await {
        Ok(contacts) => contacts,
        Err(e) => return internal_error(e),
    };

    let mut csv = String::from("WhatsApp ID,Name,Tags,Created At\n");
    for contact in &contacts {
        csv.push_str(&format!(
            "{},{},{},{}\n",
            contact.wa_id,
            contact.name,
            contact.tag_list().join(";"),
            contact.created_at
        ));
    }

    (
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=contacts.csv",
            ),
        ],
        csv,
    )
        .into_response()
}
