// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media upload/retrieval through the provider, with local bookkeeping.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use wagate_storage::queries::media;

use crate::handlers::{error_json, internal_error};
use crate::server::AppState;

/// `GET /api/media`
pub async fn list(State(state): State<AppState>) -> Response {
    match media::list(&state.db).await {
        Ok(media) => Json(media).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `POST /api/media` -- multipart upload (`file` field).
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.bin").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        match field.bytes().await {
            Ok(bytes) => file = Some((filename, mime_type, bytes.to_vec())),
            Err(e) => return error_json(StatusCode::BAD_REQUEST, &format!("bad upload: {e}")),
        }
        break;
    }

    let Some((filename, mime_type, bytes)) = file else {
        return error_json(StatusCode::BAD_REQUEST, "File is required");
    };
    let file_size = bytes.len() as i64;

    let media_id = match state
        .provider
        .upload_media(bytes, &mime_type, &filename)
        .await
    {
        Ok(id) => id,
        Err(e) => return internal_error(e),
    };

    // The provider accepted the upload; local bookkeeping is best-effort.
    if let Err(e) = media::insert(&state.db, &media_id, &filename, &mime_type, file_size).await {
        warn!(media_id = media_id.as_str(), error = %e, "failed to record media locally");
        return Json(serde_json::json!({
            "id": media_id,
            "filename": filename,
            "warning": "Upload succeeded but failed to save to local database",
        }))
        .into_response();
    }

    Json(serde_json::json!({
        "id": media_id,
        "filename": filename,
        "mime_type": mime_type,
        "file_size": file_size,
    }))
    .into_response()
}

/// `GET /api/media/{id}` -- resolve a short-lived download URL.
pub async fn retrieve_url(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.provider.retrieve_media_url(&id).await {
        Ok(url) => Json(serde_json::json!({"url": url})).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `DELETE /api/media/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if let Err(e) = state.provider.delete_media(&id).await {
        return internal_error(e);
    }
    if let Err(e) = media::delete_by_media_id(&state.db, &id).await {
        warn!(media_id = id.as_str(), error = %e, "failed to remove local media record");
    }
    Json(serde_json::json!({"status": "Media deleted"})).into_response()
}
