// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local flow graph CRUD for the visual editor.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use wagate_core::flow::GraphPayload;
use wagate_storage::queries::flows;

use crate::handlers::{error_json, internal_error};
use crate::server::AppState;

/// `GET /api/flows`
pub async fn list(State(state): State<AppState>) -> Response {
    match flows::list(&state.db).await {
        Ok(flows) => Json(flows).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveFlowRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// The authored graph, either inline JSON or a JSON-encoded string
    /// (older editor builds post the latter).
    pub graph_data: serde_json::Value,
}

impl SaveFlowRequest {
    fn graph(&self) -> Result<GraphPayload, serde_json::Error> {
        match &self.graph_data {
            serde_json::Value::String(encoded) => serde_json::from_str(encoded),
            other => serde_json::from_value(other.clone()),
        }
    }
}

/// `POST /api/flows` -- upsert a flow and replace its graph.
pub async fn save(State(state): State<AppState>, Json(body): Json<SaveFlowRequest>) -> Response {
    let graph = match body.graph() {
        Ok(graph) => graph,
        Err(e) => return error_json(StatusCode::BAD_REQUEST, &format!("bad graph_data: {e}")),
    };

    let flow_id = if body.id.is_empty() {
        format!("flow_{}", uuid::Uuid::new_v4())
    } else {
        body.id.clone()
    };

    match flows::save_graph(&state.db, &flow_id, &body.name, &graph).await {
        Ok(()) => Json(serde_json::json!({"id": flow_id, "status": "saved"})).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /api/flows/{id}` -- the flow with its authored graph.
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let payload = match flows::load_payload(&state.db, &id).await {
        Ok(Some(payload)) => payload,
        Ok(None) => return error_json(StatusCode::NOT_FOUND, "Flow not found"),
        Err(e) => return internal_error(e),
    };

    let name = match flows::list(&state.db).await {
        Ok(rows) => rows
            .into_iter()
            .find(|f| f.id == id)
            .map(|f| f.name)
            .unwrap_or_default(),
        Err(e) => return internal_error(e),
    };

    Json(serde_json::json!({
        "id": id,
        "name": name,
        "graph_data": payload,
    }))
    .into_response()
}

/// `DELETE /api/flows/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match flows::delete_flow(&state.db, &id).await {
        Ok(true) => Json(serde_json::json!({"status": "deleted"})).into_response(),
        Ok(false) => error_json(StatusCode::NOT_FOUND, "Flow not found"),
        Err(e) => internal_error(e),
    }
}
