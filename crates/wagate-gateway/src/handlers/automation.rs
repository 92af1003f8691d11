// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation rule CRUD, logs, and analytics.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use wagate_storage::queries::rules;

use crate::handlers::{error_json, internal_error};
use crate::server::AppState;

/// `GET /api/automation/rules`
pub async fn list_rules(State(state): State<AppState>) -> Response {
    match rules::list_all(&state.db).await {
        Ok(rules) => Json(rules).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct RuleRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub priority: i64,
    pub conditions: serde_json::Value,
    pub actions: serde_json::Value,
}

/// `POST /api/automation/rules`
pub async fn create_rule(State(state): State<AppState>, Json(body): Json<RuleRequest>) -> Response {
    if body.name.is_empty() || body.kind.is_empty() {
        return error_json(StatusCode::BAD_REQUEST, "name and type required");
    }
    match rules::create(
        &state.db,
        &body.name,
        &body.kind,
        body.priority,
        &body.conditions.to_string(),
        &body.actions.to_string(),
    )
    .await
    {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"id": id, "message": "Rule created successfully"})),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

/// `PUT /api/automation/rules/{id}`
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<RuleRequest>,
) -> Response {
    match rules::update(
        &state.db,
        id,
        &body.name,
        &body.kind,
        body.priority,
        &body.conditions.to_string(),
        &body.actions.to_string(),
    )
    .await
    {
        Ok(()) => Json(serde_json::json!({"message": "Rule updated successfully"})).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `DELETE /api/automation/rules/{id}`
pub async fn delete_rule(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match rules::delete(&state.db, id).await {
        Ok(true) => Json(serde_json::json!({"message": "Rule deleted successfully"})).into_response(),
        Ok(false) => error_json(StatusCode::NOT_FOUND, "Rule not found"),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

/// `POST /api/automation/rules/{id}/toggle`
pub async fn toggle_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ToggleRequest>,
) -> Response {
    match rules::set_enabled(&state.db, id, body.enabled).await {
        Ok(()) => Json(serde_json::json!({"message": "Rule toggled successfully"})).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /api/automation/logs`
pub async fn list_logs(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let limit = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(50);
    match rules::list_logs(&state.db, limit).await {
        Ok(logs) => Json(logs).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /api/automation/analytics`
pub async fn analytics(State(state): State<AppState>) -> Response {
    match rules::analytics(&state.db).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => internal_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_request_accepts_structured_conditions() {
        let req: RuleRequest = serde_json::from_str(
            r#"{"name": "welcome", "type": "keyword", "priority": 10,
                "conditions": [{"type": "keyword", "operator": "equals", "value": "hi"}],
                "actions": [{"type": "send_message", "params": {"message": "hello"}}]}"#,
        )
        .unwrap();
        assert_eq!(req.name, "welcome");
        assert_eq!(req.kind, "keyword");
        assert!(req.conditions.is_array());
    }
}
