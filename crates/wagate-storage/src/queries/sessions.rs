// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation session lifecycle and context operations.
//!
//! All mutations go through the single writer thread, so the
//! one-active-session-per-contact invariant holds without row locks. The
//! partial unique index on `(wa_id) WHERE status = 'active'` backs it up at
//! the schema level.

use std::collections::HashMap;
use std::str::FromStr;

use rusqlite::params;

use wagate_core::types::{ConversationSession, SessionStatus};
use wagate_core::GatewayError;

use crate::database::{map_tr_err, Database};

const SELECT_COLUMNS: &str =
    "id, wa_id, flow_id, current_node, context, status, started_at, updated_at";

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<ConversationSession, rusqlite::Error> {
    let status: String = row.get(5)?;
    Ok(ConversationSession {
        id: row.get(0)?,
        wa_id: row.get(1)?,
        flow_id: row.get(2)?,
        current_node: row.get(3)?,
        context: row.get(4)?,
        status: SessionStatus::from_str(&status).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?,
        started_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Get a contact's active session, if any.
pub async fn get_active(
    db: &Database,
    wa_id: &str,
) -> Result<Option<ConversationSession>, GatewayError> {
    let wa_id = wa_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM conversation_sessions
                 WHERE wa_id = ?1 AND status = 'active'"
            ))?;
            match stmt.query_row(params![wa_id], row_to_session) {
                Ok(session) => Ok(Some(session)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Get a session by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<ConversationSession>, GatewayError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM conversation_sessions WHERE id = ?1"
            ))?;
            match stmt.query_row(params![id], row_to_session) {
                Ok(session) => Ok(Some(session)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Create a new active session at `start_node`.
///
/// Any existing active session for the contact is completed first, inside
/// the same transaction, so at most one active session ever exists.
pub async fn create_active(
    db: &Database,
    wa_id: &str,
    flow_id: &str,
    start_node: &str,
) -> Result<ConversationSession, GatewayError> {
    let wa_id = wa_id.to_string();
    let flow_id = flow_id.to_string();
    let start_node = start_node.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE conversation_sessions SET status = 'completed',
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE wa_id = ?1 AND status = 'active'",
                params![wa_id],
            )?;
            tx.execute(
                "INSERT INTO conversation_sessions (wa_id, flow_id, current_node, context, status)
                 VALUES (?1, ?2, ?3, '{}', 'active')",
                params![wa_id, flow_id, start_node],
            )?;
            let id = tx.last_insert_rowid();
            let session = tx.query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM conversation_sessions WHERE id = ?1"),
                params![id],
                row_to_session,
            )?;
            tx.commit()?;
            Ok(session)
        })
        .await
        .map_err(map_tr_err)
}

/// Move the session to another node.
pub async fn update_current_node(
    db: &Database,
    session_id: i64,
    node_id: &str,
) -> Result<(), GatewayError> {
    let node_id = node_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversation_sessions SET current_node = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![node_id, session_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Rewrite the session's flow and current node in one statement (flow jump).
pub async fn update_flow_position(
    db: &Database,
    session_id: i64,
    flow_id: &str,
    node_id: &str,
) -> Result<(), GatewayError> {
    let flow_id = flow_id.to_string();
    let node_id = node_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversation_sessions SET flow_id = ?1, current_node = ?2,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?3",
                params![flow_id, node_id, session_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Store one key in the session's JSON context blob.
///
/// Read-modify-write is safe here because every write funnels through the
/// single writer thread.
pub async fn put_context(
    db: &Database,
    session_id: i64,
    key: &str,
    value: &str,
) -> Result<(), GatewayError> {
    let key = key.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| {
            let blob: String = conn.query_row(
                "SELECT context FROM conversation_sessions WHERE id = ?1",
                params![session_id],
                |row| row.get(0),
            )?;
            let mut context: HashMap<String, String> =
                serde_json::from_str(&blob).unwrap_or_default();
            context.insert(key, value);
            let encoded = serde_json::to_string(&context)
                .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
            conn.execute(
                "UPDATE conversation_sessions SET context = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![encoded, session_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Read one key from the session's context blob.
pub async fn get_context(
    db: &Database,
    session_id: i64,
    key: &str,
) -> Result<Option<String>, GatewayError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            let blob: String = match conn.query_row(
                "SELECT context FROM conversation_sessions WHERE id = ?1",
                params![session_id],
                |row| row.get(0),
            ) {
                Ok(blob) => blob,
                Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            let context: HashMap<String, String> =
                serde_json::from_str(&blob).unwrap_or_default();
            Ok(context.get(&key).cloned())
        })
        .await
        .map_err(map_tr_err)
}

async fn set_status(db: &Database, session_id: i64, status: &str) -> Result<(), GatewayError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversation_sessions SET status = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![status, session_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Transition a session to `completed`. Idempotent.
pub async fn complete(db: &Database, session_id: i64) -> Result<(), GatewayError> {
    set_status(db, session_id, "completed").await
}

/// Complete a contact's active session, if any.
pub async fn complete_by_wa_id(db: &Database, wa_id: &str) -> Result<(), GatewayError> {
    let wa_id = wa_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversation_sessions SET status = 'completed',
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE wa_id = ?1 AND status = 'active'",
                params![wa_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Operator-initiated termination, distinguished from self-completion.
pub async fn terminate(db: &Database, session_id: i64) -> Result<(), GatewayError> {
    set_status(db, session_id, "terminated").await
}

/// List sessions, optionally filtered by status.
pub async fn list(
    db: &Database,
    status: Option<&str>,
) -> Result<Vec<ConversationSession>, GatewayError> {
    let status = status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let mut sessions = Vec::new();
            match &status {
                Some(filter) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {SELECT_COLUMNS} FROM conversation_sessions
                         WHERE status = ?1 ORDER BY started_at DESC"
                    ))?;
                    let rows = stmt.query_map(params![filter], row_to_session)?;
                    for row in rows {
                        sessions.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {SELECT_COLUMNS} FROM conversation_sessions
                         ORDER BY started_at DESC"
                    ))?;
                    let rows = stmt.query_map([], row_to_session)?;
                    for row in rows {
                        sessions.push(row?);
                    }
                }
            }
            Ok(sessions)
        })
        .await
        .map_err(map_tr_err)
}
