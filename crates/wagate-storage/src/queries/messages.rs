// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only message log.
//!
//! The engine only ever writes here; reads serve the dashboard.

use rusqlite::params;

use wagate_core::types::MessageRecord;
use wagate_core::GatewayError;

use crate::database::{map_tr_err, Database};

/// Append a message-log row. Returns the new row id.
pub async fn insert(
    db: &Database,
    wa_id: &str,
    sender: &str,
    content: &str,
    kind: &str,
    status: &str,
) -> Result<i64, GatewayError> {
    let wa_id = wa_id.to_string();
    let sender = sender.to_string();
    let content = content.to_string();
    let kind = kind.to_string();
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (wa_id, sender, content, type, status)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![wa_id, sender, content, kind, status],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent messages, newest first.
pub async fn list_recent(db: &Database, limit: i64) -> Result<Vec<MessageRecord>, GatewayError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, wa_id, sender, content, type, status, created_at
                 FROM messages ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok(MessageRecord {
                    id: row.get(0)?,
                    wa_id: row.get(1)?,
                    sender: row.get(2)?,
                    content: row.get(3)?,
                    kind: row.get(4)?,
                    status: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}
