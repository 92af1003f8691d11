// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact CRUD and tag operations.
//!
//! Tag mutation is read-modify-write on the JSON blob; it serializes through
//! the single writer thread, so concurrent rule actions cannot lose adds.

use rusqlite::params;

use wagate_core::types::Contact;
use wagate_core::GatewayError;

use crate::database::{map_tr_err, Database};

const SELECT_COLUMNS: &str = "wa_id, name, profile_pic_url, tags, created_at";

fn row_to_contact(row: &rusqlite::Row<'_>) -> Result<Contact, rusqlite::Error> {
    Ok(Contact {
        wa_id: row.get(0)?,
        name: row.get(1)?,
        profile_pic_url: row.get(2)?,
        tags: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Get a contact by WhatsApp id.
pub async fn get(db: &Database, wa_id: &str) -> Result<Option<Contact>, GatewayError> {
    let wa_id = wa_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM contacts WHERE wa_id = ?1"
            ))?;
            match stmt.query_row(params![wa_id], row_to_contact) {
                Ok(contact) => Ok(Some(contact)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List all contacts, newest first.
pub async fn list(db: &Database) -> Result<Vec<Contact>, GatewayError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM contacts ORDER BY created_at DESC"
            ))?;
            let rows = stmt.query_map([], row_to_contact)?;
            let mut contacts = Vec::new();
            for row in rows {
                contacts.push(row?);
            }
            Ok(contacts)
        })
        .await
        .map_err(map_tr_err)
}

/// Ensure a contact exists for an inbound sender.
///
/// Creates the row with `name = wa_id` on first contact; refreshes the name
/// only while it is empty or still equal to the phone number.
pub async fn upsert_inbound(db: &Database, wa_id: &str) -> Result<(), GatewayError> {
    let wa_id = wa_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO contacts (wa_id, name, tags) VALUES (?1, ?1, '[]')
                 ON CONFLICT(wa_id) DO UPDATE SET
                     name = CASE
                         WHEN contacts.name = '' OR contacts.name = contacts.wa_id
                         THEN excluded.name ELSE contacts.name END,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![wa_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Operator upsert with explicit name and tags.
pub async fn upsert(
    db: &Database,
    wa_id: &str,
    name: &str,
    tags: &str,
) -> Result<(), GatewayError> {
    let wa_id = wa_id.to_string();
    let name = name.to_string();
    let tags = if tags.is_empty() { "[]".to_string() } else { tags.to_string() };
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO contacts (wa_id, name, tags) VALUES (?1, ?2, ?3)
                 ON CONFLICT(wa_id) DO UPDATE SET
                     name = excluded.name,
                     tags = excluded.tags,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![wa_id, name, tags],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a contact. Returns false when no row matched.
pub async fn delete(db: &Database, wa_id: &str) -> Result<bool, GatewayError> {
    let wa_id = wa_id.to_string();
    db.connection()
        .call(move |conn| {
            let affected =
                conn.execute("DELETE FROM contacts WHERE wa_id = ?1", params![wa_id])?;
            Ok(affected > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Append a tag to the contact's decoded tag list if not already present.
///
/// Creates the contact when missing. Returns true when the tag was added.
pub async fn add_tag(db: &Database, wa_id: &str, tag: &str) -> Result<bool, GatewayError> {
    let wa_id = wa_id.to_string();
    let tag = tag.to_string();
    db.connection()
        .call(move |conn| {
            let blob: Option<String> = match conn.query_row(
                "SELECT tags FROM contacts WHERE wa_id = ?1",
                params![wa_id],
                |row| row.get(0),
            ) {
                Ok(blob) => Some(blob),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e.into()),
            };

            let mut tags: Vec<String> = blob
                .as_deref()
                .and_then(|b| serde_json::from_str(b).ok())
                .unwrap_or_default();
            if tags.iter().any(|t| t == &tag) {
                return Ok(false);
            }
            tags.push(tag);
            let encoded = serde_json::to_string(&tags)
                .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;

            match blob {
                Some(_) => {
                    conn.execute(
                        "UPDATE contacts SET tags = ?1,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE wa_id = ?2",
                        params![encoded, wa_id],
                    )?;
                }
                None => {
                    conn.execute(
                        "INSERT INTO contacts (wa_id, name, tags) VALUES (?1, ?1, ?2)",
                        params![wa_id, encoded],
                    )?;
                }
            }
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

/// Decoded tag membership test (exact match, not substring).
pub async fn has_tag(db: &Database, wa_id: &str, tag: &str) -> Result<bool, GatewayError> {
    let tag = tag.to_string();
    Ok(get(db, wa_id)
        .await?
        .map(|c| c.tag_list().iter().any(|t| t == &tag))
        .unwrap_or(false))
}
