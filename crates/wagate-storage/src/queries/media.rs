// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locally-tracked media objects (the bytes live with the provider).

use rusqlite::params;

use wagate_core::types::MediaAsset;
use wagate_core::GatewayError;

use crate::database::{map_tr_err, Database};

/// Record an uploaded media object.
pub async fn insert(
    db: &Database,
    media_id: &str,
    filename: &str,
    mime_type: &str,
    file_size: i64,
) -> Result<(), GatewayError> {
    let media_id = media_id.to_string();
    let filename = filename.to_string();
    let mime_type = mime_type.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO media (media_id, filename, mime_type, file_size)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(media_id) DO UPDATE SET
                     filename = excluded.filename,
                     mime_type = excluded.mime_type,
                     file_size = excluded.file_size",
                params![media_id, filename, mime_type, file_size],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All tracked media, newest first.
pub async fn list(db: &Database) -> Result<Vec<MediaAsset>, GatewayError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, media_id, filename, mime_type, file_size, uploaded_at
                 FROM media ORDER BY uploaded_at DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(MediaAsset {
                    id: row.get(0)?,
                    media_id: row.get(1)?,
                    filename: row.get(2)?,
                    mime_type: row.get(3)?,
                    file_size: row.get(4)?,
                    uploaded_at: row.get(5)?,
                })
            })?;
            let mut media = Vec::new();
            for row in rows {
                media.push(row?);
            }
            Ok(media)
        })
        .await
        .map_err(map_tr_err)
}

/// Remove a media record by provider media id.
pub async fn delete_by_media_id(db: &Database, media_id: &str) -> Result<(), GatewayError> {
    let media_id = media_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM media WHERE media_id = ?1", params![media_id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
