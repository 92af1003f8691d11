// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted system settings.
//!
//! Selected credentials are synchronized at startup: a value already in the
//! database wins over the environment, and non-empty environment values are
//! persisted on first run.

use rusqlite::params;

use wagate_core::GatewayError;

use crate::database::{map_tr_err, Database};

/// Read a setting.
pub async fn get(db: &Database, key: &str) -> Result<Option<String>, GatewayError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            match conn.query_row(
                "SELECT value FROM system_settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            ) {
                Ok(value) => Ok(Some(value)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Write a setting.
pub async fn set(db: &Database, key: &str, value: &str) -> Result<(), GatewayError> {
    let key = key.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO system_settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Reconcile one setting with its environment-sourced value.
///
/// Returns the effective value: the stored one when present and non-empty,
/// otherwise `current` (which is persisted when non-empty).
pub async fn load_or_store(
    db: &Database,
    key: &str,
    current: &str,
) -> Result<String, GatewayError> {
    match get(db, key).await? {
        Some(stored) if !stored.is_empty() => Ok(stored),
        _ => {
            if !current.is_empty() {
                set(db, key, current).await?;
            }
            Ok(current.to_string())
        }
    }
}
