// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local cache of provider message templates.

use rusqlite::params;

use wagate_core::types::TemplateRecord;
use wagate_core::GatewayError;

use crate::database::{map_tr_err, Database};

/// Insert or refresh a template by provider id.
pub async fn upsert(db: &Database, template: &TemplateRecord) -> Result<(), GatewayError> {
    let template = template.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO templates (id, name, language, category, status, components)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     language = excluded.language,
                     category = excluded.category,
                     status = excluded.status,
                     components = excluded.components",
                params![
                    template.id,
                    template.name,
                    template.language,
                    template.category,
                    template.status,
                    template.components,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All cached templates.
pub async fn list(db: &Database) -> Result<Vec<TemplateRecord>, GatewayError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, language, category, status, components FROM templates",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(TemplateRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    language: row.get(2)?,
                    category: row.get(3)?,
                    status: row.get(4)?,
                    components: row.get(5)?,
                })
            })?;
            let mut templates = Vec::new();
            for row in rows {
                templates.push(row?);
            }
            Ok(templates)
        })
        .await
        .map_err(map_tr_err)
}
