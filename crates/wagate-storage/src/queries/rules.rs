// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation rule CRUD and execution logs.

use rusqlite::params;

use wagate_core::types::{AutomationLogEntry, AutomationRule};
use wagate_core::GatewayError;

use crate::database::{map_tr_err, Database};
use crate::models::RuleAnalytics;

const SELECT_COLUMNS: &str =
    "id, name, type, enabled, priority, conditions, actions, created_at, updated_at";

fn row_to_rule(row: &rusqlite::Row<'_>) -> Result<AutomationRule, rusqlite::Error> {
    Ok(AutomationRule {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        enabled: row.get(3)?,
        priority: row.get(4)?,
        conditions: row.get(5)?,
        actions: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Enabled rules in evaluation order: `priority DESC, created_at DESC`.
pub async fn list_enabled(db: &Database) -> Result<Vec<AutomationRule>, GatewayError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM automation_rules
                 WHERE enabled = 1 ORDER BY priority DESC, created_at DESC"
            ))?;
            let rows = stmt.query_map([], row_to_rule)?;
            let mut rules = Vec::new();
            for row in rows {
                rules.push(row?);
            }
            Ok(rules)
        })
        .await
        .map_err(map_tr_err)
}

/// All rules, for the operator surface.
pub async fn list_all(db: &Database) -> Result<Vec<AutomationRule>, GatewayError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM automation_rules
                 ORDER BY priority DESC, created_at DESC"
            ))?;
            let rows = stmt.query_map([], row_to_rule)?;
            let mut rules = Vec::new();
            for row in rows {
                rules.push(row?);
            }
            Ok(rules)
        })
        .await
        .map_err(map_tr_err)
}

/// Create a rule. Conditions and actions are JSON arrays, stored verbatim.
pub async fn create(
    db: &Database,
    name: &str,
    kind: &str,
    priority: i64,
    conditions: &str,
    actions: &str,
) -> Result<i64, GatewayError> {
    let name = name.to_string();
    let kind = kind.to_string();
    let conditions = conditions.to_string();
    let actions = actions.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO automation_rules (name, type, priority, conditions, actions)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![name, kind, priority, conditions, actions],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Update a rule in place.
pub async fn update(
    db: &Database,
    id: i64,
    name: &str,
    kind: &str,
    priority: i64,
    conditions: &str,
    actions: &str,
) -> Result<(), GatewayError> {
    let name = name.to_string();
    let kind = kind.to_string();
    let conditions = conditions.to_string();
    let actions = actions.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE automation_rules
                 SET name = ?1, type = ?2, priority = ?3, conditions = ?4, actions = ?5,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?6",
                params![name, kind, priority, conditions, actions, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a rule.
pub async fn delete(db: &Database, id: i64) -> Result<bool, GatewayError> {
    db.connection()
        .call(move |conn| {
            let affected =
                conn.execute("DELETE FROM automation_rules WHERE id = ?1", params![id])?;
            Ok(affected > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Enable or disable a rule.
pub async fn set_enabled(db: &Database, id: i64, enabled: bool) -> Result<(), GatewayError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE automation_rules SET enabled = ?1 WHERE id = ?2",
                params![enabled, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Append an automation log entry.
pub async fn insert_log(
    db: &Database,
    rule_id: i64,
    wa_id: &str,
    trigger_type: &str,
    action_taken: &str,
    success: bool,
    error_message: &str,
) -> Result<(), GatewayError> {
    let wa_id = wa_id.to_string();
    let trigger_type = trigger_type.to_string();
    let action_taken = action_taken.to_string();
    let error_message = error_message.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO automation_logs
                 (rule_id, wa_id, trigger_type, action_taken, success, error_message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![rule_id, wa_id, trigger_type, action_taken, success, error_message],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent automation log entries.
pub async fn list_logs(db: &Database, limit: i64) -> Result<Vec<AutomationLogEntry>, GatewayError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, rule_id, wa_id, trigger_type, action_taken, success,
                        error_message, created_at
                 FROM automation_logs ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok(AutomationLogEntry {
                    id: row.get(0)?,
                    rule_id: row.get(1)?,
                    wa_id: row.get(2)?,
                    trigger_type: row.get(3)?,
                    action_taken: row.get(4)?,
                    success: row.get(5)?,
                    error_message: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?;
            let mut logs = Vec::new();
            for row in rows {
                logs.push(row?);
            }
            Ok(logs)
        })
        .await
        .map_err(map_tr_err)
}

/// Aggregate rule and execution counters for the dashboard.
pub async fn analytics(db: &Database) -> Result<RuleAnalytics, GatewayError> {
    db.connection()
        .call(|conn| {
            let count = |conn: &rusqlite::Connection, sql: &str| -> Result<i64, rusqlite::Error> {
                conn.query_row(sql, [], |row| row.get(0))
            };
            Ok(RuleAnalytics {
                total_rules: count(conn, "SELECT COUNT(*) FROM automation_rules")?,
                active_rules: count(
                    conn,
                    "SELECT COUNT(*) FROM automation_rules WHERE enabled = 1",
                )?,
                total_executions: count(conn, "SELECT COUNT(*) FROM automation_logs")?,
                successful_executions: count(
                    conn,
                    "SELECT COUNT(*) FROM automation_logs WHERE success = 1",
                )?,
                failed_executions: count(
                    conn,
                    "SELECT COUNT(*) FROM automation_logs WHERE success = 0",
                )?,
            })
        })
        .await
        .map_err(map_tr_err)
}
