// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage-local row types.
//!
//! The canonical domain types live in `wagate-core::types`; this module only
//! holds shapes that exist purely as database rows or query results.

use serde::{Deserialize, Serialize};

/// A row of the `flows` table (graph content lives in `flow_nodes` /
/// `flow_edges`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRow {
    pub id: String,
    pub name: String,
    pub status: String,
    pub updated_at: String,
}

/// Aggregate counters over rules and their execution logs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleAnalytics {
    pub total_rules: i64,
    pub active_rules: i64,
    pub total_executions: i64,
    pub successful_executions: i64,
    pub failed_executions: i64,
}
