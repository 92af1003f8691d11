// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flow graph persistence.
//!
//! `save_graph` replaces a flow's nodes and edges atomically
//! (delete-then-insert in one transaction), so `load_graph` can never
//! observe a half-saved graph. Node `data` blobs are stored verbatim and
//! decoded into the step sum at load time.

use rusqlite::params;
use tracing::warn;

use wagate_core::flow::{
    FlowGraph, GraphEdge, GraphNode, GraphPayload, NodeData, NodeDataRecord,
};
use wagate_core::{FlowError, GatewayError};

use crate::database::{map_tr_err, Database};
use crate::models::FlowRow;

/// Materialize a flow's graph, decoding node step lists.
pub async fn load_graph(db: &Database, flow_id: &str) -> Result<FlowGraph, GatewayError> {
    let flow_id_owned = flow_id.to_string();
    let result = db
        .connection()
        .call(move |conn| {
            let exists: bool = conn
                .query_row(
                    "SELECT 1 FROM flows WHERE id = ?1",
                    params![flow_id_owned],
                    |_| Ok(()),
                )
                .map(|_| true)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(false),
                    other => Err(other),
                })?;
            if !exists {
                return Ok(None);
            }

            let mut nodes = Vec::new();
            {
                let mut stmt = conn.prepare(
                    "SELECT node_id, type, position_x, position_y, data
                     FROM flow_nodes WHERE flow_id = ?1 ORDER BY id ASC",
                )?;
                let rows = stmt.query_map(params![flow_id_owned], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })?;
                for row in rows {
                    let (node_id, kind, x, y, data) = row?;
                    let record: NodeDataRecord = match serde_json::from_str(&data) {
                        Ok(record) => record,
                        Err(e) => {
                            warn!(node_id, error = %e, "undecodable node data, treating as empty");
                            NodeDataRecord::default()
                        }
                    };
                    nodes.push(GraphNode {
                        id: node_id,
                        kind,
                        x,
                        y,
                        data: NodeData::from_record(record),
                    });
                }
            }

            let mut edges = Vec::new();
            {
                let mut stmt = conn.prepare(
                    "SELECT edge_id, source, target, source_handle
                     FROM flow_edges WHERE flow_id = ?1 ORDER BY id ASC",
                )?;
                let rows = stmt.query_map(params![flow_id_owned], |row| {
                    Ok(GraphEdge {
                        id: row.get(0)?,
                        source: row.get(1)?,
                        target: row.get(2)?,
                        source_handle: row.get(3)?,
                    })
                })?;
                for row in rows {
                    edges.push(row?);
                }
            }

            Ok(Some(FlowGraph { nodes, edges }))
        })
        .await
        .map_err(map_tr_err)?;

    result.ok_or_else(|| FlowError::GraphNotFound(flow_id.to_string()).into())
}

/// Reload a flow's graph in its authored form (raw node `data` values),
/// for the operator editor round-trip. `None` when the flow is unknown.
pub async fn load_payload(
    db: &Database,
    flow_id: &str,
) -> Result<Option<GraphPayload>, GatewayError> {
    use wagate_core::flow::{NodePayload, Position};

    let flow_id = flow_id.to_string();
    db.connection()
        .call(move |conn| {
            let exists: bool = conn
                .query_row("SELECT 1 FROM flows WHERE id = ?1", params![flow_id], |_| Ok(()))
                .map(|_| true)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(false),
                    other => Err(other),
                })?;
            if !exists {
                return Ok(None);
            }

            let mut nodes = Vec::new();
            {
                let mut stmt = conn.prepare(
                    "SELECT node_id, type, position_x, position_y, data
                     FROM flow_nodes WHERE flow_id = ?1 ORDER BY id ASC",
                )?;
                let rows = stmt.query_map(params![flow_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })?;
                for row in rows {
                    let (id, kind, x, y, data) = row?;
                    nodes.push(NodePayload {
                        id,
                        kind,
                        position: Position { x, y },
                        data: serde_json::from_str(&data)
                            .unwrap_or(serde_json::Value::Null),
                    });
                }
            }

            let mut edges = Vec::new();
            {
                let mut stmt = conn.prepare(
                    "SELECT edge_id, source, target, source_handle
                     FROM flow_edges WHERE flow_id = ?1 ORDER BY id ASC",
                )?;
                let rows = stmt.query_map(params![flow_id], |row| {
                    Ok(GraphEdge {
                        id: row.get(0)?,
                        source: row.get(1)?,
                        target: row.get(2)?,
                        source_handle: row.get(3)?,
                    })
                })?;
                for row in rows {
                    edges.push(row?);
                }
            }

            Ok(Some(GraphPayload { nodes, edges }))
        })
        .await
        .map_err(map_tr_err)
}

/// Upsert the `flows` row and replace its node and edge sets atomically.
pub async fn save_graph(
    db: &Database,
    flow_id: &str,
    name: &str,
    payload: &GraphPayload,
) -> Result<(), GatewayError> {
    let flow_id = flow_id.to_string();
    let name = name.to_string();
    let payload = payload.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO flows (id, name, status)
                 VALUES (?1, ?2, 'draft')
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![flow_id, name],
            )?;
            tx.execute(
                "DELETE FROM flow_nodes WHERE flow_id = ?1",
                params![flow_id],
            )?;
            tx.execute(
                "DELETE FROM flow_edges WHERE flow_id = ?1",
                params![flow_id],
            )?;
            for node in &payload.nodes {
                tx.execute(
                    "INSERT INTO flow_nodes (flow_id, node_id, type, position_x, position_y, data)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        flow_id,
                        node.id,
                        node.kind,
                        node.position.x,
                        node.position.y,
                        node.data.to_string(),
                    ],
                )?;
            }
            for edge in &payload.edges {
                tx.execute(
                    "INSERT INTO flow_edges (flow_id, edge_id, source, target, source_handle)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![flow_id, edge.id, edge.source, edge.target, edge.source_handle],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a flow; nodes and edges cascade.
pub async fn delete_flow(db: &Database, flow_id: &str) -> Result<bool, GatewayError> {
    let flow_id = flow_id.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute("DELETE FROM flows WHERE id = ?1", params![flow_id])?;
            Ok(affected > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// List flows, most recently updated first.
pub async fn list(db: &Database) -> Result<Vec<FlowRow>, GatewayError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, status, updated_at FROM flows ORDER BY updated_at DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(FlowRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    status: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            })?;
            let mut flows = Vec::new();
            for row in rows {
                flows.push(row?);
            }
            Ok(flows)
        })
        .await
        .map_err(map_tr_err)
}

/// The most recently updated flow, if any.
pub async fn latest(db: &Database) -> Result<Option<FlowRow>, GatewayError> {
    Ok(list(db).await?.into_iter().next())
}
