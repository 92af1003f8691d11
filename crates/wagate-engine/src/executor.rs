// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Node execution: run a node's ordered step list, then wait for input or
//! auto-advance along the edge set.
//!
//! Auto-advance chains (including cross-flow jumps) run iteratively under a
//! depth cap, so authored cycles terminate instead of recursing without
//! bound. Send failures are logged and never abort the flow.

use tracing::{debug, warn};

use wagate_core::flow::{FlowGraph, GraphNode, Step};
use wagate_core::types::{ListRow, ReplyButton};
use wagate_core::{FlowError, GatewayError};
use wagate_storage::queries::{flows, sessions};

use crate::edges::find_next;
use crate::resolver::resolve_variables;
use crate::Engine;

/// Upper bound on consecutive auto-advance/jump hops in one execution.
const MAX_CHAIN_DEPTH: usize = 64;

/// Provider limit on reply buttons per interactive message.
const MAX_BUTTONS: usize = 3;

/// Provider limit on rows per interactive list.
const MAX_LIST_ROWS: usize = 10;

const DEFAULT_LIST_BUTTON: &str = "Select an option";

/// Where execution goes after one node's steps ran.
enum NodeOutcome {
    /// Keep going in the current graph (wait-or-advance decision applies).
    Continue,
    /// A jump step rewrote the session; resume in another graph.
    Jump { graph: FlowGraph, node: GraphNode },
}

impl Engine {
    /// Execute `node` and everything auto-advance reaches after it.
    ///
    /// Returns once the flow waits for input, the session completes, or a
    /// structural error surfaces.
    pub async fn execute_node(
        &self,
        wa_id: &str,
        mut node: GraphNode,
        mut graph: FlowGraph,
    ) -> Result<(), GatewayError> {
        for _ in 0..MAX_CHAIN_DEPTH {
            match self.run_steps(wa_id, &node).await? {
                NodeOutcome::Jump { graph: g, node: n } => {
                    graph = g;
                    node = n;
                    continue;
                }
                NodeOutcome::Continue => {}
            }

            // Wait-or-advance: a trailing input or interactive step parks
            // the session on this node until the user replies.
            if node.data.steps.last().map(Step::awaits_reply).unwrap_or(false) {
                debug!(wa_id, node = node.id.as_str(), "waiting for user input");
                return Ok(());
            }

            match find_next(&node, &graph.edges, "") {
                Some(next_id) => {
                    if let Some(session) = sessions::get_active(&self.db, wa_id).await? {
                        sessions::update_current_node(&self.db, session.id, &next_id).await?;
                    }
                    match graph.node(&next_id) {
                        Some(next) => node = next.clone(),
                        None => {
                            // Edge points at a node the graph no longer has.
                            self.complete_session(wa_id).await?;
                            return Err(FlowError::NodeMissing {
                                flow: String::new(),
                                node: next_id,
                            }
                            .into());
                        }
                    }
                }
                None => {
                    debug!(wa_id, node = node.id.as_str(), "end of flow");
                    self.complete_session(wa_id).await?;
                    return Ok(());
                }
            }
        }

        warn!(wa_id, "auto-advance depth cap reached, completing session");
        self.complete_session(wa_id).await?;
        Ok(())
    }

    /// Run one node's steps in order.
    async fn run_steps(&self, wa_id: &str, node: &GraphNode) -> Result<NodeOutcome, GatewayError> {
        for step in &node.data.steps {
            match step {
                Step::Text { content } => {
                    let text = resolve_variables(&self.db, wa_id, content).await?;
                    self.send_text_best_effort(wa_id, &text).await;
                }
                Step::Image { content } => {
                    // Media ids cannot be sent as-is yet; surface the
                    // reference as text.
                    self.send_text_best_effort(wa_id, &format!("[Image] {content}")).await;
                }
                Step::QuickReply { content, buttons } => {
                    let text = resolve_variables(&self.db, wa_id, content).await?;
                    let buttons: Vec<ReplyButton> = buttons
                        .iter()
                        .take(MAX_BUTTONS)
                        .enumerate()
                        .map(|(i, b)| ReplyButton {
                            id: format!("btn_{i}"),
                            title: b.label.clone(),
                        })
                        .collect();
                    if let Err(e) = self
                        .provider
                        .send_interactive_buttons(wa_id, &text, &buttons)
                        .await
                    {
                        warn!(wa_id, error = %e, "interactive button send failed");
                    }
                }
                Step::List {
                    content,
                    button_text,
                    options,
                } => {
                    let text = resolve_variables(&self.db, wa_id, content).await?;
                    let button = if button_text.is_empty() {
                        DEFAULT_LIST_BUTTON
                    } else {
                        button_text.as_str()
                    };
                    let rows: Vec<ListRow> = options
                        .iter()
                        .take(MAX_LIST_ROWS)
                        .enumerate()
                        .map(|(i, o)| ListRow {
                            id: format!("opt_{i}"),
                            title: o.title.clone(),
                            description: o.description.clone(),
                        })
                        .collect();
                    if rows.is_empty() {
                        continue;
                    }
                    if let Err(e) = self
                        .provider
                        .send_interactive_list(wa_id, &text, button, &rows)
                        .await
                    {
                        warn!(wa_id, error = %e, "interactive list send failed");
                    }
                }
                Step::Input { .. } => {
                    // Input steps emit nothing; the author precedes them
                    // with a prompt step. The wait decision happens after
                    // the step loop.
                }
                Step::Jump {
                    target_flow,
                    target_node,
                } => {
                    if target_flow.is_empty() {
                        continue;
                    }
                    // A jump abandons any remaining steps of this node.
                    return self.prepare_jump(wa_id, target_flow, target_node).await;
                }
                Step::Unknown { kind } => {
                    warn!(wa_id, kind = kind.as_str(), "skipping unknown step kind");
                }
            }
        }
        Ok(NodeOutcome::Continue)
    }

    /// Rewrite the active session onto another flow and resolve the entry
    /// node there.
    async fn prepare_jump(
        &self,
        wa_id: &str,
        target_flow: &str,
        target_node: &str,
    ) -> Result<NodeOutcome, GatewayError> {
        debug!(wa_id, target_flow, target_node, "jumping to flow");

        let session = sessions::get_active(&self.db, wa_id).await?.ok_or_else(|| {
            GatewayError::Internal(format!("jump without an active session for {wa_id}"))
        })?;

        let graph = match flows::load_graph(&self.db, target_flow).await {
            Ok(graph) => graph,
            Err(e) => {
                self.send_text_best_effort(wa_id, "Error: Target flow not found.").await;
                return Err(e);
            }
        };

        let node = if target_node.is_empty() {
            match graph.start_node() {
                Some(node) => node.clone(),
                None => {
                    self.send_text_best_effort(wa_id, "Error: Start node not found in target flow.")
                        .await;
                    return Err(FlowError::NoStartNode(target_flow.to_string()).into());
                }
            }
        } else {
            match graph.node(target_node) {
                Some(node) => node.clone(),
                None => {
                    self.send_text_best_effort(wa_id, "Error: Target node not found.").await;
                    return Err(FlowError::NodeMissing {
                        flow: target_flow.to_string(),
                        node: target_node.to_string(),
                    }
                    .into());
                }
            }
        };

        sessions::update_flow_position(&self.db, session.id, target_flow, &node.id).await?;

        Ok(NodeOutcome::Jump { graph, node })
    }

    /// Best-effort text send: delivery failure is logged, never propagated.
    pub(crate) async fn send_text_best_effort(&self, wa_id: &str, text: &str) {
        if let Err(e) = self.provider.send_text(wa_id, text).await {
            warn!(wa_id, error = %e, "text send failed");
        }
    }

    /// Complete the contact's active session and notify the dashboard.
    pub(crate) async fn complete_session(&self, wa_id: &str) -> Result<(), GatewayError> {
        sessions::complete_by_wa_id(&self.db, wa_id).await?;
        self.hub.publish(
            "session_update",
            serde_json::json!({"wa_id": wa_id, "status": "completed"}),
        );
        Ok(())
    }
}
