// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Public flow entry points: start a flow for a contact, or continue an
//! active session with a fresh input.
//!
//! Per-contact ordering is the dispatcher's job; by the time these run, the
//! calling worker is the only writer for this contact.

use tracing::{debug, info, warn};

use wagate_core::flow::Step;
use wagate_core::types::ConversationSession;
use wagate_core::{FlowError, GatewayError};
use wagate_storage::queries::{flows, sessions};

use crate::edges::find_next;
use crate::validator::{validate, Verdict};
use crate::Engine;

const RETRIES_EXHAUSTED_MESSAGE: &str = "Too many invalid attempts. Session ended.";

impl Engine {
    /// Start `flow_id` for a contact at its start node.
    ///
    /// Any active session the contact already has is completed first.
    pub async fn start_flow(&self, wa_id: &str, flow_id: &str) -> Result<(), GatewayError> {
        let graph = flows::load_graph(&self.db, flow_id).await?;
        let start = graph
            .start_node()
            .cloned()
            .ok_or_else(|| FlowError::NoStartNode(flow_id.to_string()))?;

        let session = sessions::create_active(&self.db, wa_id, flow_id, &start.id).await?;
        info!(wa_id, flow_id, session_id = session.id, "flow started");
        self.hub.publish(
            "session_update",
            serde_json::json!({"wa_id": wa_id, "flow_id": flow_id, "status": "active"}),
        );

        self.execute_node(wa_id, start, graph).await
    }

    /// Continue an active session with the user's reply.
    pub async fn continue_flow(
        &self,
        wa_id: &str,
        session: &ConversationSession,
        input: &str,
    ) -> Result<(), GatewayError> {
        debug!(
            wa_id,
            session_id = session.id,
            flow_id = session.flow_id.as_str(),
            node = session.current_node.as_str(),
            "continuing flow"
        );

        let graph = flows::load_graph(&self.db, &session.flow_id).await?;
        let Some(current) = graph.node(&session.current_node).cloned() else {
            // The graph was edited under the session; end it cleanly.
            sessions::complete(&self.db, session.id).await?;
            return Err(FlowError::NodeMissing {
                flow: session.flow_id.clone(),
                node: session.current_node.clone(),
            }
            .into());
        };

        // Validation rules come from the node's final step (the input
        // trigger, when there is one).
        let last_step = current.data.steps.last();
        let verdict = match last_step {
            Some(Step::Input {
                kind, validation, ..
            }) => validate(input, *kind, validation.as_ref()),
            _ => Verdict::pass(),
        };

        let retry_key = format!("{}_retries", current.id);
        if !verdict.ok {
            let retries = sessions::get_context(&self.db, session.id, &retry_key)
                .await?
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(0);

            if retries < verdict.max_retries {
                self.send_text_best_effort(wa_id, &verdict.error_message).await;
                sessions::put_context(&self.db, session.id, &retry_key, &(retries + 1).to_string())
                    .await?;
                // Stay on the current node.
                return Ok(());
            }

            warn!(wa_id, session_id = session.id, "input retries exhausted");
            self.send_text_best_effort(wa_id, RETRIES_EXHAUSTED_MESSAGE).await;
            sessions::complete(&self.db, session.id).await?;
            self.hub.publish(
                "session_update",
                serde_json::json!({"wa_id": wa_id, "status": "completed"}),
            );
            return Ok(());
        }

        // Valid input: reset the retry counter and capture the variable.
        sessions::put_context(&self.db, session.id, &retry_key, "0").await?;
        if let Some(Step::Input { variable, .. }) = last_step {
            if !variable.is_empty() {
                sessions::put_context(&self.db, session.id, variable, input).await?;
            }
        }

        match find_next(&current, &graph.edges, input) {
            Some(next_id) => {
                sessions::update_current_node(&self.db, session.id, &next_id).await?;
                let Some(next) = graph.node(&next_id).cloned() else {
                    sessions::complete(&self.db, session.id).await?;
                    return Err(FlowError::NodeMissing {
                        flow: session.flow_id.clone(),
                        node: next_id,
                    }
                    .into());
                };
                self.execute_node(wa_id, next, graph).await
            }
            None => {
                debug!(wa_id, session_id = session.id, "no next node, completing session");
                sessions::complete(&self.db, session.id).await?;
                self.hub.publish(
                    "session_update",
                    serde_json::json!({"wa_id": wa_id, "status": "completed"}),
                );
                Ok(())
            }
        }
    }
}
