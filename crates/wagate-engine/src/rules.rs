// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation rule evaluation for messages not consumed by an active flow.
//!
//! Rules run in `priority DESC, created_at DESC` order; conditions combine
//! with AND; the first matching rule executes its actions and evaluation
//! stops. Evaluation errors (bad condition JSON, broken regexes) are logged
//! and treated as non-matches.

use regex::Regex;
use tracing::{debug, info, warn};

use wagate_core::types::{AutomationRule, RuleAction, RuleCondition};
use wagate_core::GatewayError;
use wagate_storage::queries::{contacts, flows, rules, sessions};

use crate::Engine;

impl Engine {
    /// Process one inbound text for a contact.
    ///
    /// An active flow session consumes the message outright; otherwise the
    /// rule set is evaluated.
    pub async fn process_incoming(&self, wa_id: &str, text: &str) -> Result<(), GatewayError> {
        if let Some(session) = sessions::get_active(&self.db, wa_id).await? {
            debug!(
                wa_id,
                flow_id = session.flow_id.as_str(),
                node = session.current_node.as_str(),
                "active session consumes message"
            );
            return self.continue_flow(wa_id, &session, text).await;
        }

        let rule_set = rules::list_enabled(&self.db).await?;
        for rule in &rule_set {
            if !self.conditions_match(rule, wa_id, text).await? {
                continue;
            }
            info!(wa_id, rule = rule.name.as_str(), "rule matched");

            match self.execute_actions(rule, wa_id, text).await {
                Ok(()) => {
                    rules::insert_log(
                        &self.db,
                        rule.id,
                        wa_id,
                        &rule.kind,
                        "action_executed",
                        true,
                        "",
                    )
                    .await?;
                }
                Err(e) => {
                    warn!(rule = rule.name.as_str(), error = %e, "rule action failed");
                    rules::insert_log(
                        &self.db,
                        rule.id,
                        wa_id,
                        &rule.kind,
                        "action_failed",
                        false,
                        &e.to_string(),
                    )
                    .await?;
                }
            }
            // Highest-priority rule wins.
            break;
        }

        // Debugging hook: start the most recently updated flow.
        if self.test_triggers {
            let lowered = text.to_lowercase();
            if lowered == "test" || lowered == "start" {
                if let Some(flow) = flows::latest(&self.db).await? {
                    info!(wa_id, flow_id = flow.id.as_str(), "test trigger starting latest flow");
                    return self.start_flow(wa_id, &flow.id).await;
                }
            }
        }

        Ok(())
    }

    /// AND-evaluate a rule's conditions. Undecodable condition JSON never
    /// matches.
    async fn conditions_match(
        &self,
        rule: &AutomationRule,
        wa_id: &str,
        text: &str,
    ) -> Result<bool, GatewayError> {
        let conditions: Vec<RuleCondition> = match serde_json::from_str(&rule.conditions) {
            Ok(conditions) => conditions,
            Err(e) => {
                warn!(rule = rule.name.as_str(), error = %e, "undecodable rule conditions");
                return Ok(false);
            }
        };

        for condition in &conditions {
            let matched = match condition.kind.as_str() {
                "keyword" => match_keyword(text, &condition.operator, &condition.value),
                "message_type" => condition.value == "text",
                "contact_tag" => contacts::has_tag(&self.db, wa_id, &condition.value).await?,
                other => {
                    warn!(kind = other, "unknown condition type");
                    false
                }
            };
            if !matched {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Run a rule's actions in order; the first failure aborts the rest.
    async fn execute_actions(
        &self,
        rule: &AutomationRule,
        wa_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        let actions: Vec<RuleAction> = serde_json::from_str(&rule.actions)
            .map_err(|e| GatewayError::Internal(format!("undecodable rule actions: {e}")))?;

        for action in &actions {
            match action.kind.as_str() {
                "send_message" => {
                    let Some(message) = action.params.get("message").and_then(|v| v.as_str())
                    else {
                        continue;
                    };
                    let message = message
                        .replace("{{contact_name}}", wa_id)
                        .replace("{{message}}", text);
                    self.provider.send_text(wa_id, &message).await?;
                }
                "add_tag" => {
                    let Some(tag) = action.params.get("tag").and_then(|v| v.as_str()) else {
                        continue;
                    };
                    contacts::add_tag(&self.db, wa_id, tag).await?;
                }
                "start_flow" => {
                    let Some(flow_id) = action.params.get("flow_id") else {
                        continue;
                    };
                    if let Some(flow_id) = flow_id.as_str() {
                        self.start_flow(wa_id, flow_id).await?;
                    } else if let Some(numeric) = flow_id.as_i64() {
                        // Legacy integer-id rules: park the session at the
                        // literal `start` node without executing.
                        sessions::create_active(&self.db, wa_id, &numeric.to_string(), "start")
                            .await?;
                        info!(wa_id, flow_id = numeric, "legacy flow session created");
                    }
                }
                other => {
                    warn!(kind = other, "unknown action type");
                }
            }
        }
        Ok(())
    }
}

/// Keyword matching over lowercased, trimmed message text.
fn match_keyword(message: &str, operator: &str, value: &str) -> bool {
    let message = message.trim().to_lowercase();
    let value = value.to_lowercase();

    match operator {
        "equals" => message == value,
        "contains" => message.contains(&value),
        "starts_with" => message.starts_with(&value),
        "regex" => match Regex::new(&value) {
            Ok(re) => re.is_match(&message),
            Err(e) => {
                warn!(pattern = value.as_str(), error = %e, "invalid keyword regex");
                false
            }
        },
        _ => false,
    }
}
