// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flow graph types: nodes, edges, and the step sum executed per node.
//!
//! Graphs are authored in a visual editor and arrive as JSON. Node `data`
//! blobs are stored verbatim and decoded into [`NodeData`] at load time.
//! Step indices are position-significant: interactive edges are keyed by
//! `handle-<stepIndex>-<choiceIndex>`, so decoding must never drop a step
//! (unrecognized kinds become [`Step::Unknown`] to keep indices stable).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source-handle suffix that marks a fallback edge.
pub const HANDLE_DEFAULT_SUFFIX: &str = "default";

/// Build the source-handle name for an interactive branch.
pub fn handle_name(step_index: usize, choice_index: usize) -> String {
    format!("handle-{step_index}-{choice_index}")
}

/// A materialized flow graph.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl FlowGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The unique node flagged `isStart`.
    pub fn start_node(&self) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.data.is_start)
    }
}

/// A node of the graph with its decoded step list.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: String,
    /// Editor node type. Presentational, not interpreted by the engine.
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub data: NodeData,
}

/// Decoded node payload.
#[derive(Debug, Clone, Default)]
pub struct NodeData {
    pub label: String,
    pub is_start: bool,
    pub steps: Vec<Step>,
}

impl NodeData {
    pub fn from_record(record: NodeDataRecord) -> Self {
        Self {
            label: record.label,
            is_start: record.is_start,
            steps: record.steps.into_iter().map(Step::from_record).collect(),
        }
    }
}

/// An edge of the graph. `source_handle` round-trips byte-for-byte through
/// save and load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, rename = "sourceHandle")]
    pub source_handle: String,
}

impl GraphEdge {
    /// True when this edge is a fallback: an empty handle or one whose name
    /// ends with `default`.
    pub fn is_fallback(&self) -> bool {
        self.source_handle.is_empty() || self.source_handle.ends_with(HANDLE_DEFAULT_SUFFIX)
    }
}

/// Serde mirror of an authored node `data` blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeDataRecord {
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "isStart")]
    pub is_start: bool,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

/// Serde mirror of one authored step: a shared prefix (`type`, `content`,
/// `variable`, `validation`) plus kind-specific fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub variable: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<QuickReplyButton>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ListOption>,
    #[serde(default, rename = "buttonText", skip_serializing_if = "String::is_empty")]
    pub button_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<StepValidation>,
    #[serde(default, rename = "targetFlowId", skip_serializing_if = "String::is_empty")]
    pub target_flow_id: String,
    #[serde(default, rename = "targetNodeId", skip_serializing_if = "String::is_empty")]
    pub target_node_id: String,
}

/// A quick-reply button. The label doubles as the reply match key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReplyButton {
    #[serde(default)]
    pub label: String,
}

/// A list option. The title doubles as the reply match key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOption {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Validation attached to an input step. `max_retries`, `min`, and `max`
/// accept both JSON numbers and numeric strings from the editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepValidation {
    #[serde(default, rename = "maxRetries", skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<Value>,
    #[serde(default, rename = "errorMessage", skip_serializing_if = "String::is_empty")]
    pub error_message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub regex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
}

/// Coerce a JSON number or numeric string to an integer.
pub fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce a JSON number or numeric string to a float.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The input step kinds, used to select type-intrinsic validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Number,
    Email,
}

/// The closed sum of step kinds the executor dispatches over.
#[derive(Debug, Clone)]
pub enum Step {
    Text {
        content: String,
    },
    Image {
        content: String,
    },
    QuickReply {
        content: String,
        buttons: Vec<QuickReplyButton>,
    },
    List {
        content: String,
        button_text: String,
        options: Vec<ListOption>,
    },
    Input {
        kind: InputKind,
        variable: String,
        prompt: String,
        validation: Option<StepValidation>,
    },
    /// Jump to another flow (or a specific node of it).
    Jump {
        target_flow: String,
        target_node: String,
    },
    /// A kind this build does not understand. Kept so step indices stay
    /// aligned with authored handles; the executor logs and skips it.
    Unknown {
        kind: String,
    },
}

impl Step {
    pub fn from_record(record: StepRecord) -> Self {
        match record.kind.as_str() {
            "Text" | "Text Message" => Step::Text {
                content: record.content,
            },
            "Image" => Step::Image {
                content: record.content,
            },
            "Quick Reply" => Step::QuickReply {
                content: record.content,
                buttons: record.buttons,
            },
            "List" => Step::List {
                content: record.content,
                button_text: record.button_text,
                options: record.options,
            },
            "Text Input" => Step::Input {
                kind: InputKind::Text,
                variable: record.variable,
                prompt: record.content,
                validation: record.validation,
            },
            "Number Input" => Step::Input {
                kind: InputKind::Number,
                variable: record.variable,
                prompt: record.content,
                validation: record.validation,
            },
            "Email Input" => Step::Input {
                kind: InputKind::Email,
                variable: record.variable,
                prompt: record.content,
                validation: record.validation,
            },
            "Chatbot" => Step::Jump {
                target_flow: record.target_flow_id,
                target_node: record.target_node_id,
            },
            _ => Step::Unknown { kind: record.kind },
        }
    }

    /// True for steps whose node waits for a user reply when they are last.
    pub fn awaits_reply(&self) -> bool {
        matches!(
            self,
            Step::Input { .. } | Step::QuickReply { .. } | Step::List { .. }
        )
    }
}

/// An authored graph as posted by the operator API: node `data` is kept as
/// an opaque JSON value so saving preserves fields this build ignores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphPayload {
    #[serde(default)]
    pub nodes: Vec<NodePayload>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePayload {
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_steps(json: &str) -> Vec<Step> {
        let records: Vec<StepRecord> = serde_json::from_str(json).unwrap();
        records.into_iter().map(Step::from_record).collect()
    }

    #[test]
    fn text_message_is_an_alias_for_text() {
        let steps = decode_steps(
            r#"[{"type":"Text","content":"a"},{"type":"Text Message","content":"b"}]"#,
        );
        assert!(matches!(&steps[0], Step::Text { content } if content == "a"));
        assert!(matches!(&steps[1], Step::Text { content } if content == "b"));
    }

    #[test]
    fn unknown_kinds_keep_their_index() {
        let steps = decode_steps(
            r#"[{"type":"Hologram"},{"type":"Quick Reply","content":"Pick:","buttons":[{"label":"Yes"}]}]"#,
        );
        assert!(matches!(&steps[0], Step::Unknown { kind } if kind == "Hologram"));
        // The quick reply must still sit at index 1 for handle-1-0 to resolve.
        assert!(matches!(&steps[1], Step::QuickReply { .. }));
    }

    #[test]
    fn input_steps_carry_variable_and_validation() {
        let steps = decode_steps(
            r#"[{"type":"Email Input","variable":"email","validation":{"maxRetries":"2","errorMessage":"bad"}}]"#,
        );
        match &steps[0] {
            Step::Input {
                kind,
                variable,
                validation,
                ..
            } => {
                assert_eq!(*kind, InputKind::Email);
                assert_eq!(variable, "email");
                let v = validation.as_ref().unwrap();
                assert_eq!(coerce_i64(v.max_retries.as_ref().unwrap()), Some(2));
                assert_eq!(v.error_message, "bad");
            }
            other => panic!("expected input step, got {other:?}"),
        }
    }

    #[test]
    fn coercions_accept_numbers_and_numeric_strings() {
        assert_eq!(coerce_i64(&serde_json::json!(5)), Some(5));
        assert_eq!(coerce_i64(&serde_json::json!(5.0)), Some(5));
        assert_eq!(coerce_i64(&serde_json::json!("7")), Some(7));
        assert_eq!(coerce_i64(&serde_json::json!("x")), None);
        assert_eq!(coerce_f64(&serde_json::json!(1.5)), Some(1.5));
        assert_eq!(coerce_f64(&serde_json::json!("2.5")), Some(2.5));
        assert_eq!(coerce_f64(&serde_json::json!(true)), None);
    }

    #[test]
    fn fallback_edges_match_empty_and_default_handles() {
        let mk = |handle: &str| GraphEdge {
            id: "e".into(),
            source: "a".into(),
            target: "b".into(),
            source_handle: handle.into(),
        };
        assert!(mk("").is_fallback());
        assert!(mk("default").is_fallback());
        assert!(mk("handle-default").is_fallback());
        assert!(!mk("handle-1-0").is_fallback());
    }

    #[test]
    fn edge_source_handle_round_trips_byte_for_byte() {
        let json = r#"{"id":"e1","source":"a","target":"b","sourceHandle":"handle-2-1"}"#;
        let edge: GraphEdge = serde_json::from_str(json).unwrap();
        assert_eq!(edge.source_handle, "handle-2-1");
        let back = serde_json::to_string(&edge).unwrap();
        assert!(back.contains(r#""sourceHandle":"handle-2-1""#));
    }

    #[test]
    fn awaits_reply_covers_inputs_and_interactive_steps() {
        let wait = decode_steps(
            r#"[{"type":"Text Input"},{"type":"Quick Reply"},{"type":"List"}]"#,
        );
        assert!(wait.iter().all(Step::awaits_reply));
        let advance = decode_steps(r#"[{"type":"Text"},{"type":"Image"},{"type":"Chatbot"}]"#);
        assert!(!advance.iter().any(Step::awaits_reply));
    }

    #[test]
    fn handle_name_formats_indices() {
        assert_eq!(handle_name(1, 0), "handle-1-0");
    }
}
