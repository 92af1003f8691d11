// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Edge resolution: map a node, the edge set, and an interactive reply (or
//! none) to the next node id.
//!
//! Interactive branches are keyed by `handle-<stepIndex>-<choiceIndex>`
//! against the node's step list as authored. The step scan stops at the
//! first interactive step found, so a Quick Reply ahead of a List wins.

use wagate_core::flow::{handle_name, GraphEdge, GraphNode, Step};

/// Compute the next node id, or `None` when no edge applies.
///
/// `input` is empty when auto-advancing from a non-waiting node; only the
/// fallback path can match then.
pub fn find_next(node: &GraphNode, edges: &[GraphEdge], input: &str) -> Option<String> {
    let mut has_quick_replies = false;
    let mut has_list = false;
    for step in &node.data.steps {
        match step {
            Step::QuickReply { .. } => {
                has_quick_replies = true;
                break;
            }
            Step::List { .. } => {
                has_list = true;
                break;
            }
            _ => {}
        }
    }

    if has_quick_replies {
        for (step_index, step) in node.data.steps.iter().enumerate() {
            let Step::QuickReply { buttons, .. } = step else {
                continue;
            };
            for (button_index, button) in buttons.iter().enumerate() {
                if !equal_fold(&button.label, input) {
                    continue;
                }
                let handle = handle_name(step_index, button_index);
                if let Some(edge) = edges
                    .iter()
                    .find(|e| e.source == node.id && e.source_handle == handle)
                {
                    return Some(edge.target.clone());
                }
                // Matched button without an edge: keep scanning.
            }
        }
    } else if has_list {
        for (step_index, step) in node.data.steps.iter().enumerate() {
            let Step::List { options, .. } = step else {
                continue;
            };
            for (option_index, option) in options.iter().enumerate() {
                if !equal_fold(&option.title, input) {
                    continue;
                }
                let handle = handle_name(step_index, option_index);
                if let Some(edge) = edges
                    .iter()
                    .find(|e| e.source == node.id && e.source_handle == handle)
                {
                    return Some(edge.target.clone());
                }
            }
        }
    }

    // Fallback: the first generic edge out of this node.
    let interactive = has_quick_replies || has_list;
    edges
        .iter()
        .find(|e| e.source == node.id && (!interactive || e.is_fallback()))
        .map(|e| e.target.clone())
}

fn equal_fold(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wagate_core::flow::{NodeData, NodeDataRecord};

    fn node(id: &str, steps_json: &str) -> GraphNode {
        let record: NodeDataRecord =
            serde_json::from_str(&format!(r#"{{"steps": {steps_json}}}"#)).unwrap();
        GraphNode {
            id: id.to_string(),
            kind: "message".to_string(),
            x: 0.0,
            y: 0.0,
            data: NodeData::from_record(record),
        }
    }

    fn edge(source: &str, target: &str, handle: &str) -> GraphEdge {
        GraphEdge {
            id: format!("{source}-{target}-{handle}"),
            source: source.to_string(),
            target: target.to_string(),
            source_handle: handle.to_string(),
        }
    }

    const BRANCHING: &str = r#"[
        {"type": "Text", "content": "Pick:"},
        {"type": "Quick Reply", "buttons": [{"label": "Yes"}, {"label": "No"}]}
    ]"#;

    #[test]
    fn quick_reply_matches_case_insensitively() {
        let n = node("a", BRANCHING);
        let edges = vec![
            edge("a", "b", "handle-1-0"),
            edge("a", "c", "handle-1-1"),
            edge("a", "d", "default"),
        ];

        assert_eq!(find_next(&n, &edges, "yes"), Some("b".into()));
        assert_eq!(find_next(&n, &edges, "NO"), Some("c".into()));
    }

    #[test]
    fn unmatched_reply_falls_through_to_default_edge() {
        let n = node("a", BRANCHING);
        let edges = vec![
            edge("a", "b", "handle-1-0"),
            edge("a", "d", "default"),
        ];
        assert_eq!(find_next(&n, &edges, "maybe"), Some("d".into()));
    }

    #[test]
    fn unmatched_reply_without_default_resolves_to_none() {
        let n = node("a", BRANCHING);
        let edges = vec![edge("a", "b", "handle-1-0")];
        assert_eq!(find_next(&n, &edges, "maybe"), None);
    }

    #[test]
    fn matched_button_without_an_edge_keeps_scanning_to_fallback() {
        let n = node("a", BRANCHING);
        // "No" matches handle-1-1 but no such edge exists.
        let edges = vec![edge("a", "d", "handle-1-default")];
        assert_eq!(find_next(&n, &edges, "no"), Some("d".into()));
    }

    #[test]
    fn list_titles_match_when_no_quick_reply_present() {
        let n = node(
            "a",
            r#"[{"type": "List", "options": [{"title": "Sales"}, {"title": "Support"}]}]"#,
        );
        let edges = vec![
            edge("a", "s1", "handle-0-0"),
            edge("a", "s2", "handle-0-1"),
        ];
        assert_eq!(find_next(&n, &edges, "support"), Some("s2".into()));
    }

    #[test]
    fn quick_reply_wins_when_it_precedes_a_list() {
        let n = node(
            "a",
            r#"[{"type": "Quick Reply", "buttons": [{"label": "Go"}]},
                {"type": "List", "options": [{"title": "Go"}]}]"#,
        );
        // Only the quick-reply handle resolves; the list handle is ignored.
        let edges = vec![
            edge("a", "via-list", "handle-1-0"),
            edge("a", "via-button", "handle-0-0"),
        ];
        assert_eq!(find_next(&n, &edges, "go"), Some("via-button".into()));
    }

    #[test]
    fn non_interactive_node_takes_any_outgoing_edge() {
        let n = node("a", r#"[{"type": "Text", "content": "hi"}]"#);
        let edges = vec![edge("a", "b", "")];
        assert_eq!(find_next(&n, &edges, ""), Some("b".into()));
    }

    #[test]
    fn auto_advance_on_interactive_node_only_uses_fallback_edges() {
        let n = node("a", BRANCHING);
        let edges = vec![
            edge("a", "b", "handle-1-0"),
            edge("a", "d", "handle-default"),
        ];
        // Empty input cannot match a button; only the default edge applies.
        assert_eq!(find_next(&n, &edges, ""), Some("d".into()));
    }

    #[test]
    fn edges_from_other_nodes_are_ignored() {
        let n = node("a", r#"[{"type": "Text", "content": "hi"}]"#);
        let edges = vec![edge("z", "b", "")];
        assert_eq!(find_next(&n, &edges, ""), None);
    }

    #[test]
    fn node_without_steps_or_edges_has_no_next() {
        let n = node("a", "[]");
        assert_eq!(find_next(&n, &[], ""), None);
    }
}
