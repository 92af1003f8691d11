// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the flow engine and rule matcher.
//!
//! Each test assembles an isolated harness (temp SQLite, capturing mock
//! provider behind the production outbox) and drives inbound messages
//! through the same entry point the per-contact workers use.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use wagate_core::types::{InboundMessage, SessionStatus};
use wagate_engine::ContactRouter;
use wagate_storage::queries::{contacts, messages, sessions};
use wagate_test_utils::{SentMessage, TestHarness};

// ---- Flow execution ----

#[tokio::test]
async fn linear_flow_auto_advances_and_completes() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .save_flow(
            "f",
            "linear",
            r#"{
              "nodes": [
                {"id": "a", "type": "message",
                 "data": {"isStart": true, "steps": [{"type": "Text", "content": "hi"}]}},
                {"id": "b", "type": "message",
                 "data": {"steps": [{"type": "Text", "content": "bye"}]}}
              ],
              "edges": [{"id": "e1", "source": "a", "target": "b", "sourceHandle": ""}]
            }"#,
        )
        .await
        .unwrap();

    harness.engine.start_flow("u", "f").await.unwrap();

    assert_eq!(harness.provider.texts().await, vec!["hi", "bye"]);
    assert!(harness.active_session("u").await.unwrap().is_none());

    let all = sessions::list(&harness.db, None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, SessionStatus::Completed);
}

const BRANCHING_FLOW: &str = r#"{
  "nodes": [
    {"id": "a", "type": "message",
     "data": {"isStart": true, "steps": [
        {"type": "Text", "content": "Pick:"},
        {"type": "Quick Reply", "content": "Choose", "buttons": [{"label": "Yes"}, {"label": "No"}]}
     ]}},
    {"id": "b", "type": "message", "data": {"steps": [{"type": "Text", "content": "yes!"}]}},
    {"id": "c", "type": "message", "data": {"steps": [{"type": "Text", "content": "no!"}]}},
    {"id": "d", "type": "message", "data": {"steps": [{"type": "Text", "content": "fallback"}]}}
  ],
  "edges": [
    {"id": "e1", "source": "a", "target": "b", "sourceHandle": "handle-1-0"},
    {"id": "e2", "source": "a", "target": "c", "sourceHandle": "handle-1-1"},
    {"id": "e3", "source": "a", "target": "d", "sourceHandle": "default"}
  ]
}"#;

#[tokio::test]
async fn quick_reply_branch_matches_lowercased_reply() {
    let harness = TestHarness::new().await.unwrap();
    harness.save_flow("f", "branching", BRANCHING_FLOW).await.unwrap();

    harness.engine.start_flow("u", "f").await.unwrap();

    // The start node emits the prompt and an interactive-button message,
    // then waits.
    let sent = harness.provider.sent().await;
    assert_eq!(sent.len(), 2);
    assert!(matches!(
        &sent[1],
        SentMessage::Buttons { body, buttons, .. }
            if body == "Choose" && buttons.len() == 2 && buttons[0].id == "btn_0"
    ));
    assert!(harness.active_session("u").await.unwrap().is_some());

    // The interactive reply arrives as its title, compared case-insensitively.
    harness.inbound_text("u", "yes").await.unwrap();

    assert_eq!(harness.provider.texts().await, vec!["Pick:", "yes!"]);
    assert!(harness.active_session("u").await.unwrap().is_none());
}

#[tokio::test]
async fn unmatched_reply_takes_the_default_edge() {
    let harness = TestHarness::new().await.unwrap();
    harness.save_flow("f", "branching", BRANCHING_FLOW).await.unwrap();

    harness.engine.start_flow("u", "f").await.unwrap();
    harness.inbound_text("u", "maybe").await.unwrap();

    assert_eq!(harness.provider.texts().await, vec!["Pick:", "fallback"]);
}

#[tokio::test]
async fn unmatched_reply_without_default_edge_ends_the_session() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .save_flow(
            "f",
            "no-default",
            r#"{
              "nodes": [
                {"id": "a", "type": "message",
                 "data": {"isStart": true, "steps": [
                    {"type": "Quick Reply", "content": "Choose", "buttons": [{"label": "Yes"}]}
                 ]}},
                {"id": "b", "type": "message", "data": {"steps": [{"type": "Text", "content": "yes!"}]}}
              ],
              "edges": [{"id": "e1", "source": "a", "target": "b", "sourceHandle": "handle-0-0"}]
            }"#,
        )
        .await
        .unwrap();

    harness.engine.start_flow("u", "f").await.unwrap();
    harness.inbound_text("u", "whatever").await.unwrap();

    assert!(harness.active_session("u").await.unwrap().is_none());
    assert!(harness.provider.texts().await.is_empty());
}

#[tokio::test]
async fn email_retries_exhaust_after_the_configured_cap() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .save_flow(
            "f",
            "email",
            r#"{
              "nodes": [
                {"id": "a", "type": "message",
                 "data": {"isStart": true, "steps": [
                    {"type": "Text", "content": "Email?"},
                    {"type": "Email Input", "variable": "email",
                     "validation": {"maxRetries": 2}}
                 ]}}
              ],
              "edges": []
            }"#,
        )
        .await
        .unwrap();

    harness.engine.start_flow("u", "f").await.unwrap();
    let session_id = harness.active_session("u").await.unwrap().unwrap().id;

    harness.inbound_text("u", "bad").await.unwrap();
    harness.inbound_text("u", "still bad").await.unwrap();
    harness.inbound_text("u", "nope").await.unwrap();

    assert_eq!(
        harness.provider.texts().await,
        vec![
            "Email?",
            "Please enter a valid email address.",
            "Please enter a valid email address.",
            "Too many invalid attempts. Session ended.",
        ]
    );

    let session = harness.session(session_id).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    // No variable was captured.
    assert_eq!(harness.context_value(session_id, "email").await.unwrap(), None);
}

#[tokio::test]
async fn failed_validation_keeps_the_node_and_counts_retries() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .save_flow(
            "f",
            "email",
            r#"{
              "nodes": [
                {"id": "ask", "type": "message",
                 "data": {"isStart": true, "steps": [
                    {"type": "Email Input", "variable": "email"}
                 ]}}
              ],
              "edges": []
            }"#,
        )
        .await
        .unwrap();

    harness.engine.start_flow("u", "f").await.unwrap();
    let session_id = harness.active_session("u").await.unwrap().unwrap().id;

    harness.inbound_text("u", "not-an-email").await.unwrap();

    let session = harness.session(session_id).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Active);
    assert_eq!(session.current_node, "ask");
    assert_eq!(
        harness.context_value(session_id, "ask_retries").await.unwrap().as_deref(),
        Some("1")
    );

    harness.inbound_text("u", "also bad").await.unwrap();
    assert_eq!(
        harness.context_value(session_id, "ask_retries").await.unwrap().as_deref(),
        Some("2")
    );
}

#[tokio::test]
async fn number_bounds_use_the_custom_error_message() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .save_flow(
            "f",
            "number",
            r#"{
              "nodes": [
                {"id": "a", "type": "message",
                 "data": {"isStart": true, "steps": [
                    {"type": "Text", "content": "Num?"},
                    {"type": "Number Input", "variable": "n",
                     "validation": {"min": 1, "max": 10, "errorMessage": "1-10 only"}}
                 ]}},
                {"id": "b", "type": "message", "data": {"steps": [{"type": "Text", "content": "ok"}]}}
              ],
              "edges": [{"id": "e1", "source": "a", "target": "b", "sourceHandle": ""}]
            }"#,
        )
        .await
        .unwrap();

    harness.engine.start_flow("u", "f").await.unwrap();
    let session_id = harness.active_session("u").await.unwrap().unwrap().id;

    harness.inbound_text("u", "0").await.unwrap();
    harness.inbound_text("u", "abc").await.unwrap();
    harness.inbound_text("u", "7").await.unwrap();

    assert_eq!(
        harness.provider.texts().await,
        vec!["Num?", "1-10 only", "1-10 only", "ok"]
    );
    assert_eq!(
        harness.context_value(session_id, "n").await.unwrap().as_deref(),
        Some("7")
    );
}

#[tokio::test]
async fn jump_step_moves_the_session_to_the_target_flow() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .save_flow(
            "f1",
            "origin",
            r#"{
              "nodes": [
                {"id": "a", "type": "message",
                 "data": {"isStart": true, "steps": [
                    {"type": "Text", "content": "one"},
                    {"type": "Chatbot", "targetFlowId": "f2", "targetNodeId": "x"}
                 ]}}
              ],
              "edges": []
            }"#,
        )
        .await
        .unwrap();
    harness
        .save_flow(
            "f2",
            "target",
            r#"{
              "nodes": [
                {"id": "s", "type": "message",
                 "data": {"isStart": true, "steps": [{"type": "Text", "content": "start-of-f2"}]}},
                {"id": "x", "type": "message",
                 "data": {"steps": [{"type": "Text", "content": "x-ran"}]}}
              ],
              "edges": []
            }"#,
        )
        .await
        .unwrap();

    harness.engine.start_flow("u", "f1").await.unwrap();

    // The jump skips f2's start node and runs the target directly.
    assert_eq!(harness.provider.texts().await, vec!["one", "x-ran"]);

    let all = sessions::list(&harness.db, None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].flow_id, "f2");
    assert_eq!(all[0].current_node, "x");
    assert_eq!(all[0].status, SessionStatus::Completed);
}

#[tokio::test]
async fn jump_to_a_missing_flow_sends_an_operator_visible_error() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .save_flow(
            "f1",
            "origin",
            r#"{
              "nodes": [
                {"id": "a", "type": "message",
                 "data": {"isStart": true, "steps": [
                    {"type": "Chatbot", "targetFlowId": "ghost"}
                 ]}}
              ],
              "edges": []
            }"#,
        )
        .await
        .unwrap();

    let result = harness.engine.start_flow("u", "f1").await;
    assert!(result.is_err());
    assert_eq!(
        harness.provider.texts().await,
        vec!["Error: Target flow not found."]
    );
}

#[tokio::test]
async fn send_failures_do_not_abort_the_flow() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .save_flow(
            "f",
            "linear",
            r#"{
              "nodes": [
                {"id": "a", "type": "message",
                 "data": {"isStart": true, "steps": [{"type": "Text", "content": "hi"}]}},
                {"id": "b", "type": "message",
                 "data": {"steps": [{"type": "Text", "content": "bye"}]}}
              ],
              "edges": [{"id": "e1", "source": "a", "target": "b", "sourceHandle": ""}]
            }"#,
        )
        .await
        .unwrap();

    harness.provider.set_fail_sends(true);
    harness.engine.start_flow("u", "f").await.unwrap();

    // Both sends were attempted and the session still completed.
    assert_eq!(harness.provider.texts().await, vec!["hi", "bye"]);
    let all = sessions::list(&harness.db, None).await.unwrap();
    assert_eq!(all[0].status, SessionStatus::Completed);
}

#[tokio::test]
async fn variables_render_in_flow_messages() {
    let harness = TestHarness::new().await.unwrap();
    contacts::upsert(&harness.db, "u", "Ada", "[]").await.unwrap();
    harness
        .save_flow(
            "f",
            "vars",
            r#"{
              "nodes": [
                {"id": "a", "type": "message",
                 "data": {"isStart": true, "steps": [
                    {"type": "Text", "content": "Name?"},
                    {"type": "Text Input", "variable": "answer"}
                 ]}},
                {"id": "b", "type": "message",
                 "data": {"steps": [{"type": "Text", "content": "Hi {{contact.name}}, you said {{vars.answer}}"}]}}
              ],
              "edges": [{"id": "e1", "source": "a", "target": "b", "sourceHandle": ""}]
            }"#,
        )
        .await
        .unwrap();

    harness.engine.start_flow("u", "f").await.unwrap();
    harness.inbound_text("u", "blue").await.unwrap();

    assert_eq!(
        harness.provider.texts().await,
        vec!["Name?", "Hi Ada, you said blue"]
    );
}

// ---- Rule matching ----

#[tokio::test]
async fn matching_rule_adds_tag_exactly_once_and_wins_by_priority() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .add_rule(
            "tagger",
            10,
            r#"[{"type": "keyword", "operator": "contains", "value": "help"}]"#,
            r#"[{"type": "add_tag", "params": {"tag": "needs-help"}}]"#,
        )
        .await
        .unwrap();
    harness
        .add_rule(
            "low-priority",
            1,
            r#"[{"type": "keyword", "operator": "contains", "value": "help"}]"#,
            r#"[{"type": "send_message", "params": {"message": "low"}}]"#,
        )
        .await
        .unwrap();

    harness.inbound_text("u", "please HELP").await.unwrap();
    harness.inbound_text("u", "please HELP").await.unwrap();

    let contact = contacts::get(&harness.db, "u").await.unwrap().unwrap();
    assert_eq!(contact.tag_list(), vec!["needs-help"]);

    // The lower-priority rule never ran.
    assert!(harness.provider.texts().await.is_empty());
}

#[tokio::test]
async fn send_message_action_substitutes_placeholders() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .add_rule(
            "echo",
            5,
            r#"[{"type": "keyword", "operator": "starts_with", "value": "echo"}]"#,
            r#"[{"type": "send_message", "params": {"message": "{{contact_name}} said: {{message}}"}}]"#,
        )
        .await
        .unwrap();

    harness.inbound_text("15550001", "echo hello").await.unwrap();

    assert_eq!(
        harness.provider.texts().await,
        vec!["15550001 said: echo hello"]
    );
}

#[tokio::test]
async fn contact_tag_condition_uses_decoded_membership() {
    let harness = TestHarness::new().await.unwrap();
    contacts::upsert(&harness.db, "u", "u", r#"["premium-plus"]"#).await.unwrap();
    harness
        .add_rule(
            "vip",
            5,
            r#"[{"type": "keyword", "operator": "equals", "value": "hi"},
                {"type": "contact_tag", "value": "premium"}]"#,
            r#"[{"type": "send_message", "params": {"message": "vip lane"}}]"#,
        )
        .await
        .unwrap();

    // "premium" is a substring of the stored tag but not a member.
    harness.inbound_text("u", "hi").await.unwrap();
    assert!(harness.provider.texts().await.is_empty());

    contacts::add_tag(&harness.db, "u", "premium").await.unwrap();
    harness.inbound_text("u", "hi").await.unwrap();
    assert_eq!(harness.provider.texts().await, vec!["vip lane"]);
}

#[tokio::test]
async fn start_flow_action_launches_the_flow() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .save_flow(
            "onboarding",
            "onboarding",
            r#"{
              "nodes": [
                {"id": "a", "type": "message",
                 "data": {"isStart": true, "steps": [{"type": "Text", "content": "welcome"}]}}
              ],
              "edges": []
            }"#,
        )
        .await
        .unwrap();
    harness
        .add_rule(
            "starter",
            5,
            r#"[{"type": "keyword", "operator": "equals", "value": "join"}]"#,
            r#"[{"type": "start_flow", "params": {"flow_id": "onboarding"}}]"#,
        )
        .await
        .unwrap();

    harness.inbound_text("u", "join").await.unwrap();

    assert_eq!(harness.provider.texts().await, vec!["welcome"]);
}

#[tokio::test]
async fn legacy_numeric_start_flow_creates_a_parked_session() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .add_rule(
            "legacy",
            5,
            r#"[{"type": "keyword", "operator": "equals", "value": "old"}]"#,
            r#"[{"type": "start_flow", "params": {"flow_id": 7}}]"#,
        )
        .await
        .unwrap();

    harness.inbound_text("u", "old").await.unwrap();

    let session = harness.active_session("u").await.unwrap().unwrap();
    assert_eq!(session.flow_id, "7");
    assert_eq!(session.current_node, "start");
}

#[tokio::test]
async fn active_session_consumes_messages_before_rules() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .save_flow(
            "f",
            "ask",
            r#"{
              "nodes": [
                {"id": "a", "type": "message",
                 "data": {"isStart": true, "steps": [
                    {"type": "Text", "content": "Q?"},
                    {"type": "Text Input", "variable": "answer"}
                 ]}}
              ],
              "edges": []
            }"#,
        )
        .await
        .unwrap();
    harness
        .add_rule(
            "greedy",
            99,
            r#"[{"type": "keyword", "operator": "contains", "value": ""}]"#,
            r#"[{"type": "send_message", "params": {"message": "rule ran"}}]"#,
        )
        .await
        .unwrap();

    harness.engine.start_flow("u", "f").await.unwrap();
    let session_id = harness.active_session("u").await.unwrap().unwrap().id;

    harness.inbound_text("u", "my answer").await.unwrap();

    // The flow captured the input; the catch-all rule never fired.
    assert_eq!(
        harness.context_value(session_id, "answer").await.unwrap().as_deref(),
        Some("my answer")
    );
    assert_eq!(harness.provider.texts().await, vec!["Q?"]);
}

#[tokio::test]
async fn test_trigger_starts_the_latest_flow_when_enabled() {
    let harness = TestHarness::builder().with_test_triggers().build().await.unwrap();
    harness
        .save_flow(
            "f",
            "latest",
            r#"{
              "nodes": [
                {"id": "a", "type": "message",
                 "data": {"isStart": true, "steps": [{"type": "Text", "content": "triggered"}]}}
              ],
              "edges": []
            }"#,
        )
        .await
        .unwrap();

    harness.inbound_text("u", "start").await.unwrap();
    assert_eq!(harness.provider.texts().await, vec!["triggered"]);

    // Disabled by default.
    let plain = TestHarness::new().await.unwrap();
    plain
        .save_flow(
            "f",
            "latest",
            r#"{"nodes": [{"id": "a", "data": {"isStart": true,
                "steps": [{"type": "Text", "content": "triggered"}]}}], "edges": []}"#,
        )
        .await
        .unwrap();
    plain.inbound_text("u", "start").await.unwrap();
    assert!(plain.provider.texts().await.is_empty());
}

// ---- Ingress and per-contact serialization ----

#[tokio::test]
async fn ingest_persists_message_and_contact() {
    let harness = TestHarness::new().await.unwrap();
    let payload: wagate_engine::WebhookPayload = serde_json::from_str(
        r#"{"object": "whatsapp_business_account",
            "entry": [{"id": "e", "changes": [{"field": "messages",
              "value": {"messages": [
                {"from": "15550001", "id": "wamid.1", "type": "text",
                 "text": {"body": "hello"}}
              ]}}]}]}"#,
    )
    .unwrap();

    let inbound = harness.engine.ingest(&payload).await.unwrap();
    assert_eq!(
        inbound,
        Some(InboundMessage {
            wa_id: "15550001".into(),
            kind: "text".into(),
            content: "hello".into(),
        })
    );

    let log = messages::list_recent(&harness.db, 10).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].status, "received");
    assert_eq!(log[0].content, "hello");

    let contact = contacts::get(&harness.db, "15550001").await.unwrap().unwrap();
    assert_eq!(contact.name, "15550001");
}

#[tokio::test]
async fn outbound_sends_are_logged_with_the_outgoing_pairing() {
    let harness = TestHarness::new().await.unwrap();
    harness.engine.provider().send_text("15550001", "hi there").await.unwrap();

    let log = messages::list_recent(&harness.db, 10).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].wa_id, "outgoing-15550001");
    assert_eq!(log[0].sender, "15550001");
    assert_eq!(log[0].status, "sent");
}

#[tokio::test]
async fn contact_router_processes_a_burst_in_order() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .save_flow(
            "f",
            "two-questions",
            r#"{
              "nodes": [
                {"id": "a", "type": "message",
                 "data": {"isStart": true, "steps": [
                    {"type": "Text", "content": "Q1"},
                    {"type": "Text Input", "variable": "first"}
                 ]}},
                {"id": "b", "type": "message",
                 "data": {"steps": [
                    {"type": "Text", "content": "Q2"},
                    {"type": "Text Input", "variable": "second"}
                 ]}},
                {"id": "c", "type": "message", "data": {"steps": [{"type": "Text", "content": "done"}]}}
              ],
              "edges": [
                {"id": "e1", "source": "a", "target": "b", "sourceHandle": ""},
                {"id": "e2", "source": "b", "target": "c", "sourceHandle": ""}
              ]
            }"#,
        )
        .await
        .unwrap();

    harness.engine.start_flow("u", "f").await.unwrap();
    let session_id = harness.active_session("u").await.unwrap().unwrap().id;

    let cancel = CancellationToken::new();
    let router = Arc::new(ContactRouter::new(harness.engine.clone(), 16, cancel.clone()));

    // Two replies in one burst: they must apply in arrival order.
    for content in ["one", "two"] {
        router
            .dispatch(InboundMessage {
                wa_id: "u".into(),
                kind: "text".into(),
                content: content.into(),
            })
            .await;
    }

    // Wait for the worker to drain the queue.
    let mut done = false;
    for _ in 0..100 {
        if harness.active_session("u").await.unwrap().is_none() {
            done = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(done, "burst was not fully processed");

    assert_eq!(
        harness.context_value(session_id, "first").await.unwrap().as_deref(),
        Some("one")
    );
    assert_eq!(
        harness.context_value(session_id, "second").await.unwrap().as_deref(),
        Some("two")
    );
    assert_eq!(
        harness.provider.texts().await,
        vec!["Q1", "Q2", "done"]
    );
    assert_eq!(router.queue_count(), 1);

    cancel.cancel();
}

#[tokio::test]
async fn list_step_sends_rows_and_waits() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .save_flow(
            "f",
            "list",
            r#"{
              "nodes": [
                {"id": "a", "type": "message",
                 "data": {"isStart": true, "steps": [
                    {"type": "List", "content": "Team?",
                     "options": [{"title": "Sales", "description": "Buy things"},
                                 {"title": "Support"}]}
                 ]}},
                {"id": "b", "type": "message", "data": {"steps": [{"type": "Text", "content": "sales!"}]}}
              ],
              "edges": [{"id": "e1", "source": "a", "target": "b", "sourceHandle": "handle-0-0"}]
            }"#,
        )
        .await
        .unwrap();

    harness.engine.start_flow("u", "f").await.unwrap();

    let sent = harness.provider.sent().await;
    assert!(matches!(
        &sent[0],
        SentMessage::List { button_text, rows, .. }
            if button_text == "Select an option" && rows.len() == 2 && rows[0].id == "opt_0"
    ));

    harness.inbound_text("u", "SALES").await.unwrap();
    assert_eq!(harness.provider.texts().await, vec!["sales!"]);
}
