// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared across the wagate workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A WhatsApp contact, keyed by the provider-assigned phone identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// WhatsApp ID (phone number). Stable identity.
    pub wa_id: String,
    /// Display name. Defaults to `wa_id` until a better name is known.
    pub name: String,
    pub profile_pic_url: Option<String>,
    /// JSON-encoded string list, e.g. `["vip","needs-help"]`.
    pub tags: String,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

impl Contact {
    /// Decode the JSON tag list. Malformed blobs decode as empty.
    pub fn tag_list(&self) -> Vec<String> {
        serde_json::from_str(&self.tags).unwrap_or_default()
    }
}

/// One row of the append-only message log. Never read back by the engine;
/// used for audit and dashboard replay only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    /// Conversation key. Outbound rows use `outgoing-<to>` so the dashboard
    /// can group both directions under the recipient.
    pub wa_id: String,
    pub sender: String,
    /// Textual content; non-text kinds are normalized to
    /// `"[kind]:mediaId[:caption]"`.
    pub content: String,
    pub kind: String,
    /// `received` or `sent`.
    pub status: String,
    pub created_at: String,
}

/// Lifecycle states of a conversation session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    /// Operator-initiated termination, distinguished from self-completion.
    Terminated,
}

/// A contact's position within a flow, including accumulated context
/// variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: i64,
    pub wa_id: String,
    pub flow_id: String,
    pub current_node: String,
    /// String-keyed string map, JSON-encoded for storage.
    pub context: String,
    pub status: SessionStatus,
    pub started_at: String,
    pub updated_at: String,
}

impl ConversationSession {
    /// Decode the context blob. Empty or malformed blobs decode as empty.
    pub fn context_map(&self) -> std::collections::HashMap<String, String> {
        serde_json::from_str(&self.context).unwrap_or_default()
    }
}

/// An automation rule: AND-combined conditions driving an ordered action list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub enabled: bool,
    /// Evaluated highest-first.
    pub priority: i64,
    /// JSON array of [`RuleCondition`].
    pub conditions: String,
    /// JSON array of [`RuleAction`].
    pub actions: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A single rule condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCondition {
    /// `keyword`, `message_type`, or `contact_tag`. Unknown types never match.
    #[serde(rename = "type")]
    pub kind: String,
    /// For `keyword`: `equals`, `contains`, `starts_with`, or `regex`.
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub value: String,
}

/// A single rule action with lazily-decoded parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleAction {
    /// `send_message`, `add_tag`, or `start_flow`. Unknown types are skipped.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// Outcome record for one rule evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationLogEntry {
    pub id: i64,
    pub rule_id: i64,
    pub wa_id: String,
    pub trigger_type: String,
    pub action_taken: String,
    pub success: bool,
    pub error_message: String,
    pub created_at: String,
}

/// A media object uploaded through the provider and tracked locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: i64,
    pub media_id: String,
    pub filename: String,
    pub mime_type: String,
    pub file_size: i64,
    pub uploaded_at: String,
}

/// A message template synced from the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: String,
    pub name: String,
    pub language: String,
    pub category: String,
    pub status: String,
    /// JSON components blob, passed through verbatim.
    pub components: String,
}

/// A persisted key/value configuration override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
}

/// An inbound message after webhook normalization: the only shape the
/// engine ever sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub wa_id: String,
    /// Provider message kind (`text`, `image`, `interactive`, ...).
    pub kind: String,
    /// Normalized content; the handle match key for interactive replies.
    pub content: String,
}

/// A reply button on an interactive-button message (provider limit: 3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyButton {
    pub id: String,
    pub title: String,
}

/// A row of an interactive-list message (provider limit: 10).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRow {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}
