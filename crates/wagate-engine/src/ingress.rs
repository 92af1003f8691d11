// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook normalization.
//!
//! The provider wraps every event in an entry/changes envelope; only the
//! first message of the first change carries work. Normalization flattens
//! it to `(wa_id, kind, content)`, appends the received-message log row,
//! and upserts the contact. Media kinds collapse to
//! `"[kind]:mediaId[:caption_or_filename]"`.

use serde::Deserialize;
use tracing::debug;

use wagate_core::types::InboundMessage;
use wagate_core::GatewayError;
use wagate_storage::queries::{contacts, messages};

use crate::Engine;

/// The provider webhook envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: ChangeValue,
    #[serde(default)]
    pub field: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<MessageEvent>,
}

/// One inbound message inside the envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageEvent {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextBody>,
    #[serde(default)]
    pub image: Option<MediaAttachment>,
    #[serde(default)]
    pub video: Option<MediaAttachment>,
    #[serde(default)]
    pub audio: Option<MediaAttachment>,
    #[serde(default)]
    pub document: Option<MediaAttachment>,
    #[serde(default)]
    pub interactive: Option<InteractiveReply>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaAttachment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractiveReply {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub button_reply: Option<ChoiceReply>,
    #[serde(default)]
    pub list_reply: Option<ChoiceReply>,
    #[serde(default)]
    pub nfm_reply: Option<NfmReply>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceReply {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NfmReply {
    #[serde(default)]
    pub response_payload: String,
}

impl WebhookPayload {
    /// The first message of the first change, when the envelope carries one.
    pub fn first_message(&self) -> Option<&MessageEvent> {
        self.entry
            .first()?
            .changes
            .first()?
            .value
            .messages
            .first()
    }
}

fn media_content(kind: &str, media: &MediaAttachment) -> String {
    let mut content = format!("[{kind}]:{}", media.id);
    let extra = if media.caption.is_empty() {
        &media.filename
    } else {
        &media.caption
    };
    if !extra.is_empty() {
        content.push(':');
        content.push_str(extra);
    }
    content
}

/// Flatten a message event to its normalized textual content.
pub fn normalize_content(message: &MessageEvent) -> String {
    match message.kind.as_str() {
        "text" => message.text.as_ref().map(|t| t.body.clone()).unwrap_or_default(),
        "image" => message
            .image
            .as_ref()
            .map(|m| media_content("image", m))
            .unwrap_or_default(),
        "video" => message
            .video
            .as_ref()
            .map(|m| media_content("video", m))
            .unwrap_or_default(),
        "audio" => message
            .audio
            .as_ref()
            .map(|m| format!("[audio]:{}", m.id))
            .unwrap_or_default(),
        "document" => message
            .document
            .as_ref()
            .map(|m| media_content("document", m))
            .unwrap_or_default(),
        "interactive" => match &message.interactive {
            Some(interactive) => match interactive.kind.as_str() {
                "button_reply" => interactive
                    .button_reply
                    .as_ref()
                    .map(|r| r.title.clone())
                    .unwrap_or_default(),
                "list_reply" => interactive
                    .list_reply
                    .as_ref()
                    .map(|r| r.title.clone())
                    .unwrap_or_default(),
                "nfm_reply" => interactive
                    .nfm_reply
                    .as_ref()
                    .map(|r| format!("[flow_response]:{}", r.response_payload))
                    .unwrap_or_default(),
                other => format!("[interactive]:{other}"),
            },
            None => String::new(),
        },
        other => format!("[{other}]"),
    }
}

/// True when the normalized content should be routed into flow/rule
/// processing (text bodies and interactive reply titles).
pub fn is_routable(message: &MessageEvent, content: &str) -> bool {
    match message.kind.as_str() {
        "text" => !content.is_empty(),
        "interactive" => !content.is_empty(),
        _ => false,
    }
}

impl Engine {
    /// Persist an inbound message and its contact; return the normalized
    /// message when it should flow into rule/flow processing.
    pub async fn ingest(
        &self,
        payload: &WebhookPayload,
    ) -> Result<Option<InboundMessage>, GatewayError> {
        let Some(message) = payload.first_message() else {
            return Ok(None);
        };

        let content = normalize_content(message);
        debug!(
            from = message.from.as_str(),
            kind = message.kind.as_str(),
            "inbound message"
        );

        messages::insert(
            &self.db,
            &message.from,
            &message.from,
            &content,
            &message.kind,
            "received",
        )
        .await?;
        contacts::upsert_inbound(&self.db, &message.from).await?;

        self.hub.publish(
            "new_message",
            serde_json::json!({
                "wa_id": message.from,
                "sender": message.from,
                "content": content,
                "type": message.kind,
                "status": "received",
            }),
        );

        if is_routable(message, &content) {
            Ok(Some(InboundMessage {
                wa_id: message.from.clone(),
                kind: message.kind.clone(),
                content,
            }))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> WebhookPayload {
        serde_json::from_str(json).unwrap()
    }

    fn wrap(message: &str) -> String {
        format!(
            r#"{{"object":"whatsapp_business_account",
                 "entry":[{{"id":"e","changes":[{{"field":"messages",
                 "value":{{"messages":[{message}]}}}}]}}]}}"#
        )
    }

    #[test]
    fn text_messages_use_the_body() {
        let p = payload(&wrap(
            r#"{"from":"15550001","id":"wamid.1","type":"text","text":{"body":"hello"}}"#,
        ));
        let m = p.first_message().unwrap();
        assert_eq!(normalize_content(m), "hello");
        assert!(is_routable(m, "hello"));
    }

    #[test]
    fn image_with_caption_collapses_to_bracket_form() {
        let p = payload(&wrap(
            r#"{"from":"1","type":"image","image":{"id":"m-1","caption":"sunset"}}"#,
        ));
        let m = p.first_message().unwrap();
        let content = normalize_content(m);
        assert_eq!(content, "[image]:m-1:sunset");
        assert!(!is_routable(m, &content));
    }

    #[test]
    fn document_uses_filename_when_no_caption() {
        let p = payload(&wrap(
            r#"{"from":"1","type":"document","document":{"id":"d-1","filename":"cv.pdf"}}"#,
        ));
        assert_eq!(normalize_content(p.first_message().unwrap()), "[document]:d-1:cv.pdf");
    }

    #[test]
    fn audio_has_no_caption_segment() {
        let p = payload(&wrap(r#"{"from":"1","type":"audio","audio":{"id":"a-1"}}"#));
        assert_eq!(normalize_content(p.first_message().unwrap()), "[audio]:a-1");
    }

    #[test]
    fn button_reply_title_is_the_match_key() {
        let p = payload(&wrap(
            r#"{"from":"1","type":"interactive",
                "interactive":{"type":"button_reply",
                               "button_reply":{"id":"btn_0","title":"Yes"}}}"#,
        ));
        let m = p.first_message().unwrap();
        assert_eq!(normalize_content(m), "Yes");
        assert!(is_routable(m, "Yes"));
    }

    #[test]
    fn list_reply_title_is_the_match_key() {
        let p = payload(&wrap(
            r#"{"from":"1","type":"interactive",
                "interactive":{"type":"list_reply",
                               "list_reply":{"id":"opt_1","title":"Support"}}}"#,
        ));
        assert_eq!(normalize_content(p.first_message().unwrap()), "Support");
    }

    #[test]
    fn nfm_reply_carries_the_response_payload() {
        let p = payload(&wrap(
            r#"{"from":"1","type":"interactive",
                "interactive":{"type":"nfm_reply",
                               "nfm_reply":{"response_payload":"{\"a\":1}"}}}"#,
        ));
        assert_eq!(
            normalize_content(p.first_message().unwrap()),
            r#"[flow_response]:{"a":1}"#
        );
    }

    #[test]
    fn unknown_kinds_become_bracketed_markers() {
        let p = payload(&wrap(r#"{"from":"1","type":"sticker"}"#));
        let m = p.first_message().unwrap();
        assert_eq!(normalize_content(m), "[sticker]");
        assert!(!is_routable(m, "[sticker]"));
    }

    #[test]
    fn empty_envelopes_carry_no_message() {
        let p = payload(r#"{"object":"whatsapp_business_account","entry":[]}"#);
        assert!(p.first_message().is_none());

        // Status-only change values also decode without messages.
        let p = payload(
            r#"{"entry":[{"changes":[{"value":{"statuses":[{"id":"x"}]}}]}]}"#,
        );
        assert!(p.first_message().is_none());
    }
}
