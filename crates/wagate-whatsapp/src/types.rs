// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the WhatsApp Cloud API `/messages` endpoint.

use serde::{Deserialize, Serialize};

use wagate_core::types::{ListRow, ReplyButton};

/// The envelope POSTed to `/{phone_number_id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub messaging_product: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive: Option<InteractiveObject>,
}

impl MessagePayload {
    fn base(to: &str, kind: &str) -> Self {
        Self {
            messaging_product: "whatsapp".to_string(),
            to: to.to_string(),
            kind: kind.to_string(),
            text: None,
            template: None,
            interactive: None,
        }
    }

    pub fn text(to: &str, body: &str) -> Self {
        Self {
            text: Some(TextObject {
                body: body.to_string(),
                preview_url: false,
            }),
            ..Self::base(to, "text")
        }
    }

    pub fn template(to: &str, name: &str, language_code: &str) -> Self {
        Self {
            template: Some(TemplateObject {
                name: name.to_string(),
                language: LanguageObject {
                    code: language_code.to_string(),
                },
            }),
            ..Self::base(to, "template")
        }
    }

    pub fn interactive_buttons(to: &str, body: &str, buttons: &[ReplyButton]) -> Self {
        Self {
            interactive: Some(InteractiveObject {
                kind: "button".to_string(),
                body: BodyObject {
                    text: body.to_string(),
                },
                action: ActionObject {
                    buttons: buttons
                        .iter()
                        .map(|b| ButtonObject {
                            kind: "reply".to_string(),
                            reply: b.clone(),
                        })
                        .collect(),
                    button: String::new(),
                    sections: Vec::new(),
                },
            }),
            ..Self::base(to, "interactive")
        }
    }

    pub fn interactive_list(to: &str, body: &str, button_text: &str, rows: &[ListRow]) -> Self {
        Self {
            interactive: Some(InteractiveObject {
                kind: "list".to_string(),
                body: BodyObject {
                    text: body.to_string(),
                },
                action: ActionObject {
                    buttons: Vec::new(),
                    button: button_text.to_string(),
                    sections: vec![SectionObject {
                        title: String::new(),
                        rows: rows.to_vec(),
                    }],
                },
            }),
            ..Self::base(to, "interactive")
        }
    }

    /// Human-readable summary for the outbound message log.
    pub fn log_content(&self) -> String {
        if let Some(text) = &self.text {
            text.body.clone()
        } else if let Some(template) = &self.template {
            format!("Template: {}", template.name)
        } else {
            format!("{} message", self.kind)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextObject {
    pub body: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub preview_url: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateObject {
    pub name: String,
    pub language: LanguageObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageObject {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractiveObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub body: BodyObject,
    pub action: ActionObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyObject {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionObject {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<ButtonObject>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub button: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub reply: ReplyButton,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionObject {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    pub rows: Vec<ListRow>,
}

/// Response of a media upload.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaUploadResponse {
    pub id: String,
}

/// Response of a media-object lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaUrlResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_payload_serializes_minimally() {
        let payload = MessagePayload::text("15550001", "hello");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["messaging_product"], "whatsapp");
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"]["body"], "hello");
        assert!(json.get("template").is_none());
        assert!(json.get("interactive").is_none());
    }

    #[test]
    fn button_payload_nests_reply_objects() {
        let buttons = vec![
            ReplyButton {
                id: "btn_0".into(),
                title: "Yes".into(),
            },
            ReplyButton {
                id: "btn_1".into(),
                title: "No".into(),
            },
        ];
        let payload = MessagePayload::interactive_buttons("1", "Pick:", &buttons);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["interactive"]["type"], "button");
        assert_eq!(json["interactive"]["action"]["buttons"][0]["type"], "reply");
        assert_eq!(
            json["interactive"]["action"]["buttons"][1]["reply"]["id"],
            "btn_1"
        );
    }

    #[test]
    fn list_payload_wraps_rows_in_one_section() {
        let rows = vec![ListRow {
            id: "opt_0".into(),
            title: "Support".into(),
            description: "Talk to a human".into(),
        }];
        let payload = MessagePayload::interactive_list("1", "How can we help?", "Select", &rows);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["interactive"]["type"], "list");
        assert_eq!(json["interactive"]["action"]["button"], "Select");
        assert_eq!(
            json["interactive"]["action"]["sections"][0]["rows"][0]["title"],
            "Support"
        );
    }

    #[test]
    fn log_content_summarizes_by_kind() {
        assert_eq!(MessagePayload::text("1", "hi").log_content(), "hi");
        assert_eq!(
            MessagePayload::template("1", "welcome", "en").log_content(),
            "Template: welcome"
        );
        assert_eq!(
            MessagePayload::interactive_buttons("1", "b", &[]).log_content(),
            "interactive message"
        );
    }
}
