// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock provider gateway for deterministic testing.
//!
//! Captures every outbound send as a typed value for assertion. Sends can
//! be switched to fail, to exercise best-effort delivery paths.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use wagate_core::types::{ListRow, ReplyButton};
use wagate_core::{GatewayError, ProviderGateway};

/// One captured outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMessage {
    Text {
        to: String,
        body: String,
    },
    Buttons {
        to: String,
        body: String,
        buttons: Vec<ReplyButton>,
    },
    List {
        to: String,
        body: String,
        button_text: String,
        rows: Vec<ListRow>,
    },
    Template {
        to: String,
        name: String,
        language: String,
    },
}

/// A provider gateway that records instead of sending.
#[derive(Default)]
pub struct MockProvider {
    sent: Mutex<Vec<SentMessage>>,
    fail_sends: AtomicBool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured sends, in order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Captured plain-text bodies, in order.
    pub async fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|m| match m {
                SentMessage::Text { body, .. } => Some(body.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }

    /// Make subsequent sends fail (delivery is still captured).
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    async fn record(&self, message: SentMessage) -> Result<(), GatewayError> {
        self.sent.lock().await.push(message);
        if self.fail_sends.load(Ordering::SeqCst) {
            Err(GatewayError::Provider {
                message: "API error: 500".into(),
                status: Some(500),
                body: Some("mock failure".into()),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProviderGateway for MockProvider {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), GatewayError> {
        self.record(SentMessage::Text {
            to: to.to_string(),
            body: body.to_string(),
        })
        .await
    }

    async fn send_interactive_buttons(
        &self,
        to: &str,
        body: &str,
        buttons: &[ReplyButton],
    ) -> Result<(), GatewayError> {
        self.record(SentMessage::Buttons {
            to: to.to_string(),
            body: body.to_string(),
            buttons: buttons.to_vec(),
        })
        .await
    }

    async fn send_interactive_list(
        &self,
        to: &str,
        body: &str,
        button_text: &str,
        rows: &[ListRow],
    ) -> Result<(), GatewayError> {
        self.record(SentMessage::List {
            to: to.to_string(),
            body: body.to_string(),
            button_text: button_text.to_string(),
            rows: rows.to_vec(),
        })
        .await
    }

    async fn send_template(
        &self,
        to: &str,
        name: &str,
        language_code: &str,
    ) -> Result<(), GatewayError> {
        self.record(SentMessage::Template {
            to: to.to_string(),
            name: name.to_string(),
            language: language_code.to_string(),
        })
        .await
    }

    async fn upload_media(
        &self,
        _bytes: Vec<u8>,
        _mime_type: &str,
        _filename: &str,
    ) -> Result<String, GatewayError> {
        Ok("mock-media-1".to_string())
    }

    async fn retrieve_media_url(&self, media_id: &str) -> Result<String, GatewayError> {
        Ok(format!("https://mock.example/{media_id}"))
    }

    async fn delete_media(&self, _media_id: &str) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn get_templates(&self) -> Result<serde_json::Value, GatewayError> {
        Ok(serde_json::json!({"data": []}))
    }

    async fn create_template(
        &self,
        template: serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError> {
        Ok(template)
    }

    async fn delete_template(&self, _name: &str) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sends_are_captured_in_order() {
        let provider = MockProvider::new();
        provider.send_text("u", "first").await.unwrap();
        provider.send_text("u", "second").await.unwrap();

        assert_eq!(provider.texts().await, vec!["first", "second"]);
        assert_eq!(provider.sent_count().await, 2);
    }

    #[tokio::test]
    async fn failing_sends_still_capture() {
        let provider = MockProvider::new();
        provider.set_fail_sends(true);

        assert!(provider.send_text("u", "doomed").await.is_err());
        assert_eq!(provider.sent_count().await, 1);
    }
}
