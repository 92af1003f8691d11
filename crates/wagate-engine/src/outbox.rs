// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Send-logging wrapper around the provider gateway.
//!
//! Every outbound message also appends a `sent` row to the message log,
//! keyed `outgoing-<to>` with the recipient in the sender column so the
//! dashboard can group both directions of a conversation. Log appends and
//! event publishes are best-effort and never fail the send.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use wagate_core::types::{ListRow, ReplyButton};
use wagate_core::{GatewayError, ProviderGateway};
use wagate_storage::queries::messages;
use wagate_storage::Database;

use crate::events::EventHub;

/// Provider wrapper that mirrors sends into the message log and the
/// dashboard event stream.
pub struct Outbox {
    inner: Arc<dyn ProviderGateway>,
    db: Database,
    hub: EventHub,
}

impl Outbox {
    pub fn new(inner: Arc<dyn ProviderGateway>, db: Database, hub: EventHub) -> Self {
        Self { inner, db, hub }
    }

    async fn log_send(&self, to: &str, content: &str, kind: &str) {
        let wa_id = format!("outgoing-{to}");
        if let Err(e) = messages::insert(&self.db, &wa_id, to, content, kind, "sent").await {
            warn!(to, error = %e, "failed to log outbound message");
            return;
        }
        self.hub.publish(
            "new_message",
            serde_json::json!({
                "wa_id": wa_id,
                "sender": to,
                "content": content,
                "type": kind,
                "status": "sent",
            }),
        );
    }
}

#[async_trait]
impl ProviderGateway for Outbox {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), GatewayError> {
        let result = self.inner.send_text(to, body).await;
        self.log_send(to, body, "text").await;
        result
    }

    async fn send_interactive_buttons(
        &self,
        to: &str,
        body: &str,
        buttons: &[ReplyButton],
    ) -> Result<(), GatewayError> {
        let result = self.inner.send_interactive_buttons(to, body, buttons).await;
        self.log_send(to, "interactive message", "interactive").await;
        result
    }

    async fn send_interactive_list(
        &self,
        to: &str,
        body: &str,
        button_text: &str,
        rows: &[ListRow],
    ) -> Result<(), GatewayError> {
        let result = self
            .inner
            .send_interactive_list(to, body, button_text, rows)
            .await;
        self.log_send(to, "interactive message", "interactive").await;
        result
    }

    async fn send_template(
        &self,
        to: &str,
        name: &str,
        language_code: &str,
    ) -> Result<(), GatewayError> {
        let result = self.inner.send_template(to, name, language_code).await;
        self.log_send(to, &format!("Template: {name}"), "template").await;
        result
    }

    async fn upload_media(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        filename: &str,
    ) -> Result<String, GatewayError> {
        self.inner.upload_media(bytes, mime_type, filename).await
    }

    async fn retrieve_media_url(&self, media_id: &str) -> Result<String, GatewayError> {
        self.inner.retrieve_media_url(media_id).await
    }

    async fn delete_media(&self, media_id: &str) -> Result<(), GatewayError> {
        self.inner.delete_media(media_id).await
    }

    async fn get_templates(&self) -> Result<serde_json::Value, GatewayError> {
        self.inner.get_templates().await
    }

    async fn create_template(
        &self,
        template: serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError> {
        self.inner.create_template(template).await
    }

    async fn delete_template(&self, name: &str) -> Result<(), GatewayError> {
        self.inner.delete_template(name).await
    }
}
