// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider gateway trait: the messaging capabilities the engine consumes.
//!
//! Transport is opaque to the core. The production implementation talks to
//! the WhatsApp Cloud API; tests substitute a capturing mock. The core never
//! retries a failed send.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{ListRow, ReplyButton};

/// Outbound messaging and media capabilities of the WhatsApp provider.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Send a plain text message.
    async fn send_text(&self, to: &str, body: &str) -> Result<(), GatewayError>;

    /// Send an interactive message with up to 3 reply buttons.
    async fn send_interactive_buttons(
        &self,
        to: &str,
        body: &str,
        buttons: &[ReplyButton],
    ) -> Result<(), GatewayError>;

    /// Send an interactive list with up to 10 rows.
    async fn send_interactive_list(
        &self,
        to: &str,
        body: &str,
        button_text: &str,
        rows: &[ListRow],
    ) -> Result<(), GatewayError>;

    /// Send a pre-approved template message.
    async fn send_template(
        &self,
        to: &str,
        name: &str,
        language_code: &str,
    ) -> Result<(), GatewayError>;

    /// Upload media bytes, returning the provider-assigned media id.
    async fn upload_media(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        filename: &str,
    ) -> Result<String, GatewayError>;

    /// Resolve a media id to a short-lived download URL.
    async fn retrieve_media_url(&self, media_id: &str) -> Result<String, GatewayError>;

    /// Delete an uploaded media object.
    async fn delete_media(&self, media_id: &str) -> Result<(), GatewayError>;

    /// Fetch the account's message templates as raw provider JSON.
    async fn get_templates(&self) -> Result<serde_json::Value, GatewayError>;

    /// Create a message template from raw provider JSON.
    async fn create_template(
        &self,
        template: serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError>;

    /// Delete a message template by name.
    async fn delete_template(&self, name: &str) -> Result<(), GatewayError>;
}
