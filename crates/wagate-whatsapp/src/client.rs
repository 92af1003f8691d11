// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the WhatsApp Cloud API.
//!
//! Handles request construction, bearer authentication, and error mapping.
//! The engine performs no retries: a failed send surfaces the provider's
//! HTTP status and body and the flow proceeds best-effort.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use wagate_core::types::{ListRow, ReplyButton};
use wagate_core::{GatewayError, ProviderGateway};

use crate::types::{MediaUploadResponse, MediaUrlResponse, MessagePayload};

/// Base URL of the Graph API.
const API_BASE_URL: &str = "https://graph.facebook.com/v19.0";

/// Per-call timeout for provider requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// WhatsApp Cloud API client.
#[derive(Debug, Clone)]
pub struct CloudClient {
    client: reqwest::Client,
    phone_number_id: String,
    business_account_id: String,
    base_url: String,
}

impl CloudClient {
    /// Creates a new Cloud API client.
    ///
    /// # Arguments
    /// * `access_token` - Graph API bearer token
    /// * `phone_number_id` - sending phone number id
    /// * `business_account_id` - WABA id for template management
    pub fn new(
        access_token: &str,
        phone_number_id: &str,
        business_account_id: &str,
    ) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {access_token}");
        headers.insert(
            "authorization",
            HeaderValue::from_str(&bearer)
                .map_err(|e| GatewayError::Config(format!("invalid access token value: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            phone_number_id: phone_number_id.to_string(),
            business_account_id: business_account_id.to_string(),
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Provider {
            message: format!("API error: {status}"),
            status: Some(status.as_u16()),
            body: Some(body),
        })
    }

    /// POST a message payload to `/{phone_number_id}/messages`.
    pub async fn send_raw(&self, payload: &MessagePayload) -> Result<(), GatewayError> {
        let url = format!("{}/{}/messages", self.base_url, self.phone_number_id);
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| GatewayError::provider(format!("HTTP request failed: {e}")))?;
        Self::check(response).await?;
        debug!(to = payload.to.as_str(), kind = payload.kind.as_str(), "message sent");
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProviderGateway for CloudClient {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), GatewayError> {
        self.send_raw(&MessagePayload::text(to, body)).await
    }

    async fn send_interactive_buttons(
        &self,
        to: &str,
        body: &str,
        buttons: &[ReplyButton],
    ) -> Result<(), GatewayError> {
        self.send_raw(&MessagePayload::interactive_buttons(to, body, buttons))
            .await
    }

    async fn send_interactive_list(
        &self,
        to: &str,
        body: &str,
        button_text: &str,
        rows: &[ListRow],
    ) -> Result<(), GatewayError> {
        self.send_raw(&MessagePayload::interactive_list(to, body, button_text, rows))
            .await
    }

    async fn send_template(
        &self,
        to: &str,
        name: &str,
        language_code: &str,
    ) -> Result<(), GatewayError> {
        self.send_raw(&MessagePayload::template(to, name, language_code))
            .await
    }

    async fn upload_media(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        filename: &str,
    ) -> Result<String, GatewayError> {
        let url = format!("{}/{}/media", self.base_url, self.phone_number_id);
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| GatewayError::provider(format!("invalid mime type: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("messaging_product", "whatsapp");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| GatewayError::provider(format!("HTTP request failed: {e}")))?;
        let response = Self::check(response).await?;

        let upload: MediaUploadResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::provider(format!("failed to parse upload response: {e}")))?;
        Ok(upload.id)
    }

    async fn retrieve_media_url(&self, media_id: &str) -> Result<String, GatewayError> {
        let url = format!("{}/{}", self.base_url, media_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::provider(format!("HTTP request failed: {e}")))?;
        let response = Self::check(response).await?;

        let media: MediaUrlResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::provider(format!("failed to parse media response: {e}")))?;
        Ok(media.url)
    }

    async fn delete_media(&self, media_id: &str) -> Result<(), GatewayError> {
        let url = format!("{}/{}", self.base_url, media_id);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| GatewayError::provider(format!("HTTP request failed: {e}")))?;
        Self::check(response).await?;
        Ok(())
    }

    async fn get_templates(&self) -> Result<serde_json::Value, GatewayError> {
        let url = format!(
            "{}/{}/message_templates",
            self.base_url, self.business_account_id
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::provider(format!("HTTP request failed: {e}")))?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| GatewayError::provider(format!("failed to parse templates: {e}")))
    }

    async fn create_template(
        &self,
        template: serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError> {
        let url = format!(
            "{}/{}/message_templates",
            self.base_url, self.business_account_id
        );
        let response = self
            .client
            .post(&url)
            .json(&template)
            .send()
            .await
            .map_err(|e| GatewayError::provider(format!("HTTP request failed: {e}")))?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| GatewayError::provider(format!("failed to parse response: {e}")))
    }

    async fn delete_template(&self, name: &str) -> Result<(), GatewayError> {
        let url = format!(
            "{}/{}/message_templates?name={}",
            self.base_url, self.business_account_id, name
        );
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| GatewayError::provider(format!("HTTP request failed: {e}")))?;
        Self::check(response).await?;
        Ok(())
    }
}
