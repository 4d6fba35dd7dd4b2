// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! One attempt per request: callers fall back on failure instead of waiting.

use std::time::Duration;

use jgrants_core::JgrantsError;
use jgrants_security::{HttpClientSettings, build_client};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

/// Default endpoint of the Messages API.
pub const API_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    headers: HeaderMap,
    default_model: String,
    base_url: String,
}

impl AnthropicClient {
    /// Creates a client.
    ///
    /// # Arguments
    /// * `api_key` - sent as `x-api-key`
    /// * `api_version` - sent as `anthropic-version` (e.g. "2023-06-01")
    /// * `model` - model used when a request names none
    /// * `timeout` - whole-request timeout
    pub fn new(
        api_key: &str,
        api_version: &str,
        model: String,
        timeout: Duration,
    ) -> Result<Self, JgrantsError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| JgrantsError::Config(format!("invalid API key header value: {e}")))?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(api_version).map_err(|e| {
                JgrantsError::Config(format!("invalid API version header value: {e}"))
            })?,
        );

        let client = build_client(&HttpClientSettings::new("anthropic", timeout))?;

        Ok(Self {
            client,
            headers,
            default_model: model,
            base_url: API_BASE_URL.to_string(),
        })
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Overrides the endpoint (proxies, wiremock).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sends a request and returns the full response.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, JgrantsError> {
        let response = self
            .client
            .post(&self.base_url)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| JgrantsError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "completion response received");

        let body = response.text().await.map_err(|e| JgrantsError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "Anthropic API error ({}): {}",
                    api_err.error.type_, api_err.error.message
                ),
                Err(_) => format!("API returned {status}"),
            };
            return Err(JgrantsError::Provider {
                message,
                source: None,
            });
        }

        serde_json::from_str(&body).map_err(|e| JgrantsError::Provider {
            message: format!("failed to parse API response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}
