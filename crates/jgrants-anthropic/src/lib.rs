// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic provider adapter.
//!
//! Implements [`ProviderAdapter`] over the Messages API. When a request
//! carries an [`OutputSchema`](jgrants_core::types::OutputSchema), the schema
//! is offered as the only tool and the model is forced to call it, so the
//! tool input comes back as [`ProviderResponse::structured`].

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use jgrants_config::model::ExtractionConfig;
use jgrants_core::error::JgrantsError;
use jgrants_core::traits::{PluginAdapter, ProviderAdapter};
use jgrants_core::types::{AdapterType, HealthStatus, ProviderRequest, ProviderResponse};
use tracing::{info, warn};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest, ResponseContentBlock, ToolChoice, ToolDefinition};

/// Anthropic Claude provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config, then `ANTHROPIC_API_KEY`, else error.
pub struct AnthropicProvider {
    client: AnthropicClient,
}

impl AnthropicProvider {
    pub fn new(config: &ExtractionConfig) -> Result<Self, JgrantsError> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let client = AnthropicClient::new(
            &api_key,
            &config.api_version,
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(model = %config.model, "Anthropic provider initialized");
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: AnthropicClient) -> Self {
        Self { client }
    }

    fn to_message_request(&self, request: &ProviderRequest) -> MessageRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.clone(),
                content: m.content.clone(),
            })
            .collect();

        let (tools, tool_choice) = match &request.output_schema {
            Some(schema) => (
                Some(vec![ToolDefinition {
                    name: schema.name.clone(),
                    description: schema.description.clone(),
                    input_schema: schema.schema.clone(),
                }]),
                Some(ToolChoice::tool(schema.name.clone())),
            ),
            None => (None, None),
        };

        MessageRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.client.default_model().to_string()),
            messages,
            system: request.system_prompt.clone(),
            max_tokens: request.max_tokens,
            tools,
            tool_choice,
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, JgrantsError> {
        // Constructed means configured; a live call would spend tokens.
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, JgrantsError> {
        let api_request = self.to_message_request(&request);
        let response = self.client.complete_message(&api_request).await?;

        let wanted = request.output_schema.as_ref().map(|s| s.name.as_str());
        let mut content = String::new();
        let mut structured = None;
        for block in response.content {
            match block {
                ResponseContentBlock::Text { text } => content.push_str(&text),
                ResponseContentBlock::ToolUse { name, input, .. } => {
                    if Some(name.as_str()) == wanted {
                        structured = Some(input);
                    } else {
                        warn!(tool = %name, "ignoring call of an unrequested tool");
                    }
                }
                ResponseContentBlock::Other => {}
            }
        }

        Ok(ProviderResponse {
            id: response.id,
            content,
            structured,
            model: response.model,
            stop_reason: response.stop_reason,
        })
    }
}

/// Resolves the API key from config or environment.
fn resolve_api_key(config_key: Option<&str>) -> Result<String, JgrantsError> {
    if let Some(key) = config_key.filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
        JgrantsError::Config(
            "Anthropic API key not found. Set extraction.api_key in config or ANTHROPIC_API_KEY environment variable.".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jgrants_core::types::{OutputSchema, ProviderMessage};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> AnthropicProvider {
        let client = AnthropicClient::new(
            "k",
            "2023-06-01",
            "claude-haiku-4-5".into(),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(server.uri());
        AnthropicProvider::with_client(client)
    }

    fn schema_request() -> ProviderRequest {
        ProviderRequest {
            model: None,
            system_prompt: Some("extract".into()),
            messages: vec![ProviderMessage {
                role: "user".into(),
                content: "東京の製造業向け".into(),
            }],
            max_tokens: 256,
            output_schema: Some(OutputSchema {
                name: "search_query".into(),
                description: "structured query".into(),
                schema: json!({"type": "object", "properties": {"keyword": {"type": "string"}}}),
            }),
        }
    }

    #[test]
    fn resolve_api_key_prefers_config() {
        assert_eq!(resolve_api_key(Some("sk-ant-config")).unwrap(), "sk-ant-config");
    }

    #[test]
    fn schema_becomes_forced_tool() {
        let server_uri = "http://127.0.0.1:1";
        let client = AnthropicClient::new("k", "2023-06-01", "claude-haiku-4-5".into(), Duration::from_secs(1))
            .unwrap()
            .with_base_url(server_uri);
        let req = AnthropicProvider::with_client(client).to_message_request(&schema_request());
        assert_eq!(req.model, "claude-haiku-4-5");
        assert_eq!(req.system.as_deref(), Some("extract"));
        let tools = req.tools.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "search_query");
        assert_eq!(req.tool_choice, Some(ToolChoice::tool("search_query")));
    }

    #[tokio::test]
    async fn tool_input_is_returned_as_structured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "tool_choice": {"type": "tool", "name": "search_query"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_s",
                "type": "message",
                "role": "assistant",
                "model": "claude-haiku-4-5",
                "stop_reason": "tool_use",
                "content": [{
                    "type": "tool_use",
                    "id": "tu_1",
                    "name": "search_query",
                    "input": {"keyword": "製造業", "area_region": "関東"}
                }],
                "usage": {"input_tokens": 50, "output_tokens": 20}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server).complete(schema_request()).await.unwrap();
        assert_eq!(
            response.structured,
            Some(json!({"keyword": "製造業", "area_region": "関東"}))
        );
        assert!(response.content.is_empty());
    }

    #[tokio::test]
    async fn text_only_answer_has_no_structured_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_t",
                "type": "message",
                "role": "assistant",
                "model": "claude-haiku-4-5",
                "stop_reason": "end_turn",
                "content": [{"type": "text", "text": "```json\n{\"keyword\": \"DX\"}\n```"}],
                "usage": {"input_tokens": 50, "output_tokens": 20}
            })))
            .mount(&server)
            .await;

        let response = provider(&server).complete(schema_request()).await.unwrap();
        assert!(response.structured.is_none());
        assert!(response.content.contains("\"keyword\""));
    }

    #[test]
    fn plugin_adapter_metadata() {
        let client = AnthropicClient::new("k", "2023-06-01", "m".into(), Duration::from_secs(1)).unwrap();
        let provider = AnthropicProvider::with_client(client);
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.adapter_type(), AdapterType::Provider);
    }
}
