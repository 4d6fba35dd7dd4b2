// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`SubsidySource`] over the intermediary server's tools.

use async_trait::async_trait;
use jgrants_config::JgrantsConfig;
use jgrants_core::types::Overview;
use jgrants_core::{
    AccessDescriptor, AdapterType, HealthStatus, JgrantsError, NormalizeOptions, PluginAdapter,
    RenderedContent, SearchQuery, SubsidyDetail, SubsidySource, SubsidySummary, content,
    normalize,
};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::client::McpClient;

const SEARCH_TOOL: &str = "search_subsidies";
const DETAIL_TOOL: &str = "get_subsidy_detail";
const OVERVIEW_TOOL: &str = "get_subsidy_overview";
const PING_TOOL: &str = "ping";

/// The protocol transport.
pub struct McpSource {
    client: McpClient,
    options: NormalizeOptions,
}

impl McpSource {
    pub fn new(client: McpClient, options: NormalizeOptions) -> Self {
        Self { client, options }
    }

    pub fn from_config(config: &JgrantsConfig) -> Result<Self, JgrantsError> {
        let client = McpClient::new(&config.mcp)?;
        info!(endpoint = %client.endpoint(), "protocol transport ready");
        Ok(Self::new(
            client,
            NormalizeOptions {
                missing_status: config.results.missing_status,
            },
        ))
    }

    pub fn client(&self) -> &McpClient {
        &self.client
    }

    /// Calls a tool, re-running it once on a fresh session if the old one expired.
    async fn call(&self, tool: &str, arguments: Value) -> Result<Value, JgrantsError> {
        match self.client.call_tool(tool, arguments.clone()).await {
            Err(JgrantsError::SessionExpired(reason)) => {
                warn!(tool, %reason, "retrying on a new session");
                self.client.call_tool(tool, arguments).await
            }
            other => other,
        }
    }
}

fn is_not_found(err: &JgrantsError) -> bool {
    match err {
        JgrantsError::Tool { message, .. } => {
            let lower = message.to_ascii_lowercase();
            lower.contains("not found") || message.contains("見つかりません")
        }
        _ => false,
    }
}

#[async_trait]
impl PluginAdapter for McpSource {
    fn name(&self) -> &str {
        "mcp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, JgrantsError> {
        match self.call(PING_TOOL, json!({})).await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl SubsidySource for McpSource {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SubsidySummary>, JgrantsError> {
        let payload = self
            .call(SEARCH_TOOL, query.to_query_params().to_json_object())
            .await?;
        let items = match payload.get("subsidies").or_else(|| payload.get("result")) {
            Some(Value::Array(raw)) => normalize::to_summary_list(raw),
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                return Err(JgrantsError::Protocol(format!(
                    "expected `subsidies` to be an array, got {other}"
                )));
            }
        };
        let total = payload.get("total_count").and_then(Value::as_u64);
        debug!(
            keyword = %query.keyword,
            count = items.len(),
            ?total,
            "search complete"
        );
        Ok(items)
    }

    async fn get_detail(&self, id: &str) -> Result<SubsidyDetail, JgrantsError> {
        if id.trim().is_empty() {
            return Err(JgrantsError::InvalidQuery("subsidy id is empty".into()));
        }
        match self.call(DETAIL_TOOL, json!({ "subsidy_id": id })).await {
            Ok(payload) => Ok(normalize::to_detail(&payload, &self.options)),
            Err(e) if is_not_found(&e) => Err(JgrantsError::NotFound { id: id.to_string() }),
            Err(e) => Err(e),
        }
    }

    async fn get_file_content(
        &self,
        access: &AccessDescriptor,
    ) -> Result<RenderedContent, JgrantsError> {
        match access {
            AccessDescriptor::Inline { data } => content::render_inline(data),
            AccessDescriptor::Tool { tool, params } => {
                let payload = self.call(tool, params.clone()).await?;
                Ok(content::from_tool_payload(&payload))
            }
        }
    }

    async fn overview(&self) -> Result<Overview, JgrantsError> {
        let payload = self
            .call(OVERVIEW_TOOL, json!({ "output_format": "json" }))
            .await?;
        serde_json::from_value(payload)
            .map_err(|e| JgrantsError::parse("overview payload has an unexpected shape", e))
    }
}
