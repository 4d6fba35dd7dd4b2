// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`SubsidySource`] over the public REST API.

use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use jgrants_config::JgrantsConfig;
use jgrants_core::types::{Overview, QueryParams};
use jgrants_core::{
    AccessDescriptor, AdapterType, HealthStatus, JgrantsError, NormalizeOptions, PluginAdapter,
    RenderedContent, SearchQuery, SubsidyDetail, SubsidySource, SubsidySummary, content,
    normalize, overview,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::ApiClient;

/// Offset deadline buckets are computed in (JST).
const CATALOG_OFFSET_SECS: i32 = 9 * 3600;

/// The direct transport.
pub struct DirectApiSource {
    client: ApiClient,
    options: NormalizeOptions,
    overview_keyword: String,
}

impl DirectApiSource {
    pub fn new(client: ApiClient, options: NormalizeOptions, overview_keyword: String) -> Self {
        Self {
            client,
            options,
            overview_keyword,
        }
    }

    pub fn from_config(config: &JgrantsConfig) -> Result<Self, JgrantsError> {
        let client = ApiClient::new(&config.upstream, &config.retry)?;
        info!(base_url = %config.upstream.base_url, "direct transport ready");
        Ok(Self::new(
            client,
            NormalizeOptions {
                missing_status: config.results.missing_status,
            },
            config.upstream.overview_keyword.clone(),
        ))
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

/// The `result` array of an API payload; absent means empty.
fn result_array(payload: &Value) -> Result<&[Value], JgrantsError> {
    match payload.get("result") {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(JgrantsError::Protocol(format!(
            "expected `result` to be an array, got {other}"
        ))),
    }
}

#[async_trait]
impl PluginAdapter for DirectApiSource {
    fn name(&self) -> &str {
        "direct"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, JgrantsError> {
        let mut probe = SearchQuery::new(self.overview_keyword.clone());
        probe.accepting_only = true;
        match self.search(&probe).await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl SubsidySource for DirectApiSource {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SubsidySummary>, JgrantsError> {
        let payload = self
            .client
            .fetch("subsidies", &query.to_query_params())
            .await?;
        let items = normalize::to_summary_list(result_array(&payload)?);
        debug!(keyword = %query.keyword, count = items.len(), "search complete");
        Ok(items)
    }

    async fn get_detail(&self, id: &str) -> Result<SubsidyDetail, JgrantsError> {
        if id.trim().is_empty() {
            return Err(JgrantsError::InvalidQuery("subsidy id is empty".into()));
        }
        let payload = self
            .client
            .fetch_segments(&["subsidies", "id", id], &QueryParams::new())
            .await?;
        let raw = result_array(&payload)?
            .first()
            .ok_or_else(|| JgrantsError::NotFound { id: id.to_string() })?;
        Ok(normalize::to_detail(raw, &self.options))
    }

    async fn get_file_content(
        &self,
        access: &AccessDescriptor,
    ) -> Result<RenderedContent, JgrantsError> {
        match access {
            AccessDescriptor::Inline { data } => content::render_inline(data),
            AccessDescriptor::Tool { tool, .. } => Err(JgrantsError::Unsupported(format!(
                "attachment is served by the `{tool}` tool; switch transport.kind to \"mcp\""
            ))),
        }
    }

    async fn overview(&self) -> Result<Overview, JgrantsError> {
        let mut query = SearchQuery::new(self.overview_keyword.clone());
        query.accepting_only = true;
        let items = self.search(&query).await?;
        let offset = FixedOffset::east_opt(CATALOG_OFFSET_SECS)
            .ok_or_else(|| JgrantsError::Internal("invalid catalog offset".into()))?;
        Ok(overview::summarize(&items, Utc::now().with_timezone(&offset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jgrants_config::model::{RetryConfig, UpstreamConfig};
    use jgrants_core::types::AcceptanceStatus;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer) -> DirectApiSource {
        let upstream = UpstreamConfig {
            base_url: server.uri(),
            timeout_secs: 5,
            ..UpstreamConfig::default()
        };
        let retry = RetryConfig {
            max_attempts: 3,
            backoff_base_ms: 10,
        };
        DirectApiSource::new(
            ApiClient::new(&upstream, &retry).unwrap(),
            NormalizeOptions::default(),
            "補助金".into(),
        )
    }

    #[tokio::test]
    async fn search_maps_query_and_normalizes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subsidies"))
            .and(query_param("keyword", "事業"))
            .and(query_param("acceptance", "1"))
            .and(query_param("sort", "acceptance_end_datetime"))
            .and(query_param("order", "ASC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metadata": {"resultset": {"count": 1}},
                "result": [{"id": "A001", "title": "X補助金", "subsidy_max_limit": "5,000,000"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let items = source(&server).search(&SearchQuery::new("事業")).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_deref(), Some("A001"));
        assert_eq!(items[0].title.as_deref(), Some("X補助金"));
    }

    #[tokio::test]
    async fn search_without_result_key_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"metadata": {}})))
            .mount(&server)
            .await;
        assert!(source(&server).search(&SearchQuery::new("事業")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn detail_uses_id_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subsidies/id/a0W5h00000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [{
                    "id": "a0W5h00000",
                    "title": "ものづくり補助金",
                    "detail": "<p>概要</p>",
                    "front_subsidy_detail_page_url": "https://www.jgrants-portal.go.jp/subsidy/a0W5h00000",
                    "application_guidelines": [{"name": "要領.md", "data": "IyDopoHpoJg="}]
                }]
            })))
            .mount(&server)
            .await;

        let detail = source(&server).get_detail("a0W5h00000").await.unwrap();
        assert_eq!(detail.summary.title.as_deref(), Some("ものづくり補助金"));
        assert_eq!(detail.status, AcceptanceStatus::Unknown);
        assert_eq!(detail.attachments.len(), 1);
        assert!(matches!(
            detail.attachments[0].access,
            AccessDescriptor::Inline { .. }
        ));
    }

    #[tokio::test]
    async fn empty_detail_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
            .mount(&server)
            .await;
        let err = source(&server).get_detail("missing").await.unwrap_err();
        assert!(matches!(err, JgrantsError::NotFound { ref id } if id == "missing"));
    }

    #[tokio::test]
    async fn tool_descriptor_is_unsupported() {
        let server = MockServer::start().await;
        let access = AccessDescriptor::Tool {
            tool: "get_file_content".into(),
            params: json!({"subsidy_id": "A001", "category": "application_form", "file_index": 0}),
        };
        let err = source(&server).get_file_content(&access).await.unwrap_err();
        assert!(matches!(err, JgrantsError::Unsupported(_)));
    }

    #[tokio::test]
    async fn overview_counts_accepting_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subsidies"))
            .and(query_param("keyword", "補助金"))
            .and(query_param("acceptance", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [{"id": "A"}, {"id": "B"}, {"id": "C"}]
            })))
            .mount(&server)
            .await;

        let overview = source(&server).overview().await.unwrap();
        assert_eq!(overview.total_count, 3);
        assert!(overview.urgent_deadlines.is_empty());
    }

    #[tokio::test]
    async fn health_reports_unreachable_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let health = source(&server).health_check().await.unwrap();
        assert!(matches!(health, HealthStatus::Unhealthy(_)));
    }
}
