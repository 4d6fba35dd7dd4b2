// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`SubsidyService`]: one object exposing search, detail, attachment,
//! extraction and overview operations over the configured transport.

use std::sync::Arc;

use jgrants_config::model::JgrantsConfig;
use jgrants_core::types::{Overview, SearchQuery};
use jgrants_core::{
    AccessDescriptor, HealthStatus, JgrantsError, PluginAdapter, RenderedContent, SubsidyDetail,
    SubsidySource, SubsidySummary,
};
use jgrants_extract::{DegradeReason, Extraction, QueryExtractor};
use tracing::{debug, info};

use crate::wiring;

/// Result of a free-text search: the query that was run and what it found.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub query: SearchQuery,
    /// Set when the query came from the literal-keyword fallback.
    pub degraded: Option<DegradeReason>,
    pub results: Vec<SubsidySummary>,
}

/// Subsidy operations over one transport.
///
/// Cheap to share behind an `Arc`; every method takes `&self` and calls may
/// run concurrently.
pub struct SubsidyService {
    source: Arc<dyn SubsidySource>,
    extractor: QueryExtractor,
    tls_verification_disabled: bool,
}

impl SubsidyService {
    pub fn new(source: Arc<dyn SubsidySource>, extractor: QueryExtractor) -> Self {
        Self {
            source,
            extractor,
            tls_verification_disabled: false,
        }
    }

    /// Builds the transport named by `transport.kind` and the extractor.
    ///
    /// A missing API key is not an error: extraction then always uses the
    /// literal input.
    pub fn from_config(config: &JgrantsConfig) -> Result<Self, JgrantsError> {
        let transport = wiring::build_transport(config)?;
        let provider = wiring::build_provider(&config.extraction);
        let extractor = QueryExtractor::from_config(&config.extraction, provider);
        info!(
            transport = transport.source.name(),
            extraction = extractor.has_provider(),
            "subsidy service ready"
        );
        Ok(Self {
            source: transport.source,
            extractor,
            tls_verification_disabled: transport.tls_verification_disabled,
        })
    }

    /// Name of the active transport (`direct` or `mcp`).
    pub fn transport_name(&self) -> &str {
        self.source.name()
    }

    /// Whether the active transport skips TLS certificate verification.
    pub fn tls_verification_disabled(&self) -> bool {
        self.tls_verification_disabled
    }

    pub fn extractor(&self) -> &QueryExtractor {
        &self.extractor
    }

    /// Runs a structured search. Invalid queries fail before any request.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SubsidySummary>, JgrantsError> {
        query.validate()?;
        let results = self.source.search(query).await?;
        debug!(keyword = %query.keyword, count = results.len(), "search complete");
        Ok(results)
    }

    /// Extracts a query from free text and runs it.
    pub async fn search_text(&self, text: &str) -> Result<SearchOutcome, JgrantsError> {
        let Extraction { query, degraded } = self.extractor.extract_with_outcome(text).await;
        let results = self.search(&query).await?;
        Ok(SearchOutcome {
            query,
            degraded,
            results,
        })
    }

    pub async fn get_detail(&self, id: &str) -> Result<SubsidyDetail, JgrantsError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(JgrantsError::InvalidQuery("subsidy id is empty".to_string()));
        }
        self.source.get_detail(id).await
    }

    pub async fn get_file_content(
        &self,
        access: &AccessDescriptor,
    ) -> Result<RenderedContent, JgrantsError> {
        self.source.get_file_content(access).await
    }

    /// Never fails; see [`QueryExtractor::extract`].
    pub async fn extract(&self, text: &str) -> SearchQuery {
        self.extractor.extract(text).await
    }

    pub async fn extract_with_outcome(&self, text: &str) -> Extraction {
        self.extractor.extract_with_outcome(text).await
    }

    pub async fn overview(&self) -> Result<Overview, JgrantsError> {
        self.source.overview().await
    }

    /// Transport connectivity; failures are reported as `Unhealthy`.
    pub async fn health_check(&self) -> HealthStatus {
        match self.source.health_check().await {
            Ok(status) => status,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jgrants_core::types::AdapterType;
    use jgrants_extract::ExtractorSettings;
    use std::sync::Mutex;

    /// Records queries and answers with one fixed summary.
    #[derive(Default)]
    struct RecordingSource {
        queries: Mutex<Vec<SearchQuery>>,
        details: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PluginAdapter for RecordingSource {
        fn name(&self) -> &str {
            "recording"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Transport
        }
        async fn health_check(&self) -> Result<HealthStatus, JgrantsError> {
            Err(JgrantsError::Internal("probe crashed".into()))
        }
    }

    #[async_trait]
    impl SubsidySource for RecordingSource {
        async fn search(&self, query: &SearchQuery) -> Result<Vec<SubsidySummary>, JgrantsError> {
            self.queries.lock().unwrap().push(query.clone());
            Ok(vec![SubsidySummary {
                id: Some("A001".into()),
                title: Some("X補助金".into()),
                ..SubsidySummary::default()
            }])
        }
        async fn get_detail(&self, id: &str) -> Result<SubsidyDetail, JgrantsError> {
            self.details.lock().unwrap().push(id.to_string());
            Err(JgrantsError::NotFound { id: id.to_string() })
        }
        async fn get_file_content(
            &self,
            _access: &AccessDescriptor,
        ) -> Result<RenderedContent, JgrantsError> {
            Err(JgrantsError::Unsupported("no files".into()))
        }
        async fn overview(&self) -> Result<Overview, JgrantsError> {
            Ok(Overview {
                total_count: 7,
                ..Overview::default()
            })
        }
    }

    fn service() -> (SubsidyService, Arc<RecordingSource>) {
        let source = Arc::new(RecordingSource::default());
        let dyn_source: Arc<dyn SubsidySource> = source.clone();
        let extractor = QueryExtractor::new(None, ExtractorSettings::default());
        (SubsidyService::new(dyn_source, extractor), source)
    }

    #[tokio::test]
    async fn short_keyword_never_reaches_transport() {
        let (svc, source) = service();
        let err = svc.search(&SearchQuery::new(" a ")).await.unwrap_err();
        assert!(matches!(err, JgrantsError::InvalidQuery(_)));
        assert!(source.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_dispatches_valid_query() {
        let (svc, source) = service();
        let results = svc.search(&SearchQuery::new("事業")).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id.as_deref(), Some("A001"));
        assert_eq!(source.queries.lock().unwrap()[0].keyword, "事業");
    }

    #[tokio::test]
    async fn search_text_without_provider_uses_literal_keyword() {
        let (svc, source) = service();
        let outcome = svc.search_text("  ものづくり補助金  ").await.unwrap();
        assert_eq!(outcome.query.keyword, "ものづくり補助金");
        assert_eq!(outcome.degraded, Some(DegradeReason::NoProvider));
        assert_eq!(outcome.results.len(), 1);
        assert!(source.queries.lock().unwrap()[0].accepting_only);
    }

    #[tokio::test]
    async fn blank_detail_id_is_rejected_locally() {
        let (svc, source) = service();
        assert!(matches!(
            svc.get_detail("  ").await.unwrap_err(),
            JgrantsError::InvalidQuery(_)
        ));
        assert!(matches!(
            svc.get_detail(" a0W5h00000UiXkYEAV ").await.unwrap_err(),
            JgrantsError::NotFound { .. }
        ));
        assert_eq!(*source.details.lock().unwrap(), vec!["a0W5h00000UiXkYEAV"]);
    }

    #[tokio::test]
    async fn health_errors_become_unhealthy() {
        let (svc, _) = service();
        assert!(matches!(svc.health_check().await, HealthStatus::Unhealthy(_)));
        assert_eq!(svc.transport_name(), "recording");
        assert!(!svc.tls_verification_disabled());
    }

    #[tokio::test]
    async fn overview_passes_through() {
        let (svc, _) = service();
        assert_eq!(svc.overview().await.unwrap().total_count, 7);
    }

    #[test]
    fn from_config_defaults_to_direct() {
        let mut config = JgrantsConfig::default();
        config.extraction.enabled = false;
        let svc = SubsidyService::from_config(&config).unwrap();
        assert_eq!(svc.transport_name(), "direct");
        assert!(!svc.extractor().has_provider());
    }
}
