// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` starts a `wiremock` server, points the configured transport
//! at it and assembles a real [`SubsidyService`] around it. Tests mount the
//! upstream answers they need and drive the service directly.

use std::sync::Arc;

use jgrants_config::model::{JgrantsConfig, TransportKind};
use jgrants_core::types::AcceptanceStatus;
use jgrants_core::{JgrantsError, ProviderAdapter};
use jgrants_extract::QueryExtractor;
use jgrants_service::SubsidyService;
use jgrants_service::wiring::build_transport;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::mock_provider::{MockProvider, MockReply};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    transport: TransportKind,
    replies: Option<Vec<MockReply>>,
    max_attempts: u32,
    backoff_base_ms: u64,
    missing_status: AcceptanceStatus,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            transport: TransportKind::Direct,
            replies: None,
            max_attempts: 3,
            backoff_base_ms: 10,
            missing_status: AcceptanceStatus::Unknown,
        }
    }

    /// Select the transport under test.
    pub fn with_transport(mut self, kind: TransportKind) -> Self {
        self.transport = kind;
        self
    }

    /// Enable extraction with a [`MockProvider`] answering these replies.
    pub fn with_mock_replies(mut self, replies: Vec<MockReply>) -> Self {
        self.replies = Some(replies);
        self
    }

    /// Override the direct transport's retry policy.
    pub fn with_retry(mut self, max_attempts: u32, backoff_base_ms: u64) -> Self {
        self.max_attempts = max_attempts;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    pub fn with_missing_status(mut self, status: AcceptanceStatus) -> Self {
        self.missing_status = status;
        self
    }

    /// Start the mock upstream and build the service against it.
    pub async fn build(self) -> Result<TestHarness, JgrantsError> {
        let server = MockServer::start().await;

        let mut config = JgrantsConfig::default();
        config.transport.kind = self.transport;
        config.upstream.base_url = server.uri();
        config.upstream.timeout_secs = 5;
        config.retry.max_attempts = self.max_attempts;
        config.retry.backoff_base_ms = self.backoff_base_ms;
        config.mcp.base_url = server.uri();
        config.mcp.timeout_secs = 5;
        config.mcp.init_timeout_secs = 5;
        config.extraction.enabled = self.replies.is_some();
        config.results.missing_status = self.missing_status;

        let transport = build_transport(&config)?;
        let provider = self.replies.map(|r| Arc::new(MockProvider::with_replies(r)));
        let dyn_provider = provider
            .clone()
            .map(|p| p as Arc<dyn ProviderAdapter>);
        let extractor = QueryExtractor::from_config(&config.extraction, dyn_provider);
        let service = SubsidyService::new(transport.source, extractor);

        Ok(TestHarness {
            server,
            service,
            provider,
            config,
        })
    }
}

/// A complete service wired to a local mock upstream.
pub struct TestHarness {
    /// The mock upstream (REST API or protocol server).
    pub server: MockServer,
    pub service: SubsidyService,
    /// Present when extraction was enabled through the builder.
    pub provider: Option<Arc<MockProvider>>,
    /// The configuration the service was built from.
    pub config: JgrantsConfig,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Answer `GET {base}{route}` with `body`.
    pub async fn mount_json(&self, route: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer the next `times` calls to `GET {base}{route}` with `status`.
    ///
    /// Mount this before [`mount_json`](Self::mount_json) for the same route
    /// so the failures are served first.
    pub async fn mount_failures(&self, route: &str, status: u16, times: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status))
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }

    /// Accept the protocol handshake, issuing session `session_id`.
    pub async fn mount_mcp_session(&self, session_id: &str) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "initialize"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("mcp-session-id", session_id)
                    .set_body_json(json!({
                        "jsonrpc": "2.0",
                        "id": 1,
                        "result": {
                            "protocolVersion": "2024-11-05",
                            "capabilities": {"tools": {}},
                            "serverInfo": {"name": "mock-jgrants", "version": "0.0.0"}
                        }
                    })),
            )
            .mount(&self.server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "notifications/initialized"})))
            .respond_with(ResponseTemplate::new(202))
            .mount(&self.server)
            .await;
    }

    /// Answer calls to `tool` with `payload` as the text content.
    pub async fn mount_mcp_tool(&self, tool: &str, payload: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(
                json!({"method": "tools/call", "params": {"name": tool}}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 2,
                "result": {"content": [{"type": "text", "text": payload.to_string()}]}
            })))
            .mount(&self.server)
            .await;
    }

    /// Number of requests the mock upstream has seen.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or(0)
    }
}
