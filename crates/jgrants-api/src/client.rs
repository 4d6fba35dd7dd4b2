// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the public jGrants REST API.
//!
//! [`ApiClient::fetch`] joins an endpoint path to the configured base URL,
//! serializes flat query parameters and retries transient failures under the
//! configured [`RetryPolicy`].

use std::time::Duration;

use jgrants_config::model::{RetryConfig, UpstreamConfig};
use jgrants_core::JgrantsError;
use jgrants_core::types::QueryParams;
use jgrants_security::{HttpClientSettings, build_client, network_error};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::retry::RetryPolicy;

/// Client for GET endpoints returning JSON.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    policy: RetryPolicy,
    tls_disabled: bool,
}

impl ApiClient {
    /// Creates a client from the `[upstream]` and `[retry]` sections.
    pub fn new(upstream: &UpstreamConfig, retry: &RetryConfig) -> Result<Self, JgrantsError> {
        let settings = HttpClientSettings {
            label: "upstream",
            timeout: Duration::from_secs(upstream.timeout_secs),
            connect_timeout: Duration::from_secs(upstream.connect_timeout_secs),
            accept_invalid_certs: upstream.accept_invalid_certs,
        };
        let base_url = Url::parse(&upstream.base_url).map_err(|e| {
            JgrantsError::Config(format!("invalid upstream.base_url `{}`: {e}", upstream.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(JgrantsError::Config(format!(
                "upstream.base_url `{base_url}` cannot carry a path"
            )));
        }

        Ok(Self {
            http: build_client(&settings)?,
            base_url,
            policy: RetryPolicy::from_config(retry),
            tls_disabled: upstream.accept_invalid_certs,
        })
    }

    /// Replaces the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// True when certificate validation was switched off in config.
    pub fn tls_verification_disabled(&self) -> bool {
        self.tls_disabled
    }

    /// Fetches `endpoint_path` (slash-separated, relative to the base URL).
    pub async fn fetch(&self, endpoint_path: &str, params: &QueryParams) -> Result<Value, JgrantsError> {
        let segments: Vec<&str> = endpoint_path.split('/').filter(|s| !s.is_empty()).collect();
        self.fetch_segments(&segments, params).await
    }

    /// Like [`fetch`](Self::fetch) with pre-split path segments, each
    /// percent-encoded on its own.
    pub async fn fetch_segments(
        &self,
        segments: &[&str],
        params: &QueryParams,
    ) -> Result<Value, JgrantsError> {
        let url = self.url_for(segments, params);
        self.policy.run(|attempt| self.attempt(&url, attempt)).await
    }

    /// Builds the request URL. Booleans become `1`/`0`.
    pub fn url_for(&self, segments: &[&str], params: &QueryParams) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in params.iter() {
                query.append_pair(key, &value.to_query_scalar());
            }
        }
        url
    }

    async fn attempt(&self, url: &Url, attempt: u32) -> Result<Value, JgrantsError> {
        debug!(attempt = attempt + 1, url = %url, "GET");

        let response = self
            .http
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(network_error)?;
        debug!(attempt = attempt + 1, status = %status, bytes = body.len(), "response received");

        if !status.is_success() {
            return Err(JgrantsError::upstream(
                status.as_u16(),
                &String::from_utf8_lossy(&body),
            ));
        }

        serde_json::from_slice(&body)
            .map_err(|e| JgrantsError::parse("upstream body is not valid JSON", e))
    }
}
