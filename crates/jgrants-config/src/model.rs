// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use jgrants_core::types::AcceptanceStatus;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to values that
/// talk to the public jGrants API directly.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JgrantsConfig {
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Which transport serves subsidy requests.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Public REST API settings (direct transport).
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Retry policy of the direct transport.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Intermediary protocol server settings (mcp transport).
    #[serde(default)]
    pub mcp: McpConfig,

    /// Natural-language query extraction settings.
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Result normalization choices.
    #[serde(default)]
    pub results: ResultsConfig,
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// The two interchangeable transports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// The public REST API with retries.
    #[default]
    Direct,
    /// The intermediary protocol server.
    Mcp,
}

/// Transport selection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    #[serde(default)]
    pub kind: TransportKind,
}

/// Public REST API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL that endpoint paths such as `subsidies` are joined to.
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,

    /// Per-attempt connect+read timeout.
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,

    /// Per-attempt connect timeout.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Skip TLS certificate validation (interception proxies). Logged loudly.
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Keyword of the accepting-only search an overview is computed from.
    #[serde(default = "default_overview_keyword")]
    pub overview_keyword: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            timeout_secs: default_upstream_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            accept_invalid_certs: false,
            overview_keyword: default_overview_keyword(),
        }
    }
}

fn default_upstream_base_url() -> String {
    "https://api.jgrants-portal.go.jp/exp/v1/public".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_overview_keyword() -> String {
    "補助金".to_string()
}

/// Retry policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts per logical call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first failed attempt; doubles after each further one.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

/// Intermediary protocol server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct McpConfig {
    #[serde(default = "default_mcp_base_url")]
    pub base_url: String,

    /// Path of the single JSON-RPC endpoint.
    #[serde(default = "default_mcp_endpoint")]
    pub endpoint: String,

    /// Protocol revision declared during the handshake.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,

    #[serde(default = "default_client_name")]
    pub client_name: String,

    #[serde(default = "default_client_version")]
    pub client_version: String,

    /// Fail the handshake when the server issues no session id.
    #[serde(default)]
    pub require_session_id: bool,

    /// Timeout of a tool call.
    #[serde(default = "default_mcp_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout of the handshake.
    #[serde(default = "default_init_timeout_secs")]
    pub init_timeout_secs: u64,

    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            base_url: default_mcp_base_url(),
            endpoint: default_mcp_endpoint(),
            protocol_version: default_protocol_version(),
            client_name: default_client_name(),
            client_version: default_client_version(),
            require_session_id: false,
            timeout_secs: default_mcp_timeout_secs(),
            init_timeout_secs: default_init_timeout_secs(),
            accept_invalid_certs: false,
        }
    }
}

fn default_mcp_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_mcp_endpoint() -> String {
    "/mcp".to_string()
}

fn default_protocol_version() -> String {
    "2024-11-05".to_string()
}

fn default_client_name() -> String {
    "jgrants".to_string()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_mcp_timeout_secs() -> u64 {
    30
}

fn default_init_timeout_secs() -> u64 {
    10
}

/// Natural-language query extraction configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractionConfig {
    /// When false the extractor always uses the literal input as keyword.
    #[serde(default = "default_extraction_enabled")]
    pub enabled: bool,

    /// Anthropic API key. `None` falls back to `ANTHROPIC_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_extraction_model")]
    pub model: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_extraction_max_tokens")]
    pub max_tokens: u32,

    /// Kept short: a slow provider blocks interactive search.
    #[serde(default = "default_extraction_timeout_secs")]
    pub timeout_secs: u64,

    /// Cap on the fallback keyword taken from the raw input.
    #[serde(default = "default_keyword_max_chars")]
    pub keyword_max_chars: usize,

    /// Keyword used when the input itself is empty.
    #[serde(default = "default_fallback_keyword")]
    pub fallback_keyword: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            enabled: default_extraction_enabled(),
            api_key: None,
            model: default_extraction_model(),
            api_version: default_api_version(),
            max_tokens: default_extraction_max_tokens(),
            timeout_secs: default_extraction_timeout_secs(),
            keyword_max_chars: default_keyword_max_chars(),
            fallback_keyword: default_fallback_keyword(),
        }
    }
}

fn default_extraction_enabled() -> bool {
    true
}

fn default_extraction_model() -> String {
    "claude-haiku-4-5".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_extraction_max_tokens() -> u32 {
    512
}

fn default_extraction_timeout_secs() -> u64 {
    15
}

fn default_keyword_max_chars() -> usize {
    50
}

fn default_fallback_keyword() -> String {
    "事業".to_string()
}

/// Result normalization configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResultsConfig {
    /// Status reported for a subsidy whose payload has no status field.
    #[serde(default)]
    pub missing_status: AcceptanceStatus,
}
