// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! reqwest client construction with TLS 1.2+, bounded redirects and
//! per-request timeouts.

use std::time::Duration;

use jgrants_core::{JgrantsError, NetworkFailure};
use tracing::{error, info, warn};

/// Redirect hops followed before a request fails.
pub const MAX_REDIRECTS: usize = 10;

/// Settings for one outbound client.
#[derive(Debug, Clone)]
pub struct HttpClientSettings {
    /// Label used in log lines ("upstream", "mcp", "anthropic").
    pub label: &'static str,
    /// Whole-request timeout (connect + read).
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Skips certificate validation. Logged at `warn` on construction.
    pub accept_invalid_certs: bool,
}

impl HttpClientSettings {
    pub fn new(label: &'static str, timeout: Duration) -> Self {
        Self {
            label,
            timeout,
            connect_timeout: timeout,
            accept_invalid_certs: false,
        }
    }
}

/// Builds a reqwest client following the connection policy.
pub fn build_client(settings: &HttpClientSettings) -> Result<reqwest::Client, JgrantsError> {
    if settings.accept_invalid_certs {
        warn!(
            client = settings.label,
            "TLS certificate verification is DISABLED; responses can be intercepted"
        );
    }

    let client = reqwest::Client::builder()
        .min_tls_version(reqwest::tls::Version::TLS_1_2)
        .timeout(settings.timeout)
        .connect_timeout(settings.connect_timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .danger_accept_invalid_certs(settings.accept_invalid_certs)
        .user_agent(concat!("jgrants/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            error!(client = settings.label, "failed to build HTTP client: {e}");
            JgrantsError::Config(format!(
                "failed to build {} HTTP client: {e}",
                settings.label
            ))
        })?;

    info!(
        client = settings.label,
        timeout_secs = settings.timeout.as_secs(),
        "HTTP client ready"
    );
    Ok(client)
}

/// Maps a reqwest transport error onto [`JgrantsError::Network`].
pub fn network_error(err: reqwest::Error) -> JgrantsError {
    let kind = if err.is_timeout() {
        NetworkFailure::Timeout
    } else if err.is_connect() {
        NetworkFailure::Connect
    } else {
        NetworkFailure::Other
    };
    JgrantsError::Network {
        kind,
        message: err.to_string(),
        source: Some(Box::new(err)),
    }
}

/// Accepts https anywhere and plain http only for loopback hosts.
pub fn validate_url(url: &str) -> Result<(), JgrantsError> {
    let parsed =
        url::Url::parse(url).map_err(|e| JgrantsError::Config(format!("invalid URL `{url}`: {e}")))?;

    match parsed.scheme() {
        "https" => Ok(()),
        "http" if is_localhost(parsed.host_str().unwrap_or("")) => Ok(()),
        scheme => Err(JgrantsError::Config(format!(
            "`{url}` uses {scheme}; remote hosts require https"
        ))),
    }
}

/// Check if a host refers to the local machine.
pub fn is_localhost(host: &str) -> bool {
    matches!(host, "localhost" | "::1" | "[::1]") || host.starts_with("127.")
}
