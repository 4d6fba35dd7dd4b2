// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the jgrants external-access layer.

use serde::Serialize;
use strum::Display;
use thiserror::Error;

/// Maximum number of characters of an upstream body kept in an error.
const BODY_EXCERPT_CHARS: usize = 200;

/// What kind of network failure occurred before any HTTP status was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum NetworkFailure {
    /// Connection refused, DNS failure, TLS handshake failure.
    Connect,
    /// Connect or read timeout.
    Timeout,
    /// Any other transport-level failure (body read aborted, redirect loop).
    Other,
}

/// Human-readable classification of a terminal failure.
///
/// Lets the presentation layer tell "no results" apart from
/// "service unavailable" without matching on every error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FailureCause {
    Timeout,
    Unreachable,
    NotFound,
    ServerError,
    ClientError,
    Protocol,
    InvalidInput,
    Unsupported,
    Internal,
}

/// The primary error type used across all jgrants crates.
#[derive(Debug, Error)]
pub enum JgrantsError {
    /// Configuration errors (invalid values, missing credentials).
    #[error("configuration error: {0}")]
    Config(String),

    /// Connect/read timeout, connection refused and other transport failures.
    #[error("network error ({kind}): {message}")]
    Network {
        kind: NetworkFailure,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The upstream answered with a non-success HTTP status.
    #[error("upstream returned HTTP {status}{}", format_excerpt(.body_excerpt.as_deref()))]
    Upstream {
        status: u16,
        body_excerpt: Option<String>,
    },

    /// A payload could not be decoded (invalid JSON, invalid base64).
    #[error("failed to parse payload: {message}")]
    Parse {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed protocol envelope.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The session handshake was rejected.
    #[error("session error: {0}")]
    Session(String),

    /// An established session is no longer valid; a new handshake may succeed.
    #[error("session expired: {0}")]
    SessionExpired(String),

    /// A tool invocation on the intermediary server failed.
    #[error("tool `{tool}` failed: {message}")]
    Tool {
        tool: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A tool call never got an answer from the intermediary server.
    #[error("tool `{tool}` unreachable ({kind})")]
    ToolUnreachable {
        tool: String,
        kind: NetworkFailure,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Every permitted attempt failed; `last` is the final cause.
    #[error("giving up after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<JgrantsError>,
    },

    /// The upstream has no subsidy with this id.
    #[error("subsidy not found: {id}")]
    NotFound { id: String },

    /// The query violates the schema (e.g. keyword too short).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The selected transport cannot perform this operation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Language-understanding provider errors.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl JgrantsError {
    /// Builds an [`JgrantsError::Upstream`] keeping a bounded excerpt of the body.
    pub fn upstream(status: u16, body: &str) -> Self {
        let trimmed = body.trim();
        let body_excerpt = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.chars().take(BODY_EXCERPT_CHARS).collect())
        };
        Self::Upstream {
            status,
            body_excerpt,
        }
    }

    /// Builds a [`JgrantsError::Parse`] from any decoding error.
    pub fn parse<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Builds a [`JgrantsError::Tool`] without an underlying source.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Returns the HTTP status carried by this error, looking through retries.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::RetriesExhausted { last, .. } => last.http_status(),
            _ => None,
        }
    }

    /// Classifies the failure for user-visible messaging.
    pub fn cause(&self) -> FailureCause {
        match self {
            Self::Network { kind, .. } | Self::ToolUnreachable { kind, .. } => match kind {
                NetworkFailure::Timeout => FailureCause::Timeout,
                NetworkFailure::Connect | NetworkFailure::Other => FailureCause::Unreachable,
            },
            Self::Upstream { status, .. } => match *status {
                404 => FailureCause::NotFound,
                500..=599 => FailureCause::ServerError,
                _ => FailureCause::ClientError,
            },
            Self::Parse { .. }
            | Self::Protocol(_)
            | Self::Session(_)
            | Self::SessionExpired(_)
            | Self::Tool { .. } => FailureCause::Protocol,
            Self::RetriesExhausted { last, .. } => last.cause(),
            Self::NotFound { .. } => FailureCause::NotFound,
            Self::InvalidQuery(_) | Self::Config(_) => FailureCause::InvalidInput,
            Self::Unsupported(_) => FailureCause::Unsupported,
            Self::Provider { .. } => FailureCause::Unreachable,
            Self::Internal(_) => FailureCause::Internal,
        }
    }
}

fn format_excerpt(excerpt: Option<&str>) -> String {
    match excerpt {
        Some(body) => format!(": {body}"),
        None => String::new(),
    }
}
