// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Collects every violation instead of stopping at the first.

use crate::diagnostic::ConfigError;
use crate::model::JgrantsConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &JgrantsConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::validation(
            "logging.level",
            format!(
                "must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.logging.level
            ),
        ));
    }

    check_url(&mut errors, "upstream.base_url", &config.upstream.base_url);
    check_url(&mut errors, "mcp.base_url", &config.mcp.base_url);

    if !config.mcp.endpoint.starts_with('/') {
        errors.push(ConfigError::validation(
            "mcp.endpoint",
            format!("must start with `/`, got `{}`", config.mcp.endpoint),
        ));
    }

    if config.retry.max_attempts < 1 {
        errors.push(ConfigError::validation(
            "retry.max_attempts",
            "must be at least 1",
        ));
    }

    for (key, secs) in [
        ("upstream.timeout_secs", config.upstream.timeout_secs),
        (
            "upstream.connect_timeout_secs",
            config.upstream.connect_timeout_secs,
        ),
        ("mcp.timeout_secs", config.mcp.timeout_secs),
        ("mcp.init_timeout_secs", config.mcp.init_timeout_secs),
        ("extraction.timeout_secs", config.extraction.timeout_secs),
    ] {
        if secs == 0 {
            errors.push(ConfigError::validation(key, "must be greater than 0"));
        }
    }

    if config.extraction.max_tokens == 0 {
        errors.push(ConfigError::validation(
            "extraction.max_tokens",
            "must be greater than 0",
        ));
    }

    if config.extraction.keyword_max_chars < 2 {
        errors.push(ConfigError::validation(
            "extraction.keyword_max_chars",
            format!(
                "must be at least 2, got {}",
                config.extraction.keyword_max_chars
            ),
        ));
    }

    for (key, keyword) in [
        (
            "extraction.fallback_keyword",
            &config.extraction.fallback_keyword,
        ),
        ("upstream.overview_keyword", &config.upstream.overview_keyword),
    ] {
        if keyword.trim().chars().count() < 2 {
            errors.push(ConfigError::validation(
                key,
                "must contain at least 2 characters",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ConfigError>, key: &str, value: &str) {
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        Ok(parsed) => errors.push(ConfigError::validation(
            key,
            format!("must use http or https, got `{}`", parsed.scheme()),
        )),
        Err(e) => errors.push(ConfigError::validation(
            key,
            format!("is not a valid URL: {e}"),
        )),
    }
}
