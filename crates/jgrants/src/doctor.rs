// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `jgrants doctor` command implementation.
//!
//! Runs diagnostic checks against the configured transport and extraction
//! provider to identify configuration and connectivity problems.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use jgrants_config::model::JgrantsConfig;
use jgrants_core::HealthStatus;
use jgrants_service::SubsidyService;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `jgrants doctor` command.
///
/// Returns the number of failed checks. With `plain`, disables colored output.
pub async fn run_doctor(config: &JgrantsConfig, service: &SubsidyService, plain: bool) -> usize {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_transport(service).await,
        check_tls(service),
        check_extraction(config, service),
    ];

    println!();
    println!("  jgrants doctor ({} transport)", service.transport_name());
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;

    for result in &results {
        match result.status {
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Fail => fail_count += 1,
            CheckStatus::Pass => {}
        }
        println!("{}", format_line(result, use_color));
    }

    println!();
    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    fail_count
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!(
            "    {symbol} {:<20} {message} ({duration_ms}ms)",
            result.name
        )
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// One cheap upstream round trip through the active transport.
async fn check_transport(service: &SubsidyService) -> CheckResult {
    let start = Instant::now();
    match service.health_check().await {
        HealthStatus::Healthy => CheckResult::new("Transport", CheckStatus::Pass, "reachable", start),
        HealthStatus::Degraded(msg) => CheckResult::new("Transport", CheckStatus::Warn, msg, start),
        HealthStatus::Unhealthy(msg) => CheckResult::new("Transport", CheckStatus::Fail, msg, start),
    }
}

fn check_tls(service: &SubsidyService) -> CheckResult {
    let start = Instant::now();
    if service.tls_verification_disabled() {
        CheckResult::new(
            "TLS verification",
            CheckStatus::Warn,
            "disabled (accept_invalid_certs = true)",
            start,
        )
    } else {
        CheckResult::new("TLS verification", CheckStatus::Pass, "enabled", start)
    }
}

fn check_extraction(config: &JgrantsConfig, service: &SubsidyService) -> CheckResult {
    let start = Instant::now();
    if !config.extraction.enabled {
        return CheckResult::new(
            "Query extraction",
            CheckStatus::Pass,
            "disabled, literal keywords",
            start,
        );
    }
    if service.extractor().has_provider() {
        CheckResult::new(
            "Query extraction",
            CheckStatus::Pass,
            format!("model {}", config.extraction.model),
            start,
        )
    } else {
        CheckResult::new(
            "Query extraction",
            CheckStatus::Warn,
            "no API key, literal keywords",
            start,
        )
    }
}
