// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of raw upstream payloads into [`SubsidySummary`] and [`SubsidyDetail`].
//!
//! Two raw shapes are accepted: records from the public API
//! (`acceptance_start_datetime`, `detail`, base64 attachment groups) and tool
//! payloads from the intermediary server (`acceptance_start`, `target {..}`,
//! `files {..}` with `mcp_access` pointers). Every field is optional; nothing
//! here fails.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::{
    AcceptanceStatus, AccessDescriptor, Amount, Attachment, AttachmentCategory, SubsidyDetail,
    SubsidySummary,
};

/// Tool the intermediary expects for rendering files when `mcp_access` names none.
pub const DEFAULT_FILE_TOOL: &str = "get_file_content";

/// Status label the catalog uses for "currently accepting".
const ACCEPTING_LABEL: &str = "受付中";

/// Attachment groups in the order they are listed.
const ATTACHMENT_GROUPS: [(&str, AttachmentCategory); 3] = [
    ("application_guidelines", AttachmentCategory::ApplicationGuidelines),
    ("outline_of_grant", AttachmentCategory::OutlineOfGrant),
    ("application_form", AttachmentCategory::ApplicationForm),
];

/// Knobs for decisions the raw payload leaves open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Status assigned when the payload has no `status` field.
    pub missing_status: AcceptanceStatus,
}

/// Maps a raw result array into summaries. Non-object elements are skipped.
pub fn to_summary_list(raw: &[Value]) -> Vec<SubsidySummary> {
    raw.iter()
        .filter_map(|item| match item.as_object() {
            Some(obj) => Some(summary_from_object(obj)),
            None => {
                debug!(item = %item, "skipping non-object search result");
                None
            }
        })
        .collect()
}

/// Maps one raw record into a summary.
pub fn to_summary(raw: &Value) -> SubsidySummary {
    match raw.as_object() {
        Some(obj) => summary_from_object(obj),
        None => SubsidySummary::default(),
    }
}

/// Maps one raw record into a detail.
pub fn to_detail(raw: &Value, options: &NormalizeOptions) -> SubsidyDetail {
    let Some(obj) = raw.as_object() else {
        return SubsidyDetail {
            status: options.missing_status,
            ..SubsidyDetail::default()
        };
    };

    let target = obj.get("target").and_then(Value::as_object);

    SubsidyDetail {
        summary: summary_from_object(obj),
        status: parse_status(obj.get("status"), options.missing_status),
        description: text(obj, &["description", "detail", "subsidy_catch_phrase"]),
        application_url: text(obj, &["application_url", "front_subsidy_detail_page_url"]),
        target_employees: text(obj, &["target_number_of_employees"])
            .or_else(|| target.and_then(|t| text(t, &["employees"]))),
        use_purpose: text(obj, &["use_purpose"])
            .or_else(|| target.and_then(|t| text(t, &["purpose"]))),
        attachments: collect_attachments(obj),
        save_directory: text(obj, &["save_directory"]),
    }
}

fn summary_from_object(obj: &Map<String, Value>) -> SubsidySummary {
    let target = obj.get("target").and_then(Value::as_object);

    SubsidySummary {
        id: text(obj, &["id"]),
        title: text(obj, &["title", "name"]),
        acceptance_start: first(obj, &["acceptance_start_datetime", "acceptance_start"])
            .and_then(parse_timestamp),
        acceptance_end: first(obj, &["acceptance_end_datetime", "acceptance_end"])
            .and_then(parse_timestamp),
        max_limit_amount: obj.get("subsidy_max_limit").and_then(parse_amount),
        target_area: text(obj, &["target_area_search"])
            .or_else(|| target.and_then(|t| text(t, &["area"]))),
        target_industry: text(obj, &["target_industry", "industry"])
            .or_else(|| target.and_then(|t| text(t, &["industry"]))),
    }
}

/// Returns the first present, non-null value among `keys`.
fn first<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Returns the first non-empty textual value among `keys`. Numbers are stringified.
fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(|v| match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Parses a ceiling amount. Strings that are not numbers are kept verbatim.
pub fn parse_amount(value: &Value) -> Option<Amount> {
    match value {
        Value::Number(n) => n.as_f64().map(Amount::Number),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            let digits: String = trimmed.chars().filter(|c| *c != ',').collect();
            match digits.parse::<f64>() {
                Ok(n) if n.is_finite() => Some(Amount::Number(n)),
                _ => Some(Amount::Unparsed(s.clone())),
            }
        }
        _ => None,
    }
}

/// Parses RFC 3339 timestamps, or naive `YYYY-MM-DDTHH:MM:SS[.fff]` read as UTC.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<FixedOffset>> {
    let s = value.as_str()?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(naive.and_utc().fixed_offset()),
        Err(_) => {
            debug!(value = s, "unparsable timestamp");
            None
        }
    }
}

fn parse_status(value: Option<&Value>, missing: AcceptanceStatus) -> AcceptanceStatus {
    match value.and_then(Value::as_str).map(str::trim) {
        None | Some("") => missing,
        Some(ACCEPTING_LABEL) => AcceptanceStatus::Accepting,
        Some(other) if other.eq_ignore_ascii_case("accepting") => AcceptanceStatus::Accepting,
        Some(_) => AcceptanceStatus::Closed,
    }
}

fn collect_attachments(obj: &Map<String, Value>) -> Vec<Attachment> {
    let mut attachments = Vec::new();

    // Public API: groups at the top level carry base64 data.
    for (group, category) in ATTACHMENT_GROUPS {
        if let Some(entries) = obj.get(group).and_then(Value::as_array) {
            attachments.extend(entries.iter().filter_map(|e| attachment(e, category)));
        }
    }

    // Intermediary: groups nested under `files`.
    if let Some(files) = obj.get("files").and_then(Value::as_object) {
        for (group, entries) in files {
            let category = category_for(group);
            if let Some(entries) = entries.as_array() {
                attachments.extend(entries.iter().filter_map(|e| attachment(e, category)));
            }
        }
    }

    attachments
}

fn category_for(group: &str) -> AttachmentCategory {
    ATTACHMENT_GROUPS
        .iter()
        .find(|(name, _)| *name == group)
        .map(|(_, category)| *category)
        .unwrap_or(AttachmentCategory::Other)
}

fn attachment(entry: &Value, category: AttachmentCategory) -> Option<Attachment> {
    let obj = entry.as_object()?;
    let name = text(obj, &["name"]).unwrap_or_else(|| "unknown".to_string());

    if let Some(error) = obj.get("error") {
        debug!(name, %error, "skipping attachment reported as failed");
        return None;
    }

    let declared_size = obj.get("size").and_then(Value::as_u64);

    if let Some(access) = obj.get("mcp_access").and_then(Value::as_object) {
        let tool = text(access, &["tool"]).unwrap_or_else(|| DEFAULT_FILE_TOOL.to_string());
        let params = access.get("params").cloned().unwrap_or(Value::Object(Map::new()));
        return Some(Attachment {
            name,
            size: declared_size,
            category,
            access: AccessDescriptor::Tool { tool, params },
        });
    }

    if let Some(data) = obj.get("data").and_then(Value::as_str) {
        return Some(Attachment {
            name,
            size: declared_size.or_else(|| Some(base64_decoded_len(data))),
            category,
            access: AccessDescriptor::Inline {
                data: data.to_string(),
            },
        });
    }

    debug!(name, "attachment has neither data nor access pointer");
    None
}

/// Exact decoded length of standard padded base64 text.
fn base64_decoded_len(data: &str) -> u64 {
    let significant = data.bytes().filter(|b| !b.is_ascii_whitespace()).count();
    let padding = data.bytes().rev().take_while(|b| *b == b'=').count();
    ((significant / 4) * 3).saturating_sub(padding) as u64
}
