// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-backed query extraction with a literal-keyword fallback.
//!
//! One provider call per extraction, no retries. Anything the provider gets
//! wrong degrades the query, never the search.

use std::str::FromStr;
use std::sync::Arc;

use jgrants_config::model::ExtractionConfig;
use jgrants_core::ProviderAdapter;
use jgrants_core::types::{
    AreaRegion, EmployeeBand, Industry, ProviderMessage, ProviderRequest, SearchQuery, UsePurpose,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::prompt;

/// Why an extraction fell back to the literal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// Nothing but whitespace was typed.
    EmptyInput,
    /// Extraction is switched off in configuration.
    Disabled,
    /// No provider could be constructed (usually a missing API key).
    NoProvider,
    /// The provider call itself failed.
    ProviderFailed(String),
    /// The provider answered but no JSON object could be read from it.
    Unparseable,
    /// The answer parsed but carried no usable keyword.
    MissingKeyword,
}

impl std::fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "empty input"),
            Self::Disabled => write!(f, "extraction disabled"),
            Self::NoProvider => write!(f, "no provider configured"),
            Self::ProviderFailed(msg) => write!(f, "provider failed: {msg}"),
            Self::Unparseable => write!(f, "provider output unparseable"),
            Self::MissingKeyword => write!(f, "provider returned no keyword"),
        }
    }
}

/// Result of [`QueryExtractor::extract_with_outcome`].
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub query: SearchQuery,
    /// `None` when the provider's answer was used.
    pub degraded: Option<DegradeReason>,
}

/// Tunables taken from `[extraction]`.
#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub enabled: bool,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub keyword_max_chars: usize,
    pub fallback_keyword: String,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self::from(&ExtractionConfig::default())
    }
}

impl From<&ExtractionConfig> for ExtractorSettings {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            enabled: config.enabled,
            model: Some(config.model.clone()),
            max_tokens: config.max_tokens,
            keyword_max_chars: config.keyword_max_chars,
            fallback_keyword: config.fallback_keyword.clone(),
        }
    }
}

/// Turns free text into a [`SearchQuery`].
pub struct QueryExtractor {
    provider: Option<Arc<dyn ProviderAdapter>>,
    settings: ExtractorSettings,
}

impl QueryExtractor {
    pub fn new(provider: Option<Arc<dyn ProviderAdapter>>, settings: ExtractorSettings) -> Self {
        Self { provider, settings }
    }

    pub fn from_config(config: &ExtractionConfig, provider: Option<Arc<dyn ProviderAdapter>>) -> Self {
        Self::new(provider, ExtractorSettings::from(config))
    }

    pub fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    /// Whether a provider will be consulted at all.
    pub fn has_provider(&self) -> bool {
        self.settings.enabled && self.provider.is_some()
    }

    /// Extracts a query. Never fails; the keyword is always searchable.
    pub async fn extract(&self, text: &str) -> SearchQuery {
        self.extract_with_outcome(text).await.query
    }

    /// Like [`extract`](Self::extract), also reporting whether the provider's
    /// answer was used.
    pub async fn extract_with_outcome(&self, text: &str) -> Extraction {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return self.degrade(trimmed, DegradeReason::EmptyInput);
        }
        if !self.settings.enabled {
            return self.degrade(trimmed, DegradeReason::Disabled);
        }
        let Some(provider) = self.provider.as_ref() else {
            return self.degrade(trimmed, DegradeReason::NoProvider);
        };

        let request = ProviderRequest {
            model: self.settings.model.clone(),
            system_prompt: Some(prompt::instructions()),
            messages: vec![ProviderMessage {
                role: "user".to_string(),
                content: trimmed.to_string(),
            }],
            max_tokens: self.settings.max_tokens,
            output_schema: Some(prompt::output_schema()),
        };

        let response = match provider.complete(request).await {
            Ok(response) => response,
            Err(e) => return self.degrade(trimmed, DegradeReason::ProviderFailed(e.to_string())),
        };

        let fields = match response.structured {
            Some(value @ Value::Object(_)) => Some(value),
            _ => parse_json_object(&response.content),
        };
        let Some(fields) = fields else {
            debug!(content = %response.content, "provider answer had no JSON object");
            return self.degrade(trimmed, DegradeReason::Unparseable);
        };

        let mut query = query_from_fields(&fields);
        let keyword_ok = query.keyword.chars().count() >= SearchQuery::MIN_KEYWORD_CHARS;
        if !keyword_ok {
            query.keyword = self.literal_keyword(trimmed);
            warn!(keyword = %query.keyword, "extracted keyword missing or too short, using input");
            return Extraction {
                query,
                degraded: Some(DegradeReason::MissingKeyword),
            };
        }

        debug!(?query, "query extracted");
        Extraction {
            query,
            degraded: None,
        }
    }

    fn degrade(&self, input: &str, reason: DegradeReason) -> Extraction {
        let query = SearchQuery::new(self.literal_keyword(input));
        match reason {
            DegradeReason::EmptyInput | DegradeReason::Disabled => {
                debug!(%reason, keyword = %query.keyword, "using literal keyword")
            }
            _ => warn!(%reason, keyword = %query.keyword, "query extraction degraded"),
        }
        Extraction {
            query,
            degraded: Some(reason),
        }
    }

    /// The input cut to `keyword_max_chars`, or the fallback keyword when
    /// that is too short to search with.
    fn literal_keyword(&self, input: &str) -> String {
        let truncated: String = input
            .trim()
            .chars()
            .take(self.settings.keyword_max_chars)
            .collect();
        let truncated = truncated.trim_end().to_string();
        if truncated.chars().count() >= SearchQuery::MIN_KEYWORD_CHARS {
            truncated
        } else {
            self.settings.fallback_keyword.clone()
        }
    }
}

/// Pulls the first JSON object out of free-form text.
///
/// Tolerates code fences and prose before or after the object.
fn parse_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed);

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end < start {
        return None;
    }
    match serde_json::from_str::<Value>(&unfenced[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "provider JSON did not parse");
            None
        }
    }
}

/// Builds a query from loosely typed fields, dropping values outside the
/// closed sets. The keyword may come back empty.
fn query_from_fields(fields: &Value) -> SearchQuery {
    let keyword = string_field(fields, &["keyword"])
        .map(|(_, k)| k.trim().to_string())
        .unwrap_or_default();
    let mut query = SearchQuery::new(keyword);
    query.industry = enum_field::<Industry>(fields, &["industry"]);
    query.employee_band =
        enum_field::<EmployeeBand>(fields, &["employee_band", "target_number_of_employees"]);
    query.area_region = enum_field::<AreaRegion>(fields, &["area_region", "target_area_search"]);
    query.use_purpose = enum_field::<UsePurpose>(fields, &["use_purpose"]);
    query
}

fn string_field<'a>(fields: &'a Value, keys: &[&'a str]) -> Option<(&'a str, &'a str)> {
    keys.iter().find_map(|key| {
        fields
            .get(*key)
            .and_then(Value::as_str)
            .map(|value| (*key, value))
    })
}

fn enum_field<E: FromStr>(fields: &Value, keys: &[&str]) -> Option<E> {
    let (key, raw) = string_field(fields, keys)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match E::from_str(raw) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(field = key, value = raw, "dropping value outside the allowed set");
            None
        }
    }
}
