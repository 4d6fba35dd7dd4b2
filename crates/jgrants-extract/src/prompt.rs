// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Instruction text and output schema sent to the provider.

use jgrants_core::types::{AreaRegion, EmployeeBand, Industry, OutputSchema, UsePurpose};
use schemars::JsonSchema;
use serde_json::Value;
use strum::IntoEnumIterator;

/// Name of the tool the provider is forced to call.
pub const SCHEMA_TOOL_NAME: &str = "search_query";

/// Shape the provider is asked to produce. Only used to derive the schema;
/// answers are parsed leniently so one bad field does not void the rest.
#[derive(Debug, JsonSchema)]
pub struct QueryFields {
    /// Short search keyword, at least 2 characters (e.g. "DX", "設備投資").
    pub keyword: String,
    /// Industry of the applicant.
    pub industry: Option<Industry>,
    /// Employee-count ceiling of the applicant.
    pub employee_band: Option<EmployeeBand>,
    /// Region where the applicant operates.
    pub area_region: Option<AreaRegion>,
    /// What the applicant wants to use the subsidy for.
    pub use_purpose: Option<UsePurpose>,
}

/// JSON schema of [`QueryFields`] as a tool input schema.
pub fn output_schema() -> OutputSchema {
    let mut schema: Value = serde_json::to_value(schemars::schema_for!(QueryFields))
        .unwrap_or_else(|_| Value::Object(Default::default()));
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
    }
    OutputSchema {
        name: SCHEMA_TOOL_NAME.to_string(),
        description: "Structured search conditions for the jGrants subsidy catalog".to_string(),
        schema,
    }
}

fn labels<E: IntoEnumIterator + ToString>() -> String {
    E::iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" / ")
}

/// System prompt describing the fields, their closed value sets and the
/// synonym rules.
pub fn instructions() -> String {
    format!(
        r#"You convert a Japanese subsidy search request into search conditions for the jGrants catalog.

Fields:
- keyword (required): a short search term of at least 2 characters taken from the request.
- industry: one of {industries}
- employee_band: one of {bands}
- area_region: one of {areas}
- use_purpose: one of {purposes}

Rules:
- Use only the listed values, copied exactly. Omit a field when the request does not determine it.
- 小規模事業者 or 小規模企業 means employee_band 20名以下.
- 中小企業 means employee_band 300名以下.
- デジタル化, DX, IT導入 or システム導入 mean use_purpose 設備整備・IT導入をしたい.
- 創業, 起業 or 新規事業 mean use_purpose 新たな事業を行いたい.
- 海外展開 or 輸出 mean use_purpose 販路拡大・海外展開をしたい.
- A prefecture or city maps to the region that contains it (東京 -> 関東・甲信越地方, 大阪 -> 近畿地方).

Answer by calling the {tool} tool. If you cannot call tools, answer with a single JSON object with the same fields and nothing else."#,
        industries = labels::<Industry>(),
        bands = labels::<EmployeeBand>(),
        areas = labels::<AreaRegion>(),
        purposes = labels::<UsePurpose>(),
        tool = SCHEMA_TOOL_NAME,
    )
}
