// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data contracts shared by the transports, the extractor and the normalizer.
//!
//! Closed enumerations serialize to the Japanese labels the upstream API
//! accepts verbatim as query values.

use chrono::{DateTime, FixedOffset};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

use crate::error::JgrantsError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    /// A subsidy transport (direct API or protocol server).
    Transport,
    /// A language-understanding provider.
    Provider,
}

// --- Closed enumerations ---

/// Target industry (JSIC major groups as labelled by jGrants).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub enum Industry {
    #[serde(rename = "農業、林業")]
    #[strum(serialize = "農業、林業")]
    AgricultureForestry,
    #[serde(rename = "漁業")]
    #[strum(serialize = "漁業")]
    Fishery,
    #[serde(rename = "鉱業、採石業、砂利採取業")]
    #[strum(serialize = "鉱業、採石業、砂利採取業")]
    Mining,
    #[serde(rename = "建設業")]
    #[strum(serialize = "建設業")]
    Construction,
    #[serde(rename = "製造業")]
    #[strum(serialize = "製造業")]
    Manufacturing,
    #[serde(rename = "電気・ガス・熱供給・水道業")]
    #[strum(serialize = "電気・ガス・熱供給・水道業")]
    Utilities,
    #[serde(rename = "情報通信業")]
    #[strum(serialize = "情報通信業")]
    InformationCommunications,
    #[serde(rename = "運輸業、郵便業")]
    #[strum(serialize = "運輸業、郵便業")]
    TransportPostal,
    #[serde(rename = "卸売業、小売業")]
    #[strum(serialize = "卸売業、小売業")]
    WholesaleRetail,
    #[serde(rename = "金融業、保険業")]
    #[strum(serialize = "金融業、保険業")]
    FinanceInsurance,
    #[serde(rename = "不動産業、物品賃貸業")]
    #[strum(serialize = "不動産業、物品賃貸業")]
    RealEstateLeasing,
    #[serde(rename = "学術研究、専門・技術サービス業")]
    #[strum(serialize = "学術研究、専門・技術サービス業")]
    ScientificProfessional,
    #[serde(rename = "宿泊業、飲食サービス業")]
    #[strum(serialize = "宿泊業、飲食サービス業")]
    AccommodationFood,
    #[serde(rename = "生活関連サービス業、娯楽業")]
    #[strum(serialize = "生活関連サービス業、娯楽業")]
    LifestyleEntertainment,
    #[serde(rename = "教育、学習支援業")]
    #[strum(serialize = "教育、学習支援業")]
    Education,
    #[serde(rename = "医療、福祉")]
    #[strum(serialize = "医療、福祉")]
    MedicalWelfare,
    #[serde(rename = "複合サービス事業")]
    #[strum(serialize = "複合サービス事業")]
    CompoundServices,
    #[serde(rename = "サービス業（他に分類されないもの）")]
    #[strum(serialize = "サービス業（他に分類されないもの）")]
    OtherServices,
}

/// Employee-count ceiling of the applicant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub enum EmployeeBand {
    #[serde(rename = "従業員数の制約なし")]
    #[strum(serialize = "従業員数の制約なし")]
    Unrestricted,
    #[serde(rename = "5名以下")]
    #[strum(serialize = "5名以下")]
    UpTo5,
    #[serde(rename = "20名以下")]
    #[strum(serialize = "20名以下")]
    UpTo20,
    #[serde(rename = "50名以下")]
    #[strum(serialize = "50名以下")]
    UpTo50,
    #[serde(rename = "100名以下")]
    #[strum(serialize = "100名以下")]
    UpTo100,
    #[serde(rename = "300名以下")]
    #[strum(serialize = "300名以下")]
    UpTo300,
    #[serde(rename = "900名以下")]
    #[strum(serialize = "900名以下")]
    UpTo900,
    #[serde(rename = "901名以上")]
    #[strum(serialize = "901名以上")]
    Over900,
}

/// Target region.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub enum AreaRegion {
    #[serde(rename = "全国")]
    #[strum(serialize = "全国")]
    Nationwide,
    #[serde(rename = "北海道地方")]
    #[strum(serialize = "北海道地方")]
    Hokkaido,
    #[serde(rename = "東北地方")]
    #[strum(serialize = "東北地方")]
    Tohoku,
    #[serde(rename = "関東・甲信越地方")]
    #[strum(serialize = "関東・甲信越地方")]
    KantoKoshinetsu,
    #[serde(rename = "東海・北陸地方")]
    #[strum(serialize = "東海・北陸地方")]
    TokaiHokuriku,
    #[serde(rename = "近畿地方")]
    #[strum(serialize = "近畿地方")]
    Kinki,
    #[serde(rename = "中国地方")]
    #[strum(serialize = "中国地方")]
    Chugoku,
    #[serde(rename = "四国地方")]
    #[strum(serialize = "四国地方")]
    Shikoku,
    #[serde(rename = "九州・沖縄地方")]
    #[strum(serialize = "九州・沖縄地方")]
    KyushuOkinawa,
}

/// What the applicant wants to use the subsidy for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub enum UsePurpose {
    #[serde(rename = "新たな事業を行いたい")]
    #[strum(serialize = "新たな事業を行いたい")]
    NewBusiness,
    #[serde(rename = "販路拡大・海外展開をしたい")]
    #[strum(serialize = "販路拡大・海外展開をしたい")]
    SalesExpansion,
    #[serde(rename = "イベント・事業運営支援がほしい")]
    #[strum(serialize = "イベント・事業運営支援がほしい")]
    EventSupport,
    #[serde(rename = "事業を引き継ぎたい")]
    #[strum(serialize = "事業を引き継ぎたい")]
    Succession,
    #[serde(rename = "研究開発・実証事業を行いたい")]
    #[strum(serialize = "研究開発・実証事業を行いたい")]
    ResearchDevelopment,
    #[serde(rename = "人材育成を行いたい")]
    #[strum(serialize = "人材育成を行いたい")]
    HumanResources,
    #[serde(rename = "資金繰りを改善したい")]
    #[strum(serialize = "資金繰りを改善したい")]
    CashFlow,
    #[serde(rename = "設備整備・IT導入をしたい")]
    #[strum(serialize = "設備整備・IT導入をしたい")]
    EquipmentIt,
    #[serde(rename = "雇用・職場環境を改善したい")]
    #[strum(serialize = "雇用・職場環境を改善したい")]
    Employment,
    #[serde(rename = "エコ・SDGs活動支援がほしい")]
    #[strum(serialize = "エコ・SDGs活動支援がほしい")]
    EcoSdgs,
    #[serde(rename = "災害（自然災害、感染症等）支援がほしい")]
    #[strum(serialize = "災害（自然災害、感染症等）支援がほしい")]
    DisasterRelief,
    #[serde(rename = "教育・子育て・少子化支援がほしい")]
    #[strum(serialize = "教育・子育て・少子化支援がほしい")]
    ChildcareEducation,
    #[serde(rename = "スポーツ・文化支援がほしい")]
    #[strum(serialize = "スポーツ・文化支援がほしい")]
    SportsCulture,
    #[serde(rename = "安全・防災対策支援がほしい")]
    #[strum(serialize = "安全・防災対策支援がほしい")]
    SafetyPrevention,
    #[serde(rename = "まちづくり・地域振興支援がほしい")]
    #[strum(serialize = "まちづくり・地域振興支援がほしい")]
    CommunityDevelopment,
}

/// Sort key accepted by the upstream API.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum SortField {
    #[default]
    #[serde(rename = "acceptance_end_datetime")]
    #[strum(serialize = "acceptance_end_datetime")]
    EndDate,
    #[serde(rename = "acceptance_start_datetime")]
    #[strum(serialize = "acceptance_start_datetime")]
    StartDate,
    #[serde(rename = "created_date")]
    #[strum(serialize = "created_date")]
    CreatedDate,
}

/// Sort direction.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "ASC")]
    #[strum(serialize = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    #[strum(serialize = "DESC")]
    Desc,
}

// --- Query ---

/// A structured query against the subsidy catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free keyword, at least [`SearchQuery::MIN_KEYWORD_CHARS`] characters.
    pub keyword: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<Industry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_band: Option<EmployeeBand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_region: Option<AreaRegion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_purpose: Option<UsePurpose>,
    #[serde(default)]
    pub sort_field: SortField,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default = "default_accepting_only")]
    pub accepting_only: bool,
}

fn default_accepting_only() -> bool {
    true
}

impl SearchQuery {
    /// The upstream rejects shorter keywords.
    pub const MIN_KEYWORD_CHARS: usize = 2;

    /// Creates a query with the catalog defaults: end date ascending, accepting only.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            industry: None,
            employee_band: None,
            area_region: None,
            use_purpose: None,
            sort_field: SortField::default(),
            sort_order: SortOrder::default(),
            accepting_only: default_accepting_only(),
        }
    }

    /// Checks the keyword invariant before the query reaches a transport.
    pub fn validate(&self) -> Result<(), JgrantsError> {
        let chars = self.keyword.trim().chars().count();
        if chars < Self::MIN_KEYWORD_CHARS {
            return Err(JgrantsError::InvalidQuery(format!(
                "keyword must be at least {} characters, got {chars}",
                Self::MIN_KEYWORD_CHARS
            )));
        }
        Ok(())
    }

    /// Flattens the query into the parameter names both transports understand.
    pub fn to_query_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.push("keyword", self.keyword.trim());
        params.push("sort", self.sort_field.to_string());
        params.push("order", self.sort_order.to_string());
        params.push("acceptance", self.accepting_only);
        if let Some(industry) = self.industry {
            params.push("industry", industry.to_string());
        }
        if let Some(band) = self.employee_band {
            params.push("target_number_of_employees", band.to_string());
        }
        if let Some(area) = self.area_region {
            params.push("target_area_search", area.to_string());
        }
        if let Some(purpose) = self.use_purpose {
            params.push("use_purpose", purpose.to_string());
        }
        params
    }
}

/// A scalar query-string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    /// Serialized as `"1"` / `"0"`, the upstream's numeric flag convention.
    Bool(bool),
}

impl QueryValue {
    /// Renders the value as a query-string scalar.
    pub fn to_query_scalar(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(n) => n.to_string(),
            Self::Bool(true) => "1".to_string(),
            Self::Bool(false) => "0".to_string(),
        }
    }

    /// Renders the value as a JSON tool argument (flags stay numeric).
    pub fn to_json(&self) -> Value {
        match self {
            Self::Str(s) => Value::String(s.clone()),
            Self::Int(n) => Value::from(*n),
            Self::Bool(b) => Value::from(i64::from(*b)),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Ordered, flat key/value parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, QueryValue)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Looks up the first value for `key`.
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts to a JSON object for tool arguments.
    pub fn to_json_object(&self) -> Value {
        let map = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        Value::Object(map)
    }
}

// --- Results ---

/// A subsidy ceiling: a number when the upstream value parses, otherwise the raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Unparsed(String),
}

impl Amount {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Unparsed(_) => None,
        }
    }
}

/// Whether the subsidy currently accepts applications.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AcceptanceStatus {
    Accepting,
    Closed,
    #[default]
    Unknown,
}

/// One row of a search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubsidySummary {
    pub id: Option<String>,
    pub title: Option<String>,
    pub acceptance_start: Option<DateTime<FixedOffset>>,
    pub acceptance_end: Option<DateTime<FixedOffset>>,
    pub max_limit_amount: Option<Amount>,
    pub target_area: Option<String>,
    pub target_industry: Option<String>,
}

/// Group an attachment is listed under.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttachmentCategory {
    ApplicationGuidelines,
    OutlineOfGrant,
    ApplicationForm,
    Other,
}

/// How attachment content can be obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessDescriptor {
    /// Base64 content embedded in the detail payload.
    Inline { data: String },
    /// A tool invocation on the intermediary server that renders the file.
    Tool { tool: String, params: Value },
}

/// A reference to a file attached to a subsidy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub size: Option<u64>,
    pub category: AttachmentCategory,
    pub access: AccessDescriptor,
}

/// Full record of one subsidy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubsidyDetail {
    #[serde(flatten)]
    pub summary: SubsidySummary,
    pub status: AcceptanceStatus,
    pub description: Option<String>,
    pub application_url: Option<String>,
    pub target_employees: Option<String>,
    pub use_purpose: Option<String>,
    pub attachments: Vec<Attachment>,
    pub save_directory: Option<String>,
}

/// Attachment content prepared for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedContent {
    Markdown { name: Option<String>, text: String },
    Binary { name: Option<String>, bytes: Vec<u8> },
    Unavailable { name: Option<String>, reason: String },
}

// --- Provider types ---

/// A single message sent to a language-understanding provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMessage {
    /// Role: "user" or "assistant".
    pub role: String,
    pub content: String,
}

/// A JSON schema the provider is asked to conform its answer to.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

/// A request to a language-understanding provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// Overrides the provider's default model when set.
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub messages: Vec<ProviderMessage>,
    pub max_tokens: u32,
    /// Requests schema-constrained output when set.
    pub output_schema: Option<OutputSchema>,
}

/// A response from a language-understanding provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub id: String,
    /// Concatenated free-form text.
    pub content: String,
    /// Schema-constrained result, when the provider returned one.
    pub structured: Option<Value>,
    pub model: String,
    pub stop_reason: Option<String>,
}

// --- Overview ---

/// Catalog statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overview {
    pub total_count: u64,
    pub by_deadline_period: DeadlineBuckets,
    pub by_amount_range: AmountBuckets,
    pub urgent_deadlines: Vec<UrgentDeadline>,
}

/// Accepting subsidies by the month their acceptance ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlineBuckets {
    pub this_month: u64,
    pub next_month: u64,
    pub after_next_month: u64,
}

/// Subsidies by ceiling amount in yen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmountBuckets {
    pub under_1m: u64,
    pub under_10m: u64,
    pub under_100m: u64,
    pub over_100m: u64,
}

/// A subsidy whose acceptance closes soon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrgentDeadline {
    pub id: String,
    pub title: String,
    pub days_left: i64,
}
