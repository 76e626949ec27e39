//! Insight models: what the model returns and what the sink stores
//!
//! The raw model output is deserialized into `RawInsight` and only becomes an
//! `InsightRow` after schema and taxonomy validation. The row's
//! `content_hash` is the idempotent upsert key.

use crate::models::CrmContext;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The five insight categories. Validation is exhaustive over this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    Pain,
    ProductGap,
    CompetitiveSignal,
    DealFriction,
    Faq,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::Pain => "pain",
            InsightType::ProductGap => "product_gap",
            InsightType::CompetitiveSignal => "competitive_signal",
            InsightType::DealFriction => "deal_friction",
            InsightType::Faq => "faq",
        }
    }
}

impl std::fmt::Display for InsightType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority signal on a product gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPriority {
    MustHave,
    NiceToHave,
    Dealbreaker,
}

impl GapPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            GapPriority::MustHave => "must_have",
            GapPriority::NiceToHave => "nice_to_have",
            GapPriority::Dealbreaker => "dealbreaker",
        }
    }
}

/// One insight exactly as the model returned it, before validation.
/// Unknown `insight_type` values fail deserialization, which drops the whole
/// response (schema violation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInsight {
    pub insight_type: InsightType,
    pub insight_subtype: String,
    #[serde(default)]
    pub module: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub verbatim_quote: Option<String>,
    pub confidence: f64,
    // competitive_signal fields
    #[serde(default)]
    pub competitor_name: Option<String>,
    #[serde(default)]
    pub competitor_relationship: Option<String>,
    // product_gap fields
    #[serde(default)]
    pub feature_name: Option<String>,
    #[serde(default)]
    pub gap_description: Option<String>,
    #[serde(default)]
    pub gap_priority: Option<GapPriority>,
    // faq fields
    #[serde(default)]
    pub faq_topic: Option<String>,
}

/// The response envelope the model must produce for one chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsResponse {
    pub insights: Vec<RawInsight>,
}

/// A validated, normalized insight ready for the persistence sink.
/// Never mutated after creation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InsightRow {
    pub content_hash: String,
    pub transcript_id: String,
    pub chunk_index: u32,
    // CRM context
    pub deal_id: Option<String>,
    pub deal_name: Option<String>,
    pub company_name: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub segment: Option<String>,
    pub amount: Option<f64>,
    pub deal_stage: Option<String>,
    pub deal_owner: Option<String>,
    pub call_date: Option<String>,
    // insight content
    pub insight_type: String,
    pub insight_subtype: String,
    pub module: Option<String>,
    pub summary: String,
    pub verbatim_quote: Option<String>,
    pub confidence: f64,
    pub competitor_name: Option<String>,
    pub competitor_relationship: Option<String>,
    pub feature_name: Option<String>,
    pub gap_description: Option<String>,
    pub gap_priority: Option<String>,
    pub faq_topic: Option<String>,
    // provenance
    pub model_used: String,
    pub prompt_version: String,
    pub batch_id: Option<String>,
}

impl InsightRow {
    /// Copy the CRM context fields onto a partially built row.
    pub fn apply_context(&mut self, metadata: &CrmContext) {
        self.deal_id = metadata.deal_id.clone();
        self.deal_name = metadata.deal_name.clone();
        self.company_name = metadata.company_name.clone();
        self.region = metadata.region.clone();
        self.country = metadata.country.clone();
        self.industry = metadata.industry.clone();
        self.company_size = metadata.company_size.clone();
        self.segment = metadata.segment.clone();
        self.amount = metadata.amount;
        self.deal_stage = metadata.deal_stage.clone();
        self.deal_owner = metadata.deal_owner.clone();
        self.call_date = metadata.call_date.clone();
    }
}
