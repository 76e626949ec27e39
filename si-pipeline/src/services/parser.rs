//! Response parsing and taxonomy validation
//!
//! Turns raw model output into DB-ready `InsightRow`s. Malformed output is
//! never an error at this layer: a chunk whose response fails to parse
//! contributes zero rows and a log line, and the run moves on. Valid insights
//! with an unknown module keep the insight and drop the module, except for
//! product gaps where the module is load-bearing.

use once_cell::sync::Lazy;
use regex::Regex;
use si_common::{content_hash, TaxonomyCatalog};

use crate::models::{CrmContext, InsightRow, InsightType, InsightsResponse, RawInsight};

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_]").unwrap());
static SLUG_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());

/// A feature code first seen in this run, pending persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeature {
    pub code: String,
    pub display_name: String,
    pub suggested_module: Option<String>,
}

pub struct InsightParser {
    catalog: TaxonomyCatalog,
    prompt_version: String,
    new_features: Vec<NewFeature>,
}

impl InsightParser {
    pub fn new(catalog: TaxonomyCatalog, prompt_version: &str) -> Self {
        Self {
            catalog,
            prompt_version: prompt_version.to_string(),
            new_features: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &TaxonomyCatalog {
        &self.catalog
    }

    /// Features discovered so far, in discovery order.
    pub fn new_features(&self) -> &[NewFeature] {
        &self.new_features
    }

    /// Parse one model response for one chunk. Returns only the insights
    /// that survive validation.
    pub fn parse_response(
        &mut self,
        raw_json: &str,
        transcript_id: &str,
        chunk_index: u32,
        metadata: &CrmContext,
        model_used: &str,
        batch_id: Option<&str>,
    ) -> Vec<InsightRow> {
        let response: InsightsResponse = match serde_json::from_str(raw_json) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::error!(
                    transcript_id,
                    chunk_index,
                    error = %err,
                    "Discarding unparseable model response"
                );
                return Vec::new();
            }
        };

        let raw_count = response.insights.len();
        let mut rows = Vec::with_capacity(raw_count);
        for insight in response.insights {
            if let Some(row) =
                self.normalize(insight, transcript_id, chunk_index, metadata, model_used, batch_id)
            {
                self.track_feature(&row);
                rows.push(row);
            }
        }

        tracing::info!(
            transcript_id,
            chunk_index,
            raw = raw_count,
            valid = rows.len(),
            "Parsed chunk response"
        );
        rows
    }

    /// Validate and normalize a single insight. None means dropped.
    fn normalize(
        &self,
        mut insight: RawInsight,
        transcript_id: &str,
        chunk_index: u32,
        metadata: &CrmContext,
        model_used: &str,
        batch_id: Option<&str>,
    ) -> Option<InsightRow> {
        let itype = insight.insight_type;
        let mut subtype = insight.insight_subtype.clone();
        let mut module = insight.module.clone();

        match itype {
            InsightType::Pain => {
                if !self.catalog.is_valid_pain(&subtype) {
                    tracing::warn!(subtype, "Unknown pain subtype, dropping insight");
                    return None;
                }
                // Fill the module from the taxonomy when the model omitted it.
                if module.is_none() {
                    module = self.catalog.module_for_pain(&subtype).map(String::from);
                }
            }
            InsightType::DealFriction => {
                if !self.catalog.is_valid_friction(&subtype) {
                    tracing::warn!(subtype, "Unknown deal_friction subtype, dropping insight");
                    return None;
                }
            }
            InsightType::Faq => {
                if !self.catalog.is_valid_faq(&subtype) {
                    tracing::warn!(subtype, "Unknown faq subtype, dropping insight");
                    return None;
                }
            }
            InsightType::CompetitiveSignal => {
                // Here the subtype is the relationship code. Models sometimes
                // put it in competitor_relationship instead; accept that.
                if !self.catalog.is_valid_relationship(&subtype) {
                    match insight.competitor_relationship.as_deref() {
                        Some(rel) if self.catalog.is_valid_relationship(rel) => {
                            subtype = rel.to_string();
                        }
                        _ => {
                            tracing::warn!(subtype, "Unknown competitive relationship, dropping insight");
                            return None;
                        }
                    }
                }
            }
            InsightType::ProductGap => {
                if module.is_none() {
                    tracing::warn!(
                        summary = %truncate(&insight.summary, 60),
                        "product_gap without module, dropping insight"
                    );
                    return None;
                }
                if let Some(name) = insight.feature_name.take() {
                    insight.feature_name = Some(to_slug(&name));
                }
            }
        }

        if let Some(code) = module.as_deref() {
            if !self.catalog.is_valid_module(code) {
                tracing::warn!(module = code, "Unknown module code");
                if itype == InsightType::ProductGap {
                    return None;
                }
                module = None;
            }
        }

        // Unmatched names pass through as reported so no signal is lost.
        let competitor_name = insight.competitor_name.as_deref().map(|name| {
            self.catalog
                .normalize_competitor(name)
                .unwrap_or(name)
                .to_string()
        });

        let content_hash = content_hash(
            transcript_id,
            chunk_index,
            itype.as_str(),
            &subtype,
            &insight.summary,
        );

        let mut row = InsightRow {
            content_hash,
            transcript_id: transcript_id.to_string(),
            chunk_index,
            deal_id: None,
            deal_name: None,
            company_name: None,
            region: None,
            country: None,
            industry: None,
            company_size: None,
            segment: None,
            amount: None,
            deal_stage: None,
            deal_owner: None,
            call_date: None,
            insight_type: itype.as_str().to_string(),
            insight_subtype: subtype,
            module,
            summary: insight.summary,
            verbatim_quote: insight.verbatim_quote,
            confidence: insight.confidence,
            competitor_name,
            competitor_relationship: insight.competitor_relationship,
            feature_name: insight.feature_name,
            gap_description: insight.gap_description,
            gap_priority: insight.gap_priority.map(|p| p.as_str().to_string()),
            faq_topic: insight.faq_topic,
            model_used: model_used.to_string(),
            prompt_version: self.prompt_version.clone(),
            batch_id: batch_id.map(String::from),
        };
        row.apply_context(metadata);
        Some(row)
    }

    /// Record a feature code the taxonomy has not seen before. Registration
    /// in the catalog keeps later chunks of the same run from re-reporting it.
    fn track_feature(&mut self, row: &InsightRow) {
        let Some(code) = row.feature_name.as_deref() else {
            return;
        };
        if code.is_empty() || self.catalog.is_known_feature(code) {
            return;
        }
        let display_name = title_case(code);
        self.catalog
            .register_feature(code, &display_name, row.module.as_deref());
        tracing::info!(code, "Discovered new feature code");
        self.new_features.push(NewFeature {
            code: code.to_string(),
            display_name,
            suggested_module: row.module.clone(),
        });
    }
}

/// Lowercase slug: non `[a-z0-9_]` squashed to single underscores, trimmed.
fn to_slug(text: &str) -> String {
    let lower = text.trim().to_lowercase();
    let replaced = NON_SLUG.replace_all(&lower, "_");
    let collapsed = SLUG_RUNS.replace_all(&replaced, "_");
    collapsed.trim_matches('_').to_string()
}

fn title_case(code: &str) -> String {
    code.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use si_common::TaxonomyCatalog;

    fn parser() -> InsightParser {
        InsightParser::new(TaxonomyCatalog::seed(), "v2.0")
    }

    fn response(insights: &str) -> String {
        format!("{{\"insights\": [{insights}]}}")
    }

    const PAIN: &str = r#"{
        "insight_type": "pain",
        "insight_subtype": "manual_processes",
        "summary": "HR team re-keys every hire into three systems",
        "verbatim_quote": "we type it all in three times",
        "confidence": 0.9
    }"#;

    #[test]
    fn unparseable_json_yields_no_rows() {
        let mut p = parser();
        let rows = p.parse_response(
            "{not json",
            "t1",
            0,
            &CrmContext::default(),
            "gpt-4o-mini",
            None,
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn valid_pain_passes_and_inherits_module() {
        let mut p = parser();
        let raw = response(PAIN);
        let rows = p.parse_response(&raw, "t1", 0, &CrmContext::default(), "gpt-4o-mini", None);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.insight_type, "pain");
        assert_eq!(row.insight_subtype, "manual_processes");
        // manual_processes is a general pain with no linked module
        assert!(row.module.is_none());
        assert_eq!(row.prompt_version, "v2.0");
        assert!(!row.content_hash.is_empty());
    }

    #[test]
    fn unknown_subtype_drops_the_insight_only() {
        let mut p = parser();
        let raw = response(&format!(
            r#"{{
                "insight_type": "pain",
                "insight_subtype": "made_up_pain",
                "summary": "nope",
                "confidence": 0.8
            }}, {PAIN}"#
        ));
        let rows = p.parse_response(&raw, "t1", 0, &CrmContext::default(), "gpt-4o-mini", None);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].insight_subtype, "manual_processes");
    }

    #[test]
    fn competitive_signal_falls_back_to_relationship_field() {
        let mut p = parser();
        let raw = response(
            r#"{
                "insight_type": "competitive_signal",
                "insight_subtype": "using_it_right_now",
                "competitor_name": "workday",
                "competitor_relationship": "currently_using",
                "summary": "They run Workday today",
                "confidence": 0.7
            }"#,
        );
        let rows = p.parse_response(&raw, "t1", 2, &CrmContext::default(), "gpt-4o-mini", None);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].insight_subtype, "currently_using");
        assert_eq!(rows[0].competitor_name.as_deref(), Some("Workday"));
    }

    #[test]
    fn unmatched_competitor_name_is_kept_verbatim() {
        let mut p = parser();
        let raw = response(
            r#"{
                "insight_type": "competitive_signal",
                "insight_subtype": "currently_using",
                "competitor_name": "NichePayrollCo",
                "summary": "They use a niche local vendor",
                "confidence": 0.6
            }"#,
        );
        let rows = p.parse_response(&raw, "t1", 0, &CrmContext::default(), "gpt-4o-mini", None);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].competitor_name.as_deref(), Some("NichePayrollCo"));
    }

    #[test]
    fn product_gap_without_module_is_dropped() {
        let mut p = parser();
        let raw = response(
            r#"{
                "insight_type": "product_gap",
                "insight_subtype": "missing_feature",
                "summary": "Wants shift bidding",
                "confidence": 0.8
            }"#,
        );
        let rows = p.parse_response(&raw, "t1", 0, &CrmContext::default(), "gpt-4o-mini", None);
        assert!(rows.is_empty());
    }

    #[test]
    fn unknown_module_is_stripped_except_for_product_gaps() {
        let mut p = parser();
        let raw = response(&format!(
            r#"{{
                "insight_type": "deal_friction",
                "insight_subtype": "budget",
                "module": "not_a_module",
                "summary": "Price pushback",
                "confidence": 0.6
            }}, {{
                "insight_type": "product_gap",
                "insight_subtype": "missing_feature",
                "module": "not_a_module",
                "summary": "Wants a thing",
                "confidence": 0.6
            }}"#
        ));
        let rows = p.parse_response(&raw, "t1", 0, &CrmContext::default(), "gpt-4o-mini", None);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].insight_type, "deal_friction");
        assert!(rows[0].module.is_none());
    }

    #[test]
    fn new_feature_is_slugged_registered_once() {
        let mut p = parser();
        let gap = r#"{
                "insight_type": "product_gap",
                "insight_subtype": "missing_feature",
                "module": "time_tracking",
                "feature_name": "Shift  Bidding!",
                "summary": "Wants shift bidding",
                "gap_priority": "must_have",
                "confidence": 0.8
            }"#;
        let raw = response(&format!("{gap}, {gap}"));
        let rows = p.parse_response(&raw, "t1", 0, &CrmContext::default(), "gpt-4o-mini", None);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].feature_name.as_deref(), Some("shift_bidding"));
        assert_eq!(rows[0].gap_priority.as_deref(), Some("must_have"));
        assert_eq!(p.new_features().len(), 1);
        assert_eq!(p.new_features()[0].code, "shift_bidding");
        assert_eq!(p.new_features()[0].display_name, "Shift Bidding");
    }

    #[test]
    fn to_slug_normalizes() {
        assert_eq!(to_slug("Shift  Bidding!"), "shift_bidding");
        assert_eq!(to_slug("  API v2 Access "), "api_v2_access");
        assert_eq!(to_slug("___"), "");
    }
}
