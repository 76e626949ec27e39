//! Prompt construction for the extraction requests
//!
//! The system prompt carries the full taxonomy and output contract and is
//! built once per run; only the user prompt varies per chunk.

use crate::models::CrmContext;
use serde_json::{json, Value};
use si_common::TaxonomyCatalog;

/// Build the system prompt: role, taxonomy code lists, output instructions.
pub fn build_system_prompt(catalog: &TaxonomyCatalog) -> String {
    let mut sections = vec![header()];
    sections.push(code_section(
        "Product modules",
        catalog.modules().map(|(code, entry)| {
            format!("- {} ({}; category: {})", code, entry.display_name, entry.hr_category)
        }),
    ));
    sections.push(code_section(
        "Pain subtypes",
        catalog.pains().map(|(code, entry)| match &entry.module {
            Some(module) => format!(
                "- {} ({}; theme: {}; module: {})",
                code, entry.display_name, entry.theme, module
            ),
            None => format!("- {} ({}; theme: {})", code, entry.display_name, entry.theme),
        }),
    ));
    sections.push(code_section(
        "Deal friction subtypes",
        catalog.frictions().map(|(code, display)| format!("- {} ({})", code, display)),
    ));
    sections.push(code_section(
        "FAQ subtypes",
        catalog.faqs().map(|(code, display)| format!("- {} ({})", code, display)),
    ));
    sections.push(code_section(
        "Competitive relationships",
        catalog.relationships().map(|(code, display)| format!("- {} ({})", code, display)),
    ));
    sections.push(code_section(
        "Seed feature codes (product_gap)",
        catalog.features().map(|(code, entry)| format!("- {} ({})", code, entry.display_name)),
    ));
    sections.push(code_section(
        "Known competitors",
        catalog.competitors().map(|name| format!("- {name}")),
    ));
    sections.push(output_instructions());
    sections.join("\n\n")
}

fn header() -> String {
    "You are an analyst extracting structured sales insights from B2B call \
     transcripts for an HR software vendor. Identify every distinct insight in \
     the transcript chunk and classify it using ONLY the taxonomy codes listed \
     below. Emit nothing outside the taxonomy."
        .to_string()
}

fn code_section<I: Iterator<Item = String>>(title: &str, lines: I) -> String {
    let mut body: Vec<String> = lines.collect();
    body.sort();
    format!("## {}\n{}", title, body.join("\n"))
}

fn output_instructions() -> String {
    "## Output\n\
     Return a JSON object with an `insights` array. Each insight has:\n\
     - insight_type: one of pain, product_gap, competitive_signal, deal_friction, faq\n\
     - insight_subtype: a code from the matching taxonomy above \
     (for competitive_signal use a relationship code)\n\
     - module: a module code when the insight concerns a specific module; \
     REQUIRED for product_gap\n\
     - summary: 1-2 sentences\n\
     - verbatim_quote: the supporting quote, when one exists\n\
     - confidence: 0.0-1.0\n\
     - competitor_name / competitor_relationship: for competitive_signal\n\
     - feature_name (a seed code or a new lowercase slug), gap_description, \
     gap_priority (must_have | nice_to_have | dealbreaker): for product_gap\n\
     - faq_topic: for faq\n\
     Set every unused field to null. Report only what the transcript supports."
        .to_string()
}

/// Build the per-chunk user prompt: labeled CRM context plus the transcript.
pub fn build_user_prompt(chunk_text: &str, metadata: &CrmContext) -> String {
    let fields: [(&str, Option<&str>); 9] = [
        ("Deal", metadata.deal_name.as_deref()),
        ("Company", metadata.company_name.as_deref()),
        ("Region", metadata.region.as_deref()),
        ("Country", metadata.country.as_deref()),
        ("Industry", metadata.industry.as_deref()),
        ("Company size", metadata.company_size.as_deref()),
        ("Stage", metadata.deal_stage.as_deref()),
        ("Owner", metadata.deal_owner.as_deref()),
        ("Call date", metadata.call_date.as_deref()),
    ];

    let mut context: Vec<String> = fields
        .iter()
        .filter_map(|(label, value)| value.map(|v| format!("- {label}: {v}")))
        .collect();
    if let Some(amount) = metadata.amount {
        context.push(format!("- Amount: {amount}"));
    }
    let context_str = if context.is_empty() {
        "- No CRM context available".to_string()
    } else {
        context.join("\n")
    };

    format!("## Deal context\n\n{context_str}\n\n## Transcript\n\n{chunk_text}")
}

/// Strict structured-output schema for the insights envelope: every property
/// required, optionals nullable, no additional properties.
pub fn response_format_schema() -> Value {
    fn nullable_string() -> Value {
        json!({ "type": ["string", "null"] })
    }
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "transcript_insights",
            "strict": true,
            "schema": {
                "type": "object",
                "additionalProperties": false,
                "required": ["insights"],
                "properties": {
                    "insights": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "additionalProperties": false,
                            "required": [
                                "insight_type", "insight_subtype", "module", "summary",
                                "verbatim_quote", "confidence", "competitor_name",
                                "competitor_relationship", "feature_name",
                                "gap_description", "gap_priority", "faq_topic"
                            ],
                            "properties": {
                                "insight_type": {
                                    "type": "string",
                                    "enum": ["pain", "product_gap", "competitive_signal",
                                             "deal_friction", "faq"]
                                },
                                "insight_subtype": { "type": "string" },
                                "module": nullable_string(),
                                "summary": { "type": "string" },
                                "verbatim_quote": nullable_string(),
                                "confidence": { "type": "number" },
                                "competitor_name": nullable_string(),
                                "competitor_relationship": nullable_string(),
                                "feature_name": nullable_string(),
                                "gap_description": nullable_string(),
                                "gap_priority": {
                                    "type": ["string", "null"],
                                    "enum": ["must_have", "nice_to_have", "dealbreaker", null]
                                },
                                "faq_topic": nullable_string()
                            }
                        }
                    }
                }
            }
        }
    })
}
