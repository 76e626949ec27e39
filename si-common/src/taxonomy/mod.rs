//! Taxonomy catalog: the reference set of valid classification codes.
//!
//! The catalog is injected wherever validation happens rather than read from
//! ambient module state, so the validator can run against a fixture catalog
//! in tests. The seed content ships with the crate; the feature list grows at
//! runtime as the extractor surfaces feature names nobody seeded.

mod seed;

use std::collections::HashMap;

/// A pain subtype entry; `module` links the pain to the product module it
/// implies, used to auto-fill a missing module on pain insights.
#[derive(Debug, Clone)]
pub struct PainEntry {
    pub display_name: String,
    pub theme: String,
    pub module: Option<String>,
}

/// A product module entry.
#[derive(Debug, Clone)]
pub struct ModuleEntry {
    pub display_name: String,
    pub hr_category: String,
}

/// A feature catalog entry. Non-seed entries were discovered at runtime.
#[derive(Debug, Clone)]
pub struct FeatureEntry {
    pub display_name: String,
    pub suggested_module: Option<String>,
    pub is_seed: bool,
}

/// Read-mostly catalog of valid codes per category plus the competitor list.
///
/// Cloning is cheap enough for a per-run working copy; `register_feature`
/// mutates only that copy (the durable registration is a DB upsert done by
/// the caller).
#[derive(Debug, Clone, Default)]
pub struct TaxonomyCatalog {
    pains: HashMap<String, PainEntry>,
    frictions: HashMap<String, String>,
    faqs: HashMap<String, String>,
    relationships: HashMap<String, String>,
    modules: HashMap<String, ModuleEntry>,
    features: HashMap<String, FeatureEntry>,
    competitors: Vec<String>,
}

impl TaxonomyCatalog {
    /// The full built-in seed catalog.
    pub fn seed() -> Self {
        let pains = seed::PAIN_SUBTYPES
            .iter()
            .map(|(code, display, theme, module)| {
                (
                    code.to_string(),
                    PainEntry {
                        display_name: display.to_string(),
                        theme: theme.to_string(),
                        module: module.map(str::to_string),
                    },
                )
            })
            .collect();
        let modules = seed::MODULES
            .iter()
            .map(|(code, display, category)| {
                (
                    code.to_string(),
                    ModuleEntry {
                        display_name: display.to_string(),
                        hr_category: category.to_string(),
                    },
                )
            })
            .collect();
        let features = seed::SEED_FEATURES
            .iter()
            .map(|(code, display, module)| {
                (
                    code.to_string(),
                    FeatureEntry {
                        display_name: display.to_string(),
                        suggested_module: module.map(str::to_string),
                        is_seed: true,
                    },
                )
            })
            .collect();
        Self {
            pains,
            frictions: pair_map(seed::DEAL_FRICTION_SUBTYPES),
            faqs: pair_map(seed::FAQ_SUBTYPES),
            relationships: pair_map(seed::COMPETITIVE_RELATIONSHIPS),
            modules,
            features,
            competitors: seed::COMPETITORS.iter().map(|(name, _)| name.to_string()).collect(),
        }
    }

    pub fn is_valid_pain(&self, code: &str) -> bool {
        self.pains.contains_key(code)
    }

    pub fn is_valid_friction(&self, code: &str) -> bool {
        self.frictions.contains_key(code)
    }

    pub fn is_valid_faq(&self, code: &str) -> bool {
        self.faqs.contains_key(code)
    }

    pub fn is_valid_relationship(&self, code: &str) -> bool {
        self.relationships.contains_key(code)
    }

    pub fn is_valid_module(&self, code: &str) -> bool {
        self.modules.contains_key(code)
    }

    pub fn is_known_feature(&self, code: &str) -> bool {
        self.features.contains_key(code)
    }

    /// Module a pain subtype implies, if any.
    pub fn module_for_pain(&self, code: &str) -> Option<&str> {
        self.pains.get(code).and_then(|p| p.module.as_deref())
    }

    /// Match a competitor name against the known list: case-insensitive exact
    /// match first, then substring containment in either direction. `None`
    /// means unmatched; the caller keeps the raw name in that case.
    pub fn normalize_competitor(&self, name: &str) -> Option<&str> {
        let lower = name.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        if let Some(canonical) = self
            .competitors
            .iter()
            .find(|c| c.to_lowercase() == lower)
        {
            return Some(canonical);
        }
        self.competitors
            .iter()
            .find(|c| {
                let canonical = c.to_lowercase();
                canonical.contains(&lower) || lower.contains(&canonical)
            })
            .map(String::as_str)
    }

    /// Register a feature discovered at runtime into this working copy so the
    /// same code validates for the rest of the run.
    pub fn register_feature(&mut self, code: &str, display_name: &str, module: Option<&str>) {
        self.features.entry(code.to_string()).or_insert(FeatureEntry {
            display_name: display_name.to_string(),
            suggested_module: module.map(str::to_string),
            is_seed: false,
        });
    }

    // Iterators used by the DB seeder and the prompt builder.

    pub fn pains(&self) -> impl Iterator<Item = (&str, &PainEntry)> {
        self.pains.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn frictions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.frictions.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn faqs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.faqs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn relationships(&self) -> impl Iterator<Item = (&str, &str)> {
        self.relationships.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn modules(&self) -> impl Iterator<Item = (&str, &ModuleEntry)> {
        self.modules.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn features(&self) -> impl Iterator<Item = (&str, &FeatureEntry)> {
        self.features.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn competitors(&self) -> impl Iterator<Item = &str> {
        self.competitors.iter().map(String::as_str)
    }
}

fn pair_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(code, display)| (code.to_string(), display.to_string()))
        .collect()
}
