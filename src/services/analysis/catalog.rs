// Pattern Catalog
// Versioned taxonomy of pain/benefit/transformation/segment categories

use crate::models::{CategoryDefinition, CategoryLayer, MatchRule, TaxonomyFile};
use crate::services::text_processor::normalize_for_matching;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

const BUILTIN_TAXONOMY: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/data/default_taxonomy.json"
));

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read taxonomy {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse taxonomy: {0}")]
    Parse(String),

    #[error("category '{category}' has an invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        category: String,
        pattern: String,
        message: String,
    },

    #[error("category name '{0}' is defined more than once")]
    Duplicate(String),

    #[error("category '{0}' has no usable matching rules")]
    NoRules(String),
}

#[derive(Debug, Clone)]
enum Matcher {
    Phrase(String),
    Pattern(Regex),
}

impl Matcher {
    fn is_match(&self, normalized: &str) -> bool {
        match self {
            Matcher::Phrase(p) => normalized.contains(p.as_str()),
            Matcher::Pattern(re) => re.is_match(normalized),
        }
    }
}

/// A category with its rules compiled against normalized text.
#[derive(Debug, Clone)]
pub struct CompiledCategory {
    name: String,
    layer: CategoryLayer,
    matchers: Vec<Matcher>,
    key_term: Option<String>,
}

impl CompiledCategory {
    fn compile(def: &CategoryDefinition) -> Result<Self, CatalogError> {
        let name = def.name.trim().to_string();
        let mut matchers = Vec::with_capacity(def.rules.len());
        let mut key_term = None;

        for rule in &def.rules {
            match rule {
                MatchRule::Phrase(raw) => {
                    let phrase = normalize_for_matching(raw);
                    if phrase.is_empty() {
                        continue;
                    }
                    if key_term.is_none() {
                        key_term = Some(phrase.clone());
                    }
                    matchers.push(Matcher::Phrase(phrase));
                }
                MatchRule::Regex(raw) => {
                    let re = RegexBuilder::new(raw)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| CatalogError::InvalidPattern {
                            category: name.clone(),
                            pattern: raw.clone(),
                            message: e.to_string(),
                        })?;
                    matchers.push(Matcher::Pattern(re));
                }
            }
        }

        if name.is_empty() || matchers.is_empty() {
            return Err(CatalogError::NoRules(name));
        }

        if let Some(declared) = def.key_term.as_deref().map(normalize_for_matching) {
            if !declared.is_empty() {
                key_term = Some(declared);
            }
        }

        Ok(Self {
            name,
            layer: def.layer,
            matchers,
            key_term,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layer(&self) -> CategoryLayer {
        self.layer
    }

    /// Declared key term, else the first literal phrase; used to rank quotes.
    pub fn key_term(&self) -> Option<&str> {
        self.key_term.as_deref()
    }

    /// `normalized` must come from `normalize_for_matching`.
    pub fn matches(&self, normalized: &str) -> bool {
        !normalized.is_empty() && self.matchers.iter().any(|m| m.is_match(normalized))
    }
}

/// Compiled, immutable taxonomy. Category ids are positions in definition order.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    version: String,
    categories: Vec<CompiledCategory>,
    by_layer: [Vec<usize>; 5],
    by_name: HashMap<String, usize>,
}

impl PatternCatalog {
    pub fn from_definitions(
        version: &str,
        definitions: &[CategoryDefinition],
    ) -> Result<Self, CatalogError> {
        let mut categories = Vec::with_capacity(definitions.len());
        let mut by_layer: [Vec<usize>; 5] = Default::default();
        let mut by_name = HashMap::new();

        for def in definitions {
            let compiled = CompiledCategory::compile(def)?;
            let id = categories.len();
            if by_name.insert(compiled.name.clone(), id).is_some() {
                return Err(CatalogError::Duplicate(compiled.name));
            }
            by_layer[compiled.layer.index()].push(id);
            categories.push(compiled);
        }

        Ok(Self {
            version: version.trim().to_string(),
            categories,
            by_layer,
            by_name,
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let parsed: TaxonomyFile =
            serde_json::from_str(raw).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_definitions(&parsed.version, &parsed.categories)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    /// The taxonomy shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_TAXONOMY)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn category(&self, id: usize) -> &CompiledCategory {
        &self.categories[id]
    }

    pub fn categories(&self) -> &[CompiledCategory] {
        &self.categories
    }

    /// Category ids of one layer, in definition order.
    pub fn layer_ids(&self, layer: CategoryLayer) -> &[usize] {
        &self.by_layer[layer.index()]
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, layer: CategoryLayer, rules: Vec<MatchRule>) -> CategoryDefinition {
        CategoryDefinition {
            name: name.to_string(),
            layer,
            rules,
            key_term: None,
        }
    }

    #[test]
    fn test_builtin_catalog_covers_every_layer() {
        let catalog = PatternCatalog::builtin().unwrap();
        assert!(!catalog.version().is_empty());
        for layer in CategoryLayer::ALL {
            assert!(!catalog.layer_ids(layer).is_empty(), "{:?} empty", layer);
        }
        assert!(catalog.find("Healthcare Worker").is_some());
        assert!(catalog.find("Pain & Symptom Relief").is_some());
        assert!(catalog.find("Senior").is_some());
    }

    #[test]
    fn test_phrase_and_regex_rules_match_case_insensitively() {
        let catalog = PatternCatalog::from_definitions(
            "t1",
            &[def(
                "Nurse",
                CategoryLayer::IdentitySegment,
                vec![
                    MatchRule::Regex(r"\bi'?m an? nurse\b".to_string()),
                    MatchRule::Phrase("Night Shift".to_string()),
                ],
            )],
        )
        .unwrap();
        let cat = catalog.category(0);
        assert!(cat.matches(&normalize_for_matching("I\u{2019}M A NURSE and proud")));
        assert!(cat.matches(&normalize_for_matching("worked the   night\nshift")));
        assert!(!cat.matches(&normalize_for_matching("my sister is a nurse")));
        assert!(!cat.matches(""));
        assert_eq!(cat.key_term(), Some("night shift"));
    }

    #[test]
    fn test_declared_key_term_overrides_first_phrase() {
        let mut nurse = def(
            "Healthcare Worker",
            CategoryLayer::IdentitySegment,
            vec![
                MatchRule::Regex(r"\bi'?m an? nurse\b".to_string()),
                MatchRule::Phrase("nursing shift".to_string()),
            ],
        );
        let catalog = PatternCatalog::from_definitions("t1", &[nurse.clone()]).unwrap();
        assert_eq!(catalog.category(0).key_term(), Some("nursing shift"));

        nurse.key_term = Some(" Nurse ".to_string());
        let catalog = PatternCatalog::from_definitions("t1", &[nurse]).unwrap();
        assert_eq!(catalog.category(0).key_term(), Some("nurse"));

        let builtin = PatternCatalog::builtin().unwrap();
        let id = builtin.find("Healthcare Worker").unwrap();
        assert_eq!(builtin.category(id).key_term(), Some("nurse"));
        let id = builtin.find("Pain & Symptom Relief").unwrap();
        assert_eq!(builtin.category(id).key_term(), Some("pain"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = PatternCatalog::from_definitions(
            "t1",
            &[
                def("Comfort", CategoryLayer::Benefit, vec![MatchRule::Phrase("soft".into())]),
                def("Comfort", CategoryLayer::MotivationSegment, vec![MatchRule::Phrase("comfy".into())]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate(name) if name == "Comfort"));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = PatternCatalog::from_definitions(
            "t1",
            &[def("Broken", CategoryLayer::Pain, vec![MatchRule::Regex("(unclosed".into())])],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPattern { .. }));
    }

    #[test]
    fn test_blank_rules_rejected() {
        let err = PatternCatalog::from_definitions(
            "t1",
            &[def("Empty", CategoryLayer::Pain, vec![MatchRule::Phrase("   ".into())])],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::NoRules(_)));
    }

    #[test]
    fn test_json_round_trip_shape() {
        let raw = r#"{
            "version": "custom-1",
            "categories": [
                { "name": "Comfort", "layer": "benefit", "rules": [{ "phrase": "comfortable" }] },
                { "name": "Senior", "layer": "identity-segment", "rules": [{ "regex": "\\bi'?m retired\\b" }] }
            ]
        }"#;
        let catalog = PatternCatalog::from_json_str(raw).unwrap();
        assert_eq!(catalog.version(), "custom-1");
        assert_eq!(catalog.layer_ids(CategoryLayer::Benefit), &[0]);
        assert_eq!(catalog.layer_ids(CategoryLayer::IdentitySegment), &[1]);
    }
}
