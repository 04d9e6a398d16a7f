// Review Insights Data Models
// JSON contract shared with the dashboard and prompt builders

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============ Input Records ============

/// A parsed customer review. The engine only ever borrows these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub reviewer: String,
    #[serde(default)]
    pub body: String,
    pub rating: u8,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub product: String,
}

impl Review {
    pub fn new(product: &str, rating: u8, body: &str) -> Self {
        Self {
            reviewer: String::new(),
            body: body.to_string(),
            rating,
            date: None,
            product: product.to_string(),
        }
    }
}

/// Rating cell as an upstream CSV parser may hand it over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingField {
    Number(f64),
    Text(String),
}

/// Loosely-typed review row, before intake validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReviewRecord {
    #[serde(default, alias = "author", alias = "name")]
    pub reviewer: Option<String>,
    #[serde(default, alias = "text", alias = "review", alias = "content")]
    pub body: Option<String>,
    #[serde(default, alias = "stars", alias = "score")]
    pub rating: Option<RatingField>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, alias = "productLine", alias = "product_line")]
    pub product: Option<String>,
}

// ============ Taxonomy ============

/// Dimension a catalog category belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryLayer {
    Pain,
    Benefit,
    Transformation,
    MotivationSegment,
    IdentitySegment,
}

impl CategoryLayer {
    pub const ALL: [CategoryLayer; 5] = [
        CategoryLayer::Pain,
        CategoryLayer::Benefit,
        CategoryLayer::Transformation,
        CategoryLayer::MotivationSegment,
        CategoryLayer::IdentitySegment,
    ];

    pub fn index(self) -> usize {
        match self {
            CategoryLayer::Pain => 0,
            CategoryLayer::Benefit => 1,
            CategoryLayer::Transformation => 2,
            CategoryLayer::MotivationSegment => 3,
            CategoryLayer::IdentitySegment => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryLayer::Pain => "pain",
            CategoryLayer::Benefit => "benefit",
            CategoryLayer::Transformation => "transformation",
            CategoryLayer::MotivationSegment => "motivation-segment",
            CategoryLayer::IdentitySegment => "identity-segment",
        }
    }

    pub fn segment_layer(self) -> Option<SegmentLayer> {
        match self {
            CategoryLayer::MotivationSegment => Some(SegmentLayer::Motivation),
            CategoryLayer::IdentitySegment => Some(SegmentLayer::Identity),
            _ => None,
        }
    }
}

/// The two customer-segment layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentLayer {
    Identity,
    Motivation,
}

impl SegmentLayer {
    /// Identity first: profiles and coverage are reported in this order.
    pub const ALL: [SegmentLayer; 2] = [SegmentLayer::Identity, SegmentLayer::Motivation];

    pub fn category_layer(self) -> CategoryLayer {
        match self {
            SegmentLayer::Identity => CategoryLayer::IdentitySegment,
            SegmentLayer::Motivation => CategoryLayer::MotivationSegment,
        }
    }
}

/// One matching rule of a category definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchRule {
    /// Case-insensitive substring.
    Phrase(String),
    /// Case-insensitive regular expression.
    Regex(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDefinition {
    pub name: String,
    pub layer: CategoryLayer,
    pub rules: Vec<MatchRule>,
    /// Literal preferred when picking quotes. Defaults to the first phrase rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_term: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyFile {
    pub version: String,
    #[serde(default)]
    pub source: Option<String>,
    pub categories: Vec<CategoryDefinition>,
}

// ============ Category Statistics ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrequencyTier {
    #[serde(rename = "Very Common")]
    VeryCommon,
    #[serde(rename = "Moderately Common")]
    ModeratelyCommon,
    #[serde(rename = "Not Common")]
    NotCommon,
}

impl FrequencyTier {
    pub fn label(self) -> &'static str {
        match self {
            FrequencyTier::VeryCommon => "Very Common",
            FrequencyTier::ModeratelyCommon => "Moderately Common",
            FrequencyTier::NotCommon => "Not Common",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub name: String,
    pub count: usize,
    pub percentage: f64,
    pub frequency: FrequencyTier,
    #[serde(default)]
    pub quotes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentCount {
    pub name: String,
    pub layer: SegmentLayer,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingStats {
    /// Mean rating, two decimals. Zero for an empty scope.
    pub average: f64,
    /// Index 0 holds 1-star reviews, index 4 holds 5-star reviews.
    pub star_counts: [usize; 5],
    pub five_star_percentage: f64,
    pub low_rating_percentage: f64,
}

// ============ Product Analysis ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAnalysis {
    pub product: String,
    pub review_count: usize,
    pub ratings: RatingStats,
    pub pain_points: Vec<CategoryStat>,
    pub benefits: Vec<CategoryStat>,
    pub transformations: Vec<CategoryStat>,
    pub identity_segments: Vec<SegmentCount>,
    pub motivation_segments: Vec<SegmentCount>,
    pub transformation_stories: Vec<String>,
}

// ============ Segment Model ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductShare {
    pub product: String,
    pub count: usize,
    /// Share of that product's own reviews.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentProfile {
    pub name: String,
    pub layer: SegmentLayer,
    pub total_reviews: usize,
    pub percentage: f64,
    pub average_rating: f64,
    pub five_star_percentage: f64,
    pub product_breakdown: Vec<ProductShare>,
    pub top_pains: Vec<CategoryStat>,
    pub top_benefits: Vec<CategoryStat>,
    pub top_transformations: Vec<CategoryStat>,
    pub quotes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossSegmentOverlap {
    pub identity: String,
    pub motivation: String,
    pub count: usize,
    pub by_product: BTreeMap<String, usize>,
    pub average_rating: f64,
    pub percent_of_identity: f64,
    pub percent_of_motivation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAffinityEntry {
    pub segment: String,
    pub layer: SegmentLayer,
    pub count: usize,
    pub concentration_index: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageStat {
    pub count: usize,
    pub percentage: f64,
}

/// Per-layer split: `segmented + unsegmented == total_reviews`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerCoverage {
    pub layer: SegmentLayer,
    pub segmented: usize,
    pub unsegmented: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentBreakdown {
    pub total_reviews: usize,
    pub profiles: Vec<SegmentProfile>,
    pub overlaps: Vec<CrossSegmentOverlap>,
    pub product_affinity: BTreeMap<String, Vec<ProductAffinityEntry>>,
    pub multi_segment: CoverageStat,
    pub unsegmented: CoverageStat,
    pub layer_coverage: Vec<LayerCoverage>,
}

// ============ Full Analysis ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullAnalysis {
    pub catalog_version: String,
    pub total_reviews: usize,
    pub skipped_records: usize,
    pub product_counts: BTreeMap<String, usize>,
    pub products: Vec<ProductAnalysis>,
    pub overall: ProductAnalysis,
    pub segments: SegmentBreakdown,
}

// ============ Progress ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub stage: String,
    pub percent: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_names_match_serialized_form() {
        for layer in CategoryLayer::ALL {
            let json = serde_json::to_string(&layer).unwrap();
            assert_eq!(json, format!("\"{}\"", layer.as_str()));
        }
    }

    #[test]
    fn test_definition_key_term_is_optional() {
        let def: CategoryDefinition = serde_json::from_str(
            r#"{"name": "Nurse", "layer": "identity-segment", "rules": [{"regex": "nurse"}], "keyTerm": "nurse"}"#,
        )
        .unwrap();
        assert_eq!(def.key_term.as_deref(), Some("nurse"));
        let def: CategoryDefinition =
            serde_json::from_str(r#"{"name": "Soft", "layer": "benefit", "rules": [{"phrase": "soft"}]}"#).unwrap();
        assert!(def.key_term.is_none());
    }
}
