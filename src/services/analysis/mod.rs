// Analysis Module
// Deterministic review analysis organized into specialized submodules:
// - catalog: versioned taxonomy of categories and matching rules
// - classifier: multi-label tagging of each review
// - quotes: representative quote ranking
// - aggregation: per-product category statistics
// - segment_profile: corpus-wide segment profiles
// - cross_segment: identity x motivation overlap and concentration index
// - orchestrator: runs the stages and assembles the result

pub mod catalog;
pub mod classifier;
pub mod quotes;
pub mod aggregation;
pub mod segment_profile;
pub mod cross_segment;
pub mod orchestrator;

pub use catalog::{CatalogError, CompiledCategory, PatternCatalog};
pub use classifier::{classify_all, classify_review, ClassifiedReview, TagSet};
pub use aggregation::{analyze_scope, category_stats, frequency_tier, percentage, rating_stats};
pub use segment_profile::build_segment_profiles;
pub use cross_segment::{
    concentration_index,
    cross_segment_overlaps,
    layer_coverage,
    product_affinity,
    segment_coverage,
};
pub use orchestrator::{AnalysisError, CancelFlag, NoopProgress, ProgressSink, ReviewAnalyzer};
