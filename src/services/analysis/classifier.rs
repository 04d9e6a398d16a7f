// Review Classifier
// Multi-label tagging of reviews against the pattern catalog

use super::catalog::PatternCatalog;
use crate::models::{CategoryLayer, Review};
use crate::services::text_processor::normalize_for_matching;
use rayon::prelude::*;

/// Matched category ids per layer, each list ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    by_layer: [Vec<usize>; 5],
}

impl TagSet {
    pub fn ids(&self, layer: CategoryLayer) -> &[usize] {
        &self.by_layer[layer.index()]
    }

    pub fn contains(&self, layer: CategoryLayer, id: usize) -> bool {
        self.ids(layer).binary_search(&id).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.by_layer.iter().all(Vec::is_empty)
    }

    /// Distinct segments matched across both segment layers.
    pub fn segment_count(&self) -> usize {
        self.ids(CategoryLayer::IdentitySegment).len()
            + self.ids(CategoryLayer::MotivationSegment).len()
    }

    pub fn names<'c>(&self, catalog: &'c PatternCatalog, layer: CategoryLayer) -> Vec<&'c str> {
        self.ids(layer)
            .iter()
            .map(|&id| catalog.category(id).name())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ClassifiedReview<'a> {
    /// Position in the input list; the tie-breaker for every ordering.
    pub index: usize,
    pub review: &'a Review,
    pub normalized: String,
    pub tags: TagSet,
}

impl ClassifiedReview<'_> {
    pub fn product(&self) -> &str {
        &self.review.product
    }

    /// Star rating clamped to 1-5. Every statistic reads ratings through here.
    pub fn rating(&self) -> u8 {
        self.review.rating.clamp(1, 5)
    }
}

/// Classify a single review. Pure function of the body text.
pub fn classify_review<'a>(
    index: usize,
    review: &'a Review,
    catalog: &PatternCatalog,
) -> ClassifiedReview<'a> {
    let normalized = normalize_for_matching(&review.body);
    let mut tags = TagSet::default();

    if !normalized.is_empty() {
        for layer in CategoryLayer::ALL {
            tags.by_layer[layer.index()] = catalog
                .layer_ids(layer)
                .iter()
                .copied()
                .filter(|&id| catalog.category(id).matches(&normalized))
                .collect();
        }
    }

    ClassifiedReview {
        index,
        review,
        normalized,
        tags,
    }
}

/// Classify every review, keeping input order.
pub fn classify_all<'a>(
    reviews: &'a [Review],
    catalog: &PatternCatalog,
    parallel: bool,
) -> Vec<ClassifiedReview<'a>> {
    if parallel {
        reviews
            .par_iter()
            .enumerate()
            .map(|(i, r)| classify_review(i, r, catalog))
            .collect()
    } else {
        reviews
            .iter()
            .enumerate()
            .map(|(i, r)| classify_review(i, r, catalog))
            .collect()
    }
}
