// Segment Profile Builder
// Corpus-wide profile for every identity and motivation segment

use super::aggregation::{category_stats, percentage, rating_stats};
use super::catalog::PatternCatalog;
use super::classifier::ClassifiedReview;
use super::quotes::{rank_quotes, QuoteLedger, QuotePolicy};
use crate::models::{CategoryLayer, ProductShare, SegmentLayer, SegmentProfile};
use crate::services::config_store::AnalysisConfig;
use std::collections::BTreeMap;

/// Review count per product line across the whole corpus.
pub fn product_totals(classified: &[ClassifiedReview<'_>]) -> BTreeMap<String, usize> {
    let mut totals = BTreeMap::new();
    for c in classified {
        *totals.entry(c.product().to_string()).or_insert(0) += 1;
    }
    totals
}

/// One profile per catalog segment (identity layer first), zero-member
/// segments included.
pub fn build_segment_profiles(
    classified: &[ClassifiedReview<'_>],
    catalog: &PatternCatalog,
    config: &AnalysisConfig,
) -> Vec<SegmentProfile> {
    let totals = product_totals(classified);
    let policy = QuotePolicy::from_config(config);
    let mut profiles = Vec::new();

    for layer in SegmentLayer::ALL {
        let category_layer = layer.category_layer();
        let mut ledger = QuoteLedger::default();

        for &id in catalog.layer_ids(category_layer) {
            let members: Vec<&ClassifiedReview> = classified
                .iter()
                .filter(|c| c.tags.contains(category_layer, id))
                .collect();
            let key_term = catalog.category(id).key_term();
            let quotes = ledger.assign(rank_quotes(&members, key_term, &policy), policy.cap);

            profiles.push(build_profile(
                catalog.category(id).name(),
                layer,
                &members,
                classified.len(),
                &totals,
                catalog,
                config,
                quotes,
            ));
        }
    }

    profiles
}

#[allow(clippy::too_many_arguments)]
fn build_profile(
    name: &str,
    layer: SegmentLayer,
    members: &[&ClassifiedReview<'_>],
    corpus_total: usize,
    product_totals: &BTreeMap<String, usize>,
    catalog: &PatternCatalog,
    config: &AnalysisConfig,
    quotes: Vec<String>,
) -> SegmentProfile {
    let ratings = rating_stats(members);

    let mut per_product: BTreeMap<&str, usize> = BTreeMap::new();
    for c in members {
        *per_product.entry(c.product()).or_insert(0) += 1;
    }
    let product_breakdown = per_product
        .into_iter()
        .map(|(product, count)| ProductShare {
            product: product.to_string(),
            count,
            percentage: percentage(count, product_totals.get(product).copied().unwrap_or(0)),
        })
        .collect();

    let top = |layer: CategoryLayer| {
        let mut stats = category_stats(members, catalog, layer, config);
        stats.truncate(config.top_n);
        stats
    };

    SegmentProfile {
        name: name.to_string(),
        layer,
        total_reviews: members.len(),
        percentage: percentage(members.len(), corpus_total),
        average_rating: ratings.average,
        five_star_percentage: ratings.five_star_percentage,
        product_breakdown,
        top_pains: top(CategoryLayer::Pain),
        top_benefits: top(CategoryLayer::Benefit),
        top_transformations: top(CategoryLayer::Transformation),
        quotes,
    }
}
