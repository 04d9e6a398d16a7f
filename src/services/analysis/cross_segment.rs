// Cross-Segment Analysis
// Identity x motivation overlap, coverage counts, product concentration index

use super::aggregation::{percentage, round2};
use super::catalog::PatternCatalog;
use super::classifier::ClassifiedReview;
use super::segment_profile::product_totals;
use crate::models::{
    CategoryLayer, CoverageStat, CrossSegmentOverlap, LayerCoverage, ProductAffinityEntry,
    SegmentLayer,
};
use std::collections::BTreeMap;

/// Every identity x motivation pair with at least one shared review.
/// Ordered by count descending, then identity and motivation catalog order.
pub fn cross_segment_overlaps(
    classified: &[ClassifiedReview<'_>],
    catalog: &PatternCatalog,
) -> Vec<CrossSegmentOverlap> {
    let identity_ids = catalog.layer_ids(CategoryLayer::IdentitySegment);
    let motivation_ids = catalog.layer_ids(CategoryLayer::MotivationSegment);

    let layer_total = |layer: CategoryLayer, id: usize| {
        classified
            .iter()
            .filter(|c| c.tags.contains(layer, id))
            .count()
    };

    let mut pairs: Vec<(usize, usize, CrossSegmentOverlap)> = Vec::new();

    for (i_pos, &identity) in identity_ids.iter().enumerate() {
        let identity_members: Vec<&ClassifiedReview> = classified
            .iter()
            .filter(|c| c.tags.contains(CategoryLayer::IdentitySegment, identity))
            .collect();
        if identity_members.is_empty() {
            continue;
        }

        for (m_pos, &motivation) in motivation_ids.iter().enumerate() {
            let both: Vec<&ClassifiedReview> = identity_members
                .iter()
                .copied()
                .filter(|c| c.tags.contains(CategoryLayer::MotivationSegment, motivation))
                .collect();
            if both.is_empty() {
                continue;
            }

            let mut by_product: BTreeMap<String, usize> = BTreeMap::new();
            let mut rating_sum = 0u64;
            for c in &both {
                *by_product.entry(c.product().to_string()).or_insert(0) += 1;
                rating_sum += c.rating() as u64;
            }

            let count = both.len();
            let motivation_total = layer_total(CategoryLayer::MotivationSegment, motivation);
            pairs.push((
                i_pos,
                m_pos,
                CrossSegmentOverlap {
                    identity: catalog.category(identity).name().to_string(),
                    motivation: catalog.category(motivation).name().to_string(),
                    count,
                    by_product,
                    average_rating: round2(rating_sum as f64 / count as f64),
                    percent_of_identity: percentage(count, identity_members.len()),
                    percent_of_motivation: percentage(count, motivation_total),
                },
            ));
        }
    }

    pairs.sort_by(|(ai, am, a), (bi, bm, b)| {
        b.count.cmp(&a.count).then(ai.cmp(bi)).then(am.cmp(bm))
    });
    pairs.into_iter().map(|(_, _, overlap)| overlap).collect()
}

/// Concentration index of every segment within every product line.
/// CI = (segment share inside product) / (segment share across corpus).
/// Entries whose ratio would be undefined or zero are omitted.
pub fn product_affinity(
    classified: &[ClassifiedReview<'_>],
    catalog: &PatternCatalog,
) -> BTreeMap<String, Vec<ProductAffinityEntry>> {
    let corpus_total = classified.len();
    let totals = product_totals(classified);
    let mut affinity = BTreeMap::new();

    for (product, &product_total) in &totals {
        let mut entries: Vec<(usize, ProductAffinityEntry)> = Vec::new();
        let mut position = 0usize;

        for layer in SegmentLayer::ALL {
            let category_layer = layer.category_layer();
            for &id in catalog.layer_ids(category_layer) {
                position += 1;
                let overall = classified
                    .iter()
                    .filter(|c| c.tags.contains(category_layer, id))
                    .count();
                let in_product = classified
                    .iter()
                    .filter(|c| c.product() == product.as_str() && c.tags.contains(category_layer, id))
                    .count();

                let Some(ci) =
                    concentration_index(in_product, product_total, overall, corpus_total)
                else {
                    continue;
                };

                entries.push((
                    position,
                    ProductAffinityEntry {
                        segment: catalog.category(id).name().to_string(),
                        layer,
                        count: in_product,
                        concentration_index: ci,
                    },
                ));
            }
        }

        entries.sort_by(|(pa, a), (pb, b)| {
            b.concentration_index
                .total_cmp(&a.concentration_index)
                .then(pa.cmp(pb))
        });
        affinity.insert(
            product.clone(),
            entries.into_iter().map(|(_, e)| e).collect(),
        );
    }

    affinity
}

/// Two-decimal CI, or `None` when any count is zero.
pub fn concentration_index(
    in_product: usize,
    product_total: usize,
    overall: usize,
    corpus_total: usize,
) -> Option<f64> {
    if in_product == 0 || product_total == 0 || overall == 0 || corpus_total == 0 {
        return None;
    }
    let product_share = in_product as f64 / product_total as f64;
    let corpus_share = overall as f64 / corpus_total as f64;
    Some(round2(product_share / corpus_share))
}

/// Corpus-wide `(multi_segment, unsegmented)`: k >= 2 and k == 0, where k
/// counts distinct segments across both layers.
pub fn segment_coverage(classified: &[ClassifiedReview<'_>]) -> (CoverageStat, CoverageStat) {
    let total = classified.len();
    let mut multi = 0usize;
    let mut none = 0usize;
    for c in classified {
        match c.tags.segment_count() {
            0 => none += 1,
            1 => {}
            _ => multi += 1,
        }
    }
    (
        CoverageStat {
            count: multi,
            percentage: percentage(multi, total),
        },
        CoverageStat {
            count: none,
            percentage: percentage(none, total),
        },
    )
}

/// Per layer, how many reviews matched at least one of its segments.
pub fn layer_coverage(classified: &[ClassifiedReview<'_>]) -> Vec<LayerCoverage> {
    SegmentLayer::ALL
        .iter()
        .map(|&layer| {
            let segmented = classified
                .iter()
                .filter(|c| !c.tags.ids(layer.category_layer()).is_empty())
                .count();
            LayerCoverage {
                layer,
                segmented,
                unsegmented: classified.len() - segmented,
            }
        })
        .collect()
}
