// Product Aggregation
// Per-scope category counts, percentages, frequency tiers and quotes

use super::catalog::PatternCatalog;
use super::classifier::ClassifiedReview;
use super::quotes::{rank_quotes, QuoteLedger, QuotePolicy};
use crate::models::{
    CategoryLayer, CategoryStat, FrequencyTier, ProductAnalysis, RatingStats, SegmentCount,
    SegmentLayer,
};
use crate::services::config_store::AnalysisConfig;
use crate::services::text_processor::display_quote;
use std::collections::{BTreeMap, HashSet};

/// Round to one decimal place.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Round to two decimal places.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// `count / total * 100`, one decimal. Zero when the scope is empty.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(count as f64 / total as f64 * 100.0)
}

pub fn frequency_tier(percentage: f64, config: &AnalysisConfig) -> FrequencyTier {
    if percentage > config.very_common_above {
        FrequencyTier::VeryCommon
    } else if percentage >= config.moderately_common_from {
        FrequencyTier::ModeratelyCommon
    } else {
        FrequencyTier::NotCommon
    }
}

/// Group reviews by product line; each group keeps input order.
pub fn group_by_product<'r, 'a>(
    classified: &'r [ClassifiedReview<'a>],
) -> BTreeMap<String, Vec<&'r ClassifiedReview<'a>>> {
    let mut groups: BTreeMap<String, Vec<&ClassifiedReview>> = BTreeMap::new();
    for c in classified {
        groups.entry(c.product().to_string()).or_default().push(c);
    }
    groups
}

pub fn rating_stats(scope: &[&ClassifiedReview<'_>]) -> RatingStats {
    let mut star_counts = [0usize; 5];
    let mut sum = 0u64;
    for c in scope {
        let stars = c.rating();
        star_counts[(stars - 1) as usize] += 1;
        sum += stars as u64;
    }

    let total = scope.len();
    let average = if total == 0 {
        0.0
    } else {
        round2(sum as f64 / total as f64)
    };

    RatingStats {
        average,
        star_counts,
        five_star_percentage: percentage(star_counts[4], total),
        low_rating_percentage: percentage(star_counts[0] + star_counts[1], total),
    }
}

/// CategoryStats for one layer over `scope`. Categories without a match are
/// omitted. Ordered by count descending, then catalog order.
pub fn category_stats(
    scope: &[&ClassifiedReview<'_>],
    catalog: &PatternCatalog,
    layer: CategoryLayer,
    config: &AnalysisConfig,
) -> Vec<CategoryStat> {
    let total = scope.len();
    let policy = QuotePolicy::from_config(config);

    let mut matched: Vec<(usize, Vec<&ClassifiedReview>)> = catalog
        .layer_ids(layer)
        .iter()
        .filter_map(|&id| {
            let members: Vec<&ClassifiedReview> = scope
                .iter()
                .copied()
                .filter(|c| c.tags.contains(layer, id))
                .collect();
            (!members.is_empty()).then_some((id, members))
        })
        .collect();
    matched.sort_by(|(a_id, a), (b_id, b)| b.len().cmp(&a.len()).then(a_id.cmp(b_id)));

    let mut ledger = QuoteLedger::default();
    matched
        .into_iter()
        .map(|(id, members)| {
            let category = catalog.category(id);
            let ranked = rank_quotes(&members, category.key_term(), &policy);
            let pct = percentage(members.len(), total);
            CategoryStat {
                name: category.name().to_string(),
                count: members.len(),
                percentage: pct,
                frequency: frequency_tier(pct, config),
                quotes: ledger.assign(ranked, policy.cap),
            }
        })
        .collect()
}

/// Every segment of the layer, zeros included, in catalog order.
pub fn segment_counts(
    scope: &[&ClassifiedReview<'_>],
    catalog: &PatternCatalog,
    layer: SegmentLayer,
) -> Vec<SegmentCount> {
    let category_layer = layer.category_layer();
    catalog
        .layer_ids(category_layer)
        .iter()
        .map(|&id| {
            let count = scope
                .iter()
                .filter(|c| c.tags.contains(category_layer, id))
                .count();
            SegmentCount {
                name: catalog.category(id).name().to_string(),
                layer,
                count,
                percentage: percentage(count, scope.len()),
            }
        })
        .collect()
}

/// Excerpts from reviews that carry any transformation signal.
/// Higher ratings first, then in-window length, then input order.
pub fn transformation_stories(
    scope: &[&ClassifiedReview<'_>],
    config: &AnalysisConfig,
) -> Vec<String> {
    let policy = QuotePolicy::from_config(config);
    let mut candidates: Vec<(std::cmp::Reverse<u8>, bool, usize, String)> = scope
        .iter()
        .filter(|c| !c.tags.ids(CategoryLayer::Transformation).is_empty())
        .filter_map(|c| {
            let quote = display_quote(&c.review.body);
            if quote.is_empty() {
                return None;
            }
            let len = quote.chars().count();
            let in_window = len >= policy.min_chars && len <= policy.max_chars;
            Some((std::cmp::Reverse(c.rating()), !in_window, c.index, quote))
        })
        .collect();
    candidates.sort();

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .map(|(_, _, _, quote)| quote)
        .filter(|q| seen.insert(q.clone()))
        .take(config.story_cap)
        .collect()
}

/// Full per-scope analysis: one product line, or the whole corpus.
pub fn analyze_scope(
    name: &str,
    scope: &[&ClassifiedReview<'_>],
    catalog: &PatternCatalog,
    config: &AnalysisConfig,
) -> ProductAnalysis {
    ProductAnalysis {
        product: name.to_string(),
        review_count: scope.len(),
        ratings: rating_stats(scope),
        pain_points: category_stats(scope, catalog, CategoryLayer::Pain, config),
        benefits: category_stats(scope, catalog, CategoryLayer::Benefit, config),
        transformations: category_stats(scope, catalog, CategoryLayer::Transformation, config),
        identity_segments: segment_counts(scope, catalog, SegmentLayer::Identity),
        motivation_segments: segment_counts(scope, catalog, SegmentLayer::Motivation),
        transformation_stories: transformation_stories(scope, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryDefinition, MatchRule, Review};
    use crate::services::analysis::classifier::classify_all;

    fn catalog() -> PatternCatalog {
        let defs = vec![
            CategoryDefinition {
                name: "comfortable".into(),
                layer: CategoryLayer::Benefit,
                rules: vec![MatchRule::Phrase("comfortable".into())],
                key_term: None,
            },
            CategoryDefinition {
                name: "supportive".into(),
                layer: CategoryLayer::Benefit,
                rules: vec![MatchRule::Phrase("support".into())],
                key_term: None,
            },
            CategoryDefinition {
                name: "Life-Changing".into(),
                layer: CategoryLayer::Transformation,
                rules: vec![MatchRule::Phrase("life changing".into())],
                key_term: None,
            },
            CategoryDefinition {
                name: "Senior".into(),
                layer: CategoryLayer::IdentitySegment,
                rules: vec![MatchRule::Phrase("i'm retired".into())],
                key_term: None,
            },
        ];
        PatternCatalog::from_definitions("test", &defs).unwrap()
    }

    #[test]
    fn test_percentage_and_rounding() {
        assert_eq!(percentage(10, 40), 25.0);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(round2(4.666), 4.67);
    }

    #[test]
    fn test_frequency_tier_boundaries() {
        let config = AnalysisConfig::default();
        assert_eq!(frequency_tier(5.1, &config), FrequencyTier::VeryCommon);
        assert_eq!(frequency_tier(5.0, &config), FrequencyTier::ModeratelyCommon);
        assert_eq!(frequency_tier(2.0, &config), FrequencyTier::ModeratelyCommon);
        assert_eq!(frequency_tier(1.9, &config), FrequencyTier::NotCommon);
        assert_eq!(frequency_tier(0.0, &config), FrequencyTier::NotCommon);
    }

    #[test]
    fn test_comfortable_scenario_on_product_scope() {
        let catalog = catalog();
        let mut reviews = Vec::new();
        for i in 0..40 {
            let body = if i < 10 { "Really comfortable for long days" } else { "Fine." };
            reviews.push(Review::new("Product A", 4, body));
        }
        for _ in 0..60 {
            reviews.push(Review::new("Product B", 4, "Ok socks"));
        }
        let classified = classify_all(&reviews, &catalog, false);
        let groups = group_by_product(&classified);
        let config = AnalysisConfig::default();

        let a = analyze_scope("Product A", &groups["Product A"], &catalog, &config);
        assert_eq!(a.review_count, 40);
        assert_eq!(a.benefits.len(), 1);
        let comfortable = &a.benefits[0];
        assert_eq!(comfortable.name, "comfortable");
        assert_eq!(comfortable.count, 10);
        assert_eq!(comfortable.percentage, 25.0);
        assert_eq!(comfortable.frequency, FrequencyTier::VeryCommon);

        let b = analyze_scope("Product B", &groups["Product B"], &catalog, &config);
        assert!(b.benefits.is_empty());
        // segments are reported even with zero matches
        assert_eq!(b.identity_segments.len(), 1);
        assert_eq!(b.identity_segments[0].count, 0);
        assert_eq!(b.identity_segments[0].percentage, 0.0);
        assert!(b.motivation_segments.is_empty());
    }

    #[test]
    fn test_stats_ordered_by_count_then_catalog() {
        let catalog = catalog();
        let reviews = vec![
            Review::new("A", 5, "great support"),
            Review::new("A", 5, "great support and comfortable"),
            Review::new("A", 5, "comfortable"),
            Review::new("A", 5, "good support"),
        ];
        let classified = classify_all(&reviews, &catalog, false);
        let scope: Vec<_> = classified.iter().collect();
        let stats = category_stats(&scope, &catalog, CategoryLayer::Benefit, &AnalysisConfig::default());
        let names: Vec<_> = stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["supportive", "comfortable"]);
        assert_eq!(stats[0].count, 3);
        assert_eq!(stats[0].percentage, 75.0);
        assert!(stats[0].quotes.len() <= 3);
    }

    #[test]
    fn test_rating_stats() {
        let catalog = catalog();
        let reviews = vec![
            Review::new("A", 5, ""),
            Review::new("A", 5, ""),
            Review::new("A", 1, ""),
            Review::new("A", 4, ""),
        ];
        let classified = classify_all(&reviews, &catalog, false);
        let scope: Vec<_> = classified.iter().collect();
        let stats = rating_stats(&scope);
        assert_eq!(stats.average, 3.75);
        assert_eq!(stats.star_counts, [1, 0, 0, 1, 2]);
        assert_eq!(stats.five_star_percentage, 50.0);
        assert_eq!(stats.low_rating_percentage, 25.0);
        assert_eq!(rating_stats(&[]).average, 0.0);
    }

    #[test]
    fn test_transformation_stories_prefer_high_ratings() {
        let catalog = catalog();
        let reviews = vec![
            Review::new("A", 3, "Honestly life changing, though they run a little warm in summer."),
            Review::new("A", 5, "Life changing! I can finally stand through a whole shift again."),
            Review::new("A", 5, "No story here at all, just ordinary socks."),
        ];
        let classified = classify_all(&reviews, &catalog, false);
        let scope: Vec<_> = classified.iter().collect();
        let stories = transformation_stories(&scope, &AnalysisConfig::default());
        assert_eq!(stories.len(), 2);
        assert!(stories[0].starts_with("Life changing!"));
    }
}
