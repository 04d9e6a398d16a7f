// Analysis Orchestrator
// Classify once, then aggregate per product, profile segments, cross-tabulate

use super::aggregation::{analyze_scope, group_by_product};
use super::catalog::{CatalogError, PatternCatalog};
use super::classifier::classify_all;
use super::cross_segment::{cross_segment_overlaps, layer_coverage, product_affinity, segment_coverage};
use super::segment_profile::build_segment_profiles;
use crate::models::{FullAnalysis, ProgressUpdate, RawReviewRecord, Review, SegmentBreakdown};
use crate::services::config_store::AnalysisConfig;
use crate::services::intake::intake_records;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("no reviews to analyze")]
    EmptyCorpus,

    #[error("analysis cancelled before {stage}")]
    Cancelled { stage: String },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Receives advisory progress updates. Never consulted for control flow.
pub trait ProgressSink: Sync {
    fn report(&self, update: ProgressUpdate);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressUpdate) + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        self(update)
    }
}

pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _update: ProgressUpdate) {}
}

/// Shared abort switch, checked between stages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Keeps reported percentages non-decreasing and within 0-100.
struct ProgressTracker<'p> {
    sink: &'p dyn ProgressSink,
    last: Cell<u8>,
}

impl<'p> ProgressTracker<'p> {
    fn new(sink: &'p dyn ProgressSink) -> Self {
        Self {
            sink,
            last: Cell::new(0),
        }
    }

    fn report(&self, stage: &str, percent: u8) {
        let percent = self.last.get().max(percent.min(100));
        self.last.set(percent);
        self.sink.report(ProgressUpdate {
            stage: stage.to_string(),
            percent,
        });
    }
}

/// The review analysis engine: an immutable taxonomy plus tuning knobs.
#[derive(Debug, Clone)]
pub struct ReviewAnalyzer {
    catalog: Arc<PatternCatalog>,
    config: AnalysisConfig,
}

impl ReviewAnalyzer {
    pub fn new(catalog: PatternCatalog, config: AnalysisConfig) -> Self {
        Self {
            catalog: Arc::new(catalog),
            config,
        }
    }

    /// Analyzer over the built-in taxonomy with default settings.
    pub fn with_builtin_catalog() -> Result<Self, AnalysisError> {
        Ok(Self::new(PatternCatalog::builtin()?, AnalysisConfig::default()))
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze(&self, reviews: &[Review]) -> Result<FullAnalysis, AnalysisError> {
        self.analyze_with_progress(reviews, &NoopProgress, &CancelFlag::new())
    }

    /// Validate raw upload rows, then analyze what survives. Skipped rows are
    /// counted in `FullAnalysis::skipped_records`.
    pub fn analyze_records(
        &self,
        records: &[RawReviewRecord],
        progress: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<FullAnalysis, AnalysisError> {
        let outcome = intake_records(records);
        if !outcome.skipped.is_empty() {
            warn!(
                skipped = outcome.skipped.len(),
                accepted = outcome.reviews.len(),
                "intake.records_skipped"
            );
        }
        let mut analysis = self.analyze_with_progress(&outcome.reviews, progress, cancel)?;
        analysis.skipped_records = outcome.skipped.len();
        Ok(analysis)
    }

    pub fn analyze_with_progress(
        &self,
        reviews: &[Review],
        progress: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<FullAnalysis, AnalysisError> {
        if reviews.is_empty() {
            warn!("analysis.empty_corpus");
            return Err(AnalysisError::EmptyCorpus);
        }

        let clamped = reviews.iter().filter(|r| !(1..=5).contains(&r.rating)).count();
        if clamped > 0 {
            warn!(clamped, "analysis.ratings_out_of_range");
        }

        let started = Instant::now();
        let tracker = ProgressTracker::new(progress);
        let catalog = self.catalog.as_ref();
        let config = &self.config;
        let checkpoint = |stage: &str| -> Result<(), AnalysisError> {
            if cancel.is_cancelled() {
                info!(stage, "analysis.cancelled");
                return Err(AnalysisError::Cancelled {
                    stage: stage.to_string(),
                });
            }
            Ok(())
        };

        info!(
            reviews = reviews.len(),
            catalog = catalog.version(),
            categories = catalog.len(),
            "analysis.started"
        );

        checkpoint("classification")?;
        tracker.report("Classifying reviews", 5);
        let classified = classify_all(reviews, catalog, config.parallel_classification);
        tracker.report("Classified reviews", 30);
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "analysis.classified");

        let groups = group_by_product(&classified);
        let product_count = groups.len();
        let mut products = Vec::with_capacity(product_count);
        for (i, (name, scope)) in groups.iter().enumerate() {
            checkpoint("product aggregation")?;
            let pct = 30 + ((i * 30) / product_count.max(1)) as u8;
            tracker.report(&format!("Analyzing {}", name), pct);
            products.push(analyze_scope(name, scope, catalog, config));
        }

        checkpoint("corpus aggregation")?;
        tracker.report("Analyzing all products", 60);
        let all: Vec<_> = classified.iter().collect();
        let overall = analyze_scope("All Products", &all, catalog, config);

        checkpoint("segment profiles")?;
        tracker.report("Building segment profiles", 70);
        let profiles = build_segment_profiles(&classified, catalog, config);

        checkpoint("cross-segment analysis")?;
        tracker.report("Cross-segment analysis", 85);
        let overlaps = cross_segment_overlaps(&classified, catalog);
        let affinity = product_affinity(&classified, catalog);
        let (multi_segment, unsegmented) = segment_coverage(&classified);
        let coverage = layer_coverage(&classified);

        checkpoint("assembly")?;
        tracker.report("Assembling results", 95);
        let analysis = FullAnalysis {
            catalog_version: catalog.version().to_string(),
            total_reviews: reviews.len(),
            skipped_records: 0,
            product_counts: groups
                .iter()
                .map(|(name, scope)| (name.clone(), scope.len()))
                .collect(),
            products,
            overall,
            segments: SegmentBreakdown {
                total_reviews: reviews.len(),
                profiles,
                overlaps,
                product_affinity: affinity,
                multi_segment,
                unsegmented,
                layer_coverage: coverage,
            },
        };

        tracker.report("Complete", 100);
        info!(
            reviews = analysis.total_reviews,
            products = product_count,
            overlaps = analysis.segments.overlaps.len(),
            unsegmented = analysis.segments.unsegmented.count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis.completed"
        );

        Ok(analysis)
    }
}
