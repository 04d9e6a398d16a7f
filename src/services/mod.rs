// Review Insights Core Services

pub mod text_processor;
pub mod config_store;
pub mod intake;
pub mod analysis;

pub use text_processor::*;
pub use config_store::*;
pub use intake::{intake_records, IntakeIssue, IntakeOutcome, SkippedRecord};

pub use analysis::{
    classify_all,
    AnalysisError,
    CancelFlag,
    CatalogError,
    NoopProgress,
    PatternCatalog,
    ProgressSink,
    ReviewAnalyzer,
};
