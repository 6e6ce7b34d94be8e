//! Filter contracts and the filters shipped with the pipeline.
//!
//! Filters are pluggable: anything implementing [`VariantFilter`] or
//! [`GeneFilter`] can be wrapped in an [`AnalysisStep`](crate::AnalysisStep).

use std::fmt;

use variomyx_common::{FilterKind, FilterResult, Gene, PriorityKind, VariantEvaluation};

pub mod variant;
pub mod gene;

pub use gene::{GeneSymbolFilter, InheritanceFilter, PriorityScoreFilter};
pub use variant::{FrequencyFilter, IntervalFilter, PathogenicityFilter, QualityFilter};

/// Accepts or rejects a single variant record.
pub trait VariantFilter: Send + Sync + fmt::Debug {
    fn kind(&self) -> FilterKind;

    /// Evaluate the variant. Implementations read annotations as they find
    /// them; fetching missing annotations is the runner's job.
    fn run_filter(&self, variant: &VariantEvaluation) -> FilterResult;
}

/// Accepts or rejects a gene from properties aggregated across its variants.
pub trait GeneFilter: Send + Sync + fmt::Debug {
    fn kind(&self) -> FilterKind;

    fn run_filter(&self, gene: &Gene) -> FilterResult;

    /// The prioritiser whose scores this filter gates on, if any.
    fn gated_priority(&self) -> Option<PriorityKind> {
        None
    }
}
