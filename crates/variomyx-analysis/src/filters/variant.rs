//! Variant-level filters.

use tracing::warn;
use variomyx_common::{Contig, FilterKind, FilterResult, VariantEvaluation};

use super::VariantFilter;

/// Predicted pathogenicity at or above which a variant counts as pathogenic.
pub const PATHOGENIC_THRESHOLD: f64 = 0.5;

/// Minimum call quality (QUAL).
#[derive(Debug, Clone)]
pub struct QualityFilter {
    pub min_quality: f64,
}

impl QualityFilter {
    pub fn new(min_quality: f64) -> Self {
        Self { min_quality }
    }
}

impl VariantFilter for QualityFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::Quality
    }

    fn run_filter(&self, variant: &VariantEvaluation) -> FilterResult {
        if variant.quality >= self.min_quality {
            FilterResult::pass(self.kind(), 1.0)
        } else {
            FilterResult::fail(self.kind(), 0.0)
        }
    }
}

/// Maximum population frequency, in percent.
#[derive(Debug, Clone)]
pub struct FrequencyFilter {
    pub max_frequency: f64,
}

impl FrequencyFilter {
    pub fn new(max_frequency: f64) -> Self {
        Self { max_frequency }
    }
}

impl VariantFilter for FrequencyFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::Frequency
    }

    fn run_filter(&self, variant: &VariantEvaluation) -> FilterResult {
        let Some(data) = &variant.frequency else {
            warn!(variant = %variant.key(), "No frequency annotation attached, failing frequency filter");
            return FilterResult::fail(self.kind(), 0.0);
        };
        if data.max_freq() <= self.max_frequency {
            FilterResult::pass(self.kind(), data.score())
        } else {
            FilterResult::fail(self.kind(), data.score())
        }
    }
}

/// Keeps variants predicted pathogenic, or every annotated variant when
/// `keep_non_pathogenic` is set. The predicted score is always recorded.
#[derive(Debug, Clone)]
pub struct PathogenicityFilter {
    pub keep_non_pathogenic: bool,
}

impl PathogenicityFilter {
    pub fn new(keep_non_pathogenic: bool) -> Self {
        Self { keep_non_pathogenic }
    }
}

impl VariantFilter for PathogenicityFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::Pathogenicity
    }

    fn run_filter(&self, variant: &VariantEvaluation) -> FilterResult {
        let Some(data) = &variant.pathogenicity else {
            warn!(variant = %variant.key(), "No pathogenicity annotation attached, failing pathogenicity filter");
            return FilterResult::fail(self.kind(), 0.0);
        };
        let score = data.predicted_score();
        if self.keep_non_pathogenic || score >= PATHOGENIC_THRESHOLD {
            FilterResult::pass(self.kind(), score)
        } else {
            FilterResult::fail(self.kind(), score)
        }
    }
}

/// Keeps variants inside a closed genomic interval.
#[derive(Debug, Clone)]
pub struct IntervalFilter {
    pub contig: Contig,
    pub start: u64,
    pub end: u64,
}

impl IntervalFilter {
    pub fn new(contig: Contig, start: u64, end: u64) -> Self {
        Self { contig, start, end }
    }
}

impl VariantFilter for IntervalFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::Interval
    }

    fn run_filter(&self, variant: &VariantEvaluation) -> FilterResult {
        let inside = variant.contig == self.contig
            && (self.start..=self.end).contains(&variant.position);
        if inside {
            FilterResult::pass(self.kind(), 1.0)
        } else {
            FilterResult::fail(self.kind(), 0.0)
        }
    }
}
