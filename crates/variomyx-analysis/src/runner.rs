//! Filter runners.
//!
//! Two strategies share the [`VariantFilterRunner`] contract:
//! - [`EagerFilterRunner`] expects annotations already attached and applies
//!   every filter to every variant, keeping them all.
//! - [`SparseFilterRunner`] fetches annotations on demand, stops at a
//!   variant's first failure, and keeps or drops failed variants according to
//!   its [`RetentionPolicy`].
//!
//! A sparse runner mutates the variants it is given. It must not be run
//! concurrently over the same variants.

use std::sync::Arc;

use tracing::{debug, info};
use variomyx_common::{FilterResult, Gene, RetentionPolicy, VariantEvaluation};

use crate::annotation::AnnotationProvider;
use crate::filters::{GeneFilter, VariantFilter};
use crate::priority::Prioritiser;

pub trait VariantFilterRunner {
    /// Run one filter against one variant and record the result on it.
    /// Returns the recorded result, which a repeated filter kind may have
    /// merged with an earlier one.
    fn apply(&self, filter: &dyn VariantFilter, variant: &mut VariantEvaluation) -> FilterResult;

    /// Run the filters, in order, over a batch of variants.
    fn run(&self, filters: &[Arc<dyn VariantFilter>], variants: Vec<VariantEvaluation>) -> Vec<VariantEvaluation>;
}

// ── Eager ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct EagerFilterRunner;

impl EagerFilterRunner {
    /// Apply the filters to variants held elsewhere, e.g. a sample's arena.
    pub fn run_in_place(&self, filters: &[Arc<dyn VariantFilter>], variants: &mut [VariantEvaluation]) {
        for filter in filters {
            let mut passed = 0usize;
            for variant in variants.iter_mut() {
                if self.apply(filter.as_ref(), variant).passed() {
                    passed += 1;
                }
            }
            info!(
                filter = ?filter.kind(),
                passed,
                failed = variants.len() - passed,
                "Variant filter applied"
            );
        }
    }
}

impl VariantFilterRunner for EagerFilterRunner {
    fn apply(&self, filter: &dyn VariantFilter, variant: &mut VariantEvaluation) -> FilterResult {
        let result = filter.run_filter(variant);
        variant.record_filter_result(result)
    }

    fn run(&self, filters: &[Arc<dyn VariantFilter>], mut variants: Vec<VariantEvaluation>) -> Vec<VariantEvaluation> {
        self.run_in_place(filters, &mut variants);
        variants
    }
}

// ── Sparse ────────────────────────────────────────────────────────────────────

pub struct SparseFilterRunner<'a> {
    provider: &'a dyn AnnotationProvider,
    retention: RetentionPolicy,
}

impl<'a> SparseFilterRunner<'a> {
    pub fn new(provider: &'a dyn AnnotationProvider, retention: RetentionPolicy) -> Self {
        Self { provider, retention }
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Attach whatever annotation the filter needs and the variant lacks.
    fn fetch_missing(&self, filter: &dyn VariantFilter, variant: &mut VariantEvaluation) {
        let kind = filter.kind();
        if kind.needs_frequency() && variant.frequency.is_none() {
            variant.frequency = Some(self.provider.fetch_frequency(variant));
        }
        if kind.needs_pathogenicity() && variant.pathogenicity.is_none() {
            variant.pathogenicity = Some(self.provider.fetch_pathogenicity(variant));
        }
    }

    /// Filter one variant, stopping at its first failure. A variant that
    /// already failed an earlier filter is left as it is.
    fn filter_variant(&self, filters: &[Arc<dyn VariantFilter>], variant: &mut VariantEvaluation) -> bool {
        if !variant.passed_filters() {
            return false;
        }
        for filter in filters {
            if !self.apply(filter.as_ref(), variant).passed() {
                break;
            }
        }
        variant.passed_filters()
    }

    fn retains(&self, passed: bool) -> bool {
        passed || self.retention == RetentionPolicy::KeepAll
    }

    /// Filter a single-pass stream of variants, keeping what the retention
    /// policy allows.
    pub fn run_stream<I>(&self, filters: &[Arc<dyn VariantFilter>], variants: I) -> Vec<VariantEvaluation>
    where
        I: IntoIterator<Item = VariantEvaluation>,
    {
        let mut kept = Vec::new();
        let (mut seen, mut passed) = (0usize, 0usize);
        for mut variant in variants {
            seen += 1;
            let ok = self.filter_variant(filters, &mut variant);
            if ok {
                passed += 1;
            }
            if self.retains(ok) {
                kept.push(variant);
            }
        }
        info!(
            filters = filters.len(),
            seen,
            passed,
            kept = kept.len(),
            retention = ?self.retention,
            "Sparse variant filtering complete"
        );
        kept
    }

    /// Filter variants held elsewhere. Nothing is removed; callers apply the
    /// retention policy when they rebuild their collection.
    pub fn run_in_place(&self, filters: &[Arc<dyn VariantFilter>], variants: &mut [VariantEvaluation]) {
        let passed = variants
            .iter_mut()
            .map(|v| self.filter_variant(filters, v))
            .filter(|&ok| ok)
            .count();
        info!(filters = filters.len(), seen = variants.len(), passed, "Sparse variant filtering complete");
    }
}

impl VariantFilterRunner for SparseFilterRunner<'_> {
    fn apply(&self, filter: &dyn VariantFilter, variant: &mut VariantEvaluation) -> FilterResult {
        self.fetch_missing(filter, variant);
        let result = filter.run_filter(variant);
        variant.record_filter_result(result)
    }

    fn run(&self, filters: &[Arc<dyn VariantFilter>], variants: Vec<VariantEvaluation>) -> Vec<VariantEvaluation> {
        self.run_stream(filters, variants)
    }
}

// ── Genes ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct GeneFilterRunner;

impl GeneFilterRunner {
    /// Run gene filters over genes that still pass. A gene filter never
    /// overrides an earlier failure, and a gene's remaining filters are
    /// skipped once one fails.
    pub fn run(&self, filters: &[Arc<dyn GeneFilter>], genes: &mut [Gene], variants: &[VariantEvaluation]) {
        for filter in filters {
            let (mut evaluated, mut passed) = (0usize, 0usize);
            for gene in genes.iter_mut() {
                if !gene.passed_filters(variants) {
                    continue;
                }
                evaluated += 1;
                if gene.record_filter_result(filter.run_filter(gene)).passed() {
                    passed += 1;
                }
            }
            info!(filter = ?filter.kind(), evaluated, passed, "Gene filter applied");
        }
    }
}

/// Run a prioritiser over every gene.
pub fn run_prioritiser(prioritiser: &dyn Prioritiser, genes: &mut [Gene]) {
    prioritiser.prioritise(genes);
    let scored = genes
        .iter()
        .filter(|g| g.priority_score_for(prioritiser.kind()).is_some())
        .count();
    debug!(prioritiser = %prioritiser.kind(), genes = genes.len(), scored, "Prioritiser applied");
}
