//! Gene-level filters.

use std::collections::{BTreeSet, HashSet};

use variomyx_common::{FilterKind, FilterResult, Gene, InheritanceMode, PriorityKind};

use super::GeneFilter;

/// Segregation filter: keeps genes compatible with at least one of the
/// requested inheritance modes. Needs inheritance modes computed first.
#[derive(Debug, Clone)]
pub struct InheritanceFilter {
    modes: BTreeSet<InheritanceMode>,
}

impl InheritanceFilter {
    pub fn new(modes: impl IntoIterator<Item = InheritanceMode>) -> Self {
        Self { modes: modes.into_iter().collect() }
    }

    pub fn modes(&self) -> &BTreeSet<InheritanceMode> {
        &self.modes
    }
}

impl GeneFilter for InheritanceFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::Inheritance
    }

    fn run_filter(&self, gene: &Gene) -> FilterResult {
        let compatible = self.modes.is_empty()
            || self.modes.iter().any(|&mode| gene.is_compatible_with(mode));
        if compatible {
            FilterResult::pass(self.kind(), 1.0)
        } else {
            FilterResult::fail(self.kind(), 0.0)
        }
    }
}

/// Priority-score gate: keeps genes scored at least `min_score` by the
/// given prioritiser. Genes the prioritiser never scored fail.
#[derive(Debug, Clone)]
pub struct PriorityScoreFilter {
    pub priority: PriorityKind,
    pub min_score: f64,
}

impl PriorityScoreFilter {
    pub fn new(priority: PriorityKind, min_score: f64) -> Self {
        Self { priority, min_score }
    }
}

impl GeneFilter for PriorityScoreFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::PriorityScore
    }

    fn run_filter(&self, gene: &Gene) -> FilterResult {
        match gene.priority_score_for(self.priority) {
            Some(score) if score >= self.min_score => FilterResult::pass(self.kind(), score),
            Some(score) => FilterResult::fail(self.kind(), score),
            None => FilterResult::fail(self.kind(), 0.0),
        }
    }

    fn gated_priority(&self) -> Option<PriorityKind> {
        Some(self.priority)
    }
}

/// Keeps only the named genes.
#[derive(Debug, Clone)]
pub struct GeneSymbolFilter {
    symbols: HashSet<String>,
}

impl GeneSymbolFilter {
    pub fn new<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Self {
        Self { symbols: symbols.into_iter().map(Into::into).collect() }
    }
}

impl GeneFilter for GeneSymbolFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::GeneSymbol
    }

    fn run_filter(&self, gene: &Gene) -> FilterResult {
        if self.symbols.contains(&gene.symbol) {
            FilterResult::pass(self.kind(), 1.0)
        } else {
            FilterResult::fail(self.kind(), 0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inheritance_filter_matches_any_requested_mode() {
        let filter = InheritanceFilter::new([InheritanceMode::AutosomalDominant, InheritanceMode::XDominant]);
        let mut gene = Gene::new("FBN1", 2200);
        assert!(!filter.run_filter(&gene).passed());
        gene.set_compatible_modes(BTreeSet::from([InheritanceMode::XDominant]));
        assert!(filter.run_filter(&gene).passed());
    }

    #[test]
    fn test_inheritance_filter_any_passes_everything() {
        let filter = InheritanceFilter::new([InheritanceMode::Any]);
        assert!(filter.run_filter(&Gene::new("FBN1", 2200)).passed());
    }

    #[test]
    fn test_priority_gate() {
        let filter = PriorityScoreFilter::new(PriorityKind::HiPhive, 0.5);
        let mut gene = Gene::new("SCN1A", 6323);
        assert!(!filter.run_filter(&gene).passed(), "unscored gene must fail");
        gene.add_priority_score(PriorityKind::HiPhive, 0.7);
        let result = filter.run_filter(&gene);
        assert!(result.passed());
        assert!((result.score - 0.7).abs() < 1e-9);
        assert_eq!(filter.gated_priority(), Some(PriorityKind::HiPhive));
    }

    #[test]
    fn test_gene_symbol_filter() {
        let filter = GeneSymbolFilter::new(["BRCA1", "BRCA2"]);
        assert!(filter.run_filter(&Gene::new("BRCA2", 675)).passed());
        assert!(!filter.run_filter(&Gene::new("TP53", 7157)).passed());
    }
}
