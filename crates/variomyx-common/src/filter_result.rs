//! Per-run filter outcomes recorded against variants and genes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifies the filter that produced a result. Variant and gene filters
/// share one namespace so a result map can be keyed on it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    // Variant-level
    Quality,
    Frequency,
    Pathogenicity,
    Interval,
    // Gene-level
    Inheritance,
    PriorityScore,
    GeneSymbol,
}

impl FilterKind {
    /// Whether running this filter needs frequency annotations on the variant.
    pub fn needs_frequency(&self) -> bool {
        matches!(self, FilterKind::Frequency)
    }

    /// Whether running this filter needs pathogenicity annotations on the variant.
    pub fn needs_pathogenicity(&self) -> bool {
        matches!(self, FilterKind::Pathogenicity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterResult {
    pub kind: FilterKind,
    pub status: FilterStatus,
    /// Evidence strength in [0, 1]
    pub score: f64,
}

impl FilterResult {
    pub fn pass(kind: FilterKind, score: f64) -> Self {
        Self { kind, status: FilterStatus::Pass, score: score.clamp(0.0, 1.0) }
    }

    pub fn fail(kind: FilterKind, score: f64) -> Self {
        Self { kind, status: FilterStatus::Fail, score: score.clamp(0.0, 1.0) }
    }

    pub fn passed(&self) -> bool {
        self.status == FilterStatus::Pass
    }

    /// Combine two results of the same kind.
    pub fn merge(self, other: FilterResult) -> FilterResult {
        let status = if self.passed() && other.passed() { FilterStatus::Pass } else { FilterStatus::Fail };
        FilterResult { kind: self.kind, status, score: self.score.min(other.score) }
    }
}

/// Results keyed by filter kind. Each kind holds one result per run;
/// repeated filters of a kind are merged into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterResultMap {
    results: BTreeMap<FilterKind, FilterResult>,
}

impl FilterResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result and return what is now held for its kind. A repeat
    /// of a kind fails if either result failed and keeps the lower score.
    pub fn record(&mut self, result: FilterResult) -> FilterResult {
        let merged = match self.results.get(&result.kind) {
            Some(existing) => {
                tracing::debug!(kind = ?result.kind, "Merging repeated filter result");
                existing.merge(result)
            }
            None => result,
        };
        self.results.insert(result.kind, merged);
        merged
    }

    /// Logical AND of every recorded status; true when nothing was recorded.
    pub fn passed(&self) -> bool {
        self.results.values().all(FilterResult::passed)
    }

    pub fn get(&self, kind: FilterKind) -> Option<&FilterResult> {
        self.results.get(&kind)
    }

    pub fn contains(&self, kind: FilterKind) -> bool {
        self.results.contains_key(&kind)
    }

    pub fn failed_kinds(&self) -> Vec<FilterKind> {
        self.results
            .values()
            .filter(|r| !r.passed())
            .map(|r| r.kind)
            .collect()
    }

    /// Product of the scores of every passing result (1.0 when none passed).
    pub fn passing_score_product(&self) -> f64 {
        self.results
            .values()
            .filter(|r| r.passed())
            .map(|r| r.score)
            .product()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterResult> {
        self.results.values()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_map_passes() {
        assert!(FilterResultMap::new().passed());
    }

    #[test]
    fn test_single_fail_fails_aggregate() {
        let mut map = FilterResultMap::new();
        map.record(FilterResult::pass(FilterKind::Quality, 1.0));
        map.record(FilterResult::fail(FilterKind::Frequency, 0.0));
        assert!(!map.passed());
        assert_eq!(map.failed_kinds(), vec![FilterKind::Frequency]);
    }

    #[test]
    fn test_repeated_kind_merges_to_failure() {
        let mut map = FilterResultMap::new();
        assert!(map.record(FilterResult::pass(FilterKind::Quality, 1.0)).passed());
        let merged = map.record(FilterResult::fail(FilterKind::Quality, 0.0));
        assert!(!merged.passed());
        assert_eq!(map.len(), 1);
        assert!(!map.passed());
        assert_eq!(map.failed_kinds(), vec![FilterKind::Quality]);
    }

    #[test]
    fn test_failure_not_undone_by_later_pass() {
        let mut map = FilterResultMap::new();
        map.record(FilterResult::fail(FilterKind::PriorityScore, 0.3));
        let merged = map.record(FilterResult::pass(FilterKind::PriorityScore, 0.8));
        assert!(!merged.passed());
        assert_eq!(merged.score, 0.3);
    }

    #[test]
    fn test_repeated_pass_keeps_lower_score() {
        let mut map = FilterResultMap::new();
        map.record(FilterResult::pass(FilterKind::Frequency, 0.9));
        map.record(FilterResult::pass(FilterKind::Frequency, 0.6));
        assert!(map.passed());
        assert!((map.passing_score_product() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_score_product_ignores_failures() {
        let mut map = FilterResultMap::new();
        map.record(FilterResult::pass(FilterKind::Frequency, 0.5));
        map.record(FilterResult::pass(FilterKind::Pathogenicity, 0.8));
        map.record(FilterResult::fail(FilterKind::Quality, 0.0));
        assert!((map.passing_score_product() - 0.4).abs() < 1e-9);
    }
}
