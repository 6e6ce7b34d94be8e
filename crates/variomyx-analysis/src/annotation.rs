//! Trait for on-demand variant annotation.
//!
//! Provides an abstraction over frequency and pathogenicity databases so the
//! sparse runner can fetch what a filter needs without being coupled to how
//! the data is stored.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use variomyx_common::{FrequencyData, PathogenicityData, VariantEvaluation};

/// Synchronous annotation lookups.
///
/// Implementations can use:
/// - a local annotation bundle
/// - a remote annotation service (batched or cached internally)
/// - in-memory data (testing)
pub trait AnnotationProvider: Send + Sync {
    /// Population frequencies. Empty data means the variant was never observed,
    /// which is an answer and not a failure.
    fn fetch_frequency(&self, variant: &VariantEvaluation) -> FrequencyData;

    /// Predicted pathogenicity scores. Empty data means no predictor scored it.
    fn fetch_pathogenicity(&self, variant: &VariantEvaluation) -> PathogenicityData;
}

// ── In-memory implementation ──────────────────────────────────────────────────

/// Annotations keyed by variant chr-pos-ref-alt. Counts every fetch.
#[derive(Debug, Default)]
pub struct InMemoryAnnotationProvider {
    frequencies: HashMap<String, FrequencyData>,
    pathogenicities: HashMap<String, PathogenicityData>,
    frequency_fetches: AtomicUsize,
    pathogenicity_fetches: AtomicUsize,
}

impl InMemoryAnnotationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frequency(mut self, variant: &VariantEvaluation, data: FrequencyData) -> Self {
        self.frequencies.insert(variant.key(), data);
        self
    }

    pub fn with_pathogenicity(mut self, variant: &VariantEvaluation, data: PathogenicityData) -> Self {
        self.pathogenicities.insert(variant.key(), data);
        self
    }

    pub fn insert_frequency(&mut self, key: String, data: FrequencyData) {
        self.frequencies.insert(key, data);
    }

    pub fn insert_pathogenicity(&mut self, key: String, data: PathogenicityData) {
        self.pathogenicities.insert(key, data);
    }

    pub fn frequency_fetches(&self) -> usize {
        self.frequency_fetches.load(Ordering::Relaxed)
    }

    pub fn pathogenicity_fetches(&self) -> usize {
        self.pathogenicity_fetches.load(Ordering::Relaxed)
    }

    /// Copy every known annotation onto the variants, as an eager loader would.
    pub fn annotate_all(&self, variants: &mut [VariantEvaluation]) {
        for variant in variants {
            let key = variant.key();
            variant.frequency = Some(self.frequencies.get(&key).cloned().unwrap_or_default());
            variant.pathogenicity = Some(self.pathogenicities.get(&key).cloned().unwrap_or_default());
        }
    }
}

impl AnnotationProvider for InMemoryAnnotationProvider {
    fn fetch_frequency(&self, variant: &VariantEvaluation) -> FrequencyData {
        self.frequency_fetches.fetch_add(1, Ordering::Relaxed);
        self.frequencies.get(&variant.key()).cloned().unwrap_or_default()
    }

    fn fetch_pathogenicity(&self, variant: &VariantEvaluation) -> PathogenicityData {
        self.pathogenicity_fetches.fetch_add(1, Ordering::Relaxed);
        self.pathogenicities.get(&variant.key()).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use variomyx_test_utils::{frequency, variant};

    #[test]
    fn test_unknown_variant_is_no_evidence() {
        let provider = InMemoryAnnotationProvider::new();
        let data = provider.fetch_frequency(&variant("FGFR2", 2263, 100));
        assert!(data.is_empty());
        assert_eq!(provider.frequency_fetches(), 1);
        assert_eq!(provider.pathogenicity_fetches(), 0);
    }

    #[test]
    fn test_annotate_all_attaches_empty_data_for_unknown() {
        let known = variant("FGFR2", 2263, 100);
        let provider = InMemoryAnnotationProvider::new().with_frequency(&known, frequency(0.5));
        let mut variants = vec![known, variant("FGFR2", 2263, 200)];
        provider.annotate_all(&mut variants);

        assert_eq!(variants[0].frequency.as_ref().map(|f| f.max_freq()), Some(0.5));
        assert_eq!(variants[1].frequency.as_ref().map(|f| f.is_empty()), Some(true));
        assert!(variants[1].pathogenicity.is_some());
        assert_eq!(provider.frequency_fetches(), 0);
    }
}
