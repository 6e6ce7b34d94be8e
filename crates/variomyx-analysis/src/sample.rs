//! Per-run sample state and the data-factory contract that produces it.
//!
//! The sample owns the variant arena. Genes hold [`VariantId`] handles into
//! it, so a variant has exactly one owner however many genes refer to it.

use std::collections::HashMap;
use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};
use variomyx_common::{Gene, GeneIdentifier, Pedigree, Result, VariantEvaluation, VariantId};

/// A single-pass sequence of variants read from a VCF.
pub type VariantStream<'a> = Box<dyn Iterator<Item = VariantEvaluation> + 'a>;

/// Loads samples for a run. VCF and pedigree parsing live behind this trait.
pub trait SampleDataFactory {
    /// Load everything up front, annotations included.
    fn create(&self, vcf_path: &Path, pedigree_path: Option<&Path>) -> Result<Sample>;

    /// Load sample names, pedigree and the known-gene list without reading
    /// any variant.
    fn create_without_variants_or_genes(&self, vcf_path: &Path, pedigree_path: Option<&Path>) -> Result<PartialSample>;

    /// Stream the VCF's variants, unannotated. May be called once per run.
    fn stream_variants(&self, vcf_path: &Path) -> Result<VariantStream<'_>>;
}

#[derive(Debug, Clone)]
pub struct PartialSample {
    pub sample_names: Vec<String>,
    pub pedigree: Pedigree,
    pub known_genes: Vec<GeneIdentifier>,
}

// ── Known genes ───────────────────────────────────────────────────────────────

/// Reference genes a sparse run can attach variants to, in reference order.
#[derive(Debug, Clone, Default)]
pub struct KnownGeneIndex {
    genes: Vec<GeneIdentifier>,
    by_id: HashMap<u32, usize>,
}

impl KnownGeneIndex {
    /// Build the index. Records with no symbol or a zero id are dropped and
    /// the first record wins for a repeated id.
    pub fn build(records: &[GeneIdentifier]) -> Self {
        let cleaned: Vec<GeneIdentifier> = records
            .par_iter()
            .filter_map(|record| {
                let symbol = record.symbol.trim();
                (record.entrez_id != 0 && !symbol.is_empty())
                    .then(|| GeneIdentifier::new(symbol, record.entrez_id))
            })
            .collect();

        let mut index = Self::default();
        for gene in cleaned {
            if index.by_id.contains_key(&gene.entrez_id) {
                continue;
            }
            index.by_id.insert(gene.entrez_id, index.genes.len());
            index.genes.push(gene);
        }
        debug!(records = records.len(), genes = index.genes.len(), "Known gene index built");
        index
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn get(&self, entrez_id: u32) -> Option<&GeneIdentifier> {
        self.by_id.get(&entrez_id).map(|&i| &self.genes[i])
    }

    pub fn contains(&self, entrez_id: u32) -> bool {
        self.by_id.contains_key(&entrez_id)
    }

    pub fn genes(&self) -> &[GeneIdentifier] {
        &self.genes
    }
}

// ── Sample ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    sample_names: Vec<String>,
    pedigree: Pedigree,
    variants: Vec<VariantEvaluation>,
    genes: Vec<Gene>,
}

impl Sample {
    /// Build a fully loaded sample. Genes are derived from the variants'
    /// gene ids, in the order first seen.
    pub fn new(sample_names: Vec<String>, pedigree: Pedigree, variants: Vec<VariantEvaluation>) -> Self {
        let mut sample = Self {
            sample_names,
            pedigree,
            variants: Vec::new(),
            genes: Vec::new(),
        };
        let mut by_id: HashMap<u32, usize> = HashMap::new();
        for variant in variants {
            let gene_idx = *by_id.entry(variant.gene_id).or_insert_with(|| {
                sample.genes.push(Gene::new(&variant.gene_symbol, variant.gene_id));
                sample.genes.len() - 1
            });
            sample.genes[gene_idx].add_variant(VariantId(sample.variants.len()));
            sample.variants.push(variant);
        }
        sample
    }

    /// A sample with one variant-less gene per known gene. Variants are
    /// attached later with [`attach_variants`](Self::attach_variants).
    pub fn from_partial(partial: PartialSample, index: &KnownGeneIndex) -> Self {
        Self {
            sample_names: partial.sample_names,
            pedigree: partial.pedigree,
            variants: Vec::new(),
            genes: index.genes().iter().map(Gene::from_identifier).collect(),
        }
    }

    /// Move streamed variants into the arena. Variants in genes this sample
    /// does not know are dropped, as are genes left without any variant.
    /// Returns the number of variants dropped.
    pub fn attach_variants(&mut self, variants: Vec<VariantEvaluation>) -> usize {
        let by_id: HashMap<u32, usize> = self
            .genes
            .iter()
            .enumerate()
            .map(|(i, g)| (g.entrez_id, i))
            .collect();

        let mut dropped = 0;
        for variant in variants {
            match by_id.get(&variant.gene_id) {
                Some(&gene_idx) => {
                    self.genes[gene_idx].add_variant(VariantId(self.variants.len()));
                    self.variants.push(variant);
                }
                None => dropped += 1,
            }
        }
        let known = self.genes.len();
        self.genes.retain(Gene::has_variants);
        info!(
            variants = self.variants.len(),
            dropped,
            genes = self.genes.len(),
            genes_without_variants = known - self.genes.len(),
            "Attached variants to known genes"
        );
        dropped
    }

    /// Keep only variants matching `keep`, renumbering handles. Genes left
    /// without variants are removed.
    pub fn retain_variants(&mut self, keep: impl Fn(&VariantEvaluation) -> bool) {
        let mut new_ids: Vec<Option<VariantId>> = Vec::with_capacity(self.variants.len());
        let mut kept = Vec::new();
        for variant in std::mem::take(&mut self.variants) {
            if keep(&variant) {
                new_ids.push(Some(VariantId(kept.len())));
                kept.push(variant);
            } else {
                new_ids.push(None);
            }
        }
        self.variants = kept;

        for gene in &mut self.genes {
            let ids: Vec<VariantId> = gene
                .variant_ids()
                .iter()
                .filter_map(|id| new_ids.get(id.0).copied().flatten())
                .collect();
            gene.clear_variants();
            for id in ids {
                gene.add_variant(id);
            }
        }
        self.genes.retain(Gene::has_variants);
    }

    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    pub fn pedigree(&self) -> &Pedigree {
        &self.pedigree
    }

    pub fn variants(&self) -> &[VariantEvaluation] {
        &self.variants
    }

    pub fn variants_mut(&mut self) -> &mut [VariantEvaluation] {
        &mut self.variants
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn genes_mut(&mut self) -> &mut [Gene] {
        &mut self.genes
    }

    /// Genes mutably alongside the arena they index.
    pub fn genes_and_variants_mut(&mut self) -> (&mut [Gene], &[VariantEvaluation]) {
        (&mut self.genes, &self.variants)
    }

    /// Pedigree, genes and arena borrowed together for segregation analysis.
    pub fn parts_mut(&mut self) -> (&Pedigree, &mut [Gene], &[VariantEvaluation]) {
        (&self.pedigree, &mut self.genes, &self.variants)
    }

    pub fn gene(&self, symbol: &str) -> Option<&Gene> {
        self.genes.iter().find(|g| g.symbol == symbol)
    }

    pub fn variant(&self, id: VariantId) -> Option<&VariantEvaluation> {
        self.variants.get(id.0)
    }

    pub fn passed_variant_count(&self) -> usize {
        self.variants.iter().filter(|v| v.passed_filters()).count()
    }

    pub fn passed_gene_count(&self) -> usize {
        self.genes.iter().filter(|g| g.passed_filters(&self.variants)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use variomyx_common::{FilterKind, FilterResult};
    use variomyx_test_utils::variant;

    fn symbols(sample: &Sample) -> Vec<&str> {
        sample.genes().iter().map(|g| g.symbol.as_str()).collect()
    }

    #[test]
    fn test_genes_derived_in_first_seen_order() {
        let sample = Sample::new(
            vec!["proband".into()],
            Pedigree::empty(),
            vec![variant("TP53", 7157, 1), variant("FGFR2", 2263, 2), variant("TP53", 7157, 3)],
        );
        assert_eq!(symbols(&sample), vec!["TP53", "FGFR2"]);
        assert_eq!(sample.genes()[0].variant_ids(), &[VariantId(0), VariantId(2)]);
        let second = sample.genes()[0].variant_ids()[1];
        assert_eq!(sample.variant(second).map(|v| v.position), Some(3));
    }

    #[test]
    fn test_known_gene_index_cleans_records() {
        let index = KnownGeneIndex::build(&[
            GeneIdentifier::new("FGFR2", 2263),
            GeneIdentifier::new(" TP53 ", 7157),
            GeneIdentifier::new("", 1),
            GeneIdentifier::new("UNKNOWN", 0),
            GeneIdentifier::new("FGFR2-dup", 2263),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(7157).map(|g| g.symbol.as_str()), Some("TP53"));
        assert_eq!(index.get(2263).map(|g| g.symbol.as_str()), Some("FGFR2"));
        assert!(!index.contains(0));
    }

    #[test]
    fn test_attach_drops_unknown_genes_and_empty_genes() {
        let index = KnownGeneIndex::build(&[
            GeneIdentifier::new("FGFR2", 2263),
            GeneIdentifier::new("TP53", 7157),
            GeneIdentifier::new("BRCA2", 675),
        ]);
        let partial = PartialSample {
            sample_names: vec!["proband".into()],
            pedigree: Pedigree::empty(),
            known_genes: index.genes().to_vec(),
        };
        let mut sample = Sample::from_partial(partial, &index);
        assert_eq!(sample.genes().len(), 3);

        let dropped = sample.attach_variants(vec![
            variant("TP53", 7157, 1),
            variant("NOVEL", 999_999, 2),
            variant("FGFR2", 2263, 3),
        ]);

        assert_eq!(dropped, 1);
        assert_eq!(symbols(&sample), vec!["FGFR2", "TP53"]);
        assert_eq!(sample.variants().len(), 2);
        assert_eq!(sample.genes()[0].variant_ids(), &[VariantId(1)]);
    }

    #[test]
    fn test_retain_variants_renumbers_handles() {
        let mut failed = variant("TP53", 7157, 2);
        failed.record_filter_result(FilterResult::fail(FilterKind::Quality, 0.0));
        let mut sample = Sample::new(
            vec!["proband".into()],
            Pedigree::empty(),
            vec![variant("FGFR2", 2263, 1), failed, variant("BRCA2", 675, 3)],
        );

        sample.retain_variants(VariantEvaluation::passed_filters);

        assert_eq!(symbols(&sample), vec!["FGFR2", "BRCA2"]);
        let brca2 = sample.gene("BRCA2").unwrap();
        assert_eq!(brca2.variant_ids(), &[VariantId(1)]);
        assert_eq!(sample.variant(VariantId(1)).map(|v| v.position), Some(3));
        assert_eq!(sample.passed_gene_count(), 2);
    }
}
