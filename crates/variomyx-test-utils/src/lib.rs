//! Fixture builders shared by the Variomyx test suites.

pub use pretty_assertions;

use variomyx_common::annotation::{
    Frequency, FrequencyData, FrequencySource, PathogenicityData, PathogenicityScore,
    PathogenicitySource,
};
use variomyx_common::{
    AffectedStatus, Contig, FilterKind, FilterResult, Gene, Genotype, Individual, Pedigree, Sex,
    VariantEvaluation, VariantId,
};

pub const PROBAND: &str = "proband";
pub const FATHER: &str = "father";
pub const MOTHER: &str = "mother";

// ── Variants ─────────────────────────────────────────────────────────────────

/// Autosomal variant on chromosome 1 in the given gene.
pub fn variant(gene: &str, gene_id: u32, position: u64) -> VariantEvaluation {
    VariantEvaluation::new(Contig::Autosome(1), position, "A", "T")
        .with_gene(gene, gene_id)
        .with_quality(100.0)
}

pub fn x_variant(gene: &str, gene_id: u32, position: u64) -> VariantEvaluation {
    VariantEvaluation::new(Contig::X, position, "G", "C")
        .with_gene(gene, gene_id)
        .with_quality(100.0)
}

pub fn mt_variant(gene: &str, gene_id: u32, position: u64) -> VariantEvaluation {
    VariantEvaluation::new(Contig::Mt, position, "T", "C")
        .with_gene(gene, gene_id)
        .with_quality(100.0)
}

/// Variant carrying passing results with the given scores.
pub fn scored_variant(gene: &str, gene_id: u32, position: u64, scores: &[(FilterKind, f64)]) -> VariantEvaluation {
    let mut v = variant(gene, gene_id, position);
    for &(kind, score) in scores {
        v.record_filter_result(FilterResult::pass(kind, score));
    }
    v
}

/// Variant that failed the given filter.
pub fn failed_variant(gene: &str, gene_id: u32, position: u64, kind: FilterKind) -> VariantEvaluation {
    let mut v = variant(gene, gene_id, position);
    v.record_filter_result(FilterResult::fail(kind, 0.0));
    v
}

pub fn frequency(percent: f64) -> FrequencyData {
    FrequencyData::new(vec![Frequency { source: FrequencySource::GnomadExome, percent }])
}

pub fn pathogenicity(score: f64) -> PathogenicityData {
    PathogenicityData::new(vec![PathogenicityScore { source: PathogenicitySource::Revel, score }])
}

/// Set genotypes for (sample, genotype) pairs.
pub fn genotyped(mut v: VariantEvaluation, calls: &[(&str, Genotype)]) -> VariantEvaluation {
    for &(sample, gt) in calls {
        v = v.with_genotype(sample, gt);
    }
    v
}

// ── Genes ────────────────────────────────────────────────────────────────────

/// Group variants into genes by symbol, in first-seen order, with handles
/// pointing into `variants`.
pub fn genes_from(variants: &[VariantEvaluation]) -> Vec<Gene> {
    let mut genes: Vec<Gene> = Vec::new();
    for (idx, v) in variants.iter().enumerate() {
        match genes.iter_mut().find(|g| g.symbol == v.gene_symbol) {
            Some(gene) => gene.add_variant(VariantId(idx)),
            None => {
                let mut gene = Gene::new(&v.gene_symbol, v.gene_id);
                gene.add_variant(VariantId(idx));
                genes.push(gene);
            }
        }
    }
    genes
}

// ── Pedigrees ────────────────────────────────────────────────────────────────

/// Unaffected parents with one affected child of the given sex.
pub fn trio(child_sex: Sex) -> Pedigree {
    Pedigree::new(vec![
        Individual::new(FATHER, Sex::Male, AffectedStatus::Unaffected),
        Individual::new(MOTHER, Sex::Female, AffectedStatus::Unaffected),
        Individual::new(PROBAND, child_sex, AffectedStatus::Affected).with_parents(FATHER, MOTHER),
    ])
    .expect("trio pedigree is valid")
}

/// A single affected individual.
pub fn singleton(sex: Sex) -> Pedigree {
    Pedigree::new(vec![Individual::new(PROBAND, sex, AffectedStatus::Affected)])
        .expect("singleton pedigree is valid")
}

pub fn trio_sample_names() -> Vec<String> {
    vec![PROBAND.to_string(), FATHER.to_string(), MOTHER.to_string()]
}
