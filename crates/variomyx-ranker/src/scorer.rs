//! Combined gene score computation.
//!
//! Raw score: S(g) = F(g) × P(g), where F is the product of the passing
//! filter scores of the gene's best variant and P is the highest priority
//! score any evidence prioritiser gave the gene, scaled by the OMIM factor.

use std::cmp::Ordering;

use tracing::debug;
use variomyx_common::{Gene, InheritanceMode, PriorityKind, ScoringMode, VariantEvaluation};

use crate::rank_based::RankBasedGeneScorer;

/// Combined score given to genes incompatible with the requested
/// inheritance mode. They stay in the ranking, below every compatible gene
/// with evidence.
pub const INCOMPATIBLE_SCORE: f64 = 0.0;

/// Priority score assumed when no prioritiser has scored a gene.
pub const NEUTRAL_PRIORITY_SCORE: f64 = 1.0;

/// Reduces each gene's accumulated evidence to one combined score.
pub trait GeneScorer: Send + Sync {
    /// Write filter, priority and combined scores onto every gene.
    fn score_genes(&self, genes: &mut [Gene], variants: &[VariantEvaluation], mode: InheritanceMode);
}

pub fn scorer_for(mode: ScoringMode) -> Box<dyn GeneScorer> {
    match mode {
        ScoringMode::RawScore => Box::new(RawScoreGeneScorer),
        ScoringMode::RankBased => Box::new(RankBasedGeneScorer),
    }
}

/// Filter score F(g): the passing-score product of the best passing variant,
/// 0.0 when the gene failed.
pub fn gene_filter_score(gene: &Gene, variants: &[VariantEvaluation]) -> f64 {
    if !gene.passed_filters(variants) {
        return 0.0;
    }
    gene.passed_variants(variants)
        .map(|(_, v)| v.filter_results().passing_score_product())
        .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))))
        .unwrap_or(0.0)
}

/// Priority score P(g): the maximum across the evidence prioritisers that
/// ran, multiplied by the OMIM factor. OMIM only penalises, so its neutral
/// 1.0 never masks a low phenotype score.
pub fn gene_priority_score(gene: &Gene) -> f64 {
    let evidence = gene
        .priority_scores()
        .iter()
        .filter(|(kind, _)| **kind != PriorityKind::Omim)
        .map(|(_, s)| *s)
        .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))))
        .unwrap_or(NEUTRAL_PRIORITY_SCORE);
    let omim_factor = gene.priority_score_for(PriorityKind::Omim).unwrap_or(1.0);
    evidence * omim_factor
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RawScoreGeneScorer;

impl GeneScorer for RawScoreGeneScorer {
    fn score_genes(&self, genes: &mut [Gene], variants: &[VariantEvaluation], mode: InheritanceMode) {
        for gene in genes.iter_mut() {
            let filter_score = gene_filter_score(gene, variants);
            let priority_score = gene_priority_score(gene);
            let combined = if gene.is_compatible_with(mode) {
                filter_score * priority_score
            } else {
                INCOMPATIBLE_SCORE
            };
            debug!(gene = %gene.symbol, filter_score, priority_score, combined, "Scored gene");
            gene.set_scores(filter_score, priority_score, combined);
        }
    }
}

/// Sort genes best first: combined score descending, then symbol.
pub fn rank_genes(genes: &mut [Gene]) {
    genes.sort_by(|a, b| compare_ranked(a, b));
}

fn compare_ranked(a: &Gene, b: &Gene) -> Ordering {
    b.combined_score()
        .total_cmp(&a.combined_score())
        .then_with(|| a.symbol.cmp(&b.symbol))
}
