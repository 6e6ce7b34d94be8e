//! Rank-based combined scoring.
//!
//! Genes are ranked separately on filter and priority evidence. With the
//! normalised rank positions n_f and n_p (0.0 = best) and the gene's 0-based
//! position k after ordering by their mean:
//!
//! S(g) = ((1 − mean(n_f, n_p)) + (1 − k/N)) / 2
//!
//! The second term separates genes whose means tie, so scores strictly
//! decrease down the ranking and a gene leading both axes scores 1.0.

use tracing::debug;
use variomyx_common::{Gene, InheritanceMode, VariantEvaluation};

use crate::normalise::{compare_rank_keys, normalised_position, rank_positions};
use crate::scorer::{gene_filter_score, gene_priority_score, GeneScorer, INCOMPATIBLE_SCORE};

#[derive(Debug, Clone, Copy, Default)]
pub struct RankBasedGeneScorer;

impl GeneScorer for RankBasedGeneScorer {
    fn score_genes(&self, genes: &mut [Gene], variants: &[VariantEvaluation], mode: InheritanceMode) {
        let n = genes.len();
        if n == 0 {
            return;
        }

        let filter_scores: Vec<f64> = genes.iter().map(|g| gene_filter_score(g, variants)).collect();
        let priority_scores: Vec<f64> = genes.iter().map(gene_priority_score).collect();
        let labels: Vec<&str> = genes.iter().map(|g| g.symbol.as_str()).collect();

        let filter_ranks = rank_positions(&filter_scores, &labels);
        let priority_ranks = rank_positions(&priority_scores, &labels);

        let means: Vec<f64> = (0..n)
            .map(|i| (normalised_position(filter_ranks[i], n) + normalised_position(priority_ranks[i], n)) / 2.0)
            .collect();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            compare_rank_keys(
                (means[a], filter_ranks[a], labels[a]),
                (means[b], filter_ranks[b], labels[b]),
            )
        });

        let mut combined = vec![0.0; n];
        for (k, &idx) in order.iter().enumerate() {
            combined[idx] = ((1.0 - means[idx]) + (1.0 - k as f64 / n as f64)) / 2.0;
        }

        for (i, gene) in genes.iter_mut().enumerate() {
            let score = if gene.is_compatible_with(mode) { combined[i] } else { INCOMPATIBLE_SCORE };
            debug!(
                gene = %gene.symbol,
                filter_rank = filter_ranks[i],
                priority_rank = priority_ranks[i],
                combined = score,
                "Rank-scored gene"
            );
            gene.set_scores(filter_scores[i], priority_scores[i], score);
        }
    }
}
