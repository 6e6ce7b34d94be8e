//! Rank normalisation for gene scores.

use std::cmp::Ordering;

/// Rank scores from best (1) to worst (N), higher scores first.
/// Equal scores are ordered by label so the ranking is deterministic.
/// Returns ranks in the same order as the input.
pub fn rank_positions(scores: &[f64], labels: &[&str]) -> Vec<usize> {
    debug_assert_eq!(scores.len(), labels.len());
    let n = scores.len();

    let mut indexed: Vec<usize> = (0..n).collect();
    indexed.sort_by(|&a, &b| {
        scores[b]
            .total_cmp(&scores[a])
            .then_with(|| labels[a].cmp(labels[b]))
    });

    let mut ranks = vec![0usize; n];
    for (position, &idx) in indexed.iter().enumerate() {
        ranks[idx] = position + 1;
    }
    ranks
}

/// Map rank r in [1, N] onto [0, 1): the best rank is 0.0.
pub fn normalised_position(rank: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    (rank.saturating_sub(1)) as f64 / n as f64
}

/// Order two (mean position, filter rank, label) keys, best first.
pub(crate) fn compare_rank_keys(a: (f64, usize, &str), b: (f64, usize, &str)) -> Ordering {
    a.0.total_cmp(&b.0)
        .then_with(|| a.1.cmp(&b.1))
        .then_with(|| a.2.cmp(b.2))
}
