//! variomyx-ranker: Gene scoring and ranking.
//! Reduces each gene's filter and priority evidence to one combined score.

pub mod scorer;
pub mod normalise;
pub mod rank_based;

pub use scorer::{rank_genes, scorer_for, GeneScorer, RawScoreGeneScorer, INCOMPATIBLE_SCORE};
pub use rank_based::RankBasedGeneScorer;
pub use variomyx_common::ScoringMode;
