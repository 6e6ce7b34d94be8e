//! Frequency and pathogenicity annotations attached to a variant.
//!
//! An empty annotation is a valid answer from the provider: it means the
//! variant has no recorded evidence, not that the lookup failed.

use serde::{Deserialize, Serialize};

/// Population databases a frequency can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrequencySource {
    GnomadExome,
    GnomadGenome,
    TopMed,
    ThousandGenomes,
    Esp,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frequency {
    pub source: FrequencySource,
    /// Allele frequency as a percentage (0.0–100.0)
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyData {
    pub rs_id: Option<String>,
    #[serde(default)]
    pub frequencies: Vec<Frequency>,
}

impl FrequencyData {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(frequencies: Vec<Frequency>) -> Self {
        Self { rs_id: None, frequencies }
    }

    pub fn is_empty(&self) -> bool {
        self.rs_id.is_none() && self.frequencies.is_empty()
    }

    /// Highest recorded frequency across all sources, 0.0 when none is known.
    pub fn max_freq(&self) -> f64 {
        self.frequencies
            .iter()
            .map(|f| f.percent)
            .fold(0.0, f64::max)
    }

    /// Rarity score in [0, 1]: 1.0 for unseen variants, falling linearly to
    /// 0.0 at a 2% population frequency.
    pub fn score(&self) -> f64 {
        (1.0 - self.max_freq() / 2.0).clamp(0.0, 1.0)
    }
}

/// In-silico predictors a pathogenicity score can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PathogenicitySource {
    Polyphen,
    MutationTaster,
    Sift,
    Cadd,
    Revel,
    Remm,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathogenicityScore {
    pub source: PathogenicitySource,
    /// Normalised so that 1.0 is maximally pathogenic
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathogenicityData {
    #[serde(default)]
    pub scores: Vec<PathogenicityScore>,
}

impl PathogenicityData {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(scores: Vec<PathogenicityScore>) -> Self {
        Self { scores }
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Most pathogenic prediction, 0.0 when no predictor has an opinion.
    pub fn predicted_score(&self) -> f64 {
        self.scores
            .iter()
            .map(|s| s.score)
            .fold(0.0, f64::max)
            .clamp(0.0, 1.0)
    }
}
