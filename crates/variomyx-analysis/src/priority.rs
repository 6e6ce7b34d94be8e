//! Prioritiser contract and the prioritisers shipped with the pipeline.
//!
//! Phenotype-similarity and random-walk algorithms live outside this crate;
//! their output reaches the pipeline through [`ScoreTablePrioritiser`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use variomyx_common::{Gene, InheritanceMode, PriorityKind};

/// Assigns a relevance score to genes without rejecting any of them.
pub trait Prioritiser: Send + Sync + fmt::Debug {
    fn kind(&self) -> PriorityKind;

    /// Record a score of this prioritiser's kind on each gene.
    fn prioritise(&self, genes: &mut [Gene]);
}

// ── Disease lookup ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    pub id: String,
    pub name: String,
    /// `ANY` when the mode is unknown
    #[serde(default = "unknown_inheritance")]
    pub inheritance: InheritanceMode,
}

fn unknown_inheritance() -> InheritanceMode { InheritanceMode::Any }

/// Trait for accessing gene–disease associations.
pub trait DiseaseSource: Send + Sync {
    /// Diseases associated with a gene; empty when none are known.
    fn diseases_for(&self, entrez_id: u32) -> Vec<Disease>;
}

/// Disease associations held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDiseaseSource {
    data: HashMap<u32, Vec<Disease>>,
}

impl InMemoryDiseaseSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a gene–disease association.
    pub fn with(mut self, entrez_id: u32, disease: Disease) -> Self {
        self.data.entry(entrez_id).or_default().push(disease);
        self
    }
}

impl DiseaseSource for InMemoryDiseaseSource {
    fn diseases_for(&self, entrez_id: u32) -> Vec<Disease> {
        self.data.get(&entrez_id).cloned().unwrap_or_default()
    }
}

// ── OMIM ──────────────────────────────────────────────────────────────────────

/// Score when a gene's known diseases all disagree with its segregation.
pub const OMIM_MISMATCH_SCORE: f64 = 0.5;

/// Down-weights genes whose known Mendelian diseases are inherited in a way
/// the family's segregation rules out. Needs inheritance modes computed first.
#[derive(Clone)]
pub struct OmimPrioritiser {
    diseases: Arc<dyn DiseaseSource>,
}

impl OmimPrioritiser {
    pub fn new(diseases: Arc<dyn DiseaseSource>) -> Self {
        Self { diseases }
    }

    fn score_gene(&self, gene: &Gene) -> f64 {
        let diseases = self.diseases.diseases_for(gene.entrez_id);
        if diseases.is_empty() {
            return 1.0;
        }
        let any_compatible = diseases.iter().any(|d| {
            d.inheritance == InheritanceMode::Any || gene.compatible_modes().contains(&d.inheritance)
        });
        if any_compatible { 1.0 } else { OMIM_MISMATCH_SCORE }
    }
}

impl fmt::Debug for OmimPrioritiser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OmimPrioritiser").finish_non_exhaustive()
    }
}

impl Prioritiser for OmimPrioritiser {
    fn kind(&self) -> PriorityKind {
        PriorityKind::Omim
    }

    fn prioritise(&self, genes: &mut [Gene]) {
        for gene in genes.iter_mut() {
            let score = self.score_gene(gene);
            gene.add_priority_score(self.kind(), score);
        }
        debug!(genes = genes.len(), "OMIM prioritiser scored genes");
    }
}

// ── Precomputed scores ────────────────────────────────────────────────────────

/// Applies scores computed elsewhere (keyed by gene symbol). Genes absent
/// from the table score 0.0.
#[derive(Debug, Clone)]
pub struct ScoreTablePrioritiser {
    kind: PriorityKind,
    scores: HashMap<String, f64>,
}

impl ScoreTablePrioritiser {
    pub fn new(kind: PriorityKind, scores: HashMap<String, f64>) -> Self {
        Self { kind, scores }
    }
}

impl Prioritiser for ScoreTablePrioritiser {
    fn kind(&self) -> PriorityKind {
        self.kind
    }

    fn prioritise(&self, genes: &mut [Gene]) {
        let mut matched = 0usize;
        for gene in genes.iter_mut() {
            let score = match self.scores.get(&gene.symbol) {
                Some(&s) => {
                    matched += 1;
                    s
                }
                None => 0.0,
            };
            gene.add_priority_score(self.kind, score);
        }
        debug!(kind = %self.kind, genes = genes.len(), matched, "Applied precomputed priority scores");
    }
}
