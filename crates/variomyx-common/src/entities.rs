/// Core genomic entities shared by the analysis and ranking crates.
///
/// Variants live in a single arena owned by the run's sample; genes refer to
/// them through `VariantId` handles rather than holding copies.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::annotation::{FrequencyData, PathogenicityData};
use crate::error::VariomyxError;
use crate::filter_result::{FilterResult, FilterResultMap};
use crate::inheritance::InheritanceMode;

// ---------------------------------------------------------------------------
// Contig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Contig {
    Autosome(u8),
    X,
    Y,
    Mt,
}

impl Contig {
    pub fn is_autosome(&self) -> bool {
        matches!(self, Contig::Autosome(_))
    }

    pub fn is_x(&self) -> bool {
        matches!(self, Contig::X)
    }

    pub fn is_mitochondrial(&self) -> bool {
        matches!(self, Contig::Mt)
    }
}

impl fmt::Display for Contig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contig::Autosome(n) => write!(f, "{n}"),
            Contig::X => f.write_str("X"),
            Contig::Y => f.write_str("Y"),
            Contig::Mt => f.write_str("MT"),
        }
    }
}

impl FromStr for Contig {
    type Err = VariomyxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_prefix("chr").unwrap_or(name);
        match name.to_ascii_uppercase().as_str() {
            "X" | "23" => Ok(Contig::X),
            "Y" | "24" => Ok(Contig::Y),
            "M" | "MT" | "25" => Ok(Contig::Mt),
            other => match other.parse::<u8>() {
                Ok(n) if (1..=22).contains(&n) => Ok(Contig::Autosome(n)),
                _ => Err(VariomyxError::SampleLoad(format!("Unknown contig: {s}"))),
            },
        }
    }
}

impl TryFrom<String> for Contig {
    type Error = VariomyxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Contig> for String {
    fn from(contig: Contig) -> Self {
        contig.to_string()
    }
}

// ---------------------------------------------------------------------------
// Genotype
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Genotype {
    #[default]
    NoCall,
    HomRef,
    Het,
    HomAlt,
}

impl Genotype {
    /// Het or hom-alt: at least one copy of the alternate allele.
    pub fn carries_alt(&self) -> bool {
        matches!(self, Genotype::Het | Genotype::HomAlt)
    }

    pub fn is_no_call(&self) -> bool {
        matches!(self, Genotype::NoCall)
    }
}

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

/// Handle of a variant within the run's variant arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(pub usize);

/// A called variant together with its per-run evaluation state.
///
/// Coordinates and genotypes are fixed once built. Annotations may be attached
/// later by an on-demand fetch; filter results accumulate during the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantEvaluation {
    pub contig: Contig,
    pub position: u64,
    pub reference: String,
    pub alternate: String,
    #[serde(default)]
    pub quality: f64,
    pub gene_symbol: String,
    pub gene_id: u32,
    /// Genotype per sample name
    #[serde(default)]
    pub genotypes: BTreeMap<String, Genotype>,
    /// `None` until annotated
    #[serde(default)]
    pub frequency: Option<FrequencyData>,
    /// `None` until annotated
    #[serde(default)]
    pub pathogenicity: Option<PathogenicityData>,
    #[serde(default, skip_deserializing)]
    filter_results: FilterResultMap,
}

impl VariantEvaluation {
    pub fn new(contig: Contig, position: u64, reference: &str, alternate: &str) -> Self {
        Self {
            contig,
            position,
            reference: reference.to_string(),
            alternate: alternate.to_string(),
            quality: 0.0,
            gene_symbol: String::new(),
            gene_id: 0,
            genotypes: BTreeMap::new(),
            frequency: None,
            pathogenicity: None,
            filter_results: FilterResultMap::new(),
        }
    }

    pub fn with_gene(mut self, symbol: &str, gene_id: u32) -> Self {
        self.gene_symbol = symbol.to_string();
        self.gene_id = gene_id;
        self
    }

    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_genotype(mut self, sample: &str, genotype: Genotype) -> Self {
        self.genotypes.insert(sample.to_string(), genotype);
        self
    }

    pub fn with_frequency(mut self, frequency: FrequencyData) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn with_pathogenicity(mut self, pathogenicity: PathogenicityData) -> Self {
        self.pathogenicity = Some(pathogenicity);
        self
    }

    /// Genotype of a sample, `NoCall` when the sample was not genotyped here.
    pub fn genotype_of(&self, sample: &str) -> Genotype {
        self.genotypes.get(sample).copied().unwrap_or_default()
    }

    /// chr-pos-ref-alt, for logging.
    pub fn key(&self) -> String {
        format!("{}-{}-{}-{}", self.contig, self.position, self.reference, self.alternate)
    }

    /// Returns the result now held for the kind, merged with any earlier one.
    pub fn record_filter_result(&mut self, result: FilterResult) -> FilterResult {
        self.filter_results.record(result)
    }

    pub fn filter_results(&self) -> &FilterResultMap {
        &self.filter_results
    }

    pub fn passed_filters(&self) -> bool {
        self.filter_results.passed()
    }
}

// ---------------------------------------------------------------------------
// Gene
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneIdentifier {
    pub symbol: String,
    pub entrez_id: u32,
}

impl GeneIdentifier {
    pub fn new(symbol: &str, entrez_id: u32) -> Self {
        Self { symbol: symbol.to_string(), entrez_id }
    }
}

/// Sources of gene priority scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityKind {
    Omim,
    HiPhive,
    Phive,
    Phenix,
    ExomeWalker,
}

impl fmt::Display for PriorityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriorityKind::Omim => "OMIM",
            PriorityKind::HiPhive => "HIPHIVE",
            PriorityKind::Phive => "PHIVE",
            PriorityKind::Phenix => "PHENIX",
            PriorityKind::ExomeWalker => "EXOMEWALKER",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gene {
    pub symbol: String,
    pub entrez_id: u32,
    variant_ids: Vec<VariantId>,
    filter_results: FilterResultMap,
    priority_scores: BTreeMap<PriorityKind, f64>,
    compatible_modes: BTreeSet<InheritanceMode>,
    filter_score: f64,
    priority_score: f64,
    combined_score: f64,
}

impl Gene {
    pub fn new(symbol: &str, entrez_id: u32) -> Self {
        Self {
            symbol: symbol.to_string(),
            entrez_id,
            variant_ids: Vec::new(),
            filter_results: FilterResultMap::new(),
            priority_scores: BTreeMap::new(),
            compatible_modes: BTreeSet::new(),
            filter_score: 0.0,
            priority_score: 0.0,
            combined_score: 0.0,
        }
    }

    pub fn from_identifier(id: &GeneIdentifier) -> Self {
        Self::new(&id.symbol, id.entrez_id)
    }

    // ── Variants ─────────────────────────────────────────────────────────────

    pub fn variant_ids(&self) -> &[VariantId] {
        &self.variant_ids
    }

    pub fn add_variant(&mut self, id: VariantId) {
        self.variant_ids.push(id);
    }

    pub fn clear_variants(&mut self) {
        self.variant_ids.clear();
    }

    pub fn has_variants(&self) -> bool {
        !self.variant_ids.is_empty()
    }

    /// This gene's variants that pass every variant filter, resolved from the arena.
    pub fn passed_variants<'a>(
        &'a self,
        variants: &'a [VariantEvaluation],
    ) -> impl Iterator<Item = (VariantId, &'a VariantEvaluation)> + 'a {
        self.variant_ids
            .iter()
            .filter_map(move |&id| variants.get(id.0).map(|v| (id, v)))
            .filter(|(_, v)| v.passed_filters())
    }

    /// Variant-level verdict: some variant passes, or the gene has no variants yet.
    pub fn passed_variant_filters(&self, variants: &[VariantEvaluation]) -> bool {
        self.variant_ids.is_empty() || self.passed_variants(variants).next().is_some()
    }

    /// Overall verdict across variant and gene filters.
    pub fn passed_filters(&self, variants: &[VariantEvaluation]) -> bool {
        self.filter_results.passed() && self.passed_variant_filters(variants)
    }

    // ── Gene-level filters ───────────────────────────────────────────────────

    /// Returns the result now held for the kind, merged with any earlier one.
    pub fn record_filter_result(&mut self, result: FilterResult) -> FilterResult {
        self.filter_results.record(result)
    }

    pub fn filter_results(&self) -> &FilterResultMap {
        &self.filter_results
    }

    // ── Priorities ───────────────────────────────────────────────────────────

    pub fn add_priority_score(&mut self, kind: PriorityKind, score: f64) {
        self.priority_scores.insert(kind, score.clamp(0.0, 1.0));
    }

    pub fn priority_score_for(&self, kind: PriorityKind) -> Option<f64> {
        self.priority_scores.get(&kind).copied()
    }

    pub fn priority_scores(&self) -> &BTreeMap<PriorityKind, f64> {
        &self.priority_scores
    }

    // ── Inheritance ──────────────────────────────────────────────────────────

    pub fn set_compatible_modes(&mut self, modes: BTreeSet<InheritanceMode>) {
        self.compatible_modes = modes;
    }

    pub fn compatible_modes(&self) -> &BTreeSet<InheritanceMode> {
        &self.compatible_modes
    }

    pub fn is_compatible_with(&self, mode: InheritanceMode) -> bool {
        mode == InheritanceMode::Any || self.compatible_modes.contains(&mode)
    }

    // ── Scores ───────────────────────────────────────────────────────────────

    pub fn filter_score(&self) -> f64 {
        self.filter_score
    }

    pub fn priority_score(&self) -> f64 {
        self.priority_score
    }

    pub fn combined_score(&self) -> f64 {
        self.combined_score
    }

    pub fn set_scores(&mut self, filter_score: f64, priority_score: f64, combined_score: f64) {
        self.filter_score = filter_score;
        self.priority_score = priority_score;
        self.combined_score = combined_score;
    }
}
