//! Turns configured step specs into runnable steps.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use variomyx_common::{AnalysisSettings, Contig, PriorityKind, Result, StepSpec, VariomyxError};

use crate::filters::{
    FrequencyFilter, GeneSymbolFilter, InheritanceFilter, IntervalFilter, PathogenicityFilter,
    PriorityScoreFilter, QualityFilter,
};
use crate::priority::{DiseaseSource, InMemoryDiseaseSource, OmimPrioritiser, ScoreTablePrioritiser};
use crate::step::AnalysisStep;

/// External data the prioritisers read from.
#[derive(Clone)]
pub struct PrioritiserSources {
    pub diseases: Arc<dyn DiseaseSource>,
    /// Precomputed scores per prioritiser kind, keyed by gene symbol
    pub score_tables: HashMap<PriorityKind, HashMap<String, f64>>,
}

impl Default for PrioritiserSources {
    fn default() -> Self {
        Self {
            diseases: Arc::new(InMemoryDiseaseSource::new()),
            score_tables: HashMap::new(),
        }
    }
}

/// Build steps in the order given. Ordering is corrected when the steps
/// are handed to an [`Analysis`](crate::Analysis).
pub fn build_steps(
    specs: &[StepSpec],
    settings: &AnalysisSettings,
    sources: &PrioritiserSources,
) -> Result<Vec<AnalysisStep>> {
    let steps = specs
        .iter()
        .map(|spec| build_step(spec, settings, sources))
        .collect::<Result<Vec<_>>>()?;
    debug!(steps = steps.len(), "Built analysis steps");
    Ok(steps)
}

fn build_step(spec: &StepSpec, settings: &AnalysisSettings, sources: &PrioritiserSources) -> Result<AnalysisStep> {
    let step = match spec {
        StepSpec::QualityFilter { min_quality } => AnalysisStep::variant_filter(QualityFilter::new(*min_quality)),
        StepSpec::FrequencyFilter { max_frequency } => {
            AnalysisStep::variant_filter(FrequencyFilter::new(*max_frequency))
        }
        StepSpec::PathogenicityFilter { keep_non_pathogenic } => {
            AnalysisStep::variant_filter(PathogenicityFilter::new(*keep_non_pathogenic))
        }
        StepSpec::IntervalFilter { contig, start, end } => {
            let contig: Contig = contig
                .parse()
                .map_err(|_| VariomyxError::Config(format!("Unknown contig in interval filter: {contig}")))?;
            AnalysisStep::variant_filter(IntervalFilter::new(contig, *start, *end))
        }
        StepSpec::InheritanceFilter { modes } if modes.is_empty() => {
            AnalysisStep::gene_filter(InheritanceFilter::new([settings.inheritance_mode]))
        }
        StepSpec::InheritanceFilter { modes } => {
            AnalysisStep::gene_filter(InheritanceFilter::new(modes.iter().copied()))
        }
        StepSpec::PriorityScoreFilter { priority, min_score } => {
            AnalysisStep::gene_filter(PriorityScoreFilter::new(*priority, *min_score))
        }
        StepSpec::GeneSymbolFilter { symbols } => AnalysisStep::gene_filter(GeneSymbolFilter::new(symbols.iter().cloned())),
        StepSpec::OmimPrioritiser => AnalysisStep::prioritiser(OmimPrioritiser::new(Arc::clone(&sources.diseases))),
        StepSpec::ScorePrioritiser { priority } => {
            let table = sources.score_tables.get(priority).ok_or_else(|| {
                VariomyxError::Config(format!("No score table loaded for {priority} prioritiser"))
            })?;
            AnalysisStep::prioritiser(ScoreTablePrioritiser::new(*priority, table.clone()))
        }
    };
    Ok(step)
}
