//! Pipeline executor.
//!
//! Runs one analysis: load the sample, run the ordered steps, compute
//! inheritance modes once when the first step that needs them is reached,
//! then score and rank every gene.
//!
//! States: AwaitingSample → ComputingInheritance (optional) → RunningSteps
//! → Scoring → Done.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use variomyx_common::{
    AnalysisConfig, Gene, InheritanceMode, Result, RetentionPolicy, RunStrategy, ScoringMode,
    VariantEvaluation,
};
use variomyx_ranker::{rank_genes, scorer_for};

use crate::annotation::AnnotationProvider;
use crate::filters::VariantFilter;
use crate::inheritance::InheritanceAnalyzer;
use crate::runner::{run_prioritiser, EagerFilterRunner, GeneFilterRunner, SparseFilterRunner};
use crate::sample::{KnownGeneIndex, Sample, SampleDataFactory};
use crate::step::{kinds, AnalysisStep};
use crate::validator::StepOrderingValidator;

// ── Analysis definition ───────────────────────────────────────────────────────

/// Everything needed to run one analysis. Steps are validated on the way in.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub vcf_path: PathBuf,
    pub pedigree_path: Option<PathBuf>,
    steps: Vec<AnalysisStep>,
    pub strategy: RunStrategy,
    /// Applies to sparse runs; eager runs keep every variant
    pub retention: RetentionPolicy,
    pub inheritance_mode: InheritanceMode,
    pub scoring: ScoringMode,
}

impl Analysis {
    pub fn new(vcf_path: impl Into<PathBuf>, steps: Vec<AnalysisStep>) -> Self {
        Self {
            vcf_path: vcf_path.into(),
            pedigree_path: None,
            steps: StepOrderingValidator::validate(steps),
            strategy: RunStrategy::default(),
            retention: RetentionPolicy::default(),
            inheritance_mode: InheritanceMode::Any,
            scoring: ScoringMode::default(),
        }
    }

    pub fn from_config(config: &AnalysisConfig, steps: Vec<AnalysisStep>) -> Self {
        let settings = &config.analysis;
        let mut analysis = Self::new(&config.sample.vcf, steps)
            .with_strategy(settings.strategy)
            .with_retention(settings.retention)
            .with_inheritance_mode(settings.inheritance_mode)
            .with_scoring(settings.scoring);
        analysis.pedigree_path = config.sample.pedigree.clone();
        analysis
    }

    pub fn with_pedigree(mut self, path: impl Into<PathBuf>) -> Self {
        self.pedigree_path = Some(path.into());
        self
    }

    pub fn with_strategy(mut self, strategy: RunStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_inheritance_mode(mut self, mode: InheritanceMode) -> Self {
        self.inheritance_mode = mode;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringMode) -> Self {
        self.scoring = scoring;
        self
    }

    /// Steps in run order.
    pub fn steps(&self) -> &[AnalysisStep] {
        &self.steps
    }
}

// ── Results ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResults {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub strategy: RunStrategy,
    pub scoring: ScoringMode,
    pub inheritance_mode: InheritanceMode,
    pub inheritance_computed: bool,
    pub passed_gene_count: usize,
    pub passed_variant_count: usize,
    /// Genes in the sample are in rank order, best first
    pub sample: Sample,
}

impl AnalysisResults {
    pub fn ranked_genes(&self) -> &[Gene] {
        self.sample.genes()
    }

    /// The best `n` genes, optionally only those passing every filter.
    pub fn top_genes(&self, n: usize, pass_only: bool) -> Vec<&Gene> {
        let variants = self.sample.variants();
        self.ranked_genes()
            .iter()
            .filter(|g| !pass_only || g.passed_filters(variants))
            .take(n)
            .collect()
    }
}

// ── Executor ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorState {
    AwaitingSample,
    ComputingInheritance,
    RunningSteps,
    Scoring,
    Done,
}

/// Runs analyses against a sample factory and an annotation provider.
/// Owns the run's sample exclusively until it returns.
pub struct PipelineExecutor<'a> {
    factory: &'a dyn SampleDataFactory,
    annotations: &'a dyn AnnotationProvider,
    state: ExecutorState,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(factory: &'a dyn SampleDataFactory, annotations: &'a dyn AnnotationProvider) -> Self {
        Self { factory, annotations, state: ExecutorState::AwaitingSample }
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    #[instrument(skip(self, analysis), fields(vcf = %analysis.vcf_path.display(), strategy = ?analysis.strategy))]
    pub fn run_analysis(&mut self, analysis: &Analysis) -> Result<AnalysisResults> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(run_id = %run_id, steps = ?kinds(analysis.steps()), "Starting analysis");

        // ── 1. Load the sample ────────────────────────────────────────────────
        self.state = ExecutorState::AwaitingSample;
        let (mut sample, mut variants_loaded) = self.load_sample(analysis)?;
        sample.pedigree().check_sample_names(sample.sample_names())?;

        // ── 2. Run the steps ──────────────────────────────────────────────────
        self.state = ExecutorState::RunningSteps;
        let steps = analysis.steps();
        let mut inheritance_computed = false;
        let mut i = 0;
        while i < steps.len() {
            if !variants_loaded && needs_variants(&steps[i]) {
                // stream through the variant filters starting here, if any
                let end = variant_filter_run_end(steps, i);
                self.stream_variants(&mut sample, analysis, &variant_filters(&steps[i..end]))?;
                variants_loaded = true;
                if end > i {
                    i = end;
                    continue;
                }
            }

            let step = &steps[i];
            if step.is_inheritance_dependent() && !inheritance_computed {
                self.compute_inheritance(&mut sample);
                inheritance_computed = true;
            }

            match step {
                AnalysisStep::VariantFilter(_) => {
                    let end = variant_filter_run_end(steps, i);
                    self.run_variant_filters(&mut sample, analysis, &variant_filters(&steps[i..end]));
                    i = end;
                    continue;
                }
                AnalysisStep::GeneFilter(filter) => {
                    let (genes, variants) = sample.genes_and_variants_mut();
                    GeneFilterRunner.run(std::slice::from_ref(filter), genes, variants);
                }
                AnalysisStep::Prioritiser(prioritiser) => {
                    run_prioritiser(prioritiser.as_ref(), sample.genes_mut());
                }
            }
            i += 1;
        }

        if !variants_loaded {
            self.stream_variants(&mut sample, analysis, &[])?;
        }
        if analysis.inheritance_mode != InheritanceMode::Any && !inheritance_computed {
            self.compute_inheritance(&mut sample);
            inheritance_computed = true;
        }

        // ── 3. Score and rank ─────────────────────────────────────────────────
        self.state = ExecutorState::Scoring;
        {
            let (genes, variants) = sample.genes_and_variants_mut();
            scorer_for(analysis.scoring).score_genes(genes, variants, analysis.inheritance_mode);
        }
        rank_genes(sample.genes_mut());

        self.state = ExecutorState::Done;
        let results = AnalysisResults {
            run_id,
            started_at,
            finished_at: Utc::now(),
            strategy: analysis.strategy,
            scoring: analysis.scoring,
            inheritance_mode: analysis.inheritance_mode,
            inheritance_computed,
            passed_gene_count: sample.passed_gene_count(),
            passed_variant_count: sample.passed_variant_count(),
            sample,
        };
        info!(
            run_id = %run_id,
            genes = results.sample.genes().len(),
            passed_genes = results.passed_gene_count,
            passed_variants = results.passed_variant_count,
            "Analysis complete"
        );
        Ok(results)
    }

    /// Eager runs load everything; sparse runs start from the known genes
    /// and load variants later. Returns whether variants are loaded.
    fn load_sample(&self, analysis: &Analysis) -> Result<(Sample, bool)> {
        let pedigree_path = analysis.pedigree_path.as_deref();
        match analysis.strategy {
            RunStrategy::Eager => {
                let sample = self.factory.create(&analysis.vcf_path, pedigree_path)?;
                info!(
                    variants = sample.variants().len(),
                    genes = sample.genes().len(),
                    "Sample loaded"
                );
                Ok((sample, true))
            }
            RunStrategy::Sparse => {
                let partial = self
                    .factory
                    .create_without_variants_or_genes(&analysis.vcf_path, pedigree_path)?;
                let index = KnownGeneIndex::build(&partial.known_genes);
                let sample = Sample::from_partial(partial, &index);
                info!(known_genes = index.len(), "Sample loaded without variants");
                Ok((sample, false))
            }
        }
    }

    fn stream_variants(
        &self,
        sample: &mut Sample,
        analysis: &Analysis,
        filters: &[Arc<dyn VariantFilter>],
    ) -> Result<()> {
        let stream = self.factory.stream_variants(&analysis.vcf_path)?;
        let runner = SparseFilterRunner::new(self.annotations, analysis.retention);
        let kept = runner.run_stream(filters, stream);
        sample.attach_variants(kept);
        Ok(())
    }

    fn run_variant_filters(&self, sample: &mut Sample, analysis: &Analysis, filters: &[Arc<dyn VariantFilter>]) {
        match analysis.strategy {
            RunStrategy::Eager => EagerFilterRunner.run_in_place(filters, sample.variants_mut()),
            RunStrategy::Sparse => {
                SparseFilterRunner::new(self.annotations, analysis.retention)
                    .run_in_place(filters, sample.variants_mut());
                if analysis.retention == RetentionPolicy::DiscardFailed {
                    sample.retain_variants(VariantEvaluation::passed_filters);
                }
            }
        }
    }

    fn compute_inheritance(&mut self, sample: &mut Sample) {
        self.state = ExecutorState::ComputingInheritance;
        let (pedigree, genes, variants) = sample.parts_mut();
        let analysed = InheritanceAnalyzer::new(pedigree).analyse_genes(genes, variants);
        debug!(genes = analysed, "Inheritance modes latched for this run");
        self.state = ExecutorState::RunningSteps;
    }
}

/// Whether a step can only run once variants are loaded. Inheritance
/// modes come from variants, so inheritance-dependent prioritisers need them.
fn needs_variants(step: &AnalysisStep) -> bool {
    !step.only_requires_genes() || step.is_inheritance_dependent()
}

/// End (exclusive) of the run of consecutive variant filters starting at `start`.
fn variant_filter_run_end(steps: &[AnalysisStep], start: usize) -> usize {
    steps[start..]
        .iter()
        .position(|s| !s.is_variant_filter())
        .map_or(steps.len(), |offset| start + offset)
}

fn variant_filters(steps: &[AnalysisStep]) -> Vec<Arc<dyn VariantFilter>> {
    steps.iter().filter_map(AnalysisStep::as_variant_filter).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::InMemoryAnnotationProvider;
    use crate::filters::{FrequencyFilter, InheritanceFilter, PriorityScoreFilter, QualityFilter};
    use crate::priority::{InMemoryDiseaseSource, OmimPrioritiser, ScoreTablePrioritiser};
    use crate::sample::{PartialSample, VariantStream};
    use std::collections::HashMap;
    use std::path::Path;
    use variomyx_common::{GeneIdentifier, Pedigree, PriorityKind, VariomyxError};
    use tracing_test::traced_test;
    use variomyx_test_utils::{frequency, variant};

    struct FixedFactory {
        sample_names: Vec<String>,
        variants: Vec<VariantEvaluation>,
    }

    impl FixedFactory {
        fn singleton(variants: Vec<VariantEvaluation>) -> Self {
            Self { sample_names: vec!["proband".into()], variants }
        }
    }

    impl SampleDataFactory for FixedFactory {
        fn create(&self, _vcf: &Path, _ped: Option<&Path>) -> Result<Sample> {
            Ok(Sample::new(self.sample_names.clone(), Pedigree::empty(), self.variants.clone()))
        }

        fn create_without_variants_or_genes(&self, _vcf: &Path, _ped: Option<&Path>) -> Result<PartialSample> {
            let mut known: Vec<GeneIdentifier> = Vec::new();
            for v in &self.variants {
                known.push(GeneIdentifier::new(&v.gene_symbol, v.gene_id));
            }
            Ok(PartialSample {
                sample_names: self.sample_names.clone(),
                pedigree: Pedigree::empty(),
                known_genes: known,
            })
        }

        fn stream_variants(&self, _vcf: &Path) -> Result<VariantStream<'_>> {
            Ok(Box::new(self.variants.clone().into_iter()))
        }
    }

    struct FailingFactory;

    impl SampleDataFactory for FailingFactory {
        fn create(&self, vcf: &Path, _ped: Option<&Path>) -> Result<Sample> {
            Err(VariomyxError::SampleLoad(format!("cannot parse {}", vcf.display())))
        }

        fn create_without_variants_or_genes(&self, vcf: &Path, _ped: Option<&Path>) -> Result<PartialSample> {
            Err(VariomyxError::SampleLoad(format!("cannot parse {}", vcf.display())))
        }

        fn stream_variants(&self, vcf: &Path) -> Result<VariantStream<'_>> {
            Err(VariomyxError::SampleLoad(format!("cannot parse {}", vcf.display())))
        }
    }

    fn steps() -> Vec<AnalysisStep> {
        vec![
            AnalysisStep::variant_filter(QualityFilter::new(30.0)),
            AnalysisStep::variant_filter(FrequencyFilter::new(1.0)),
        ]
    }

    #[test]
    fn test_run_reaches_done() {
        let factory = FixedFactory::singleton(vec![variant("FGFR2", 2263, 1), variant("TP53", 7157, 2).with_quality(5.0)]);
        let annotations = InMemoryAnnotationProvider::new();
        let mut executor = PipelineExecutor::new(&factory, &annotations);

        let results = executor.run_analysis(&Analysis::new("cohort.vcf", steps())).unwrap();

        assert_eq!(executor.state(), ExecutorState::Done);
        assert_eq!(results.passed_variant_count, 1);
        assert_eq!(results.ranked_genes()[0].symbol, "FGFR2");
        assert!(!results.inheritance_computed);
    }

    #[test]
    fn test_sample_load_failure_is_fatal() {
        let annotations = InMemoryAnnotationProvider::new();
        let mut executor = PipelineExecutor::new(&FailingFactory, &annotations);

        let err = executor.run_analysis(&Analysis::new("broken.vcf", steps())).unwrap_err();

        assert!(matches!(err, VariomyxError::SampleLoad(_)));
        assert_eq!(executor.state(), ExecutorState::AwaitingSample);
    }

    #[test]
    fn test_multi_sample_without_pedigree_is_fatal() {
        let mut factory = FixedFactory::singleton(vec![variant("FGFR2", 2263, 1)]);
        factory.sample_names.push("sibling".into());
        let annotations = InMemoryAnnotationProvider::new();
        let mut executor = PipelineExecutor::new(&factory, &annotations);

        let err = executor.run_analysis(&Analysis::new("cohort.vcf", steps())).unwrap_err();
        assert!(matches!(err, VariomyxError::Pedigree(_)));
    }

    #[test]
    fn test_inheritance_computed_before_scoring_when_mode_requested() {
        let factory = FixedFactory::singleton(vec![variant("FGFR2", 2263, 1)]);
        let annotations = InMemoryAnnotationProvider::new();
        let mut executor = PipelineExecutor::new(&factory, &annotations);
        let analysis = Analysis::new("cohort.vcf", vec![AnalysisStep::variant_filter(QualityFilter::new(30.0))])
            .with_strategy(RunStrategy::Eager)
            .with_inheritance_mode(InheritanceMode::AutosomalDominant);

        let results = executor.run_analysis(&analysis).unwrap();

        assert!(results.inheritance_computed);
        assert!(results.ranked_genes()[0].is_compatible_with(InheritanceMode::AutosomalDominant));
        assert!(results.ranked_genes()[0].combined_score() > 0.0);
    }

    #[test]
    #[traced_test]
    fn test_inheritance_computed_once_per_run() {
        let factory = FixedFactory::singleton(vec![variant("FGFR2", 2263, 1)]);
        let annotations = InMemoryAnnotationProvider::new();
        let mut executor = PipelineExecutor::new(&factory, &annotations);
        let analysis = Analysis::new(
            "cohort.vcf",
            vec![
                AnalysisStep::gene_filter(InheritanceFilter::new([InheritanceMode::AutosomalDominant])),
                AnalysisStep::prioritiser(OmimPrioritiser::new(Arc::new(InMemoryDiseaseSource::new()))),
                AnalysisStep::variant_filter(QualityFilter::new(30.0)),
            ],
        )
        .with_strategy(RunStrategy::Eager)
        .with_inheritance_mode(InheritanceMode::AutosomalDominant);

        let results = executor.run_analysis(&analysis).unwrap();

        assert!(results.inheritance_computed);
        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|line| line.contains("Segregation analysis complete")).count() {
                1 => Ok(()),
                n => Err(format!("segregation analysis ran {n} times")),
            }
        });
    }

    #[test]
    fn test_sparse_prioritiser_before_filters_scores_known_genes() {
        let v = variant("FGFR2", 2263, 1);
        let annotations = InMemoryAnnotationProvider::new().with_frequency(&v, frequency(0.1));
        let factory = FixedFactory::singleton(vec![v]);
        let mut executor = PipelineExecutor::new(&factory, &annotations);
        let table = HashMap::from([("FGFR2".to_string(), 0.9)]);
        let analysis = Analysis::new(
            "cohort.vcf",
            vec![
                AnalysisStep::prioritiser(ScoreTablePrioritiser::new(PriorityKind::HiPhive, table)),
                AnalysisStep::variant_filter(FrequencyFilter::new(1.0)),
                AnalysisStep::gene_filter(InheritanceFilter::new([InheritanceMode::AutosomalDominant])),
            ],
        );

        let results = executor.run_analysis(&analysis).unwrap();

        let gene = &results.ranked_genes()[0];
        assert_eq!(gene.priority_score_for(PriorityKind::HiPhive), Some(0.9));
        assert!(gene.passed_filters(results.sample.variants()));
        assert_eq!(annotations.frequency_fetches(), 1);
        assert!(results.inheritance_computed);
    }

    #[test]
    fn test_omim_with_phenotype_scores_keeps_phenotype_order() {
        let factory = FixedFactory::singleton(vec![variant("BAD", 1, 1), variant("GOOD", 2, 2)]);
        let annotations = InMemoryAnnotationProvider::new();
        let mut executor = PipelineExecutor::new(&factory, &annotations);
        let table = HashMap::from([("GOOD".to_string(), 0.95), ("BAD".to_string(), 0.05)]);
        let analysis = Analysis::new(
            "cohort.vcf",
            vec![
                AnalysisStep::variant_filter(QualityFilter::new(30.0)),
                AnalysisStep::prioritiser(ScoreTablePrioritiser::new(PriorityKind::HiPhive, table)),
                AnalysisStep::prioritiser(OmimPrioritiser::new(Arc::new(InMemoryDiseaseSource::new()))),
            ],
        )
        .with_strategy(RunStrategy::Eager);

        let results = executor.run_analysis(&analysis).unwrap();

        let genes = results.ranked_genes();
        assert_eq!(genes[0].symbol, "GOOD");
        assert_eq!(genes[1].symbol, "BAD");
        assert!(genes[0].combined_score() > genes[1].combined_score());
        assert!((genes[0].priority_score() - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_every_repeated_gate_applies() {
        let factory = FixedFactory::singleton(vec![variant("FGFR2", 2263, 1)]);
        let annotations = InMemoryAnnotationProvider::new();
        let mut executor = PipelineExecutor::new(&factory, &annotations);
        let table = HashMap::from([("FGFR2".to_string(), 0.5)]);
        let analysis = Analysis::new(
            "cohort.vcf",
            vec![
                AnalysisStep::variant_filter(QualityFilter::new(30.0)),
                AnalysisStep::prioritiser(ScoreTablePrioritiser::new(PriorityKind::HiPhive, table)),
                AnalysisStep::gene_filter(PriorityScoreFilter::new(PriorityKind::HiPhive, 0.1)),
                AnalysisStep::gene_filter(PriorityScoreFilter::new(PriorityKind::HiPhive, 0.9)),
            ],
        );
        assert_eq!(analysis.steps().len(), 4);

        let results = executor.run_analysis(&analysis).unwrap();

        assert_eq!(results.passed_gene_count, 0);
        assert_eq!(results.ranked_genes()[0].combined_score(), 0.0);
    }

    #[test]
    fn test_variant_filter_run_end() {
        let mut steps = steps();
        steps.push(AnalysisStep::gene_filter(InheritanceFilter::new([])));
        steps.push(AnalysisStep::variant_filter(QualityFilter::new(1.0)));
        assert_eq!(variant_filter_run_end(&steps, 0), 2);
        assert_eq!(variant_filter_run_end(&steps, 2), 2);
        assert_eq!(variant_filter_run_end(&steps, 3), 4);
    }
}
