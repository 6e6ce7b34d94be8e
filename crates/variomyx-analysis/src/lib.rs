//! variomyx-analysis: Cohort analysis pipeline engine.
//!
//! Validates the user's step ordering, runs variant filters (eagerly or by
//! streaming with on-demand annotation), computes inheritance compatibility
//! once per run, applies gene filters and prioritisers, and hands the genes to
//! the ranker.

pub mod step;
pub mod filters;
pub mod priority;
pub mod validator;
pub mod annotation;
pub mod runner;
pub mod inheritance;
pub mod sample;
pub mod executor;
pub mod builder;

pub use step::{AnalysisStep, StepKind};
pub use validator::{StepCorrection, StepOrderingValidator, ValidationReport};
pub use annotation::{AnnotationProvider, InMemoryAnnotationProvider};
pub use runner::{EagerFilterRunner, GeneFilterRunner, SparseFilterRunner, VariantFilterRunner};
pub use inheritance::InheritanceAnalyzer;
pub use sample::{KnownGeneIndex, PartialSample, Sample, SampleDataFactory, VariantStream};
pub use executor::{Analysis, AnalysisResults, ExecutorState, PipelineExecutor};
pub use builder::{build_steps, PrioritiserSources};
