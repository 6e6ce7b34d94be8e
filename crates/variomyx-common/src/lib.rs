//! variomyx-common: Shared domain types, errors, and configuration used across all Variomyx crates.

pub mod error;
pub mod annotation;
pub mod entities;
pub mod filter_result;
pub mod inheritance;
pub mod pedigree;
pub mod analysis_config;

// Re-export commonly used types
pub use error::{Result, VariomyxError};
pub use annotation::{FrequencyData, PathogenicityData};
pub use entities::{Contig, Gene, GeneIdentifier, Genotype, PriorityKind, VariantEvaluation, VariantId};
pub use filter_result::{FilterKind, FilterResult, FilterResultMap, FilterStatus};
pub use inheritance::InheritanceMode;
pub use pedigree::{AffectedStatus, Individual, Pedigree, Sex};
pub use analysis_config::{
    AnalysisConfig, AnalysisSettings, OutputConfig, RetentionPolicy, RunStrategy, SampleSpec, ScoringMode, StepSpec,
};
