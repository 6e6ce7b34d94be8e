//! Analysis configuration.
//!
//! Users describe a run (input files, execution strategy, the ordered step
//! list and scoring) in YAML, JSON or TOML. The step list is taken as written;
//! ordering problems are corrected later by the step validator, not here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::entities::PriorityKind;
use crate::error::{Result, VariomyxError};
use crate::inheritance::InheritanceMode;

/// Complete analysis run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Input files for the cohort
    pub sample: SampleSpec,

    /// Execution and scoring options
    #[serde(default)]
    pub analysis: AnalysisSettings,

    /// Steps in user-specified order
    #[serde(default)]
    pub steps: Vec<StepSpec>,

    /// Output options
    #[serde(default)]
    pub output: OutputConfig,
}

// ── Sample ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleSpec {
    /// Path to the VCF
    pub vcf: PathBuf,

    /// Optional PED file; required for multi-sample VCFs
    #[serde(default)]
    pub pedigree: Option<PathBuf>,

    /// Sample id of the proband, for reporting
    #[serde(default)]
    pub proband: Option<String>,
}

// ── Analysis settings ─────────────────────────────────────────────────────────

/// How variants are loaded and annotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStrategy {
    /// Load every variant with annotations up front. Suits small cohorts.
    Eager,
    /// Stream variants and fetch annotations only when a filter needs them.
    #[default]
    Sparse,
}

/// What a variant filter runner does with records that fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep every record, flagged with its failures.
    #[default]
    KeepAll,
    /// Drop failed records from the output.
    DiscardFailed,
}

/// How gene evidence is merged into a combined score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    RankBased,
    #[default]
    RawScore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default)]
    pub strategy: RunStrategy,

    #[serde(default)]
    pub retention: RetentionPolicy,

    /// Mode used to score genes; `ANY` disables the compatibility floor
    #[serde(default = "default_inheritance_mode")]
    pub inheritance_mode: InheritanceMode,

    #[serde(default)]
    pub scoring: ScoringMode,
}

fn default_inheritance_mode() -> InheritanceMode { InheritanceMode::Any }

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            strategy: RunStrategy::default(),
            retention: RetentionPolicy::default(),
            inheritance_mode: default_inheritance_mode(),
            scoring: ScoringMode::default(),
        }
    }
}

// ── Steps ─────────────────────────────────────────────────────────────────────

/// One configured analysis step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepSpec {
    QualityFilter {
        min_quality: f64,
    },
    FrequencyFilter {
        /// Maximum population frequency, in percent
        max_frequency: f64,
    },
    PathogenicityFilter {
        #[serde(default)]
        keep_non_pathogenic: bool,
    },
    IntervalFilter {
        contig: String,
        start: u64,
        end: u64,
    },
    InheritanceFilter {
        /// Empty means "the analysis inheritance mode"
        #[serde(default)]
        modes: Vec<InheritanceMode>,
    },
    PriorityScoreFilter {
        priority: PriorityKind,
        min_score: f64,
    },
    GeneSymbolFilter {
        symbols: Vec<String>,
    },
    OmimPrioritiser,
    ScorePrioritiser {
        priority: PriorityKind,
    },
}

// ── Output ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of top-ranked genes to report
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Only report genes that passed every filter
    #[serde(default)]
    pub pass_only: bool,
}

fn default_top_n() -> usize { 50 }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            pass_only: false,
        }
    }
}

// ── Helper Methods ─────────────────────────────────────────────────────────────

impl AnalysisConfig {
    /// Load from YAML file
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from JSON file
    pub fn from_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file
    pub fn from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load by file extension.
    pub fn load(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(path),
            Some("json") => Self::from_json(path),
            Some("toml") => Self::from_toml(path),
            _ => Err(VariomyxError::Config(format!(
                "Unsupported analysis file type: {}",
                path.display()
            ))),
        }
    }

    /// Reject values no step could work with.
    pub fn validate(&self) -> Result<()> {
        for step in &self.steps {
            match step {
                StepSpec::FrequencyFilter { max_frequency } if !(0.0..=100.0).contains(max_frequency) => {
                    return Err(VariomyxError::Config(format!(
                        "max_frequency must be a percentage, got {max_frequency}"
                    )));
                }
                StepSpec::IntervalFilter { start, end, .. } if start > end => {
                    return Err(VariomyxError::Config(format!(
                        "Interval start {start} is after end {end}"
                    )));
                }
                StepSpec::PriorityScoreFilter { min_score, .. } if !(0.0..=1.0).contains(min_score) => {
                    return Err(VariomyxError::Config(format!(
                        "min_score must be within [0, 1], got {min_score}"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const YAML: &str = r#"
sample:
  vcf: family.vcf.gz
  pedigree: family.ped
analysis:
  strategy: eager
  retention: discard_failed
  inheritance_mode: AUTOSOMAL_DOMINANT
  scoring: rank_based
steps:
  - type: frequency_filter
    max_frequency: 1.0
  - type: inheritance_filter
  - type: omim_prioritiser
  - type: priority_score_filter
    priority: HI_PHIVE
    min_score: 0.5
"#;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_yaml_config_parses() {
        let file = write_temp(".yaml", YAML);
        let config = AnalysisConfig::load(file.path()).unwrap();
        assert_eq!(config.analysis.strategy, RunStrategy::Eager);
        assert_eq!(config.analysis.retention, RetentionPolicy::DiscardFailed);
        assert_eq!(config.analysis.inheritance_mode, InheritanceMode::AutosomalDominant);
        assert_eq!(config.steps.len(), 4);
        assert_eq!(config.steps[1], StepSpec::InheritanceFilter { modes: vec![] });
        assert_eq!(
            config.steps[3],
            StepSpec::PriorityScoreFilter { priority: PriorityKind::HiPhive, min_score: 0.5 }
        );
    }

    #[test]
    fn test_defaults_apply() {
        let file = write_temp(".toml", "[sample]\nvcf = \"solo.vcf\"\n");
        let config = AnalysisConfig::load(file.path()).unwrap();
        assert_eq!(config.analysis.strategy, RunStrategy::Sparse);
        assert_eq!(config.analysis.retention, RetentionPolicy::KeepAll);
        assert_eq!(config.analysis.inheritance_mode, InheritanceMode::Any);
        assert_eq!(config.analysis.scoring, ScoringMode::RawScore);
        assert_eq!(config.output.top_n, 50);
        assert!(config.steps.is_empty());
    }

    #[test]
    fn test_bad_frequency_rejected() {
        let json = r#"{"sample": {"vcf": "a.vcf"}, "steps": [{"type": "frequency_filter", "max_frequency": 250.0}]}"#;
        let file = write_temp(".json", json);
        assert!(matches!(AnalysisConfig::load(file.path()), Err(VariomyxError::Config(_))));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = write_temp(".ini", "");
        assert!(AnalysisConfig::load(file.path()).is_err());
    }
}
