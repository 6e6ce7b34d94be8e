//! Configuration loading for the Variomyx agent.
//! Reads variomyx.toml from the current directory or the path in VARIOMYX_CONFIG.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use variomyx_common::PriorityKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Fallback tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Analysis definition (YAML, JSON or TOML)
    pub analysis_path: PathBuf,
    /// JSON sample bundle standing in for the VCF, pedigree and annotations
    pub bundle_path: PathBuf,
    #[serde(default)]
    pub score_tables: Vec<ScoreTableConfig>,
    #[serde(default)]
    pub report: ReportConfig,
}

pub fn default_log_filter() -> String { "variomyx=debug,info".to_string() }

/// Precomputed prioritiser scores, one CSV per prioritiser kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreTableConfig {
    pub priority: PriorityKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Write the report here instead of stdout
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_pretty() -> bool { true }

impl Default for ReportConfig {
    fn default() -> Self {
        Self { path: None, pretty: default_pretty() }
    }
}

impl AgentConfig {
    /// Load configuration from variomyx.toml.
    /// Checks VARIOMYX_CONFIG env var first, then current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("VARIOMYX_CONFIG")
            .unwrap_or_else(|_| "variomyx.toml".to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy variomyx.example.toml to variomyx.toml and edit it.",
                path.display()
            );
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: AgentConfig = toml::from_str(&content)?;
        config.resolve_paths(path.parent().unwrap_or(Path::new(".")));
        Ok(config)
    }

    /// Relative paths are taken relative to the config file.
    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.analysis_path);
        resolve(&mut self.bundle_path);
        for table in &mut self.score_tables {
            resolve(&mut table.path);
        }
        if let Some(report) = self.report.path.as_mut() {
            resolve(report);
        }
    }
}

mod tests;
