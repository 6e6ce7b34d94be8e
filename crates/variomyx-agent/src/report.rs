//! Ranked-gene report written at the end of a run.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use variomyx_analysis::AnalysisResults;
use variomyx_common::{FilterKind, Gene, InheritanceMode, OutputConfig, RunStrategy, ScoringMode, VariantEvaluation};

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proband: Option<String>,
    pub strategy: RunStrategy,
    pub scoring: ScoringMode,
    pub inheritance_mode: InheritanceMode,
    pub passed_gene_count: usize,
    pub passed_variant_count: usize,
    pub genes: Vec<GeneReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneReport {
    pub rank: usize,
    pub symbol: String,
    pub entrez_id: u32,
    pub combined_score: f64,
    pub filter_score: f64,
    pub priority_score: f64,
    pub passed_filters: bool,
    pub failed_filters: Vec<FilterKind>,
    pub compatible_modes: BTreeSet<InheritanceMode>,
    pub variants: Vec<VariantReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantReport {
    pub key: String,
    pub passed_filters: bool,
    pub failed_filters: Vec<FilterKind>,
}

impl AnalysisReport {
    pub fn from_results(results: &AnalysisResults, output: &OutputConfig, proband: Option<String>) -> Self {
        let variants = results.sample.variants();
        let genes = results
            .top_genes(output.top_n, output.pass_only)
            .into_iter()
            .enumerate()
            .map(|(i, gene)| GeneReport::new(i + 1, gene, variants))
            .collect();

        Self {
            run_id: results.run_id,
            started_at: results.started_at,
            finished_at: results.finished_at,
            proband,
            strategy: results.strategy,
            scoring: results.scoring,
            inheritance_mode: results.inheritance_mode,
            passed_gene_count: results.passed_gene_count,
            passed_variant_count: results.passed_variant_count,
            genes,
        }
    }

    /// Write as JSON to `path`, or stdout when no path is given.
    pub fn write(&self, path: Option<&Path>, pretty: bool) -> anyhow::Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        match path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, json)?;
                tracing::info!(path = %path.display(), genes = self.genes.len(), "Report written");
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{json}")?;
            }
        }
        Ok(())
    }
}

impl GeneReport {
    fn new(rank: usize, gene: &Gene, variants: &[VariantEvaluation]) -> Self {
        let mut failed_filters = gene.filter_results().failed_kinds();
        for variant in gene.variant_ids().iter().map(|id| &variants[id.0]) {
            for kind in variant.filter_results().failed_kinds() {
                if !failed_filters.contains(&kind) {
                    failed_filters.push(kind);
                }
            }
        }

        Self {
            rank,
            symbol: gene.symbol.clone(),
            entrez_id: gene.entrez_id,
            combined_score: gene.combined_score(),
            filter_score: gene.filter_score(),
            priority_score: gene.priority_score(),
            passed_filters: gene.passed_filters(variants),
            failed_filters,
            compatible_modes: gene.compatible_modes().clone(),
            variants: gene
                .variant_ids()
                .iter()
                .map(|id| {
                    let variant = &variants[id.0];
                    VariantReport {
                        key: variant.key(),
                        passed_filters: variant.passed_filters(),
                        failed_filters: variant.filter_results().failed_kinds(),
                    }
                })
                .collect(),
        }
    }
}
