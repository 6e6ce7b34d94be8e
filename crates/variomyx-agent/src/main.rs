//! Variomyx: Rare-disease variant prioritisation
//! Entry point for the analysis binary.

mod bundle;
mod config;
mod report;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;
use variomyx_analysis::{build_steps, Analysis, PipelineExecutor, PrioritiserSources};
use variomyx_common::AnalysisConfig;

use crate::bundle::{load_score_table, BundleFactory, SampleBundle};
use crate::config::{default_log_filter, AgentConfig};
use crate::report::AnalysisReport;

fn main() -> anyhow::Result<()> {
    let config = AgentConfig::load();

    // Initialise structured logging
    let fallback = config
        .as_ref()
        .map(|c| c.log_filter.clone())
        .unwrap_or_else(|_| default_log_filter());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .init();

    info!("🧬 Variomyx starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match config {
        Ok(c) => {
            info!(
                "Configuration loaded. Analysis: {}, bundle: {}",
                c.analysis_path.display(),
                c.bundle_path.display()
            );
            c
        }
        Err(e) => {
            tracing::warn!("Could not load variomyx.toml: {e}");
            tracing::warn!("Copy variomyx.example.toml to variomyx.toml and edit it.");
            return Ok(());
        }
    };

    // ── 1. Analysis definition ────────────────────────────────────────────────
    let analysis_config = AnalysisConfig::load(&config.analysis_path)
        .with_context(|| format!("Loading analysis {}", config.analysis_path.display()))?;
    info!(
        steps = analysis_config.steps.len(),
        strategy = ?analysis_config.analysis.strategy,
        "Analysis definition loaded"
    );

    // ── 2. Sample data and prioritiser sources ────────────────────────────────
    let bundle = SampleBundle::load(&config.bundle_path)
        .with_context(|| format!("Loading sample bundle {}", config.bundle_path.display()))?;
    let mut score_tables = HashMap::new();
    for table in &config.score_tables {
        let scores = load_score_table(&table.path)
            .with_context(|| format!("Loading {} score table", table.priority))?;
        info!(priority = %table.priority, genes = scores.len(), "Score table loaded");
        score_tables.insert(table.priority, scores);
    }
    let sources = PrioritiserSources {
        diseases: Arc::new(bundle.disease_source()),
        score_tables,
    };
    let factory = BundleFactory::new(bundle);

    // ── 3. Run ────────────────────────────────────────────────────────────────
    let steps = build_steps(&analysis_config.steps, &analysis_config.analysis, &sources)
        .context("Building analysis steps")?;
    let analysis = Analysis::from_config(&analysis_config, steps);
    let mut executor = PipelineExecutor::new(&factory, factory.annotations());
    let results = executor.run_analysis(&analysis).context("Analysis run failed")?;
    info!(
        run_id = %results.run_id,
        passed_genes = results.passed_gene_count,
        passed_variants = results.passed_variant_count,
        frequency_fetches = factory.annotations().frequency_fetches(),
        pathogenicity_fetches = factory.annotations().pathogenicity_fetches(),
        "✅ Analysis complete"
    );

    // ── 4. Report ─────────────────────────────────────────────────────────────
    let report = AnalysisReport::from_results(
        &results,
        &analysis_config.output,
        analysis_config.sample.proband.clone(),
    );
    report.write(config.report.path.as_deref(), config.report.pretty)?;

    Ok(())
}
