//! Subcommand bodies. Each returns its result so `main` only prints.

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::info;

use ferrodock_common::{ComplexRecord, PipelineConfig, PoseTable};
use ferrodock_molecules::{find_research_directories, ComplexGrouper, PostDockingPipeline, ResearchLayout};
use ferrodock_ranker::plugins::EnrichmentPlugin;
use ferrodock_ranker::{AnalysisData, AnalysisPlugin, PluginRegistry, PluginResult};

use crate::manifest::RunManifest;

/// Full pipeline plus every enabled plugin. Returns the manifest path.
pub fn run_pipeline(
    pipeline: &PostDockingPipeline,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<PathBuf> {
    let config = pipeline.config();
    let input = input
        .or_else(|| config.input.input_dir.clone())
        .context("No input directory: pass --input or set input.input_dir")?;
    let output = output.unwrap_or_else(|| config.output.output_dir.clone());

    let pipeline_run = pipeline.run(&input, &output)?;

    let registry = PluginRegistry::with_builtin();
    let data = match &pipeline_run.affinity {
        Some(analysis) => AnalysisData {
            best_poses: Some(&analysis.best_poses),
            full_data: Some(&analysis.full_data),
        },
        None => AnalysisData::default(),
    };
    let plugins = registry.execute_all(&data, &output, &config.analysis, config.enabled_plugins());

    for (key, result) in &plugins {
        info!(plugin = %key, status = ?result.status, "Plugin finished");
    }

    let manifest_path = RunManifest::new(&pipeline_run, plugins).write(&output)?;
    info!("Run complete: {} complexes, manifest at {:?}", pipeline_run.complexes.len(), manifest_path);
    Ok(manifest_path)
}

pub fn list_complexes(config: &PipelineConfig, input: &Path) -> anyhow::Result<Vec<ComplexRecord>> {
    let grouper = ComplexGrouper::new(&config.input.docking_result_pattern)?;
    grouper.find_complexes(input)
}

pub fn research_dirs(config: &PipelineConfig, base: Option<PathBuf>) -> anyhow::Result<Vec<PathBuf>> {
    let mut input = config.input.clone();
    if base.is_some() {
        input.research_base_path = base;
    }
    let layout = ResearchLayout::from_config(&input)
        .context("No research base: pass --base or set input.research_base_path")?;
    find_research_directories(&layout)
}

/// Enrichment over a standalone best-poses CSV.
///
/// A `--threshold` override goes through the same validation as a config file.
pub fn enrich(
    config: &PipelineConfig,
    poses: &Path,
    output: Option<PathBuf>,
    threshold: Option<f64>,
) -> anyhow::Result<PluginResult> {
    let mut config = config.clone();
    if let Some(threshold) = threshold {
        config.analysis.enrichment.strong_binder_threshold = threshold;
    }
    config.validate().context("Invalid --threshold")?;

    let table = PoseTable::from_csv_path(poses)
        .with_context(|| format!("Failed to read best poses from {}", poses.display()))?;
    let output = output.unwrap_or_else(|| config.output.output_dir.clone());
    std::fs::create_dir_all(&output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let data = AnalysisData { best_poses: Some(&table), full_data: None };
    EnrichmentPlugin.analyze(&data, &output, &config.analysis)
}
