//! Orchestrator for the post-docking pipeline.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use ferrodock_common::{ComplexRecord, FerrodockError, PipelineConfig};

use crate::affinity::{analyze_binding_affinities, AffinityAnalysis};
use crate::complexes::ComplexGrouper;
use crate::docking::parse_all_docking_results;
use crate::structure::{StageReport, StructurePipeline, ToolkitAvailability};

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub complexes: Vec<ComplexRecord>,
    pub stages: Vec<StageReport>,
    /// `None` when affinity analysis is disabled or no poses were found.
    pub affinity: Option<AffinityAnalysis>,
    pub reports: Vec<PathBuf>,
}

pub struct PostDockingPipeline {
    config: PipelineConfig,
    toolkit: ToolkitAvailability,
}

impl PostDockingPipeline {
    /// Build a pipeline, probing PATH for the configured toolkit.
    pub fn new(config: PipelineConfig) -> Self {
        let toolkit = ToolkitAvailability::detect(&config.structure.toolkit_executable);
        Self { config, toolkit }
    }

    pub fn with_toolkit(config: PipelineConfig, toolkit: ToolkitAvailability) -> Self {
        Self { config, toolkit }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<PipelineRun> {
        info!("Running post-docking pipeline on {:?}", input_dir);

        validate_input(input_dir)?;
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

        let grouper = ComplexGrouper::new(&self.config.input.docking_result_pattern)?;
        let mut complexes = grouper.find_complexes(input_dir)?;
        if complexes.is_empty() {
            return Err(FerrodockError::InputNotFound(format!(
                "no docking results matching '{}' under {}",
                grouper.pattern(),
                input_dir.display()
            ))
            .into());
        }

        let stages = StructurePipeline::from_config(&self.config.structure, self.toolkit.clone())
            .run(&mut complexes, output_dir)?;

        let mut affinity = None;
        let mut reports = Vec::new();
        if self.config.analysis.analyze_binding_affinity {
            let parsed = parse_all_docking_results(&complexes);
            affinity = analyze_binding_affinities(&parsed)?;
            match &affinity {
                Some(analysis) if self.config.analysis.create_summary_reports => {
                    reports = analysis.write_reports(output_dir)?;
                }
                Some(_) => {}
                None => warn!("No docking poses could be parsed - affinity analysis skipped"),
            }
        }

        info!(
            n_complexes = complexes.len(),
            n_stages = stages.len(),
            n_reports = reports.len(),
            "Post-docking pipeline complete"
        );

        Ok(PipelineRun {
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            complexes,
            stages,
            affinity,
            reports,
        })
    }
}

/// The input root must exist and be a directory.
pub fn validate_input(input_dir: &Path) -> Result<()> {
    if !input_dir.exists() {
        return Err(FerrodockError::InputNotFound(format!(
            "input directory {} does not exist",
            input_dir.display()
        ))
        .into());
    }
    if !input_dir.is_dir() {
        return Err(FerrodockError::InputNotFound(format!(
            "input path {} is not a directory",
            input_dir.display()
        ))
        .into());
    }
    Ok(())
}
