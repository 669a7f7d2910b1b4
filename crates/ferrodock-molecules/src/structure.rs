//! Structure processing stages.
//!
//! Each stage owns one output subdirectory and one path field on
//! [`ComplexRecord`]. The built-in stages only predict where their output
//! would be written; real splitting, apo extraction, ligand conversion or
//! chain repair can be substituted by implementing [`StructureStage`].

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use ferrodock_common::{ComplexRecord, StructureConfig};

/// What a stage did with the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StageOutcome {
    Completed { directory: PathBuf, complexes: usize },
    Skipped { reason: String },
}

/// A structure processing step applied to every complex in a batch.
pub trait StructureStage: Send + Sync {
    /// Short stage name used in logs and run summaries.
    fn name(&self) -> &str;

    /// Subdirectory of the output directory this stage writes into.
    fn output_subdir(&self) -> &str;

    /// Process the batch in place, filling in this stage's path field.
    fn process(&self, complexes: &mut [ComplexRecord], output_dir: &Path) -> Result<StageOutcome>;
}

/// Create `output_dir/subdir` if needed and return it.
pub fn ensure_stage_dir(output_dir: &Path, subdir: &str) -> Result<PathBuf> {
    let dir = output_dir.join(subdir);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create stage directory {}", dir.display()))?;
    Ok(dir)
}

// ── Cheminformatics toolkit ──────────────────────────────────────────────────

/// Whether the external format-conversion toolkit can be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolkitAvailability {
    executable: Option<PathBuf>,
}

impl ToolkitAvailability {
    /// Look the executable up on PATH.
    pub fn detect(executable: &str) -> Self {
        match which::which(executable) {
            Ok(path) => {
                info!("Cheminformatics toolkit found at {:?}", path);
                Self { executable: Some(path) }
            }
            Err(_) => {
                warn!("{} not available - ligand extraction will be skipped", executable);
                Self { executable: None }
            }
        }
    }

    pub fn available(executable: impl Into<PathBuf>) -> Self {
        Self { executable: Some(executable.into()) }
    }

    pub fn unavailable() -> Self {
        Self { executable: None }
    }

    pub fn is_available(&self) -> bool {
        self.executable.is_some()
    }

    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }
}

// ── Built-in stages ──────────────────────────────────────────────────────────

/// Split complexes into receptor and ligand components.
pub struct SplitComplexes;

impl StructureStage for SplitComplexes {
    fn name(&self) -> &str { "split" }

    fn output_subdir(&self) -> &str { "split_complexes" }

    fn process(&self, complexes: &mut [ComplexRecord], output_dir: &Path) -> Result<StageOutcome> {
        let split_dir = ensure_stage_dir(output_dir, self.output_subdir())?;
        for complex in complexes.iter_mut() {
            complex.split_directory = Some(split_dir.clone());
        }
        info!("Complexes split into {:?}", split_dir);
        Ok(StageOutcome::Completed { directory: split_dir, complexes: complexes.len() })
    }
}

/// Extract the receptor without its ligand.
pub struct ExtractApoProteins;

impl StructureStage for ExtractApoProteins {
    fn name(&self) -> &str { "apo_extraction" }

    fn output_subdir(&self) -> &str { "apo_proteins" }

    fn process(&self, complexes: &mut [ComplexRecord], output_dir: &Path) -> Result<StageOutcome> {
        let apo_dir = ensure_stage_dir(output_dir, self.output_subdir())?;
        for complex in complexes.iter_mut() {
            complex.apo_protein = Some(apo_dir.join(format!("{}_apo.pdb", complex.name)));
        }
        info!("Apo proteins placed in {:?}", apo_dir);
        Ok(StageOutcome::Completed { directory: apo_dir, complexes: complexes.len() })
    }
}

/// Extract ligands and convert them to MOL2. Needs the toolkit.
pub struct ExtractLigands {
    toolkit: ToolkitAvailability,
}

impl ExtractLigands {
    pub fn new(toolkit: ToolkitAvailability) -> Self {
        Self { toolkit }
    }
}

impl StructureStage for ExtractLigands {
    fn name(&self) -> &str { "ligand_extraction" }

    fn output_subdir(&self) -> &str { "ligands_mol2" }

    fn process(&self, complexes: &mut [ComplexRecord], output_dir: &Path) -> Result<StageOutcome> {
        if !self.toolkit.is_available() {
            warn!("Cheminformatics toolkit not available - ligand extraction skipped");
            return Ok(StageOutcome::Skipped {
                reason: "cheminformatics toolkit not available".to_string(),
            });
        }

        let ligand_dir = ensure_stage_dir(output_dir, self.output_subdir())?;
        for complex in complexes.iter_mut() {
            complex.ligand_mol2 = Some(ligand_dir.join(format!("{}.mol2", complex.name)));
        }
        info!("Ligands placed in {:?}", ligand_dir);
        Ok(StageOutcome::Completed { directory: ligand_dir, complexes: complexes.len() })
    }
}

/// Repair chain identifiers in the receptor.
pub struct FixChains;

impl StructureStage for FixChains {
    fn name(&self) -> &str { "chain_fix" }

    fn output_subdir(&self) -> &str { "fixed_structures" }

    fn process(&self, complexes: &mut [ComplexRecord], output_dir: &Path) -> Result<StageOutcome> {
        let fixed_dir = ensure_stage_dir(output_dir, self.output_subdir())?;
        for complex in complexes.iter_mut() {
            complex.fixed_structure = Some(fixed_dir.join(format!("{}_fixed.pdb", complex.name)));
        }
        info!("Fixed structures placed in {:?}", fixed_dir);
        Ok(StageOutcome::Completed { directory: fixed_dir, complexes: complexes.len() })
    }
}

// ── Stage pipeline ───────────────────────────────────────────────────────────

/// One stage's entry in a run summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: String,
    #[serde(flatten)]
    pub outcome: StageOutcome,
}

/// Ordered list of stages run over a batch of complexes.
pub struct StructurePipeline {
    stages: Vec<Box<dyn StructureStage>>,
}

impl StructurePipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Enabled built-in stages in their fixed order: split, apo, ligand, chain fix.
    pub fn from_config(config: &StructureConfig, toolkit: ToolkitAvailability) -> Self {
        let mut pipeline = Self::new();
        if config.split_complexes {
            pipeline.push(SplitComplexes);
        }
        if config.extract_apo_proteins {
            pipeline.push(ExtractApoProteins);
        }
        if config.extract_ligands {
            pipeline.push(ExtractLigands::new(toolkit));
        }
        if config.fix_chains {
            pipeline.push(FixChains);
        }
        pipeline
    }

    pub fn push<S: StructureStage + 'static>(&mut self, stage: S) {
        self.stages.push(Box::new(stage));
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, complexes: &mut [ComplexRecord], output_dir: &Path) -> Result<Vec<StageReport>> {
        let mut reports = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            info!(stage = stage.name(), n_complexes = complexes.len(), "Running structure stage");
            let outcome = stage
                .process(complexes, output_dir)
                .with_context(|| format!("Structure stage '{}' failed", stage.name()))?;
            reports.push(StageReport { stage: stage.name().to_string(), outcome });
        }
        Ok(reports)
    }
}

impl Default for StructurePipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrodock_common::FilenameInfo;
    use pretty_assertions::assert_eq;

    fn complex(name: &str) -> ComplexRecord {
        let mut parts = name.split('_');
        let info = FilenameInfo {
            protein: parts.next().unwrap_or_default().to_string(),
            binding_site: parts.next().unwrap_or_default().to_string(),
            ligand: parts.next().unwrap_or_default().to_string(),
            ..Default::default()
        };
        ComplexRecord::new(info, "/in")
    }

    #[test]
    fn test_stages_predict_paths() {
        let out = tempfile::tempdir().unwrap();
        let mut batch = vec![complex("PBP1_Catalytic_Amoxacillin")];

        let mut pipeline = StructurePipeline::new();
        pipeline.push(SplitComplexes);
        pipeline.push(ExtractApoProteins);
        pipeline.push(ExtractLigands::new(ToolkitAvailability::available("/usr/bin/obabel")));
        pipeline.push(FixChains);
        let reports = pipeline.run(&mut batch, out.path()).unwrap();

        assert_eq!(reports.len(), 4);
        let c = &batch[0];
        assert_eq!(c.split_directory, Some(out.path().join("split_complexes")));
        assert_eq!(c.apo_protein, Some(out.path().join("apo_proteins/PBP1_Catalytic_Amoxacillin_apo.pdb")));
        assert_eq!(c.ligand_mol2, Some(out.path().join("ligands_mol2/PBP1_Catalytic_Amoxacillin.mol2")));
        assert_eq!(c.fixed_structure, Some(out.path().join("fixed_structures/PBP1_Catalytic_Amoxacillin_fixed.pdb")));

        // Paths are predicted, files are not produced.
        assert!(out.path().join("apo_proteins").is_dir());
        assert!(!out.path().join("apo_proteins/PBP1_Catalytic_Amoxacillin_apo.pdb").exists());
    }

    #[test]
    fn test_ligand_extraction_without_toolkit_is_noop() {
        let out = tempfile::tempdir().unwrap();
        let mut batch = vec![complex("AgrA_1_Efavarinz")];
        let before = batch.clone();

        let outcome = ExtractLigands::new(ToolkitAvailability::unavailable())
            .process(&mut batch, out.path())
            .unwrap();

        assert!(matches!(outcome, StageOutcome::Skipped { .. }));
        assert_eq!(batch, before);
        assert!(!out.path().join("ligands_mol2").exists());
    }

    #[test]
    fn test_stage_directories_are_idempotent() {
        let out = tempfile::tempdir().unwrap();
        let mut batch = vec![complex("A_B_C")];
        SplitComplexes.process(&mut batch, out.path()).unwrap();
        SplitComplexes.process(&mut batch, out.path()).unwrap();
        assert_eq!(batch[0].split_directory, Some(out.path().join("split_complexes")));
    }

    #[test]
    fn test_from_config_respects_flags_and_order() {
        let config = StructureConfig::default();
        let pipeline = StructurePipeline::from_config(&config, ToolkitAvailability::unavailable());
        assert_eq!(pipeline.stage_names(), vec!["split", "apo_extraction", "ligand_extraction"]);

        let config = StructureConfig {
            split_complexes: false,
            fix_chains: true,
            ..StructureConfig::default()
        };
        let pipeline = StructurePipeline::from_config(&config, ToolkitAvailability::unavailable());
        assert_eq!(pipeline.stage_names(), vec!["apo_extraction", "ligand_extraction", "chain_fix"]);
    }

    #[test]
    fn test_unwritable_output_dir_propagates() {
        let out = tempfile::tempdir().unwrap();
        let blocker = out.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let mut batch = vec![complex("A_B_C")];
        assert!(FixChains.process(&mut batch, &blocker).is_err());
    }

    #[test]
    fn test_stage_report_serialises_flat() {
        let report = StageReport {
            stage: "ligand_extraction".into(),
            outcome: StageOutcome::Skipped { reason: "missing".into() },
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["stage"], "ligand_extraction");
        assert_eq!(value["status"], "skipped");
        assert_eq!(value["reason"], "missing");
    }
}
