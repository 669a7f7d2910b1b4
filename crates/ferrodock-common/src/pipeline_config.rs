//! Pipeline configuration.
//!
//! Every path the pipeline touches comes from here (or the command line);
//! nothing about a particular investigator's directory layout is compiled in.
//! Loadable from TOML, YAML or JSON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{FerrodockError, Result};

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Where docking results are looked up
    #[serde(default)]
    pub input: InputConfig,

    /// Where reports land
    #[serde(default)]
    pub output: OutputConfig,

    /// Which structure stages run
    #[serde(default)]
    pub structure: StructureConfig,

    /// Analysis and plugin parameters
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

// ── Input ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    /// Root searched for docking results when none is given on the command line
    #[serde(default)]
    pub input_dir: Option<PathBuf>,

    /// Base directory of a research project laid out by hand
    #[serde(default)]
    pub research_base_path: Option<PathBuf>,

    /// Glob matched against file names to find docking outputs
    #[serde(default = "default_docking_result_pattern")]
    pub docking_result_pattern: String,

    /// Well-known result subdirectories under the research base
    #[serde(default = "default_research_subdirectories")]
    pub research_subdirectories: Vec<String>,

    /// File patterns marking a directory as holding results
    #[serde(default = "default_research_patterns")]
    pub research_patterns: Vec<String>,
}

fn default_docking_result_pattern() -> String { "*out*.pdbqt".to_string() }

fn default_research_subdirectories() -> Vec<String> {
    ["gnina_out", "vina_out", "docking_results", "results"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_research_patterns() -> Vec<String> {
    ["*out*.pdbqt", "*docked*.pdbqt", "*result*.pdbqt"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            input_dir: None,
            research_base_path: None,
            docking_result_pattern: default_docking_result_pattern(),
            research_subdirectories: default_research_subdirectories(),
            research_patterns: default_research_patterns(),
        }
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf { PathBuf::from("./post_docking_results") }

impl Default for OutputConfig {
    fn default() -> Self {
        Self { output_dir: default_output_dir() }
    }
}

// ── Structure stages ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructureConfig {
    #[serde(default = "default_true")]
    pub split_complexes: bool,

    #[serde(default = "default_true")]
    pub extract_apo_proteins: bool,

    #[serde(default = "default_true")]
    pub extract_ligands: bool,

    #[serde(default)]
    pub fix_chains: bool,

    /// Cheminformatics toolkit looked up on PATH before ligand extraction
    #[serde(default = "default_toolkit_executable")]
    pub toolkit_executable: String,
}

fn default_true() -> bool { true }
fn default_toolkit_executable() -> String { "obabel".to_string() }

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            split_complexes: true,
            extract_apo_proteins: true,
            extract_ligands: true,
            fix_chains: false,
            toolkit_executable: default_toolkit_executable(),
        }
    }
}

// ── Analysis ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default = "default_true")]
    pub analyze_binding_affinity: bool,

    #[serde(default = "default_true")]
    pub create_summary_reports: bool,

    /// Plugin keys to run; empty runs every registered plugin
    #[serde(default)]
    pub enabled_plugins: Vec<String>,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    #[serde(default)]
    pub binding_mode: BindingModeConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            analyze_binding_affinity: true,
            create_summary_reports: true,
            enabled_plugins: vec![],
            enrichment: EnrichmentConfig::default(),
            binding_mode: BindingModeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentConfig {
    /// Poses at or below this Vina affinity (kcal/mol) are strong binders
    #[serde(default = "default_strong_binder_threshold")]
    pub strong_binder_threshold: f64,

    /// Number of proteins listed in the summary
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_strong_binder_threshold() -> f64 { -8.0 }
fn default_top_n() -> usize { 5 }

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            strong_binder_threshold: default_strong_binder_threshold(),
            top_n: default_top_n(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BindingModeConfig {
    #[serde(default = "default_n_clusters")]
    pub n_clusters: usize,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Affinity at or below which a pose is "High Affinity"
    #[serde(default = "default_high_cutoff")]
    pub high_affinity_cutoff: f64,

    /// Affinity at or below which a pose is "Medium Affinity"
    #[serde(default = "default_medium_cutoff")]
    pub medium_affinity_cutoff: f64,
}

fn default_n_clusters() -> usize { 3 }
fn default_max_iterations() -> usize { 100 }
fn default_high_cutoff() -> f64 { -10.0 }
fn default_medium_cutoff() -> f64 { -7.0 }

impl Default for BindingModeConfig {
    fn default() -> Self {
        Self {
            n_clusters: default_n_clusters(),
            max_iterations: default_max_iterations(),
            high_affinity_cutoff: default_high_cutoff(),
            medium_affinity_cutoff: default_medium_cutoff(),
        }
    }
}

// ── Helper Methods ─────────────────────────────────────────────────────────────

impl PipelineConfig {
    /// Load from a TOML file
    pub fn from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load from a YAML file
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Load from a JSON file
    pub fn from_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load by file extension (`.toml`, `.yaml`/`.yml`, `.json`) and validate.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FerrodockError::InputNotFound(path.display().to_string()));
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let config = match ext.as_str() {
            "toml" => Self::from_toml(path)?,
            "yaml" | "yml" => Self::from_yaml(path)?,
            "json" => Self::from_json(path)?,
            other => {
                return Err(FerrodockError::Config(format!(
                    "unsupported config format '{other}' for {}",
                    path.display()
                )))
            }
        };
        config.validate()?;
        debug!(path = %path.display(), format = %ext, "Pipeline config parsed");
        Ok(config)
    }

    /// Save as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| FerrodockError::Config(format!("cannot serialise config: {e}")))
    }

    /// Reject values the analyzers cannot work with.
    pub fn validate(&self) -> Result<()> {
        let enrichment = &self.analysis.enrichment;
        if !enrichment.strong_binder_threshold.is_finite() {
            return Err(FerrodockError::Config(
                "analysis.enrichment.strong_binder_threshold must be finite".into(),
            ));
        }
        if enrichment.top_n == 0 {
            return Err(FerrodockError::Config(
                "analysis.enrichment.top_n must be at least 1".into(),
            ));
        }

        let modes = &self.analysis.binding_mode;
        if modes.n_clusters == 0 {
            return Err(FerrodockError::Config(
                "analysis.binding_mode.n_clusters must be at least 1".into(),
            ));
        }
        if modes.high_affinity_cutoff > modes.medium_affinity_cutoff {
            return Err(FerrodockError::Config(format!(
                "high_affinity_cutoff ({}) must not exceed medium_affinity_cutoff ({})",
                modes.high_affinity_cutoff, modes.medium_affinity_cutoff
            )));
        }

        if self.input.docking_result_pattern.trim().is_empty() {
            return Err(FerrodockError::Config(
                "input.docking_result_pattern must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Plugin keys enabled by configuration, or `None` when all are enabled.
    pub fn enabled_plugins(&self) -> Option<&[String]> {
        if self.analysis.enabled_plugins.is_empty() {
            None
        } else {
            Some(&self.analysis.enabled_plugins)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.analysis.enrichment.strong_binder_threshold, -8.0);
        assert_eq!(config.analysis.enrichment.top_n, 5);
        assert_eq!(config.input.docking_result_pattern, "*out*.pdbqt");
        assert!(config.structure.extract_ligands);
        assert!(!config.structure.fix_chains);
        assert!(config.input.research_base_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [analysis.enrichment]
            strong_binder_threshold = -9.5
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.enrichment.strong_binder_threshold, -9.5);
        assert_eq!(config.analysis.enrichment.top_n, 5);
        assert_eq!(config.structure, StructureConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_cutoffs() {
        let mut config = PipelineConfig::default();
        config.analysis.binding_mode.high_affinity_cutoff = -5.0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.analysis.binding_mode.n_clusters = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.analysis.enrichment.strong_binder_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_path_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("pipeline.yaml");
        std::fs::write(&yaml, "structure:\n  fix_chains: true\n").unwrap();
        assert!(PipelineConfig::from_path(&yaml).unwrap().structure.fix_chains);

        let json = dir.path().join("pipeline.json");
        std::fs::write(&json, r#"{"analysis": {"enabled_plugins": ["enrichment"]}}"#).unwrap();
        let config = PipelineConfig::from_path(&json).unwrap();
        assert_eq!(config.enabled_plugins(), Some(&["enrichment".to_string()][..]));

        let ini = dir.path().join("pipeline.ini");
        std::fs::write(&ini, "").unwrap();
        assert!(matches!(
            PipelineConfig::from_path(&ini),
            Err(FerrodockError::Config(_))
        ));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = PipelineConfig::default();
        config.input.research_base_path = Some(PathBuf::from("/data/project"));
        let text = config.to_toml().unwrap();
        let parsed: PipelineConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, parsed);
    }
}
