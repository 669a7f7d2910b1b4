//! `analysis_results.json`: the record of one pipeline run.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ferrodock_molecules::structure::StageReport;
use ferrodock_molecules::PipelineRun;
use ferrodock_ranker::PluginResult;

pub const MANIFEST_FILE: &str = "analysis_results.json";

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub generated_at: DateTime<Utc>,
    pub version: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub complexes_found: usize,
    pub complexes: Vec<String>,
    pub structure_stages: Vec<StageReport>,
    pub poses_analyzed: usize,
    pub reports: Vec<PathBuf>,
    pub plugins: BTreeMap<String, PluginResult>,
}

impl RunManifest {
    pub fn new(run: &PipelineRun, plugins: BTreeMap<String, PluginResult>) -> Self {
        Self {
            generated_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            input_dir: run.input_dir.clone(),
            output_dir: run.output_dir.clone(),
            complexes_found: run.complexes.len(),
            complexes: run.complexes.iter().map(|c| c.name.clone()).collect(),
            structure_stages: run.stages.clone(),
            poses_analyzed: run.affinity.as_ref().map_or(0, |a| a.full_data.len()),
            reports: run.reports.clone(),
            plugins,
        }
    }

    /// Write as pretty JSON into `output_dir`.
    pub fn write(&self, output_dir: &Path) -> anyhow::Result<PathBuf> {
        let path = output_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrodock_common::PipelineConfig;
    use ferrodock_molecules::{PostDockingPipeline, ToolkitAvailability};
    use ferrodock_ranker::{AnalysisData, PluginRegistry};

    #[test]
    fn test_manifest_round_trip_fields() {
        let tree = ferrodock_test_utils::docking_tree().unwrap();
        let out = tempfile::tempdir().unwrap();
        let config = PipelineConfig::default();

        let run = PostDockingPipeline::with_toolkit(config.clone(), ToolkitAvailability::unavailable())
            .run(tree.path(), out.path())
            .unwrap();
        let analysis = run.affinity.as_ref().unwrap();
        let data = AnalysisData {
            best_poses: Some(&analysis.best_poses),
            full_data: Some(&analysis.full_data),
        };
        let plugins = PluginRegistry::with_builtin().execute_all(&data, out.path(), &config.analysis, None);

        let path = RunManifest::new(&run, plugins).write(out.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(json["complexes_found"], 3);
        assert_eq!(json["poses_analyzed"], 7);
        assert_eq!(json["structure_stages"][2]["stage"], "ligand_extraction");
        assert_eq!(json["structure_stages"][2]["status"], "skipped");
        assert_eq!(json["plugins"]["enrichment"]["status"], "completed");
        assert_eq!(json["plugins"]["binding_mode"]["num_clusters"], 3);
        assert!(json["generated_at"].is_string());
    }
}
