//! End-to-end run of the post-docking pipeline over a scratch docking tree.
//!
//! ```bash
//! cargo test --package ferrodock-molecules --test test_pipeline_e2e
//! ```

use ferrodock_common::table::columns;
use ferrodock_common::{PipelineConfig, PoseTable};
use ferrodock_molecules::structure::StageOutcome;
use ferrodock_molecules::{PostDockingPipeline, ToolkitAvailability};
use ferrodock_test_utils::{docking_tree, write_pdbqt};
use pretty_assertions::assert_eq;

#[test]
fn test_pipeline_without_toolkit() {
    let tree = docking_tree().unwrap();
    let out = tempfile::tempdir().unwrap();

    let pipeline = PostDockingPipeline::with_toolkit(PipelineConfig::default(), ToolkitAvailability::unavailable());
    let run = pipeline.run(tree.path(), out.path()).unwrap();

    assert_eq!(run.complexes.len(), 3);
    let statuses: Vec<(&str, bool)> = run
        .stages
        .iter()
        .map(|s| (s.stage.as_str(), matches!(s.outcome, StageOutcome::Skipped { .. })))
        .collect();
    assert_eq!(
        statuses,
        vec![("split", false), ("apo_extraction", false), ("ligand_extraction", true)]
    );
    assert!(run.complexes.iter().all(|c| c.ligand_mol2.is_none()));
    assert!(run.complexes.iter().all(|c| c.apo_protein.is_some()));
    assert!(!out.path().join("ligands_mol2").exists());

    let analysis = run.affinity.as_ref().unwrap();
    assert_eq!(analysis.full_data.len(), 7);
    assert_eq!(
        analysis.best_poses.column(columns::COMPLEX_NAME).unwrap(),
        vec![
            "AgrA_1_Efavarinz",
            "PBP1_Catalytic_Amoxacillin",
            "PBP1_Catalytic_Efavirenz",
        ]
    );

    let on_disk = PoseTable::from_csv_path(&out.path().join("reports/best_poses.csv")).unwrap();
    assert_eq!(on_disk, analysis.best_poses);
    assert_eq!(run.reports.len(), 5);
}

#[test]
fn test_pipeline_merges_reruns_of_the_same_complex() {
    let tree = docking_tree().unwrap();
    write_pdbqt(
        tree.path(),
        "rerun/PBP1_Catalytic_Amoxacillin_gnina_out.pdbqt",
        &[-11.0],
    )
    .unwrap();
    let out = tempfile::tempdir().unwrap();

    let run = PostDockingPipeline::with_toolkit(PipelineConfig::default(), ToolkitAvailability::unavailable())
        .run(tree.path(), out.path())
        .unwrap();

    assert_eq!(run.complexes.len(), 3);
    let amox = run
        .complexes
        .iter()
        .find(|c| c.name == "PBP1_Catalytic_Amoxacillin")
        .unwrap();
    assert_eq!(amox.docking_results.len(), 2);

    let analysis = run.affinity.unwrap();
    let best: Vec<(&str, f64)> = analysis.best_affinities().collect();
    assert_eq!(best[0], ("PBP1_Catalytic_Amoxacillin", -11.0));
}

#[test]
fn test_pipeline_with_reports_disabled() {
    let tree = docking_tree().unwrap();
    let out = tempfile::tempdir().unwrap();
    let mut config = PipelineConfig::default();
    config.analysis.create_summary_reports = false;
    config.structure.fix_chains = true;

    let run = PostDockingPipeline::with_toolkit(config, ToolkitAvailability::available("obabel"))
        .run(tree.path(), out.path())
        .unwrap();

    assert!(run.affinity.is_some());
    assert!(run.reports.is_empty());
    assert!(!out.path().join("reports").exists());
    assert!(out.path().join("fixed_structures").is_dir());
    assert!(run.complexes.iter().all(|c| c.ligand_mol2.is_some()));
}

#[test]
fn test_pipeline_rejects_missing_input() {
    let out = tempfile::tempdir().unwrap();
    let pipeline = PostDockingPipeline::with_toolkit(PipelineConfig::default(), ToolkitAvailability::unavailable());
    assert!(pipeline.run(&out.path().join("nope"), out.path()).is_err());
}
