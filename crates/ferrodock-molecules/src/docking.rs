//! AutoDock Vina output parsing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use ferrodock_common::ComplexRecord;

const VINA_RESULT_PREFIX: &str = "REMARK VINA RESULT:";

/// One docked pose as reported by Vina.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    /// 1-based pose number.
    pub pose: usize,
    /// Predicted binding affinity (kcal/mol).
    pub vina_affinity: f64,
    pub rmsd_lb: f64,
    pub rmsd_ub: f64,
}

fn parse_result_line(line: &str) -> Option<(f64, f64, f64)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 6 {
        return None;
    }
    let affinity = fields[3].parse::<f64>().ok()?;
    let rmsd_lb = fields[4].parse::<f64>().ok()?;
    let rmsd_ub = fields[5].parse::<f64>().ok()?;
    Some((affinity, rmsd_lb, rmsd_ub))
}

/// Extract poses from the text of a Vina PDBQT output.
pub fn parse_vina_pdbqt_str(content: &str) -> Vec<PoseRecord> {
    let mut poses = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if !line.starts_with(VINA_RESULT_PREFIX) {
            continue;
        }
        match parse_result_line(line) {
            Some((vina_affinity, rmsd_lb, rmsd_ub)) => poses.push(PoseRecord {
                pose: poses.len() + 1,
                vina_affinity,
                rmsd_lb,
                rmsd_ub,
            }),
            None => debug!(line, "Skipping malformed Vina result line"),
        }
    }
    poses
}

pub fn parse_vina_pdbqt(path: &Path) -> Result<Vec<PoseRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read docking result {}", path.display()))?;
    Ok(parse_vina_pdbqt_str(&content))
}

/// Parse every result file of every complex.
///
/// Poses are numbered across a complex's files in discovery order. Complexes
/// with no readable poses are left out.
pub fn parse_all_docking_results(complexes: &[ComplexRecord]) -> Vec<(String, Vec<PoseRecord>)> {
    let mut parsed = Vec::new();

    for complex in complexes {
        let mut poses: Vec<PoseRecord> = Vec::new();
        for file in &complex.docking_results {
            match parse_vina_pdbqt(file) {
                Ok(file_poses) => {
                    for mut pose in file_poses {
                        pose.pose = poses.len() + 1;
                        poses.push(pose);
                    }
                }
                Err(e) => warn!(complex = %complex.name, "Could not parse docking result: {:#}", e),
            }
        }

        if poses.is_empty() {
            warn!(complex = %complex.name, "No poses found");
            continue;
        }
        debug!(complex = %complex.name, n_poses = poses.len(), "Parsed docking poses");
        parsed.push((complex.name.clone(), poses));
    }

    parsed
}
