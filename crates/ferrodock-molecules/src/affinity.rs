//! Binding affinity tables built from parsed Vina poses.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use ferrodock_common::table::{columns, format_float, round3};
use ferrodock_common::PoseTable;

use crate::docking::PoseRecord;

/// Number of best poses kept in `top_overall`.
pub const TOP_OVERALL: usize = 10;
/// Number of performers listed in the text summary.
pub const TOP_PERFORMERS: usize = 5;

/// Tables derived from a batch of docking results.
#[derive(Debug, Clone, PartialEq)]
pub struct AffinityAnalysis {
    /// Every pose: complex_name, pose, vina_affinity, rmsd_lb, rmsd_ub.
    pub full_data: PoseTable,
    /// Best pose per complex, strongest binder first.
    pub best_poses: PoseTable,
    /// Per-complex min/max/mean/std of vina_affinity.
    pub summary_stats: PoseTable,
    /// The first [`TOP_OVERALL`] best poses.
    pub top_overall: PoseTable,
    best: Vec<(String, PoseRecord)>,
}

impl AffinityAnalysis {
    /// Best affinity per complex in `best_poses` order.
    pub fn best_affinities(&self) -> impl Iterator<Item = (&str, f64)> {
        self.best.iter().map(|(name, pose)| (name.as_str(), pose.vina_affinity))
    }

    /// Named tables in report order.
    pub fn tables(&self) -> [(&'static str, &PoseTable); 4] {
        [
            ("full_data", &self.full_data),
            ("best_poses", &self.best_poses),
            ("summary_stats", &self.summary_stats),
            ("top_overall", &self.top_overall),
        ]
    }

    /// Plain-text digest of the best poses.
    pub fn summary_text(&self) -> String {
        let affinities: Vec<f64> = self.best.iter().map(|(_, p)| p.vina_affinity).collect();
        let n = affinities.len();
        let mean = affinities.iter().sum::<f64>() / n.max(1) as f64;
        let best = affinities.iter().copied().fold(f64::INFINITY, f64::min);
        let worst = affinities.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let mut lines = vec![
            "Post-Docking Analysis Summary Report".to_string(),
            "==================================".to_string(),
            String::new(),
            format!("Total complexes analyzed: {n}"),
            format!("Average binding affinity: {mean:.2} kcal/mol"),
            format!("Best binding affinity: {best:.2} kcal/mol"),
            format!("Worst binding affinity: {worst:.2} kcal/mol"),
            String::new(),
            "Top 5 Performers:".to_string(),
        ];
        for (i, (name, pose)) in self.best.iter().take(TOP_PERFORMERS).enumerate() {
            lines.push(format!(
                "  {}. {}: {:.2} kcal/mol (Pose {})",
                i + 1,
                name,
                pose.vina_affinity,
                pose.pose
            ));
        }
        lines.join("\n")
    }

    /// Write every table to `reports/{name}.csv`, plus `reports/summary_report.txt`.
    pub fn write_reports(&self, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let reports_dir = output_dir.join("reports");
        fs::create_dir_all(&reports_dir)
            .with_context(|| format!("Failed to create {}", reports_dir.display()))?;

        let mut written = Vec::new();
        for (name, table) in self.tables() {
            let path = reports_dir.join(format!("{name}.csv"));
            table
                .write_csv(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written.push(path);
        }

        let summary = reports_dir.join("summary_report.txt");
        fs::write(&summary, self.summary_text())
            .with_context(|| format!("Failed to write {}", summary.display()))?;
        written.push(summary);

        info!(n_files = written.len(), dir = %reports_dir.display(), "Affinity reports written");
        Ok(written)
    }
}

fn pose_row(name: &str, pose: &PoseRecord) -> [String; 5] {
    [
        name.to_string(),
        pose.pose.to_string(),
        format_float(pose.vina_affinity),
        format_float(pose.rmsd_lb),
        format_float(pose.rmsd_ub),
    ]
}

fn pose_headers() -> [&'static str; 5] {
    [
        columns::COMPLEX_NAME,
        columns::POSE,
        columns::VINA_AFFINITY,
        columns::RMSD_LB,
        columns::RMSD_UB,
    ]
}

/// Sample standard deviation; undefined below two values.
fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Build the affinity tables. Returns `None` when there are no poses at all.
pub fn analyze_binding_affinities(results: &[(String, Vec<PoseRecord>)]) -> Result<Option<AffinityAnalysis>> {
    if results.iter().all(|(_, poses)| poses.is_empty()) {
        return Ok(None);
    }

    let mut full_data = PoseTable::new(pose_headers());
    // Complex-name order, matching a sorted group-by.
    let mut by_complex: BTreeMap<&str, Vec<&PoseRecord>> = BTreeMap::new();
    for (name, poses) in results {
        for pose in poses {
            full_data.push_row(pose_row(name, pose))?;
            by_complex.entry(name.as_str()).or_default().push(pose);
        }
    }

    let mut summary_stats = PoseTable::new([
        columns::COMPLEX_NAME,
        "vina_affinity_min",
        "vina_affinity_max",
        "vina_affinity_mean",
        "vina_affinity_std",
    ]);
    let mut best: Vec<(String, PoseRecord)> = Vec::with_capacity(by_complex.len());

    for (name, poses) in &by_complex {
        let values: Vec<f64> = poses.iter().map(|p| p.vina_affinity).collect();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let std = sample_std(&values, mean)
            .map(|s| format_float(round3(s)))
            .unwrap_or_default();
        summary_stats.push_row([
            name.to_string(),
            format_float(round3(min)),
            format_float(round3(max)),
            format_float(round3(mean)),
            std,
        ])?;

        // First pose holding the minimum.
        if let Some(top) = poses.iter().find(|p| p.vina_affinity == min) {
            best.push((name.to_string(), **top));
        }
    }

    // Stable: ties keep complex-name order.
    best.sort_by(|a, b| a.1.vina_affinity.total_cmp(&b.1.vina_affinity));

    let mut best_poses = PoseTable::new(pose_headers());
    let mut top_overall = PoseTable::new([columns::COMPLEX_NAME, columns::VINA_AFFINITY, columns::POSE]);
    for (i, (name, pose)) in best.iter().enumerate() {
        best_poses.push_row(pose_row(name, pose))?;
        if i < TOP_OVERALL {
            top_overall.push_row([name.clone(), format_float(pose.vina_affinity), pose.pose.to_string()])?;
        }
    }

    info!(
        n_poses = full_data.len(),
        n_complexes = best_poses.len(),
        "Binding affinity analysis complete"
    );

    Ok(Some(AffinityAnalysis {
        full_data,
        best_poses,
        summary_stats,
        top_overall,
        best,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn poses(affinities: &[f64]) -> Vec<PoseRecord> {
        affinities
            .iter()
            .enumerate()
            .map(|(i, &a)| PoseRecord { pose: i + 1, vina_affinity: a, rmsd_lb: 0.0, rmsd_ub: 0.0 })
            .collect()
    }

    fn sample() -> Vec<(String, Vec<PoseRecord>)> {
        vec![
            ("PBP1_Catalytic_Efavirenz".into(), poses(&[-7.5, -7.1])),
            ("AgrA_1_Efavarinz".into(), poses(&[-10.4, -9.9])),
            ("PBP1_Catalytic_Amoxacillin".into(), poses(&[-8.1, -9.2, -9.2])),
            ("Solo_1_Lig".into(), poses(&[-6.0])),
        ]
    }

    #[test]
    fn test_empty_results() {
        assert!(analyze_binding_affinities(&[]).unwrap().is_none());
        let empty = vec![("A_B_C".to_string(), Vec::new())];
        assert!(analyze_binding_affinities(&empty).unwrap().is_none());
    }

    #[test]
    fn test_best_poses_sorted_by_affinity() {
        let analysis = analyze_binding_affinities(&sample()).unwrap().unwrap();
        assert_eq!(analysis.full_data.len(), 8);
        assert_eq!(
            analysis.best_poses.column(columns::COMPLEX_NAME).unwrap(),
            vec![
                "AgrA_1_Efavarinz",
                "PBP1_Catalytic_Amoxacillin",
                "PBP1_Catalytic_Efavirenz",
                "Solo_1_Lig",
            ]
        );
        // First of the tied minima wins.
        assert_eq!(analysis.best_poses.column(columns::POSE).unwrap()[1], "2");
        assert_eq!(analysis.top_overall.headers(), &["complex_name", "vina_affinity", "pose"]);
    }

    #[test]
    fn test_ties_keep_complex_name_order() {
        let results = vec![
            ("Z_1_L".to_string(), poses(&[-8.0])),
            ("A_1_L".to_string(), poses(&[-8.0])),
        ];
        let analysis = analyze_binding_affinities(&results).unwrap().unwrap();
        assert_eq!(analysis.best_poses.column(columns::COMPLEX_NAME).unwrap(), vec!["A_1_L", "Z_1_L"]);
    }

    #[test]
    fn test_summary_stats() {
        let analysis = analyze_binding_affinities(&sample()).unwrap().unwrap();
        let stats = &analysis.summary_stats;
        assert_eq!(
            stats.column(columns::COMPLEX_NAME).unwrap(),
            vec![
                "AgrA_1_Efavarinz",
                "PBP1_Catalytic_Amoxacillin",
                "PBP1_Catalytic_Efavirenz",
                "Solo_1_Lig",
            ]
        );
        let rows: Vec<&[String]> = stats.rows().collect();
        assert_eq!(rows[0], &["AgrA_1_Efavarinz", "-10.4", "-9.9", "-10.15", "0.354"]);
        // Single pose: std undefined.
        assert_eq!(rows[3][4], "");
    }

    #[test]
    fn test_top_overall_truncated() {
        let results: Vec<(String, Vec<PoseRecord>)> = (0..12)
            .map(|i| (format!("P_S_L{i:02}"), poses(&[-5.0 - i as f64])))
            .collect();
        let analysis = analyze_binding_affinities(&results).unwrap().unwrap();
        assert_eq!(analysis.best_poses.len(), 12);
        assert_eq!(analysis.top_overall.len(), TOP_OVERALL);
        assert_eq!(analysis.top_overall.column(columns::COMPLEX_NAME).unwrap()[0], "P_S_L11");
    }

    #[test]
    fn test_write_reports() {
        let out = tempfile::tempdir().unwrap();
        let analysis = analyze_binding_affinities(&sample()).unwrap().unwrap();
        let written = analysis.write_reports(out.path()).unwrap();
        assert_eq!(written.len(), 5);

        let reports = out.path().join("reports");
        for name in ["full_data", "best_poses", "summary_stats", "top_overall"] {
            assert!(reports.join(format!("{name}.csv")).is_file(), "{name}");
        }

        let reread = PoseTable::from_csv_path(&reports.join("best_poses.csv")).unwrap();
        assert_eq!(reread, analysis.best_poses);

        let summary = fs::read_to_string(reports.join("summary_report.txt")).unwrap();
        assert!(summary.contains("Total complexes analyzed: 4"));
        assert!(summary.contains("Best binding affinity: -10.40 kcal/mol"));
        assert!(summary.contains("Worst binding affinity: -6.00 kcal/mol"));
        assert!(summary.contains("  1. AgrA_1_Efavarinz: -10.40 kcal/mol (Pose 1)"));
    }
}
