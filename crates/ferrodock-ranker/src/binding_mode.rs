//! Binding mode clustering over pose affinities.
//!
//! Poses are grouped with a deterministic one-dimensional k-means on
//! `vina_affinity`. Mode labels are ranked by centroid, so mode 0 always holds
//! the strongest binders.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use ferrodock_common::table::{columns, format_float, round3};
use ferrodock_common::{BindingModeConfig, PoseTable, Result};

pub const OUTPUT_SUBDIR: &str = "binding_mode_analysis";
pub const MODES_CSV: &str = "binding_modes.csv";
pub const STATISTICS_CSV: &str = "binding_mode_statistics.csv";
pub const SUMMARY_TXT: &str = "binding_mode_summary.txt";

pub const NO_DATA_ERROR: &str = "No full data available for analysis";
pub const MISSING_COLUMN_MESSAGE: &str = "Required column (vina_affinity) not found in data";
pub const INSUFFICIENT_DATA_MESSAGE: &str = "Insufficient data for binding mode clustering";

/// Fewest affinities that still get clustered.
const MIN_POSES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AffinityCategory {
    High,
    Medium,
    Low,
}

impl AffinityCategory {
    pub fn classify(affinity: f64, config: &BindingModeConfig) -> Self {
        if affinity <= config.high_affinity_cutoff {
            Self::High
        } else if affinity <= config.medium_affinity_cutoff {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High Affinity",
            Self::Medium => "Medium Affinity",
            Self::Low => "Low Affinity",
        }
    }
}

/// Affinity statistics for one binding mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeStatistics {
    pub binding_mode: usize,
    pub vina_affinity_mean: f64,
    /// Sample standard deviation; absent for single-pose modes.
    pub vina_affinity_std: Option<f64>,
    pub vina_affinity_count: usize,
    pub vina_affinity_min: f64,
    pub vina_affinity_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingModeReport {
    pub num_clusters: usize,
    pub total_poses: usize,
    pub clustered_data_file: PathBuf,
    pub statistics_file: PathBuf,
    pub summary_file: PathBuf,
    pub cluster_statistics: Vec<ModeStatistics>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BindingModeOutcome {
    Completed(BindingModeReport),
    /// Soft success: the data cannot be clustered.
    NotClustered { message: String },
    NoData { error: String },
}

/// Cluster labels for `values`, one per value, ranked by ascending centroid.
///
/// Centroids start at evenly spaced quantiles of the sorted values; ties in
/// distance go to the lower-ranked centroid. Empty clusters are dropped and
/// labels stay contiguous.
pub fn kmeans_1d(values: &[f64], k: usize, max_iterations: usize) -> Vec<usize> {
    let n = values.len();
    if n == 0 || k == 0 {
        return Vec::new();
    }
    let k = k.min(n);

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut centroids: Vec<f64> = (0..k).map(|i| sorted[(2 * i + 1) * n / (2 * k)]).collect();

    let nearest = |value: f64, centroids: &[f64]| -> usize {
        let mut best = 0;
        for (j, c) in centroids.iter().enumerate() {
            if (value - c).abs() < (value - centroids[best]).abs() {
                best = j;
            }
        }
        best
    };

    let mut labels: Vec<usize> = values.iter().map(|&v| nearest(v, &centroids)).collect();
    for iteration in 0..max_iterations {
        for (j, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<f64> = values
                .iter()
                .zip(&labels)
                .filter(|(_, &l)| l == j)
                .map(|(&v, _)| v)
                .collect();
            if !members.is_empty() {
                *centroid = members.iter().sum::<f64>() / members.len() as f64;
            }
        }
        let next: Vec<usize> = values.iter().map(|&v| nearest(v, &centroids)).collect();
        if next == labels {
            debug!(iterations = iteration + 1, "k-means converged");
            break;
        }
        labels = next;
    }

    // Rank non-empty clusters by centroid.
    let mut used: Vec<usize> = (0..k).filter(|j| labels.contains(j)).collect();
    used.sort_by(|a, b| centroids[*a].total_cmp(&centroids[*b]));
    let mut rank = vec![0; k];
    for (r, &j) in used.iter().enumerate() {
        rank[j] = r;
    }
    labels.into_iter().map(|l| rank[l]).collect()
}

fn mode_statistics(affinities: &[f64], labels: &[usize]) -> Vec<ModeStatistics> {
    let n_modes = labels.iter().max().map_or(0, |m| m + 1);
    (0..n_modes)
        .map(|mode| {
            let members: Vec<f64> = affinities
                .iter()
                .zip(labels)
                .filter(|(_, &l)| l == mode)
                .map(|(&a, _)| a)
                .collect();
            let count = members.len();
            let mean = members.iter().sum::<f64>() / count as f64;
            let std = (count > 1).then(|| {
                let var = members.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
                round3(var.sqrt())
            });
            ModeStatistics {
                binding_mode: mode,
                vina_affinity_mean: round3(mean),
                vina_affinity_std: std,
                vina_affinity_count: count,
                vina_affinity_min: round3(members.iter().copied().fold(f64::INFINITY, f64::min)),
                vina_affinity_max: round3(members.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            }
        })
        .collect()
}

pub struct BindingModeAnalyzer {
    config: BindingModeConfig,
}

impl BindingModeAnalyzer {
    pub fn new(config: BindingModeConfig) -> Self {
        Self { config }
    }

    /// Cluster `full_data` poses and write reports under `output_dir/binding_mode_analysis`.
    pub fn analyze(&self, full_data: Option<&PoseTable>, output_dir: &Path) -> Result<BindingModeOutcome> {
        let plugin_dir = output_dir.join(OUTPUT_SUBDIR);
        fs::create_dir_all(&plugin_dir)?;

        let Some(table) = full_data else {
            warn!("{}", NO_DATA_ERROR);
            return Ok(BindingModeOutcome::NoData { error: NO_DATA_ERROR.to_string() });
        };
        let Some(affinities) = table.float_column(columns::VINA_AFFINITY) else {
            warn!("{}", MISSING_COLUMN_MESSAGE);
            return Ok(BindingModeOutcome::NotClustered {
                message: MISSING_COLUMN_MESSAGE.to_string(),
            });
        };

        let present: Vec<f64> = affinities.iter().flatten().copied().collect();
        if present.len() < MIN_POSES {
            warn!(n_poses = present.len(), "{}", INSUFFICIENT_DATA_MESSAGE);
            return Ok(BindingModeOutcome::NotClustered {
                message: INSUFFICIENT_DATA_MESSAGE.to_string(),
            });
        }

        let labels = kmeans_1d(&present, self.config.n_clusters, self.config.max_iterations);

        // Spread labels back over rows; rows without an affinity stay blank.
        let mut mode_cells = Vec::with_capacity(affinities.len());
        let mut category_cells = Vec::with_capacity(affinities.len());
        let mut next_label = labels.iter();
        for affinity in &affinities {
            match (affinity, affinity.and_then(|_| next_label.next())) {
                (Some(value), Some(label)) => {
                    mode_cells.push(label.to_string());
                    category_cells.push(AffinityCategory::classify(*value, &self.config).label().to_string());
                }
                _ => {
                    mode_cells.push(String::new());
                    category_cells.push(String::new());
                }
            }
        }

        let mut clustered = table.clone();
        clustered.set_column("binding_mode", mode_cells)?;
        clustered.set_column("affinity_category", category_cells)?;
        let clustered_data_file = plugin_dir.join(MODES_CSV);
        clustered.write_csv(&clustered_data_file)?;

        let stats = mode_statistics(&present, &labels);
        let statistics_file = plugin_dir.join(STATISTICS_CSV);
        write_statistics_csv(&stats, &statistics_file)?;

        let summary_file = plugin_dir.join(SUMMARY_TXT);
        fs::write(&summary_file, render_summary(clustered.len(), &stats))?;

        info!(n_poses = clustered.len(), n_modes = stats.len(), "Binding mode analysis complete");

        Ok(BindingModeOutcome::Completed(BindingModeReport {
            num_clusters: stats.len(),
            total_poses: clustered.len(),
            clustered_data_file,
            statistics_file,
            summary_file,
            cluster_statistics: stats,
        }))
    }
}

impl Default for BindingModeAnalyzer {
    fn default() -> Self {
        Self::new(BindingModeConfig::default())
    }
}

fn write_statistics_csv(stats: &[ModeStatistics], path: &Path) -> Result<()> {
    let mut table = PoseTable::new([
        "binding_mode",
        "vina_affinity_mean",
        "vina_affinity_std",
        "vina_affinity_count",
        "vina_affinity_min",
        "vina_affinity_max",
    ]);
    for s in stats {
        table.push_row([
            s.binding_mode.to_string(),
            format_float(s.vina_affinity_mean),
            s.vina_affinity_std.map(format_float).unwrap_or_default(),
            s.vina_affinity_count.to_string(),
            format_float(s.vina_affinity_min),
            format_float(s.vina_affinity_max),
        ])?;
    }
    table.write_csv(path)
}

fn render_summary(total_poses: usize, stats: &[ModeStatistics]) -> String {
    let mut out = String::new();
    out.push_str("Binding Mode Analysis Summary\n");
    out.push_str("============================\n\n");
    out.push_str(&format!("Total poses analyzed: {total_poses}\n"));
    out.push_str(&format!("Number of binding modes: {}\n\n", stats.len()));
    out.push_str("Binding Mode Statistics:\n");
    for s in stats {
        out.push_str(&format!(
            "  Mode {}: {} poses, affinity range {:.2} to {:.2} kcal/mol\n",
            s.binding_mode, s.vina_affinity_count, s.vina_affinity_min, s.vina_affinity_max
        ));
    }
    out
}
