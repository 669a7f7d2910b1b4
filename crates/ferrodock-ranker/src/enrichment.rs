//! Compound enrichment per protein target.
//!
//! A compound is a strong binder when its best Vina affinity is at or below
//! the configured threshold. Proteins are ranked by the fraction of their
//! compounds that are strong binders.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use ferrodock_common::table::{columns, format_float, round3};
use ferrodock_common::{EnrichmentConfig, PoseTable, Result};

pub const OUTPUT_SUBDIR: &str = "enrichment_analysis";
pub const ENRICHMENT_CSV: &str = "protein_enrichment.csv";
pub const SUMMARY_TXT: &str = "enrichment_summary.txt";

pub const NO_DATA_ERROR: &str = "No best poses data available for analysis";
pub const MISSING_COLUMNS_MESSAGE: &str =
    "Required columns (vina_affinity, complex_name) not found in data";

/// Per-protein enrichment figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRow {
    pub protein: String,
    pub total_compounds: usize,
    pub strong_binders: usize,
    /// `strong_binders / total_compounds`, rounded to 3 decimals.
    pub enrichment_ratio: f64,
}

/// Result of a completed enrichment run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentReport {
    /// All rows of the input table.
    pub total_compounds: usize,
    pub strong_binders: usize,
    pub enrichment_threshold: f64,
    pub enrichment_data_file: PathBuf,
    pub summary_file: PathBuf,
    pub top_enriched_proteins: Vec<EnrichmentRow>,
    #[serde(skip)]
    pub proteins: Vec<EnrichmentRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
    Completed(EnrichmentReport),
    /// Soft success: the table lacks `vina_affinity` or `complex_name`.
    MissingColumns { message: String },
    /// No best-poses table was supplied.
    NoData { error: String },
}

/// Protein key derived from a complex name: the first two underscore tokens.
pub fn derive_protein(complex_name: &str) -> String {
    if !complex_name.contains('_') {
        return complex_name.to_string();
    }
    let parts: Vec<&str> = complex_name.split('_').collect();
    if parts.len() >= 2 {
        format!("{}_{}", parts[0], parts[1])
    } else {
        parts[0].to_string()
    }
}

/// Aggregate rows per protein and rank them.
///
/// Proteins are ordered by ratio descending, then by name ascending. Rows
/// without an affinity value keep their protein group but are not counted.
pub fn protein_enrichment(proteins: &[String], affinities: &[Option<f64>], threshold: f64) -> Vec<EnrichmentRow> {
    let mut groups: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (protein, affinity) in proteins.iter().zip(affinities) {
        if protein.is_empty() {
            continue;
        }
        let entry = groups.entry(protein.as_str()).or_default();
        if let Some(value) = affinity {
            entry.0 += 1;
            if *value <= threshold {
                entry.1 += 1;
            }
        }
    }

    let mut rows: Vec<EnrichmentRow> = groups
        .into_iter()
        .map(|(protein, (total, strong))| EnrichmentRow {
            protein: protein.to_string(),
            total_compounds: total,
            strong_binders: strong,
            enrichment_ratio: if total == 0 {
                0.0
            } else {
                round3(strong as f64 / total as f64)
            },
        })
        .collect();

    rows.sort_by(|a, b| {
        b.enrichment_ratio
            .total_cmp(&a.enrichment_ratio)
            .then_with(|| a.protein.cmp(&b.protein))
    });
    rows
}

pub struct EnrichmentAnalyzer {
    config: EnrichmentConfig,
}

impl EnrichmentAnalyzer {
    pub fn new(config: EnrichmentConfig) -> Self {
        Self { config }
    }

    pub fn threshold(&self) -> f64 {
        self.config.strong_binder_threshold
    }

    /// Run the analysis and write its reports under `output_dir/enrichment_analysis`.
    pub fn analyze(&self, best_poses: Option<&PoseTable>, output_dir: &Path) -> Result<EnrichmentOutcome> {
        let plugin_dir = output_dir.join(OUTPUT_SUBDIR);
        fs::create_dir_all(&plugin_dir)?;

        let Some(table) = best_poses else {
            warn!("{}", NO_DATA_ERROR);
            return Ok(EnrichmentOutcome::NoData {
                error: NO_DATA_ERROR.to_string(),
            });
        };

        let (Some(names), Some(affinities)) = (
            table.column(columns::COMPLEX_NAME),
            table.float_column(columns::VINA_AFFINITY),
        ) else {
            warn!("{}", MISSING_COLUMNS_MESSAGE);
            return Ok(EnrichmentOutcome::MissingColumns {
                message: MISSING_COLUMNS_MESSAGE.to_string(),
            });
        };

        let proteins: Vec<String> = match table.column(columns::PROTEIN) {
            Some(existing) => existing.into_iter().map(str::to_string).collect(),
            None => {
                debug!("No protein column, deriving from complex names");
                names.iter().map(|n| derive_protein(n)).collect()
            }
        };

        let threshold = self.threshold();
        let rows = protein_enrichment(&proteins, &affinities, threshold);
        let total_compounds = table.len();
        let strong_binders = affinities
            .iter()
            .filter(|a| a.is_some_and(|v| v <= threshold))
            .count();

        let enrichment_data_file = plugin_dir.join(ENRICHMENT_CSV);
        write_enrichment_csv(&rows, &enrichment_data_file)?;

        let top: Vec<EnrichmentRow> = rows.iter().take(self.config.top_n).cloned().collect();
        let summary_file = plugin_dir.join(SUMMARY_TXT);
        fs::write(
            &summary_file,
            render_summary(total_compounds, strong_binders, threshold, &top),
        )?;

        info!(
            total_compounds,
            strong_binders,
            threshold,
            n_proteins = rows.len(),
            "Enrichment analysis complete"
        );

        Ok(EnrichmentOutcome::Completed(EnrichmentReport {
            total_compounds,
            strong_binders,
            enrichment_threshold: threshold,
            enrichment_data_file,
            summary_file,
            top_enriched_proteins: top,
            proteins: rows,
        }))
    }
}

impl Default for EnrichmentAnalyzer {
    fn default() -> Self {
        Self::new(EnrichmentConfig::default())
    }
}

fn write_enrichment_csv(rows: &[EnrichmentRow], path: &Path) -> Result<()> {
    let mut table = PoseTable::new([
        columns::PROTEIN,
        "total_compounds",
        "strong_binders",
        "enrichment_ratio",
    ]);
    for row in rows {
        table.push_row([
            row.protein.clone(),
            row.total_compounds.to_string(),
            row.strong_binders.to_string(),
            format_float(row.enrichment_ratio),
        ])?;
    }
    table.write_csv(path)
}

fn render_summary(total: usize, strong: usize, threshold: f64, top: &[EnrichmentRow]) -> String {
    let overall = if total == 0 {
        0.0
    } else {
        strong as f64 / total as f64 * 100.0
    };

    let mut out = String::new();
    out.push_str("Compound Enrichment Analysis Summary\n");
    out.push_str("===================================\n\n");
    out.push_str(&format!("Total compounds analyzed: {total}\n"));
    out.push_str(&format!("Strong binders (≤{threshold:?} kcal/mol): {strong}\n"));
    out.push_str(&format!("Overall enrichment rate: {overall:.1}%\n\n"));
    out.push_str("Top Enriched Proteins:\n");
    for row in top {
        out.push_str(&format!(
            "  {}: {:.1}% ({}/{})\n",
            row.protein,
            row.enrichment_ratio * 100.0,
            row.strong_binders,
            row.total_compounds
        ));
    }
    out
}
