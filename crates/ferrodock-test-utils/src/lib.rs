//! Shared fixtures for Ferrodock tests.
//!
//! Builders for Vina PDBQT outputs laid out on disk and for in-memory pose
//! tables, so crate tests do not each hand-roll the same files.

use std::fs;
use std::path::{Path, PathBuf};

use ferrodock_common::table::{columns, format_float};
use ferrodock_common::PoseTable;
use tempfile::TempDir;

pub use pretty_assertions;

/// Render a multi-model Vina PDBQT with one `REMARK VINA RESULT:` per pose.
pub fn vina_pdbqt(affinities: &[f64]) -> String {
    let mut out = String::new();
    for (i, affinity) in affinities.iter().enumerate() {
        let rmsd_lb = i as f64 * 1.5;
        let rmsd_ub = i as f64 * 2.0;
        out.push_str(&format!("MODEL {}\n", i + 1));
        out.push_str(&format!(
            "REMARK VINA RESULT:    {affinity:.1}      {rmsd_lb:.3}      {rmsd_ub:.3}\n"
        ));
        out.push_str("REMARK  Name = ligand\n");
        out.push_str("ATOM      1  C   UNL     1       0.000   0.000   0.000  0.00  0.00    +0.000 C \n");
        out.push_str("ENDMDL\n");
    }
    out
}

/// Write a Vina output under `dir/relative`, creating parent directories.
pub fn write_pdbqt(dir: &Path, relative: &str, affinities: &[f64]) -> anyhow::Result<PathBuf> {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, vina_pdbqt(affinities))?;
    Ok(path)
}

/// A scratch docking tree with a handful of complexes across two programs.
///
/// ```text
/// vina_out/PBP1_Catalytic_Amoxacillin_vina_out.pdbqt   -9.2 -8.1 -7.0
/// vina_out/PBP1_Catalytic_Efavirenz_vina_out.pdbqt     -7.5 -7.1
/// gnina_out/AgrA_1_Efavarinz_gnina_out.pdbqt           -10.4 -9.9
/// gnina_out/notes.txt
/// ```
pub fn docking_tree() -> anyhow::Result<TempDir> {
    let dir = tempfile::tempdir()?;
    write_pdbqt(
        dir.path(),
        "vina_out/PBP1_Catalytic_Amoxacillin_vina_out.pdbqt",
        &[-9.2, -8.1, -7.0],
    )?;
    write_pdbqt(
        dir.path(),
        "vina_out/PBP1_Catalytic_Efavirenz_vina_out.pdbqt",
        &[-7.5, -7.1],
    )?;
    write_pdbqt(
        dir.path(),
        "gnina_out/AgrA_1_Efavarinz_gnina_out.pdbqt",
        &[-10.4, -9.9],
    )?;
    fs::write(dir.path().join("gnina_out/notes.txt"), "not a docking result")?;
    Ok(dir)
}

/// Best-poses table with `complex_name` and `vina_affinity` columns.
pub fn best_poses(rows: &[(&str, f64)]) -> PoseTable {
    let mut table = PoseTable::new([columns::COMPLEX_NAME, columns::VINA_AFFINITY]);
    for (name, affinity) in rows {
        table
            .push_row([name.to_string(), format_float(*affinity)])
            .expect("two cells for two columns");
    }
    table
}

/// Parse an inline CSV literal into a table.
pub fn table_from_csv(csv: &str) -> PoseTable {
    PoseTable::from_reader(csv.as_bytes()).expect("fixture CSV must parse")
}
