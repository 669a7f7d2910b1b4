//! Docking output filename parsing.
//!
//! Result files follow `PROTEIN_BINDINGSITE_LIGAND[_...]_PROGRAM_TYPE`, e.g.
//! `PBP1_Catalytic_Amoxacillin_vina_out` or `AgrA_1_Efavarinz_gnina_out`.
//! Parsing is best-effort: malformed names yield empty fields, never errors.

use ferrodock_common::{DockingProgram, FilenameInfo};

/// Substrings marking the token where the ligand name ends.
pub const PROGRAM_INDICATORS: [&str; 4] = ["vina", "gnina", "out", "result"];

/// Parse a filename stem (no extension) into its protein, site, ligand and
/// program tokens.
pub fn parse_docking_filename(stem: &str) -> FilenameInfo {
    let parts: Vec<&str> = stem.split('_').collect();

    let mut info = FilenameInfo::default();
    if parts.len() < 3 {
        return info;
    }

    info.protein = parts[0].to_string();
    info.binding_site = parts[1].to_string();

    // First token carrying any indicator, searched from the start of the name.
    if let Some((idx, part)) = parts.iter().enumerate().find(|(_, part)| {
        let lower = part.to_lowercase();
        PROGRAM_INDICATORS.iter().any(|ind| lower.contains(ind))
    }) {
        info.program_index = Some(idx);
        info.program = DockingProgram::detect(part);
    }

    if let Some(idx) = info.program_index.filter(|&i| i > 2) {
        info.ligand = parts[2..idx].join("_");
    }

    info
}
