/// Core entity types shared by the grouping, structure and analysis stages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Docking program
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DockingProgram {
    Vina,
    Gnina,
    #[default]
    Unknown,
}

impl DockingProgram {
    pub fn as_str(&self) -> &'static str {
        match self {
            DockingProgram::Vina    => "vina",
            DockingProgram::Gnina   => "gnina",
            DockingProgram::Unknown => "unknown",
        }
    }

    /// Detect the program named inside a filename token.
    /// "vina" wins over "gnina" when a token somehow carries both.
    pub fn detect(token: &str) -> Self {
        let lower = token.to_lowercase();
        if lower.contains("vina") {
            DockingProgram::Vina
        } else if lower.contains("gnina") {
            DockingProgram::Gnina
        } else {
            DockingProgram::Unknown
        }
    }
}

impl fmt::Display for DockingProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Filename info
// ---------------------------------------------------------------------------

/// Tokens recovered from a `PROTEIN_SITE_LIGAND[_...]_PROGRAM_TYPE` stem.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilenameInfo {
    pub protein: String,
    pub binding_site: String,
    pub ligand: String,
    pub program: DockingProgram,
    /// Index of the first token carrying a program indicator, if any.
    pub program_index: Option<usize>,
}

impl FilenameInfo {
    /// Derived complex name: `protein_bindingSite_ligand`.
    pub fn complex_name(&self) -> String {
        format!("{}_{}_{}", self.protein, self.binding_site, self.ligand)
    }

    pub fn is_empty(&self) -> bool {
        self.protein.is_empty() && self.binding_site.is_empty() && self.ligand.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Complex record
// ---------------------------------------------------------------------------

/// A protein-ligand complex assembled from one or more docking result files.
///
/// Structure stages fill in the optional path fields as they complete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplexRecord {
    pub name: String,
    pub directory: PathBuf,
    pub info: FilenameInfo,
    /// Result files in discovery order.
    pub docking_results: Vec<PathBuf>,
    pub split_directory: Option<PathBuf>,
    pub apo_protein: Option<PathBuf>,
    pub ligand_mol2: Option<PathBuf>,
    pub fixed_structure: Option<PathBuf>,
}

impl ComplexRecord {
    pub fn new(info: FilenameInfo, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: info.complex_name(),
            directory: directory.into(),
            info,
            docking_results: Vec::new(),
            split_directory: None,
            apo_protein: None,
            ligand_mol2: None,
            fixed_structure: None,
        }
    }

    /// Most recently discovered result file.
    pub fn docking_result(&self) -> Option<&Path> {
        self.docking_results.last().map(PathBuf::as_path)
    }

    pub fn add_docking_result(&mut self, path: impl Into<PathBuf>) {
        self.docking_results.push(path.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_program() {
        assert_eq!(DockingProgram::detect("VINA"), DockingProgram::Vina);
        assert_eq!(DockingProgram::detect("gnina"), DockingProgram::Gnina);
        assert_eq!(DockingProgram::detect("out"), DockingProgram::Unknown);
    }

    #[test]
    fn test_program_serialises_lowercase() {
        let json = serde_json::to_string(&DockingProgram::Gnina).unwrap();
        assert_eq!(json, "\"gnina\"");
    }

    #[test]
    fn test_complex_name_keeps_empty_tokens() {
        let info = FilenameInfo::default();
        assert_eq!(info.complex_name(), "__");
        assert!(info.is_empty());
    }

    #[test]
    fn test_latest_docking_result() {
        let info = FilenameInfo {
            protein: "PBP1".into(),
            binding_site: "Catalytic".into(),
            ligand: "Amoxacillin".into(),
            program: DockingProgram::Vina,
            program_index: Some(3),
        };
        let mut record = ComplexRecord::new(info, "/data");
        assert!(record.docking_result().is_none());
        record.add_docking_result("/data/a_out.pdbqt");
        record.add_docking_result("/data/b_out.pdbqt");
        assert_eq!(record.name, "PBP1_Catalytic_Amoxacillin");
        assert_eq!(record.docking_result(), Some(Path::new("/data/b_out.pdbqt")));
        assert_eq!(record.docking_results.len(), 2);
    }
}
