//! Grouping of docking result files into complexes.

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use ferrodock_common::{ComplexRecord, FerrodockError};

use crate::filename::parse_docking_filename;

/// Finds docking outputs under a root and merges them by derived complex name.
#[derive(Debug, Clone)]
pub struct ComplexGrouper {
    pattern: String,
    matcher: GlobMatcher,
}

impl ComplexGrouper {
    /// Build a grouper matching file names against `pattern` (e.g. `*out*.pdbqt`).
    pub fn new(pattern: &str) -> Result<Self> {
        let matcher = Glob::new(pattern)
            .map(|g| g.compile_matcher())
            .map_err(|e| FerrodockError::InvalidPattern(format!("{pattern}: {e}")))?;
        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether a file name matches the docking output pattern.
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.matcher.is_match(Path::new(name)))
            .unwrap_or(false)
    }

    /// Walk `root` recursively and collect matching files in file-name order.
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            if entry.file_type().is_file() && self.matches(entry.path()) {
                files.push(entry.into_path());
            }
        }
        debug!(root = %root.display(), pattern = %self.pattern, n_files = files.len(), "Discovered docking outputs");
        Ok(files)
    }

    /// Merge files into complexes keyed by `protein_site_ligand`.
    ///
    /// The first file seen for a name fixes the record's directory and parsed
    /// info; every file is appended to its `docking_results`. Records come back
    /// in order of first sighting.
    pub fn group<I>(&self, files: I) -> Vec<ComplexRecord>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut complexes: Vec<ComplexRecord> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for file in files {
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let info = parse_docking_filename(&stem);
            let name = info.complex_name();

            let slot = match index.get(&name) {
                Some(&slot) => slot,
                None => {
                    let directory = file.parent().map(Path::to_path_buf).unwrap_or_default();
                    complexes.push(ComplexRecord::new(info, directory));
                    index.insert(name.clone(), complexes.len() - 1);
                    complexes.len() - 1
                }
            };

            let record = &mut complexes[slot];
            if !record.docking_results.is_empty() {
                debug!(complex = %name, file = %file.display(), "Additional result file for complex");
            }
            record.add_docking_result(file);
        }

        complexes
    }

    /// Discover and group in one step.
    pub fn find_complexes(&self, root: &Path) -> Result<Vec<ComplexRecord>> {
        info!("Finding docking outputs under {:?}", root);
        let files = self.discover(root)?;
        let complexes = self.group(files);
        info!(n_complexes = complexes.len(), "Grouped docking outputs into complexes");
        Ok(complexes)
    }
}
