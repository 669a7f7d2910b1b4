//! Locating result directories inside a hand-organised research project.

use anyhow::Result;
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use ferrodock_common::{FerrodockError, InputConfig};

/// Where a research project keeps its docking results.
#[derive(Debug, Clone)]
pub struct ResearchLayout {
    pub base_path: PathBuf,
    pub subdirectories: Vec<String>,
    pub patterns: Vec<String>,
}

impl ResearchLayout {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let defaults = InputConfig::default();
        Self {
            base_path: base_path.into(),
            subdirectories: defaults.research_subdirectories,
            patterns: defaults.research_patterns,
        }
    }

    /// Layout from configuration; `None` when no research base is configured.
    pub fn from_config(input: &InputConfig) -> Option<Self> {
        input.research_base_path.as_ref().map(|base| Self {
            base_path: base.clone(),
            subdirectories: input.research_subdirectories.clone(),
            patterns: input.research_patterns.clone(),
        })
    }
}

fn build_glob(pattern: &str) -> Result<GlobMatcher> {
    let glob = Glob::new(pattern)
        .map_err(|e| FerrodockError::InvalidPattern(format!("{pattern}: {e}")))?;
    Ok(glob.compile_matcher())
}

/// Directories holding docking results under the layout's base path.
///
/// Well-known subdirectories that exist come first, in configured order,
/// followed by the parent of every file matching a result pattern. Patterns
/// are searched one after another, so parents found by an earlier pattern
/// precede those found by a later one. Each directory appears once.
pub fn find_research_directories(layout: &ResearchLayout) -> Result<Vec<PathBuf>> {
    let base = &layout.base_path;
    if !base.is_dir() {
        return Err(FerrodockError::InputNotFound(format!(
            "research base path {} is not a directory",
            base.display()
        ))
        .into());
    }

    let mut directories: Vec<PathBuf> = Vec::new();

    for sub in &layout.subdirectories {
        let full = base.join(sub);
        if full.exists() {
            debug!(dir = %full.display(), "Found well-known result directory");
            directories.push(full);
        }
    }

    for pattern in &layout.patterns {
        let matcher = build_glob(pattern)?;
        for entry in WalkDir::new(base).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matched = entry
                .path()
                .file_name()
                .map(|name| matcher.is_match(Path::new(name)))
                .unwrap_or(false);
            if !matched {
                continue;
            }
            if let Some(parent) = entry.path().parent() {
                if !directories.iter().any(|d| d == parent) {
                    directories.push(parent.to_path_buf());
                }
            }
        }
    }

    info!(base = %base.display(), n_directories = directories.len(), "Located research result directories");
    Ok(directories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrodock_test_utils::write_pdbqt;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_known_subdirectories_then_pattern_parents() {
        let tree = ferrodock_test_utils::docking_tree().unwrap();
        let base = tree.path();
        write_pdbqt(base, "batch7/site2/ligA_docked.pdbqt", &[-6.0]).unwrap();
        std::fs::create_dir_all(base.join("results")).unwrap();

        let dirs = find_research_directories(&ResearchLayout::new(base)).unwrap();
        assert_eq!(
            dirs,
            vec![
                base.join("gnina_out"),
                base.join("vina_out"),
                base.join("results"),
                base.join("batch7/site2"),
            ]
        );
    }

    #[test]
    fn test_earlier_pattern_parents_come_first() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        write_pdbqt(base, "a_batch/lig_docked.pdbqt", &[-7.0]).unwrap();
        write_pdbqt(base, "b_batch/lig_out.pdbqt", &[-8.0]).unwrap();
        write_pdbqt(base, "c_batch/lig_result.pdbqt", &[-6.5]).unwrap();

        let dirs = find_research_directories(&ResearchLayout::new(base)).unwrap();
        assert_eq!(
            dirs,
            vec![base.join("b_batch"), base.join("a_batch"), base.join("c_batch")]
        );
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut layout = ResearchLayout::new(dir.path());
        layout.patterns = vec!["[unclosed".to_string()];
        assert!(find_research_directories(&layout).is_err());
    }

    #[test]
    fn test_missing_base_path() {
        let layout = ResearchLayout::new("/no/such/research/project");
        assert!(find_research_directories(&layout).is_err());
    }

    #[test]
    fn test_layout_requires_configured_base() {
        let mut input = InputConfig::default();
        assert!(ResearchLayout::from_config(&input).is_none());
        input.research_base_path = Some(PathBuf::from("/data/project"));
        let layout = ResearchLayout::from_config(&input).unwrap();
        assert_eq!(layout.base_path, PathBuf::from("/data/project"));
        assert_eq!(layout.subdirectories.len(), 4);
    }
}
