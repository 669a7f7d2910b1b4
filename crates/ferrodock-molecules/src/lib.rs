//! Ferrodock Molecules - docking result discovery and affinity tables.
//!
//! The post-docking flow, in order:
//! 1. Locating docking outputs (research layouts or a single input root)
//! 2. Parsing filenames and grouping outputs into complexes
//! 3. Structure stages (split, apo, ligand, chain fix)
//! 4. Parsing Vina poses
//! 5. Binding affinity tables and reports

pub mod filename;
pub mod complexes;
pub mod discovery;
pub mod structure;
pub mod docking;
pub mod affinity;
pub mod pipeline;

pub use affinity::{analyze_binding_affinities, AffinityAnalysis};
pub use complexes::ComplexGrouper;
pub use discovery::{find_research_directories, ResearchLayout};
pub use docking::{parse_all_docking_results, parse_vina_pdbqt, parse_vina_pdbqt_str, PoseRecord};
pub use filename::parse_docking_filename;
pub use pipeline::{PipelineRun, PostDockingPipeline};
pub use structure::{StageOutcome, StructurePipeline, StructureStage, ToolkitAvailability};

pub type Result<T> = anyhow::Result<T>;
