//! ferrodock-common — Shared types, errors, and configuration used across all Ferrodock crates.

pub mod error;
pub mod entities;
pub mod table;
pub mod pipeline_config;

// Re-export commonly used types
pub use entities::{ComplexRecord, DockingProgram, FilenameInfo};
pub use error::{FerrodockError, Result};
pub use pipeline_config::{
    AnalysisConfig, BindingModeConfig, EnrichmentConfig, InputConfig, OutputConfig,
    PipelineConfig, StructureConfig,
};
pub use table::PoseTable;
