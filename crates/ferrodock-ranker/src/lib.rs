//! ferrodock-ranker — Analyses over docking pose tables.
//! Enrichment of strong binders per protein, binding mode clustering, and the
//! plugin registry that runs them.

pub mod enrichment;
pub mod binding_mode;
pub mod plugins;

pub use binding_mode::{BindingModeAnalyzer, BindingModeOutcome, BindingModeReport};
pub use enrichment::{EnrichmentAnalyzer, EnrichmentOutcome, EnrichmentReport, EnrichmentRow};
pub use plugins::{AnalysisData, AnalysisPlugin, PluginInfo, PluginRegistry, PluginResult, PluginStatus};
