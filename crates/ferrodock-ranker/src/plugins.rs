//! Analysis plugin registry.
//!
//! Analyses that consume the pipeline's pose tables are registered as
//! `AnalysisPlugin` implementations in a central `PluginRegistry`.
//!
//! Plugin lifecycle:
//!   1. Implement `AnalysisPlugin` for your type.
//!   2. Register with `PluginRegistry::register`.
//!   3. The pipeline runs plugins via `PluginRegistry::execute_all`.

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use ferrodock_common::{AnalysisConfig, PoseTable};

use crate::binding_mode::{BindingModeAnalyzer, BindingModeOutcome};
use crate::enrichment::{EnrichmentAnalyzer, EnrichmentOutcome};

/// Descriptive metadata for a plugin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginInfo {
    pub key: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
}

/// Tables a plugin can consume. Either may be absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisData<'a> {
    pub best_poses: Option<&'a PoseTable>,
    pub full_data: Option<&'a PoseTable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginStatus {
    Completed,
    Failed,
}

/// Outcome of running one plugin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginResult {
    pub plugin: String,
    pub status: PluginStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Plugin-specific fields.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl PluginResult {
    pub fn completed(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            status: PluginStatus::Completed,
            message: None,
            error: None,
            details: Map::new(),
        }
    }

    pub fn failed(plugin: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            status: PluginStatus::Failed,
            message: None,
            error: Some(error.into()),
            details: Map::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Merge the fields of a serialisable struct into `details`.
    pub fn with_details<T: Serialize>(mut self, details: &T) -> Result<Self> {
        if let Value::Object(map) = serde_json::to_value(details)? {
            self.details.extend(map);
        }
        Ok(self)
    }

    pub fn is_completed(&self) -> bool {
        self.status == PluginStatus::Completed
    }
}

/// An analysis step over pose tables.
pub trait AnalysisPlugin: Send + Sync {
    /// Unique registry key (snake_case, e.g. `"enrichment"`).
    fn key(&self) -> &str;

    fn info(&self) -> PluginInfo;

    /// Run the analysis, writing any artefacts under `output_dir`.
    fn analyze(&self, data: &AnalysisData<'_>, output_dir: &Path, config: &AnalysisConfig) -> Result<PluginResult>;
}

// ── Built-in plugins ─────────────────────────────────────────────────────────

const PLUGIN_AUTHOR: &str = "Ferrodock Contributors";
const PLUGIN_VERSION: &str = "1.0.0";

pub struct EnrichmentPlugin;

impl EnrichmentPlugin {
    pub const NAME: &'static str = "Enrichment Analyzer";
}

impl AnalysisPlugin for EnrichmentPlugin {
    fn key(&self) -> &str { "enrichment" }

    fn info(&self) -> PluginInfo {
        PluginInfo {
            key: self.key().to_string(),
            name: Self::NAME.to_string(),
            version: PLUGIN_VERSION.to_string(),
            description: "Analysis plugin for compound enrichment assessment".to_string(),
            author: PLUGIN_AUTHOR.to_string(),
        }
    }

    fn analyze(&self, data: &AnalysisData<'_>, output_dir: &Path, config: &AnalysisConfig) -> Result<PluginResult> {
        let analyzer = EnrichmentAnalyzer::new(config.enrichment.clone());
        let result = match analyzer.analyze(data.best_poses, output_dir)? {
            EnrichmentOutcome::Completed(report) => PluginResult::completed(Self::NAME).with_details(&report)?,
            EnrichmentOutcome::MissingColumns { message } => PluginResult::completed(Self::NAME).with_message(message),
            EnrichmentOutcome::NoData { error } => PluginResult::failed(Self::NAME, error),
        };
        Ok(result)
    }
}

pub struct BindingModePlugin;

impl BindingModePlugin {
    pub const NAME: &'static str = "Binding Mode Analyzer";
}

impl AnalysisPlugin for BindingModePlugin {
    fn key(&self) -> &str { "binding_mode" }

    fn info(&self) -> PluginInfo {
        PluginInfo {
            key: self.key().to_string(),
            name: Self::NAME.to_string(),
            version: PLUGIN_VERSION.to_string(),
            description: "Analysis plugin for binding mode clustering".to_string(),
            author: PLUGIN_AUTHOR.to_string(),
        }
    }

    fn analyze(&self, data: &AnalysisData<'_>, output_dir: &Path, config: &AnalysisConfig) -> Result<PluginResult> {
        let analyzer = BindingModeAnalyzer::new(config.binding_mode.clone());
        let result = match analyzer.analyze(data.full_data, output_dir)? {
            BindingModeOutcome::Completed(report) => PluginResult::completed(Self::NAME).with_details(&report)?,
            BindingModeOutcome::NotClustered { message } => PluginResult::completed(Self::NAME).with_message(message),
            BindingModeOutcome::NoData { error } => PluginResult::failed(Self::NAME, error),
        };
        Ok(result)
    }
}

// ── Registry ─────────────────────────────────────────────────────────────────

/// Plugins keyed by name, iterated in key order.
pub struct PluginRegistry {
    plugins: BTreeMap<String, Box<dyn AnalysisPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self { plugins: BTreeMap::new() }
    }

    /// Registry holding the built-in enrichment and binding mode plugins.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(EnrichmentPlugin);
        registry.register(BindingModePlugin);
        tracing::debug!("PluginRegistry ready with {} plugins", registry.len());
        registry
    }

    /// Register a plugin. Panics if the key is already registered.
    pub fn register<P: AnalysisPlugin + 'static>(&mut self, plugin: P) {
        let key = plugin.key().to_string();
        assert!(!self.plugins.contains_key(&key), "Duplicate plugin key: {key}");
        self.plugins.insert(key, Box::new(plugin));
    }

    pub fn list(&self) -> Vec<PluginInfo> {
        self.plugins.values().map(|p| p.info()).collect()
    }

    pub fn len(&self) -> usize { self.plugins.len() }

    pub fn is_empty(&self) -> bool { self.plugins.is_empty() }

    pub fn contains(&self, key: &str) -> bool {
        self.plugins.contains_key(key)
    }

    /// Run one plugin by key.
    pub fn execute(
        &self,
        key: &str,
        data: &AnalysisData<'_>,
        output_dir: &Path,
        config: &AnalysisConfig,
    ) -> Result<PluginResult> {
        let plugin = self
            .plugins
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("Plugin '{key}' not found"))?;
        tracing::info!(plugin = key, "Executing plugin");
        plugin.analyze(data, output_dir, config)
    }

    /// Run every plugin, or only `only` when given. A plugin error becomes a
    /// failed result and the remaining plugins still run.
    pub fn execute_all(
        &self,
        data: &AnalysisData<'_>,
        output_dir: &Path,
        config: &AnalysisConfig,
        only: Option<&[String]>,
    ) -> BTreeMap<String, PluginResult> {
        let mut results = BTreeMap::new();
        for (key, plugin) in &self.plugins {
            if only.is_some_and(|keys| !keys.iter().any(|k| k == key)) {
                continue;
            }
            let result = match self.execute(key, data, output_dir, config) {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(plugin = %key, "Plugin failed: {:#}", e);
                    PluginResult::failed(plugin.info().name, format!("{e:#}"))
                }
            };
            results.insert(key.clone(), result);
        }
        results
    }
}

impl Default for PluginRegistry {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrodock_test_utils::best_poses;
    use pretty_assertions::assert_eq;

    struct Exploding;

    impl AnalysisPlugin for Exploding {
        fn key(&self) -> &str { "exploding" }

        fn info(&self) -> PluginInfo {
            PluginInfo {
                key: "exploding".into(),
                name: "Exploding Analyzer".into(),
                version: "0.0.1".into(),
                description: "always fails".into(),
                author: "tests".into(),
            }
        }

        fn analyze(&self, _: &AnalysisData<'_>, _: &Path, _: &AnalysisConfig) -> Result<PluginResult> {
            anyhow::bail!("boom")
        }
    }

    #[test]
    fn test_builtin_listing() {
        let registry = PluginRegistry::with_builtin();
        let keys: Vec<String> = registry.list().into_iter().map(|i| i.key).collect();
        assert_eq!(keys, vec!["binding_mode", "enrichment"]);
        assert_eq!(registry.list()[1].name, "Enrichment Analyzer");
    }

    #[test]
    #[should_panic(expected = "Duplicate plugin key")]
    fn test_duplicate_registration_panics() {
        let mut registry = PluginRegistry::with_builtin();
        registry.register(EnrichmentPlugin);
    }

    #[test]
    fn test_unknown_plugin() {
        let out = tempfile::tempdir().unwrap();
        let registry = PluginRegistry::with_builtin();
        let err = registry
            .execute("docking_score", &AnalysisData::default(), out.path(), &AnalysisConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_failing_plugin_does_not_stop_others() {
        let out = tempfile::tempdir().unwrap();
        let mut registry = PluginRegistry::with_builtin();
        registry.register(Exploding);

        let poses = best_poses(&[("4TRO_INHA_Lig1", -9.0), ("4TRO_INHA_Lig2", -6.0)]);
        let data = AnalysisData { best_poses: Some(&poses), full_data: None };
        let results = registry.execute_all(&data, out.path(), &AnalysisConfig::default(), None);

        assert_eq!(results.len(), 3);
        assert_eq!(results["exploding"].status, PluginStatus::Failed);
        assert_eq!(results["exploding"].error.as_deref(), Some("boom"));
        assert!(results["enrichment"].is_completed());
        assert_eq!(
            results["binding_mode"].error.as_deref(),
            Some("No full data available for analysis")
        );
    }

    #[test]
    fn test_enabled_subset() {
        let out = tempfile::tempdir().unwrap();
        let registry = PluginRegistry::with_builtin();
        let only = vec!["enrichment".to_string()];
        let results = registry.execute_all(&AnalysisData::default(), out.path(), &AnalysisConfig::default(), Some(&only));
        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["enrichment"]);
    }

    #[test]
    fn test_result_json_shape() {
        let out = tempfile::tempdir().unwrap();
        let poses = best_poses(&[("4TRO_INHA_Lig1", -9.0), ("4TRO_INHA_Lig2", -6.0)]);
        let data = AnalysisData { best_poses: Some(&poses), full_data: None };
        let result = PluginRegistry::with_builtin()
            .execute("enrichment", &data, out.path(), &AnalysisConfig::default())
            .unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["plugin"], "Enrichment Analyzer");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["total_compounds"], 2);
        assert_eq!(json["strong_binders"], 1);
        assert_eq!(json["enrichment_threshold"], -8.0);
        assert_eq!(json["top_enriched_proteins"][0]["protein"], "4TRO_INHA");
        assert!(json.get("message").is_none());
        assert!(json.get("error").is_none());

        let missing = PluginResult::failed("Enrichment Analyzer", "No best poses data available for analysis");
        let json = serde_json::to_value(&missing).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "No best poses data available for analysis");
    }
}
