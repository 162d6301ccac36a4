use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Actions buffered before initialization beyond this count are an error.
    pub max_pending_actions: usize,
    pub selection_debounce_ms: u64,
    /// Threshold for dashboard fuzzy rules that do not carry one.
    #[serde(default = "default_fuzzy_threshold")]
    pub default_fuzzy_threshold: f64,
    pub user_style_prefix: String,
    pub merged_prefix: String,
    pub group_label: String,
    #[serde(default = "default_grid_spacing")]
    pub grid_spacing: f64,
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,
}

fn default_fuzzy_threshold() -> f64 {
    0.6
}
fn default_grid_spacing() -> f64 {
    120.0
}
fn default_min_cluster_size() -> usize {
    2
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_pending_actions: 1000,
            selection_debounce_ms: 30,
            default_fuzzy_threshold: default_fuzzy_threshold(),
            user_style_prefix: "user-style-".to_string(),
            merged_prefix: "_merged_".to_string(),
            group_label: "Group".to_string(),
            grid_spacing: default_grid_spacing(),
            min_cluster_size: default_min_cluster_size(),
        }
    }
}

impl EngineSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings: EngineSettings = serde_json::from_str(&content)?;
        tracing::info!("Engine settings loaded from {:?}", path);
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn selection_debounce(&self) -> Duration {
        Duration::from_millis(self.selection_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{ "group_label": "Cluster" }"#).unwrap();
        assert_eq!(settings.group_label, "Cluster");
        assert_eq!(settings.max_pending_actions, 1000);
        assert_eq!(settings.default_fuzzy_threshold, 0.6);
        assert_eq!(settings.selection_debounce(), Duration::from_millis(30));
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.json");
        let settings = EngineSettings {
            grid_spacing: 80.0,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(EngineSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempdir().unwrap();
        assert!(EngineSettings::load(&dir.path().join("absent.json")).is_err());
    }
}
