// Configuration Storage Service
// Handles engine config file read/write and version backup

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default)]
    pub version: String,
    /// Custom taxonomy file; the built-in catalog is used when unset.
    #[serde(default)]
    pub catalog_path: Option<String>,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Tunable display heuristics. None of these change counts or percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    #[serde(default = "default_quote_cap")]
    pub quote_cap: usize,
    #[serde(default = "default_quote_min_chars")]
    pub quote_min_chars: usize,
    #[serde(default = "default_quote_max_chars")]
    pub quote_max_chars: usize,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_story_cap")]
    pub story_cap: usize,
    /// Tier boundary: strictly above this percentage is "Very Common".
    #[serde(default = "default_very_common_above")]
    pub very_common_above: f64,
    /// Tier boundary: at or above this percentage is at least "Moderately Common".
    #[serde(default = "default_moderately_common_from")]
    pub moderately_common_from: f64,
    #[serde(default = "default_true")]
    pub parallel_classification: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            quote_cap: 3,
            quote_min_chars: 40,
            quote_max_chars: 300,
            top_n: 5,
            story_cap: 5,
            very_common_above: 5.0,
            moderately_common_from: 2.0,
            parallel_classification: true,
        }
    }
}

fn default_quote_cap() -> usize { 3 }
fn default_quote_min_chars() -> usize { 40 }
fn default_quote_max_chars() -> usize { 300 }
fn default_top_n() -> usize { 5 }
fn default_story_cap() -> usize { 5 }
fn default_very_common_above() -> f64 { 5.0 }
fn default_moderately_common_from() -> f64 { 2.0 }
fn default_true() -> bool { true }

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("review-insights"))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))
    }

    /// Load configuration from file
    pub fn load(&self) -> Result<EngineConfig, String> {
        if !self.config_file.exists() {
            return Ok(EngineConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Save configuration to file
    pub fn save(&self, config: &EngineConfig) -> Result<(), String> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_file, content)
            .map_err(|e| format!("Failed to write config: {}", e))
    }

    /// Resolve the taxonomy path, relative paths against the config dir.
    pub fn resolve_catalog_path(&self, config: &EngineConfig) -> Option<PathBuf> {
        let raw = config.catalog_path.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        let path = PathBuf::from(raw);
        if path.is_absolute() {
            Some(path)
        } else {
            Some(self.config_dir.join(path))
        }
    }

    fn create_backup(&self) -> Result<(), String> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)
            .map_err(|e| format!("Failed to create backup dir: {}", e))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)
            .map_err(|e| format!("Failed to create backup: {}", e))?;

        // Keep only last 10 backups
        self.cleanup_old_backups(&backup_dir, 10)
    }

    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), String> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(|e| format!("Failed to read backup dir: {}", e))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Timestamped names sort chronologically
        entries.sort_by_key(|e| e.file_name());

        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.analysis.quote_cap, 3);
        assert_eq!(config.analysis.very_common_above, 5.0);
        assert!(config.analysis.parallel_classification);
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed: EngineConfig =
            serde_json::from_str(r#"{"analysis": {"quoteCap": 2}}"#).unwrap();
        assert_eq!(parsed.analysis.quote_cap, 2);
        assert_eq!(parsed.analysis.top_n, 5);
        assert_eq!(parsed.analysis.quote_max_chars, 300);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested"));
        let config = store.load().unwrap();
        assert_eq!(config.analysis, AnalysisConfig::default());
    }

    #[test]
    fn test_save_then_load_and_backup() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());

        let mut config = EngineConfig {
            version: "1".to_string(),
            catalog_path: Some("taxonomy.json".to_string()),
            analysis: AnalysisConfig::default(),
        };
        store.save(&config).unwrap();
        config.analysis.top_n = 3;
        store.save(&config).unwrap();

        assert_eq!(store.config_file(), dir.path().join("config.json").as_path());
        assert!(store.config_file().exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.analysis.top_n, 3);
        assert_eq!(
            store.resolve_catalog_path(&loaded),
            Some(dir.path().join("taxonomy.json"))
        );
        let backups = fs::read_dir(dir.path().join("backups")).unwrap().count();
        assert_eq!(backups, 1);
    }
}
