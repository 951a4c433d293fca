use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::duplicate::DuplicatePlacement;
use crate::EditorError;

pub const DEFAULT_CONFIG_NAME: &str = "formwork.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    #[serde(default)]
    pub history: HistoryConfig,

    /// Where duplicates are inserted
    #[serde(default)]
    pub duplicate_placement: DuplicatePlacement,

    /// Prefix of generated node ids
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Maximum snapshots kept (0 = unlimited)
    #[serde(default)]
    pub max_levels: usize,

    /// Snapshot every label/placeholder/description change instead of
    /// waiting for a commit
    #[serde(default)]
    pub snapshot_text_edits: bool,
}

fn default_id_prefix() -> String {
    "field".to_string()
}

impl EditorConfig {
    /// Load config from a directory
    pub fn load(cwd: impl AsRef<Path>) -> Result<Self, EditorError> {
        let config_path = cwd.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(EditorConfig::default())
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            duplicate_placement: DuplicatePlacement::default(),
            id_prefix: default_id_prefix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "history": { "maxLevels": 50, "snapshotTextEdits": true },
            "duplicatePlacement": "root",
            "idPrefix": "q"
        }"#;

        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.history.max_levels, 50);
        assert!(config.history.snapshot_text_edits);
        assert_eq!(config.duplicate_placement, DuplicatePlacement::Root);
        assert_eq!(config.id_prefix, "q");
    }

    #[test]
    fn test_default_config() {
        let config: EditorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.history.max_levels, 0);
        assert!(!config.history.snapshot_text_edits);
        assert_eq!(config.duplicate_placement, DuplicatePlacement::AfterOriginal);
        assert_eq!(config.id_prefix, "field");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load(dir.path()).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "history": { "maxLevels": 5 } }"#,
        )
        .unwrap();

        let config = EditorConfig::load(dir.path()).unwrap();
        assert_eq!(config.history.max_levels, 5);
        assert_eq!(config.id_prefix, "field");
    }
}
