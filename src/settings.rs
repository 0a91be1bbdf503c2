//! Editor settings persisted as `iveditor.json`.
//!
//! Missing keys fall back to defaults, so older files keep loading.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::{config_file, PathConfig, SETTINGS_FILE};
use crate::editor::texts::NEW_BOOKMARK;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Length of a newly created interaction, seconds
    pub default_interaction_secs: f64,
    /// How long transient notices stay visible
    pub notice_ttl_ms: u64,
    /// Deadline for late-arriving content fields
    pub readiness_timeout_ms: u64,
    /// Catalog fetch tries before falling back to an empty toolbar
    pub catalog_attempts: u32,
    /// Canvas font size in pixels; minimum element side
    pub font_size_px: f64,
    pub bookmark_label_max: usize,
    pub default_bookmark_label: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            default_interaction_secs: 10.0,
            notice_ttl_ms: 3000,
            readiness_timeout_ms: 2000,
            catalog_attempts: 3,
            font_size_px: 16.0,
            bookmark_label_max: 255,
            default_bookmark_label: NEW_BOOKMARK.to_string(),
        }
    }
}

impl EditorSettings {
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    /// Load from the resolved config dir; defaults if the file is absent or broken.
    pub fn load(paths: &PathConfig) -> Self {
        let path = config_file(SETTINGS_FILE, paths);
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring settings file: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Read settings error: {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Parse settings error: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Serialize settings error")?;
        std::fs::write(path, json).with_context(|| format!("Write settings error: {}", path.display()))
    }

    /// Apply the bookmark label rules: blank -> default, then cap the length.
    pub fn normalize_bookmark_label(&self, label: &str) -> String {
        if label.trim().is_empty() {
            return self.default_bookmark_label.clone();
        }
        label.chars().take(self.bookmark_label_max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let s: EditorSettings = serde_json::from_str(r#"{"notice_ttl_ms": 500}"#).unwrap();
        assert_eq!(s.notice_ttl_ms, 500);
        assert_eq!(s.default_interaction_secs, 10.0);
        assert_eq!(s.catalog_attempts, 3);
    }

    #[test]
    fn test_bookmark_label_rules() {
        let s = EditorSettings {
            bookmark_label_max: 5,
            ..Default::default()
        };
        assert_eq!(s.normalize_bookmark_label("   "), "New bookmark");
        assert_eq!(s.normalize_bookmark_label("Chapter one"), "Chapt");
        assert_eq!(s.normalize_bookmark_label("Intro"), "Intro");
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = std::env::temp_dir().join("iveditor_settings_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(SETTINGS_FILE);
        let s = EditorSettings {
            font_size_px: 12.0,
            ..Default::default()
        };
        s.save(&path).unwrap();
        assert_eq!(EditorSettings::from_file(&path).unwrap(), s);

        let loaded = EditorSettings::load(&PathConfig {
            config_dir: Some(dir.clone()),
        });
        assert_eq!(loaded.font_size_px, 12.0);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
