//! Authored document: the save/load contract with the host.
//!
//! Shape: `{ "interactions": [...], "bookmarks": [...] }`. Both lists default
//! to empty when missing; unknown top-level keys are preserved.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Bookmark, Interaction};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InteractiveVideoParams {
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InteractiveVideoParams {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Parse document error")
    }

    pub fn to_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Serialize document error")
    }

    /// Load from a JSON file.
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Read document error: {}", path.display()))?;
        Self::parse(&json).with_context(|| format!("In {}", path.display()))
    }

    /// Save as pretty JSON.
    pub fn to_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_string_pretty()?;
        fs::write(path, json)
            .with_context(|| format!("Write document error: {}", path.display()))?;
        Ok(())
    }
}

/// A video file offered by the host's video field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFile {
    pub path: String,
    #[serde(default)]
    pub mime: Option<String>,
}

/// The host field the editor takes its video from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoField {
    /// Semantic path of the field, e.g. "interactiveVideo/video/files"
    pub path: String,
    /// Field type as declared by the host; must be "video"
    pub field_type: String,
    #[serde(default)]
    pub files: Vec<VideoFile>,
}

impl VideoField {
    pub fn video(path: impl Into<String>, files: Vec<VideoFile>) -> Self {
        Self {
            path: path.into(),
            field_type: "video".to_string(),
            files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_lists_default_to_empty() {
        let doc = InteractiveVideoParams::parse("{}").unwrap();
        assert!(doc.interactions.is_empty());
        assert!(doc.bookmarks.is_empty());
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let doc = InteractiveVideoParams::parse(
            r#"{"bookmarks":[{"time":1.5,"label":"Intro"}],"summary":{"task":{}}}"#,
        )
        .unwrap();
        assert_eq!(doc.bookmarks[0], Bookmark::new(1.5, "Intro"));
        let out = doc.to_string_pretty().unwrap();
        assert!(out.contains("\"summary\""));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = std::env::temp_dir().join(format!("iveditor-doc-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("doc.json");

        let mut doc = InteractiveVideoParams::default();
        doc.bookmarks.push(Bookmark::new(3.0, "Chapter"));
        doc.to_json(&path).unwrap();
        let loaded = InteractiveVideoParams::from_json(&path).unwrap();
        assert_eq!(loaded, doc);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_read_missing_file_errors() {
        let err = InteractiveVideoParams::from_json("/nonexistent/iveditor.json").unwrap_err();
        assert!(err.to_string().contains("Read document error"));
    }
}
