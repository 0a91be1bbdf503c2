//! Element-type catalog: which content types can be dropped onto the video.
//!
//! The host serves a list of libraries. Fetching may fail; loading retries a
//! bounded number of times and then falls back to an empty toolbar, so the
//! editor stays usable for bookmarks and existing interactions.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::entities::keys::{machine_name, F_ADAPTIVITY, F_DISPLAY_AS_BUTTON, LIB_NIL, SCORED_LIBRARIES};

use super::texts::{fill, INSERT_ELEMENT};

/// One catalog entry as served by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryInfo {
    /// Machine name, e.g. "H5P.MultiChoice"
    pub name: String,
    /// Versioned name, e.g. "H5P.MultiChoice 1.16"
    pub uber_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub restricted: bool,
}

/// Toolbar button for one creatable element type.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementType {
    pub id: String,
    pub title: String,
    pub uber_name: String,
    /// "Click and drag to place :type"
    pub tooltip: String,
}

impl ElementType {
    /// Build the button for a library; `None` for restricted or unnamed entries.
    pub fn from_library(lib: &LibraryInfo) -> Option<Self> {
        if lib.restricted {
            return None;
        }
        let id = lib.name.split('.').nth(1)?.to_lowercase();
        let title = match id.as_str() {
            "summary" => "statements".to_string(),
            "nil" => "label".to_string(),
            _ => lib.title.to_lowercase(),
        };
        Some(Self {
            tooltip: fill(INSERT_ELEMENT, ":type", &title),
            id,
            title,
            uber_name: lib.uber_name.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// Transport failed; worth retrying
    Unavailable(String),
    /// Response arrived but could not be understood
    Malformed(String),
}

impl CatalogError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CatalogError::Unavailable(_))
    }
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Unavailable(msg) => write!(f, "Catalog unavailable: {}", msg),
            CatalogError::Malformed(msg) => write!(f, "Malformed catalog: {}", msg),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Where the library list comes from (host endpoint, file, test double).
pub trait CatalogSource {
    fn fetch(&mut self) -> Result<Vec<LibraryInfo>, CatalogError>;
}

/// Library list stored as a JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CatalogSource for JsonFileCatalog {
    fn fetch(&mut self) -> Result<Vec<LibraryInfo>, CatalogError> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| CatalogError::Unavailable(format!("{}: {}", self.path.display(), e)))?;
        serde_json::from_str(&text).map_err(|e| CatalogError::Malformed(e.to_string()))
    }
}

/// Outcome of [`load_catalog`]. `error` is set when the fallback was used.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogLoad {
    pub buttons: Vec<ElementType>,
    pub attempts: u32,
    pub error: Option<CatalogError>,
}

/// Fetch with up to `max_attempts` tries; empty toolbar on final failure.
pub fn load_catalog(source: &mut dyn CatalogSource, max_attempts: u32) -> CatalogLoad {
    let max_attempts = max_attempts.max(1);
    let mut last_error = None;
    for attempt in 1..=max_attempts {
        match source.fetch() {
            Ok(libraries) => {
                let buttons: Vec<_> = libraries.iter().filter_map(ElementType::from_library).collect();
                info!(
                    "Catalog loaded: {} of {} libraries creatable",
                    buttons.len(),
                    libraries.len()
                );
                return CatalogLoad {
                    buttons,
                    attempts: attempt,
                    error: None,
                };
            }
            Err(e) => {
                warn!("Catalog fetch attempt {}/{} failed: {}", attempt, max_attempts, e);
                let retry = e.is_retryable();
                last_error = Some(e);
                if !retry {
                    return CatalogLoad {
                        buttons: Vec::new(),
                        attempts: attempt,
                        error: last_error,
                    };
                }
            }
        }
    }
    CatalogLoad {
        buttons: Vec::new(),
        attempts: max_attempts,
        error: last_error,
    }
}

/// Interaction form fields to hide for a content type.
pub fn hidden_fields(library: &str) -> Vec<&'static str> {
    let name = machine_name(library);
    let mut hidden = Vec::new();
    if !SCORED_LIBRARIES.contains(&name) {
        hidden.push(F_ADAPTIVITY);
    }
    if name == LIB_NIL {
        hidden.push(F_DISPLAY_AS_BUTTON);
    }
    debug!("Hidden fields for {}: {:?}", name, hidden);
    hidden
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib(name: &str, title: &str, restricted: bool) -> LibraryInfo {
        LibraryInfo {
            name: name.into(),
            uber_name: format!("{} 1.0", name),
            title: title.into(),
            restricted,
        }
    }

    struct Flaky {
        failures: u32,
        calls: u32,
        error: CatalogError,
    }

    impl CatalogSource for Flaky {
        fn fetch(&mut self) -> Result<Vec<LibraryInfo>, CatalogError> {
            self.calls += 1;
            if self.calls <= self.failures {
                Err(self.error.clone())
            } else {
                Ok(vec![lib("H5P.Text", "Text", false)])
            }
        }
    }

    #[test]
    fn test_buttons_from_libraries() {
        let b = ElementType::from_library(&lib("H5P.MultiChoice", "Multiple Choice", false)).unwrap();
        assert_eq!(b.id, "multichoice");
        assert_eq!(b.title, "multiple choice");
        assert_eq!(b.tooltip, "Click and drag to place multiple choice");
        assert_eq!(b.uber_name, "H5P.MultiChoice 1.0");

        assert_eq!(ElementType::from_library(&lib("H5P.Summary", "Summary", false)).unwrap().title, "statements");
        assert_eq!(ElementType::from_library(&lib("H5P.Nil", "Nil", false)).unwrap().title, "label");
        assert!(ElementType::from_library(&lib("H5P.Table", "Table", true)).is_none());
        assert!(ElementType::from_library(&lib("Plain", "x", false)).is_none());
    }

    #[test]
    fn test_library_json_names() {
        let libs: Vec<LibraryInfo> = serde_json::from_str(
            r#"[{"name": "H5P.Image", "uberName": "H5P.Image 1.1", "title": "Image"},
                {"name": "H5P.Link", "uberName": "H5P.Link 1.3", "title": "Link", "restricted": true}]"#,
        )
        .unwrap();
        assert!(!libs[0].restricted);
        assert!(libs[1].restricted);
    }

    #[test]
    fn test_retry_then_success() {
        let mut src = Flaky {
            failures: 2,
            calls: 0,
            error: CatalogError::Unavailable("timeout".into()),
        };
        let load = load_catalog(&mut src, 3);
        assert_eq!(load.attempts, 3);
        assert_eq!(load.buttons.len(), 1);
        assert_eq!(load.error, None);
    }

    #[test]
    fn test_exhausted_falls_back_to_empty() {
        let mut src = Flaky {
            failures: 10,
            calls: 0,
            error: CatalogError::Unavailable("offline".into()),
        };
        let load = load_catalog(&mut src, 3);
        assert!(load.buttons.is_empty());
        assert_eq!(src.calls, 3);
        assert_eq!(load.error, Some(CatalogError::Unavailable("offline".into())));
    }

    #[test]
    fn test_malformed_not_retried() {
        let mut src = Flaky {
            failures: 10,
            calls: 0,
            error: CatalogError::Malformed("bad json".into()),
        };
        let load = load_catalog(&mut src, 5);
        assert_eq!(src.calls, 1);
        assert!(load.buttons.is_empty());
    }

    #[test]
    fn test_hidden_fields() {
        assert_eq!(hidden_fields("H5P.Text 1.1"), vec![F_ADAPTIVITY]);
        assert_eq!(hidden_fields("H5P.Nil 1.0"), vec![F_ADAPTIVITY, F_DISPLAY_AS_BUTTON]);
        assert!(hidden_fields("H5P.MultiChoice 1.16").is_empty());
    }
}
