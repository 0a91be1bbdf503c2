//! Interaction: a content element anchored to a time window and a canvas rect.
//!
//! Serialized with the host document's field names (`x`, `y`, `width`,
//! `height`, `duration.from/to`, `pause`, `action`, `adaptivity`). Fields this
//! crate does not model are kept in `extra` and written back untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::keys::{machine_name, P_BEHAVIOUR, P_ENABLE_RETRY};

/// Tolerance for canvas bound checks on percentage values.
const BOUNDS_EPSILON: f64 = 1e-9;

/// Stable handle for an interaction.
///
/// Independent of the interaction's position in the store; resolve the
/// position through `TimelineStore::interaction_position` when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InteractionId(pub Uuid);

impl InteractionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InteractionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InteractionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Time window in seconds. Invariant: `0 <= from <= to <= duration`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: f64,
    pub to: f64,
}

impl TimeWindow {
    pub fn new(from: f64, to: f64) -> Self {
        Self { from, to }
    }

    /// Force the window into `[0, duration]` with `from <= to`.
    pub fn clamped(self, duration: f64) -> Self {
        let duration = duration.max(0.0);
        let from = self.from.clamp(0.0, duration);
        let to = self.to.clamp(from, duration);
        Self { from, to }
    }

    pub fn is_valid(&self, duration: f64) -> bool {
        self.from.is_finite()
            && self.to.is_finite()
            && 0.0 <= self.from
            && self.from <= self.to
            && self.to <= duration
    }

    /// Inclusive on both ends, like the player's show/hide toggle.
    pub fn contains(&self, time: f64) -> bool {
        self.from <= time && time <= self.to
    }
}

/// Canvas rect in percent of the canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True if the rect lies fully within the 100x100 percent canvas.
    pub fn is_inside_canvas(&self) -> bool {
        self.x >= -BOUNDS_EPSILON
            && self.y >= -BOUNDS_EPSILON
            && self.width >= 0.0
            && self.height >= 0.0
            && self.x + self.width <= 100.0 + BOUNDS_EPSILON
            && self.y + self.height <= 100.0 + BOUNDS_EPSILON
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Content carried by an interaction. `params` is owned by the form subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAction {
    /// Uber name, e.g. "H5P.MultiChoice 1.16"
    pub library: String,
    #[serde(default = "empty_object")]
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_content_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentAction {
    pub fn new(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            params: empty_object(),
            sub_content_id: Some(Uuid::new_v4().to_string()),
            extra: Map::new(),
        }
    }
}

/// Adaptivity settings (scored content only).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adaptivity {
    #[serde(default)]
    pub require_completion: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Adaptivity {
    fn is_default(&self) -> bool {
        !self.require_completion && self.extra.is_empty()
    }
}

/// One interaction record as stored in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(flatten)]
    pub rect: Rect,
    #[serde(rename = "duration")]
    pub time_window: TimeWindow,
    #[serde(rename = "pause", default)]
    pub pause_on_display: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub action: ContentAction,
    #[serde(default, skip_serializing_if = "Adaptivity::is_default")]
    pub adaptivity: Adaptivity,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Interaction {
    /// New element with a zero-sized rect at the canvas origin.
    pub fn new(library: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            rect: Rect::default(),
            time_window: window,
            pause_on_display: false,
            label: None,
            action: ContentAction::new(library),
            adaptivity: Adaptivity::default(),
            extra: Map::new(),
        }
    }

    /// Library machine name without version.
    pub fn library(&self) -> &str {
        machine_name(&self.action.library)
    }

    pub fn requires_completion(&self) -> bool {
        self.adaptivity.require_completion
    }

    pub fn set_requires_completion(&mut self, required: bool) {
        self.adaptivity.require_completion = required;
    }

    /// Retry flag from the content's behaviour params, if the content has one.
    pub fn enable_retry(&self) -> Option<bool> {
        self.action
            .params
            .get(P_BEHAVIOUR)
            .and_then(|b| b.get(P_ENABLE_RETRY))
            .and_then(Value::as_bool)
    }

    /// Write the retry flag, creating the behaviour group if needed.
    pub fn set_enable_retry(&mut self, enabled: bool) {
        if !self.action.params.is_object() {
            self.action.params = empty_object();
        }
        if let Some(params) = self.action.params.as_object_mut() {
            let behaviour = params
                .entry(P_BEHAVIOUR)
                .or_insert_with(empty_object);
            if !behaviour.is_object() {
                *behaviour = empty_object();
            }
            if let Some(b) = behaviour.as_object_mut() {
                b.insert(P_ENABLE_RETRY.to_string(), Value::Bool(enabled));
            }
        }
    }

    pub fn is_visible_at(&self, time: f64) -> bool {
        self.time_window.contains(time)
    }
}
