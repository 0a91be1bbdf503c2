//! Editor events for views that mirror the timeline.
//!
//! Structural events carry `(index, delta)` so index-based views (bookmark
//! menus, slider markers) can renumber without a full rebuild: every item at
//! or after `index` shifts by `delta`.

use crate::entities::{BookmarkId, InteractionId};

use super::dialog::DialogState;

// === Store structure ===

/// Interaction added (`delta = 1`) or removed (`delta = -1`) at `index`.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionsChangedEvent {
    pub interaction: InteractionId,
    pub index: usize,
    pub delta: i32,
}

/// Bookmark added (`delta = 1`) or removed (`delta = -1`) at `index`.
#[derive(Clone, Debug, PartialEq)]
pub struct BookmarksChangedEvent {
    pub bookmark: BookmarkId,
    pub index: usize,
    pub delta: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BookmarkLabelChangedEvent {
    pub index: usize,
    pub label: String,
}

// === Presentation ===

/// Transient user-visible warning; views drop it after `ttl_ms`.
#[derive(Clone, Debug, PartialEq)]
pub struct NoticeEvent {
    pub message: String,
    pub ttl_ms: u64,
}

/// Drag overlay shown/hidden (blocks pointer events leaving the canvas).
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayVisibilityEvent(pub bool);

/// Interaction visual must be rebuilt from current params.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionRecreatedEvent {
    pub interaction: InteractionId,
    /// Visibility at the current playhead
    pub visible: bool,
}

/// Geometry written to the store; label anchor recomputed.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionMovedEvent {
    pub interaction: InteractionId,
}

// === Dialog / policy ===

#[derive(Clone, Debug, PartialEq)]
pub struct DialogStateChangedEvent {
    pub interaction: InteractionId,
    pub old: DialogState,
    pub new: DialogState,
}

/// Start-time conflict status for one interaction. Empty list clears it.
#[derive(Clone, Debug, PartialEq)]
pub struct StartTimeConflictEvent {
    pub interaction: InteractionId,
    pub conflicting: Vec<InteractionId>,
}

/// "Remove" pressed without confirmation; the host should ask `message`.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoveConfirmationEvent {
    pub interaction: InteractionId,
    pub message: String,
}
