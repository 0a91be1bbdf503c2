//! Entities - the persisted data model of the authored document.
//!
//! Interactions and bookmarks are plain serde records. Ordering, identity and
//! invariants are enforced by `editor::store::TimelineStore`, not here.

pub mod bookmark;
pub mod document;
pub mod interaction;
pub mod keys;

pub use bookmark::{Bookmark, BookmarkId, TimeBucket};
pub use document::{InteractiveVideoParams, VideoField, VideoFile};
pub use interaction::{Adaptivity, ContentAction, Interaction, InteractionId, Rect, TimeWindow};
