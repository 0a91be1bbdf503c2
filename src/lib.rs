//! IVEDITOR - interactive video authoring library
//!
//! Re-exports all modules for use by the binary target.

// Core plumbing (events, playback, readiness)
pub mod core;

// App modules
pub mod cli;
pub mod config;
pub mod editor;
pub mod entities;
pub mod settings;

// Re-export commonly used types from core
pub use core::event_bus::{downcast_event, events_of, BoxedEvent, EditorEventEmitter, EventBus, EventEmitter};
pub use core::player::{PlaybackCoordinator, PlaybackState};

// Re-export the editor surface
pub use editor::{ConfigError, Editor, EditorError};
pub use entities::{Bookmark, Interaction, InteractiveVideoParams, Rect, TimeWindow};
pub use settings::EditorSettings;
