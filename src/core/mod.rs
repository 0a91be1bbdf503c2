//! Core plumbing - events, playback, readiness signals
//!
//! These modules are independent of the authoring logic in `editor`.

pub mod event_bus;
pub mod player;
pub mod player_events;
pub mod readiness;

pub use event_bus::{EditorEventEmitter, EventBus};
pub use player::{PlaybackCoordinator, PlaybackState, SimulatedPlayer, VideoPlayer};
pub use readiness::{readiness, Readiness, ReadinessError, ReadySender};
