//! Player and playback events.

use super::player::PlaybackState;

// === Reported by the player ===

/// Emitted by the player whenever its playback state changes.
#[derive(Clone, Debug)]
pub struct PlaybackStateChangedEvent {
    pub old: PlaybackState,
    pub new: PlaybackState,
}

/// Emitted by the player when the playhead moves (seek or playback tick).
#[derive(Clone, Debug)]
pub struct PlayheadMovedEvent {
    pub time: f64,
}
