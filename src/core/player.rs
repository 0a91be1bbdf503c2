//! Playback collaborator and the coordinator that drives it.
//!
//! **Architecture**: the editor owns a [`PlaybackCoordinator`], which owns the
//! video player behind the [`VideoPlayer`] trait. The player never points back
//! at the editor; it reports state changes through an
//! [`EditorEventEmitter`](crate::core::event_bus::EditorEventEmitter).
//!
//! Two pause/resume policies live here:
//! - **Edit sessions**: state snapshotted at dialog open, resume only if the
//!   snapshot was `Playing`.
//! - **Pointer gestures** (press/release on an element): state remembered at
//!   press, resume on release unless it was `Paused` or `Ended`.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::event_bus::EditorEventEmitter;
use super::player_events::{PlaybackStateChangedEvent, PlayheadMovedEvent};

/// Playback state reported by the video player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlaybackState {
    Ended,
    Playing,
    Paused,
    Buffering,
    Seeking,
}

impl PlaybackState {
    /// States after which a gesture release must not restart playback.
    pub fn is_halted(self) -> bool {
        matches!(self, PlaybackState::Paused | PlaybackState::Ended)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlaybackState::Ended => "ENDED",
            PlaybackState::Playing => "PLAYING",
            PlaybackState::Paused => "PAUSED",
            PlaybackState::Buffering => "BUFFERING",
            PlaybackState::Seeking => "SEEKING",
        };
        f.write_str(s)
    }
}

/// What the editor needs from a video player. Times are in seconds.
pub trait VideoPlayer: Send {
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    fn state(&self) -> PlaybackState;
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, time: f64);
}

/// In-memory player used by the CLI and tests.
///
/// Advances by wall-clock deltas passed to [`SimulatedPlayer::update`];
/// stops in `Ended` at the end of the video.
#[derive(Debug)]
pub struct SimulatedPlayer {
    time: f64,
    duration: f64,
    state: PlaybackState,
    emitter: EditorEventEmitter,
}

impl SimulatedPlayer {
    pub fn new(duration: f64) -> Self {
        Self {
            time: 0.0,
            duration: duration.max(0.0),
            state: PlaybackState::Paused,
            emitter: EditorEventEmitter::dummy(),
        }
    }

    /// Attach the event channel playback changes are reported on.
    pub fn with_emitter(mut self, emitter: EditorEventEmitter) -> Self {
        self.emitter = emitter;
        self
    }

    fn set_state(&mut self, new: PlaybackState) {
        if self.state == new {
            return;
        }
        let old = self.state;
        self.state = new;
        trace!("Playback state {} -> {}", old, new);
        self.emitter.emit(PlaybackStateChangedEvent { old, new });
    }

    /// Enter or leave `Buffering` (network stalls in a real player).
    pub fn set_buffering(&mut self, buffering: bool) {
        if buffering {
            self.set_state(PlaybackState::Buffering);
        } else if self.state == PlaybackState::Buffering {
            self.set_state(PlaybackState::Playing);
        }
    }

    /// Advance the playhead by `dt` seconds when playing.
    pub fn update(&mut self, dt: f64) {
        if self.state != PlaybackState::Playing || dt <= 0.0 {
            return;
        }
        self.time = (self.time + dt).min(self.duration);
        self.emitter.emit(PlayheadMovedEvent { time: self.time });
        if self.time >= self.duration {
            self.set_state(PlaybackState::Ended);
        }
    }
}

impl VideoPlayer for SimulatedPlayer {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn state(&self) -> PlaybackState {
        self.state
    }

    fn play(&mut self) {
        if self.state == PlaybackState::Ended {
            self.time = 0.0;
        }
        self.set_state(PlaybackState::Playing);
    }

    fn pause(&mut self) {
        self.set_state(PlaybackState::Paused);
    }

    fn seek(&mut self, time: f64) {
        self.time = time.clamp(0.0, self.duration);
        self.emitter.emit(PlayheadMovedEvent { time: self.time });
        if self.state == PlaybackState::Ended && self.time < self.duration {
            self.set_state(PlaybackState::Paused);
        }
    }
}

/// Thin adapter issuing play/pause/seek and remembering pre-edit state.
pub struct PlaybackCoordinator {
    player: Box<dyn VideoPlayer>,
    /// State captured at the last pointer press (runtime-only)
    last_state: Option<PlaybackState>,
}

impl std::fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("state", &self.player.state())
            .field("time", &self.player.current_time())
            .field("last_state", &self.last_state)
            .finish()
    }
}

impl PlaybackCoordinator {
    pub fn new(player: Box<dyn VideoPlayer>) -> Self {
        Self {
            player,
            last_state: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.player.state()
    }

    pub fn current_time(&self) -> f64 {
        self.player.current_time()
    }

    pub fn duration(&self) -> f64 {
        self.player.duration()
    }

    pub fn play(&mut self) {
        self.player.play();
    }

    pub fn pause(&mut self) {
        self.player.pause();
    }

    /// Seek, clamped to the video.
    pub fn seek(&mut self, time: f64) {
        let duration = self.player.duration();
        self.player.seek(time.clamp(0.0, duration));
    }

    /// Borrow the underlying player (hosts drive `update` through this).
    pub fn player_mut(&mut self) -> &mut dyn VideoPlayer {
        self.player.as_mut()
    }

    // === Edit session policy ===

    /// Snapshot current state and pause unless the video already ended.
    pub fn pause_for_edit(&mut self) -> PlaybackState {
        let snapshot = self.player.state();
        if snapshot != PlaybackState::Ended && snapshot != PlaybackState::Paused {
            self.player.pause();
        }
        debug!("Edit session paused playback (was {})", snapshot);
        snapshot
    }

    /// Resume only if the session snapshot was `Playing`. Returns true if resumed.
    pub fn resume_after_edit(&mut self, snapshot: PlaybackState) -> bool {
        if snapshot == PlaybackState::Playing {
            self.player.play();
            debug!("Edit session resumed playback");
            true
        } else {
            false
        }
    }

    // === Pointer gesture policy ===

    /// Remember the state at press time and pause.
    pub fn begin_gesture(&mut self) {
        let state = self.player.state();
        self.last_state = Some(state);
        if !state.is_halted() {
            self.player.pause();
        }
    }

    /// Resume unless the state at press was paused/ended. Returns true if resumed.
    pub fn end_gesture(&mut self) -> bool {
        match self.last_state.take() {
            Some(state) if !state.is_halted() => {
                self.player.play();
                true
            }
            _ => false,
        }
    }

    pub fn last_state(&self) -> Option<PlaybackState> {
        self.last_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::{events_of, EventBus};

    fn coordinator(duration: f64) -> PlaybackCoordinator {
        PlaybackCoordinator::new(Box::new(SimulatedPlayer::new(duration)))
    }

    #[test]
    fn test_simulated_player_ends() {
        let mut player = SimulatedPlayer::new(2.0);
        player.play();
        player.update(1.5);
        assert_eq!(player.state(), PlaybackState::Playing);
        player.update(1.0);
        assert_eq!(player.current_time(), 2.0);
        assert_eq!(player.state(), PlaybackState::Ended);

        player.play();
        assert_eq!(player.current_time(), 0.0);
    }

    #[test]
    fn test_player_reports_state_changes() {
        let bus = EventBus::new();
        let mut player =
            SimulatedPlayer::new(10.0).with_emitter(EditorEventEmitter::from_emitter(bus.emitter()));
        player.play();
        player.pause();

        let changes = events_of::<PlaybackStateChangedEvent>(&bus.poll());
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].old, PlaybackState::Playing);
        assert_eq!(changes[1].new, PlaybackState::Paused);
    }

    #[test]
    fn test_edit_resumes_only_from_playing() {
        let mut c = coordinator(30.0);
        c.play();
        let snap = c.pause_for_edit();
        assert_eq!(c.state(), PlaybackState::Paused);
        assert!(c.resume_after_edit(snap));
        assert_eq!(c.state(), PlaybackState::Playing);

        c.pause();
        let snap = c.pause_for_edit();
        assert!(!c.resume_after_edit(snap));
        assert_eq!(c.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_edit_does_not_pause_ended() {
        let mut player = SimulatedPlayer::new(1.0);
        player.play();
        player.update(5.0);
        let mut c = PlaybackCoordinator::new(Box::new(player));
        assert_eq!(c.pause_for_edit(), PlaybackState::Ended);
        assert_eq!(c.state(), PlaybackState::Ended);
    }

    #[test]
    fn test_gesture_resumes_from_buffering() {
        let mut player = SimulatedPlayer::new(30.0);
        player.play();
        player.set_buffering(true);
        let mut c = PlaybackCoordinator::new(Box::new(player));

        c.begin_gesture();
        assert_eq!(c.state(), PlaybackState::Paused);
        assert!(c.end_gesture());
        assert_eq!(c.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_gesture_keeps_paused() {
        let mut c = coordinator(30.0);
        c.begin_gesture();
        assert!(!c.end_gesture());
        assert_eq!(c.state(), PlaybackState::Paused);
        // A second release without press is a no-op
        assert!(!c.end_gesture());
    }

    #[test]
    fn test_seek_is_clamped() {
        let mut c = coordinator(20.0);
        c.seek(50.0);
        assert_eq!(c.current_time(), 20.0);
        c.seek(-3.0);
        assert_eq!(c.current_time(), 0.0);
    }
}
