//! DialogController: edit-form lifecycle for one interaction at a time.
//!
//! ```text
//! Closed -> Opening -> Editing -> Validating -> Committed -> Closed
//!                         ^           |
//!                         +-----------+  (any validator failed)
//!                      Editing -> Cancelled -> Closed      (confirmed remove)
//! ```
//!
//! The session owns a draft copy of the interaction. Form edits go to the
//! draft; the store is only written on commit (geometry previews excepted,
//! those go through `GeometryEditor` straight into the store and are kept on
//! commit).

use log::{debug, info, trace};

use crate::core::event_bus::EditorEventEmitter;
use crate::core::player::{PlaybackCoordinator, PlaybackState};
use crate::entities::{Interaction, InteractionId};

use super::editor_events::{DialogStateChangedEvent, InteractionRecreatedEvent, OverlayVisibilityEvent};
use super::store::{StoreError, TimelineStore};

/// Dialog lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogState {
    Closed,     // No session
    Opening,    // Session captured, playback being paused
    Editing,    // Draft open for mutation
    Validating, // Running field validators
    Committed,  // Draft written back
    Cancelled,  // Interaction removed
}

impl std::fmt::Display for DialogState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogError {
    /// Another session is still editing/validating
    SessionOpen(InteractionId),
    NoSession,
    WrongState {
        expected: DialogState,
        actual: DialogState,
    },
    Store(StoreError),
}

impl std::fmt::Display for DialogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogError::SessionOpen(id) => {
                write!(f, "Interaction {} is already being edited", id)
            }
            DialogError::NoSession => write!(f, "No edit session open"),
            DialogError::WrongState { expected, actual } => {
                write!(f, "Dialog is {}, expected {}", actual, expected)
            }
            DialogError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DialogError {}

impl From<StoreError> for DialogError {
    fn from(e: StoreError) -> Self {
        DialogError::Store(e)
    }
}

/// One form field's validation hook.
///
/// `validate` is called for every field on "Done"; it reports its own
/// message so all failures can be shown at once.
pub trait FieldValidator: Send {
    fn name(&self) -> &str;
    fn validate(&mut self, draft: &Interaction) -> Result<(), String>;
}

/// Closure-backed validator.
pub struct FnValidator<F> {
    name: String,
    check: F,
}

impl<F> FnValidator<F>
where
    F: FnMut(&Interaction) -> Result<(), String> + Send,
{
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> FieldValidator for FnValidator<F>
where
    F: FnMut(&Interaction) -> Result<(), String> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&mut self, draft: &Interaction) -> Result<(), String> {
        (self.check)(draft)
    }
}

/// Built-in check on the time window inputs.
#[derive(Debug, Clone)]
pub struct TimeWindowValidator {
    pub duration: f64,
}

impl FieldValidator for TimeWindowValidator {
    fn name(&self) -> &str {
        crate::entities::keys::F_DURATION
    }

    fn validate(&mut self, draft: &Interaction) -> Result<(), String> {
        let w = draft.time_window;
        if !w.from.is_finite() || !w.to.is_finite() {
            return Err("Start and end time must be numbers".into());
        }
        if w.from < 0.0 || w.to > self.duration {
            return Err(format!(
                "Time window must lie within the video (0 - {:.1}s)",
                self.duration
            ));
        }
        if w.from > w.to {
            return Err("Start time must not be after end time".into());
        }
        Ok(())
    }
}

/// Failed field and its message.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ephemeral state of one edit.
pub struct EditSession {
    interaction: InteractionId,
    snapshot: PlaybackState,
    draft: Interaction,
    validators: Vec<Box<dyn FieldValidator>>,
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("interaction", &self.interaction)
            .field("snapshot", &self.snapshot)
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl EditSession {
    pub fn interaction(&self) -> InteractionId {
        self.interaction
    }

    /// Playback state captured at open
    pub fn snapshot(&self) -> PlaybackState {
        self.snapshot
    }

    pub fn draft(&self) -> &Interaction {
        &self.draft
    }
}

/// Result of pressing "Done".
#[derive(Debug, Clone, PartialEq)]
pub enum DoneOutcome {
    /// Draft written back; `resumed` if playback restarted
    Committed {
        interaction: InteractionId,
        visible: bool,
        resumed: bool,
    },
    /// Dialog stays open in `Editing`
    Invalid(Vec<FieldError>),
}

#[derive(Debug)]
pub struct DialogController {
    state: DialogState,
    session: Option<EditSession>,
    emitter: EditorEventEmitter,
}

impl Default for DialogController {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogController {
    pub fn new() -> Self {
        Self {
            state: DialogState::Closed,
            session: None,
            emitter: EditorEventEmitter::dummy(),
        }
    }

    pub fn set_emitter(&mut self, emitter: EditorEventEmitter) {
        self.emitter = emitter;
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DialogState::Editing | DialogState::Validating)
    }

    fn transition(&mut self, interaction: InteractionId, new: DialogState) {
        let old = self.state;
        self.state = new;
        trace!("Dialog {} -> {} ({})", old, new, interaction);
        self.emitter.emit(DialogStateChangedEvent {
            interaction,
            old,
            new,
        });
    }

    fn expect_editing(&self) -> Result<InteractionId, DialogError> {
        let session = self.session.as_ref().ok_or(DialogError::NoSession)?;
        if self.state != DialogState::Editing {
            return Err(DialogError::WrongState {
                expected: DialogState::Editing,
                actual: self.state,
            });
        }
        Ok(session.interaction)
    }

    /// Start editing `id`. Pauses playback unless it already ended.
    pub fn open(
        &mut self,
        store: &TimelineStore,
        playback: &mut PlaybackCoordinator,
        id: InteractionId,
        validators: Vec<Box<dyn FieldValidator>>,
    ) -> Result<(), DialogError> {
        if let Some(current) = self.session.as_ref().filter(|_| self.is_open()) {
            return Err(DialogError::SessionOpen(current.interaction));
        }
        let draft = store
            .interaction(id)
            .cloned()
            .ok_or(StoreError::UnknownInteraction(id))?;

        self.transition(id, DialogState::Opening);
        let snapshot = playback.pause_for_edit();
        self.session = Some(EditSession {
            interaction: id,
            snapshot,
            draft,
            validators,
        });
        self.transition(id, DialogState::Editing);
        info!("Editing interaction {} (playback was {})", id, snapshot);
        Ok(())
    }

    /// Mutable draft for form edits. Only while `Editing`.
    pub fn draft_mut(&mut self) -> Result<&mut Interaction, DialogError> {
        self.expect_editing()?;
        self.session
            .as_mut()
            .map(|s| &mut s.draft)
            .ok_or(DialogError::NoSession)
    }

    /// "Done": validate every field, then commit or go back to editing.
    pub fn done(
        &mut self,
        store: &mut TimelineStore,
        playback: &mut PlaybackCoordinator,
    ) -> Result<DoneOutcome, DialogError> {
        let id = self.expect_editing()?;
        self.transition(id, DialogState::Validating);

        let session = self.session.as_mut().ok_or(DialogError::NoSession)?;
        let mut errors = Vec::new();
        // No short-circuit: every field reports
        for validator in session.validators.iter_mut() {
            if let Err(message) = validator.validate(&session.draft) {
                errors.push(FieldError {
                    field: validator.name().to_string(),
                    message,
                });
            }
        }
        if !errors.is_empty() {
            debug!("Interaction {} has {} invalid field(s)", id, errors.len());
            self.transition(id, DialogState::Editing);
            return Ok(DoneOutcome::Invalid(errors));
        }

        let Some(session) = self.session.take() else {
            return Err(DialogError::NoSession);
        };
        let mut draft = session.draft;
        // Keep geometry written while the dialog was open
        match store.interaction(id) {
            Some(current) => draft.rect = current.rect,
            None => {
                self.transition(id, DialogState::Closed);
                return Err(StoreError::UnknownInteraction(id).into());
            }
        }
        let visible = draft.is_visible_at(playback.current_time());
        store.replace_interaction(id, draft)?;
        self.transition(id, DialogState::Committed);

        self.emitter.emit(InteractionRecreatedEvent {
            interaction: id,
            visible,
        });
        self.emitter.emit(OverlayVisibilityEvent(false));
        let resumed = playback.resume_after_edit(session.snapshot);
        self.transition(id, DialogState::Closed);
        info!("Committed interaction {}", id);

        Ok(DoneOutcome::Committed {
            interaction: id,
            visible,
            resumed,
        })
    }

    /// "Remove": deletes the interaction once the user confirmed.
    ///
    /// Returns `Ok(None)` (still editing) when not confirmed.
    pub fn remove(
        &mut self,
        store: &mut TimelineStore,
        playback: &mut PlaybackCoordinator,
        confirmed: bool,
    ) -> Result<Option<(usize, Interaction)>, DialogError> {
        let id = self.expect_editing()?;
        if !confirmed {
            return Ok(None);
        }
        let Some(session) = self.session.take() else {
            return Err(DialogError::NoSession);
        };
        self.transition(id, DialogState::Cancelled);
        let removed = store.remove_interaction(id);
        self.emitter.emit(OverlayVisibilityEvent(false));
        playback.resume_after_edit(session.snapshot);
        self.transition(id, DialogState::Closed);
        let removed = removed?;
        info!("Removed interaction {} from the dialog", id);
        Ok(Some(removed))
    }

    /// Drop the session without writing anything (video source replaced).
    pub fn abort(&mut self, playback: &mut PlaybackCoordinator) {
        if let Some(session) = self.session.take() {
            playback.resume_after_edit(session.snapshot);
            self.transition(session.interaction, DialogState::Closed);
            debug!("Edit session for {} aborted", session.interaction);
        }
    }
}
