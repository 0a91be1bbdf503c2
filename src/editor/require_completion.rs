//! RequireCompletionPolicy: "must be completed" cascades onto other options.
//!
//! While an interaction requires completion:
//! - `pause` is forced on and its control disabled
//! - `behaviour.enableRetry` (if the content type has it) is forced on and disabled
//! - the "wrong answer" adaptivity group is hidden
//! - equal start times with other completion-required interactions are flagged
//!
//! Turning it off only re-enables the controls; their values are left as-is.
//!
//! The retry control lives in library-specific fields that load after the
//! content type is chosen. The policy keeps one [`Readiness`] per interaction
//! and polls the one for the open dialog on every open and toggle; it never
//! blocks unless the caller asks for [`RequireCompletionPolicy::wait_for_fields`]
//! with a deadline. Everything shown in the form is rebuilt per session.

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, trace};

use crate::core::event_bus::EditorEventEmitter;
use crate::core::readiness::{Readiness, ReadinessError};
use crate::entities::keys::{P_BEHAVIOUR, P_ENABLE_RETRY};
use crate::entities::{Interaction, InteractionId};

use super::texts::{FULL_SCORE_REQUIRED_PAUSE, FULL_SCORE_REQUIRED_RETRY, FULL_SCORE_REQUIRED_TIME_FRAME};

use super::conflicts::conflicting_at;
use super::editor_events::StartTimeConflictEvent;
use super::store::TimelineStore;

/// Library-specific form fields, as dotted paths ("behaviour.enableRetry").
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LibraryFields {
    pub library: String,
    pub fields: Vec<String>,
}

impl LibraryFields {
    pub fn new(library: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            library: library.into(),
            fields,
        }
    }

    pub fn has_retry(&self) -> bool {
        let path = format!("{}.{}", P_BEHAVIOUR, P_ENABLE_RETRY);
        self.fields.iter().any(|f| *f == path)
    }
}

/// Checkbox state as the form shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub checked: bool,
    pub enabled: bool,
}

impl ControlState {
    fn editable(checked: bool) -> Self {
        Self {
            checked,
            enabled: true,
        }
    }

    fn forced() -> Self {
        Self {
            checked: true,
            enabled: false,
        }
    }
}

/// What the form should show for the policy-controlled fields.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyView {
    pub required: bool,
    pub pause: ControlState,
    /// `None` until the library fields arrive, or if the content has no retry option
    pub retry: Option<ControlState>,
    pub wrong_group_hidden: bool,
    pub conflicts: Vec<InteractionId>,
}

impl Default for PolicyView {
    fn default() -> Self {
        Self {
            required: false,
            pause: ControlState::editable(false),
            retry: None,
            wrong_group_hidden: false,
            conflicts: Vec::new(),
        }
    }
}

impl PolicyView {
    /// "fullScoreRequiredPause"
    pub fn show_pause_message(&self) -> bool {
        self.required
    }

    /// "fullScoreRequiredRetry"
    pub fn show_retry_message(&self) -> bool {
        self.required && self.retry.is_some()
    }

    /// "fullScoreRequiredTimeFrame"
    pub fn show_time_frame_message(&self) -> bool {
        self.required && !self.conflicts.is_empty()
    }

    /// Help texts to show under the affected controls, in form order.
    pub fn messages(&self) -> Vec<&'static str> {
        let mut messages = Vec::new();
        if self.show_pause_message() {
            messages.push(FULL_SCORE_REQUIRED_PAUSE);
        }
        if self.show_retry_message() {
            messages.push(FULL_SCORE_REQUIRED_RETRY);
        }
        if self.show_time_frame_message() {
            messages.push(FULL_SCORE_REQUIRED_TIME_FRAME);
        }
        messages
    }
}

#[derive(Debug, Default)]
pub struct RequireCompletionPolicy {
    /// Library fields per interaction; content type is chosen per element
    fields: HashMap<InteractionId, Readiness<LibraryFields>>,
    /// Interaction whose dialog the view describes
    session: Option<InteractionId>,
    /// Retry control of the session's content found and hooked up
    retry_wired: bool,
    view: PolicyView,
    emitter: EditorEventEmitter,
}

impl RequireCompletionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_emitter(&mut self, emitter: EditorEventEmitter) {
        self.emitter = emitter;
    }

    pub fn view(&self) -> &PolicyView {
        &self.view
    }

    /// Content type of `id` (re)selected: its fields will arrive through `fields`.
    pub fn attach_fields(&mut self, id: InteractionId, fields: Readiness<LibraryFields>) {
        self.fields.insert(id, fields);
        if self.session == Some(id) {
            self.retry_wired = false;
            self.view.retry = None;
        }
    }

    /// Interaction removed: drop its pending fields.
    pub fn forget(&mut self, id: InteractionId) {
        self.fields.remove(&id);
        if self.session == Some(id) {
            self.session = None;
            self.retry_wired = false;
            self.view = PolicyView::default();
        }
    }

    /// Start describing `id`. State from another interaction's session is dropped.
    fn enter(&mut self, id: InteractionId) {
        if self.session != Some(id) {
            self.session = Some(id);
            self.retry_wired = false;
            self.view = PolicyView::default();
        }
    }

    /// Non-blocking readiness check for the session's fields. Wires the retry
    /// control once they exist.
    fn poll_fields(&mut self) -> Result<bool, ReadinessError> {
        if self.retry_wired {
            return Ok(true);
        }
        let Some(fields) = self.session.and_then(|id| self.fields.get_mut(&id)) else {
            return Ok(false);
        };
        match fields.poll()? {
            Some(lib) => {
                self.retry_wired = lib.has_retry();
                trace!("Library fields for {} ready (retry: {})", lib.library, self.retry_wired);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Block up to `timeout` for the library fields of `id`.
    pub fn wait_for_fields(&mut self, id: InteractionId, timeout: Duration) -> Result<(), ReadinessError> {
        let Some(fields) = self.fields.get_mut(&id) else {
            return Ok(());
        };
        let has_retry = fields.wait(timeout)?.has_retry();
        if self.session == Some(id) {
            self.retry_wired = has_retry;
        }
        Ok(())
    }

    /// Dialog opened for `id`: rebuild the view from the draft.
    ///
    /// Returns whether the library fields are ready. A dropped producer is
    /// reported as an error; the rest of the policy still applies.
    pub fn on_dialog_open(
        &mut self,
        draft: &mut Interaction,
        store: &TimelineStore,
        id: InteractionId,
    ) -> Result<bool, ReadinessError> {
        self.session = None;
        self.enter(id);
        let ready = self.poll_fields();
        self.apply(draft, store, id);
        ready
    }

    /// Require-completion checkbox changed.
    pub fn toggle(
        &mut self,
        draft: &mut Interaction,
        store: &TimelineStore,
        id: InteractionId,
        required: bool,
    ) -> &PolicyView {
        self.enter(id);
        if let Err(e) = self.poll_fields() {
            debug!("Library fields unavailable: {}", e);
        }
        draft.set_requires_completion(required);
        self.apply(draft, store, id);
        &self.view
    }

    /// Start time input changed: re-check conflicts.
    pub fn on_start_time_changed(
        &mut self,
        draft: &Interaction,
        store: &TimelineStore,
        id: InteractionId,
    ) -> &[InteractionId] {
        self.enter(id);
        self.check_conflicts(draft, store, id);
        &self.view.conflicts
    }

    /// User clicked the pause checkbox. Ignored while forced.
    pub fn set_pause(&mut self, draft: &mut Interaction, checked: bool) -> bool {
        if !self.view.pause.enabled {
            return false;
        }
        draft.pause_on_display = checked;
        self.view.pause.checked = checked;
        true
    }

    /// User clicked the retry checkbox. Ignored while forced or absent.
    pub fn set_retry(&mut self, draft: &mut Interaction, checked: bool) -> bool {
        match self.view.retry.as_mut() {
            Some(retry) if retry.enabled => {
                draft.set_enable_retry(checked);
                retry.checked = checked;
                true
            }
            _ => false,
        }
    }

    fn apply(&mut self, draft: &mut Interaction, store: &TimelineStore, id: InteractionId) {
        let required = draft.requires_completion();
        self.view.required = required;
        self.view.wrong_group_hidden = required;

        if required {
            draft.pause_on_display = true;
            self.view.pause = ControlState::forced();
        } else {
            self.view.pause = ControlState::editable(draft.pause_on_display);
        }

        self.view.retry = if self.retry_wired {
            if required {
                draft.set_enable_retry(true);
                Some(ControlState::forced())
            } else {
                Some(ControlState::editable(draft.enable_retry().unwrap_or(false)))
            }
        } else {
            None
        };

        self.check_conflicts(draft, store, id);
    }

    fn check_conflicts(&mut self, draft: &Interaction, store: &TimelineStore, id: InteractionId) {
        let conflicts = if draft.requires_completion() {
            conflicting_at(store, draft.time_window.from, Some(id))
        } else {
            Vec::new()
        };
        if conflicts != self.view.conflicts {
            if !conflicts.is_empty() {
                debug!("Interaction {} shares its start time with {} other(s)", id, conflicts.len());
            }
            self.emitter.emit(StartTimeConflictEvent {
                interaction: id,
                conflicting: conflicts.clone(),
            });
        }
        self.view.conflicts = conflicts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::{events_of, EventBus};
    use crate::core::readiness::readiness;
    use crate::entities::TimeWindow;

    fn retry_fields() -> LibraryFields {
        LibraryFields::new("H5P.MultiChoice", vec!["behaviour.enableRetry".into()])
    }

    fn setup() -> (TimelineStore, InteractionId, Interaction) {
        let mut store = TimelineStore::new();
        let id = store.add_interaction(Interaction::new("H5P.MultiChoice 1.16", TimeWindow::new(12.0, 20.0)));
        let draft = store.interaction(id).cloned().unwrap();
        (store, id, draft)
    }

    #[test]
    fn test_toggle_forces_pause_and_retry() {
        let (store, id, mut draft) = setup();
        let mut policy = RequireCompletionPolicy::new();
        policy.attach_fields(id, Readiness::resolved(retry_fields()));
        assert_eq!(policy.on_dialog_open(&mut draft, &store, id), Ok(true));

        let view = policy.toggle(&mut draft, &store, id, true).clone();
        assert!(draft.pause_on_display);
        assert_eq!(draft.enable_retry(), Some(true));
        assert_eq!(view.pause, ControlState::forced());
        assert_eq!(view.retry, Some(ControlState::forced()));
        assert!(view.wrong_group_hidden);
        assert!(view.show_pause_message());
        assert!(view.show_retry_message());

        // Forced controls ignore clicks
        assert!(!policy.set_pause(&mut draft, false));
        assert!(draft.pause_on_display);
    }

    #[test]
    fn test_untoggle_reenables_at_current_value() {
        let (store, id, mut draft) = setup();
        let mut policy = RequireCompletionPolicy::new();
        policy.attach_fields(id, Readiness::resolved(retry_fields()));
        policy.on_dialog_open(&mut draft, &store, id).unwrap();
        policy.toggle(&mut draft, &store, id, true);

        let view = policy.toggle(&mut draft, &store, id, false).clone();
        assert_eq!(view.pause, ControlState { checked: true, enabled: true });
        assert_eq!(view.retry, Some(ControlState { checked: true, enabled: true }));
        assert!(!view.wrong_group_hidden);
        assert!(policy.set_retry(&mut draft, false));
        assert_eq!(draft.enable_retry(), Some(false));
    }

    #[test]
    fn test_no_retry_control_without_fields() {
        let (store, id, mut draft) = setup();
        let mut policy = RequireCompletionPolicy::new();
        let (tx, rx) = readiness();
        policy.attach_fields(id, rx);
        assert_eq!(policy.on_dialog_open(&mut draft, &store, id), Ok(false));

        let view = policy.toggle(&mut draft, &store, id, true).clone();
        assert_eq!(view.retry, None);
        assert_eq!(draft.enable_retry(), None);

        // Fields land before the next open
        tx.resolve(retry_fields());
        assert_eq!(policy.on_dialog_open(&mut draft, &store, id), Ok(true));
        assert_eq!(policy.view().retry, Some(ControlState::forced()));
        assert_eq!(draft.enable_retry(), Some(true));
    }

    #[test]
    fn test_content_without_retry() {
        let (store, id, mut draft) = setup();
        let mut policy = RequireCompletionPolicy::new();
        policy.attach_fields(id, Readiness::resolved(LibraryFields::new("H5P.Summary", vec![])));
        policy.on_dialog_open(&mut draft, &store, id).unwrap();
        let view = policy.toggle(&mut draft, &store, id, true);
        assert_eq!(view.retry, None);
        assert!(!view.show_retry_message());
    }

    #[test]
    fn test_wait_for_fields_times_out() {
        let mut policy = RequireCompletionPolicy::new();
        let id = InteractionId::new();
        let (_tx, rx) = readiness::<LibraryFields>();
        policy.attach_fields(id, rx);
        assert_eq!(
            policy.wait_for_fields(id, Duration::from_millis(5)),
            Err(ReadinessError::Timeout(Duration::from_millis(5)))
        );
    }

    #[test]
    fn test_conflict_flagged_and_cleared() {
        let (mut store, id, mut draft) = setup();
        let mut other = Interaction::new("H5P.Blanks 1.12", TimeWindow::new(12.0, 18.0));
        other.set_requires_completion(true);
        let other = store.add_interaction(other);

        let mut policy = RequireCompletionPolicy::new();
        let view = policy.toggle(&mut draft, &store, id, true);
        assert_eq!(view.conflicts, vec![other]);
        assert!(view.show_time_frame_message());

        draft.time_window.from = 13.0;
        assert!(policy.on_start_time_changed(&draft, &store, id).is_empty());

        draft.time_window.from = 12.0;
        assert_eq!(policy.on_start_time_changed(&draft, &store, id), &[other]);
        let view = policy.toggle(&mut draft, &store, id, false);
        assert!(view.conflicts.is_empty());
        assert!(!view.show_time_frame_message());
    }

    #[test]
    fn test_fields_do_not_leak_between_interactions() {
        let mut store = TimelineStore::new();
        let quiz = store.add_interaction(Interaction::new("H5P.MultiChoice 1.16", TimeWindow::new(2.0, 8.0)));
        let summary = store.add_interaction(Interaction::new("H5P.Summary 1.10", TimeWindow::new(20.0, 30.0)));

        let mut policy = RequireCompletionPolicy::new();
        policy.attach_fields(quiz, Readiness::resolved(retry_fields()));
        policy.attach_fields(summary, Readiness::resolved(LibraryFields::new("H5P.Summary", vec![])));

        let mut draft = store.interaction(quiz).cloned().unwrap();
        policy.on_dialog_open(&mut draft, &store, quiz).unwrap();
        assert_eq!(policy.toggle(&mut draft, &store, quiz, true).retry, Some(ControlState::forced()));

        let mut draft = store.interaction(summary).cloned().unwrap();
        assert_eq!(policy.on_dialog_open(&mut draft, &store, summary), Ok(true));
        let view = policy.toggle(&mut draft, &store, summary, true).clone();
        assert_eq!(view.retry, None);
        assert_eq!(draft.enable_retry(), None);
        assert_eq!(view.messages(), vec![FULL_SCORE_REQUIRED_PAUSE]);
    }

    #[test]
    fn test_new_session_starts_without_conflicts() {
        let bus = EventBus::new();
        let mut store = TimelineStore::new();
        let mut first = Interaction::new("H5P.Blanks 1.12", TimeWindow::new(12.0, 18.0));
        first.set_requires_completion(true);
        let first = store.add_interaction(first);
        let second = store.add_interaction(Interaction::new("H5P.MultiChoice 1.16", TimeWindow::new(12.0, 20.0)));
        let mut draft = store.interaction(second).cloned().unwrap();
        let unrelated = store.add_interaction(Interaction::new("H5P.Text 1.1", TimeWindow::new(40.0, 50.0)));

        let mut policy = RequireCompletionPolicy::new();
        policy.set_emitter(EditorEventEmitter::from_emitter(bus.emitter()));
        policy.on_dialog_open(&mut draft, &store, second).unwrap();
        assert_eq!(policy.toggle(&mut draft, &store, second, true).conflicts, vec![first]);
        assert_eq!(
            policy.view().messages(),
            vec![FULL_SCORE_REQUIRED_PAUSE, FULL_SCORE_REQUIRED_TIME_FRAME]
        );
        bus.poll();

        let mut draft = store.interaction(unrelated).cloned().unwrap();
        policy.on_dialog_open(&mut draft, &store, unrelated).unwrap();
        assert!(policy.view().conflicts.is_empty());
        assert!(events_of::<StartTimeConflictEvent>(&bus.poll()).is_empty());
    }
}
