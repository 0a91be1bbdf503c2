//! Authoring editor: interactions and bookmarks on a video timeline.
//!
//! [`Editor`] owns every component and the playback coordinator; components
//! never reference each other or the editor. Flow for a user gesture:
//!
//! ```text
//! gesture -> GeometryEditor / DialogController -> TimelineStore
//!         -> ConflictDetector (via RequireCompletionPolicy)
//!         -> events on the bus (views re-render)
//!         -> PlaybackCoordinator (pause/resume)
//! ```

pub mod catalog;
pub mod check;
pub mod conflicts;
pub mod dialog;
pub mod editor_events;
pub mod geometry;
pub mod require_completion;
pub mod store;
pub mod texts;

use log::{debug, info, trace, warn};
use serde_json::{Map, Value};

use crate::core::event_bus::{EditorEventEmitter, EventBus};
use crate::core::player::{PlaybackCoordinator, VideoPlayer};
use crate::core::player_events::PlaybackStateChangedEvent;
use crate::core::readiness::{Readiness, ReadinessError};
use crate::entities::keys::{machine_name, DEFAULT_NIL_LABEL, LIB_IMAGE, LIB_NIL};
use crate::entities::{
    BookmarkId, Interaction, InteractionId, InteractiveVideoParams, Rect, TimeWindow, VideoField, VideoFile,
};
use crate::settings::EditorSettings;

use catalog::{load_catalog, CatalogError, CatalogSource, ElementType};
use check::{check_store, CheckReport};
use dialog::{DialogController, DialogError, DoneOutcome, FieldValidator, TimeWindowValidator};
use editor_events::{NoticeEvent, OverlayVisibilityEvent, RemoveConfirmationEvent};
use geometry::{Canvas, GeometryEditor, GeometryError, Placement};
use require_completion::{LibraryFields, PolicyView, RequireCompletionPolicy};
use store::{BookmarkError, LoadReport, StoreError, TimelineStore};

/// Canvas assumed until the host reports the real player size.
const DEFAULT_CANVAS: (f64, f64) = (640.0, 360.0);

/// Fatal initialization errors. The editor is not created.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No host field at the configured path
    UnknownFieldPath(String),
    /// Field exists but is not a video field
    NotVideoField { path: String, field_type: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnknownFieldPath(path) => write!(f, "Unable to find the field \"{}\"", path),
            ConfigError::NotVideoField { path, field_type } => {
                write!(f, "{} (type {})", texts::fill(texts::NOT_VIDEO_FIELD, ":path", path), field_type)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorError {
    Config(ConfigError),
    /// No video selected yet; authoring is inactive
    NoVideo,
    UnknownElementType(String),
    Store(StoreError),
    Bookmark(BookmarkError),
    Geometry(GeometryError),
    Dialog(DialogError),
    Readiness(ReadinessError),
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorError::Config(e) => write!(f, "{}", e),
            EditorError::NoVideo => write!(f, "{}", texts::SELECT_VIDEO),
            EditorError::UnknownElementType(id) => write!(f, "Unknown element type \"{}\"", id),
            EditorError::Store(e) => write!(f, "{}", e),
            EditorError::Bookmark(e) => write!(f, "{}", e),
            EditorError::Geometry(e) => write!(f, "{}", e),
            EditorError::Dialog(e) => write!(f, "{}", e),
            EditorError::Readiness(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for EditorError {}

impl From<ConfigError> for EditorError {
    fn from(e: ConfigError) -> Self {
        EditorError::Config(e)
    }
}

impl From<StoreError> for EditorError {
    fn from(e: StoreError) -> Self {
        EditorError::Store(e)
    }
}

impl From<BookmarkError> for EditorError {
    fn from(e: BookmarkError) -> Self {
        EditorError::Bookmark(e)
    }
}

impl From<GeometryError> for EditorError {
    fn from(e: GeometryError) -> Self {
        EditorError::Geometry(e)
    }
}

impl From<DialogError> for EditorError {
    fn from(e: DialogError) -> Self {
        EditorError::Dialog(e)
    }
}

impl From<ReadinessError> for EditorError {
    fn from(e: ReadinessError) -> Self {
        EditorError::Readiness(e)
    }
}

/// Find the host field the video comes from.
pub fn resolve_video_field<'a>(path: &str, fields: &'a [VideoField]) -> Result<&'a VideoField, ConfigError> {
    let field = fields
        .iter()
        .find(|f| f.path == path)
        .ok_or_else(|| ConfigError::UnknownFieldPath(path.to_string()))?;
    if field.field_type != "video" {
        return Err(ConfigError::NotVideoField {
            path: path.to_string(),
            field_type: field.field_type.clone(),
        });
    }
    Ok(field)
}

/// What a pointer release did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseOutcome {
    pub resumed: bool,
    /// Freshly created element whose edit dialog should open now
    pub open_dialog: Option<InteractionId>,
}

pub struct Editor {
    settings: EditorSettings,
    video: VideoField,
    store: TimelineStore,
    /// Top-level document keys this editor does not own
    doc_extra: Map<String, Value>,
    load_report: LoadReport,
    playback: Option<PlaybackCoordinator>,
    geometry: GeometryEditor,
    dialog: DialogController,
    policy: RequireCompletionPolicy,
    buttons: Vec<ElementType>,
    bus: EventBus,
    emitter: EditorEventEmitter,
    pressed: Option<InteractionId>,
    new_element: Option<InteractionId>,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("video", &self.video.path)
            .field("interactions", &self.store.interaction_count())
            .field("bookmarks", &self.store.bookmark_count())
            .field("dialog", &self.dialog.state())
            .field("playback", &self.playback)
            .finish()
    }
}

impl Editor {
    /// Build an editor over `params`, taking the video from the host field at
    /// `video_path`. Fails only on a missing or non-video field.
    pub fn new(
        settings: EditorSettings,
        video_path: &str,
        fields: &[VideoField],
        params: InteractiveVideoParams,
    ) -> Result<Self, ConfigError> {
        let video = resolve_video_field(video_path, fields)?.clone();

        let bus = EventBus::new();
        let emitter = EditorEventEmitter::from_emitter(bus.emitter());

        let InteractiveVideoParams {
            interactions,
            bookmarks,
            extra,
        } = params;
        let (mut store, load_report) = TimelineStore::from_document(InteractiveVideoParams {
            interactions,
            bookmarks,
            extra: Map::new(),
        });
        for (bookmark, e) in &load_report.dropped_bookmarks {
            warn!("Bookmark '{}' at {:.2}s not loaded: {}", bookmark.label, bookmark.time, e);
        }
        store.set_emitter(emitter.clone());

        let mut geometry = GeometryEditor::new(Canvas::new(DEFAULT_CANVAS.0, DEFAULT_CANVAS.1, settings.font_size_px));
        geometry.set_emitter(emitter.clone());
        let mut dialog = DialogController::new();
        dialog.set_emitter(emitter.clone());
        let mut policy = RequireCompletionPolicy::new();
        policy.set_emitter(emitter.clone());

        bus.subscribe::<PlaybackStateChangedEvent, _>(|e| {
            trace!("Player reported {} -> {}", e.old, e.new);
        });

        if video.files.is_empty() {
            info!("No video selected; editor inactive");
        }

        Ok(Self {
            settings,
            video,
            store,
            doc_extra: extra,
            load_report,
            playback: None,
            geometry,
            dialog,
            policy,
            buttons: Vec::new(),
            bus,
            emitter,
            pressed: None,
            new_element: None,
        })
    }

    // === Wiring ===

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Emitter for collaborators (the player) to report on.
    pub fn emitter(&self) -> EditorEventEmitter {
        self.emitter.clone()
    }

    pub fn is_active(&self) -> bool {
        !self.video.files.is_empty() && self.playback.is_some()
    }

    /// Hand over the player for the current video.
    pub fn attach_player(&mut self, player: Box<dyn VideoPlayer>) -> Result<(), EditorError> {
        if self.video.files.is_empty() {
            return Err(EditorError::NoVideo);
        }
        info!("Player attached ({:.1}s)", player.duration());
        self.playback = Some(PlaybackCoordinator::new(player));
        Ok(())
    }

    /// Replace the video source. The current player is discarded.
    pub fn set_video(&mut self, files: Vec<VideoFile>) {
        if let Some(playback) = self.playback.as_mut() {
            self.dialog.abort(playback);
        }
        self.playback = None;
        self.pressed = None;
        self.new_element = None;
        info!("Video source replaced ({} file(s))", files.len());
        self.video.files = files;
    }

    pub fn playback(&self) -> Option<&PlaybackCoordinator> {
        self.playback.as_ref()
    }

    pub fn playback_mut(&mut self) -> Result<&mut PlaybackCoordinator, EditorError> {
        self.playback.as_mut().ok_or(EditorError::NoVideo)
    }

    /// Player area resized.
    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        self.geometry
            .set_canvas(Canvas::new(width, height, self.settings.font_size_px));
    }

    pub fn store(&self) -> &TimelineStore {
        &self.store
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    fn notice(&self, message: &str) {
        self.emitter.emit(NoticeEvent {
            message: message.to_string(),
            ttl_ms: self.settings.notice_ttl_ms,
        });
    }

    // === Element types ===

    /// Load toolbar buttons. Falls back to none (with a notice) if the catalog stays unavailable.
    pub fn load_catalog(&mut self, source: &mut dyn CatalogSource) -> Option<CatalogError> {
        let load = load_catalog(source, self.settings.catalog_attempts);
        if load.error.is_some() {
            self.notice(texts::CATALOG_UNAVAILABLE);
        }
        self.buttons = load.buttons;
        load.error
    }

    pub fn buttons(&self) -> &[ElementType] {
        &self.buttons
    }

    /// Drop a new element of `button_id` at the playhead. The pointer is
    /// considered pressed until [`Editor::release`].
    pub fn create_interaction(&mut self, button_id: &str) -> Result<InteractionId, EditorError> {
        let button = self
            .buttons
            .iter()
            .find(|b| b.id == button_id)
            .cloned()
            .ok_or_else(|| EditorError::UnknownElementType(button_id.to_string()))?;
        let playback = self.playback.as_mut().ok_or(EditorError::NoVideo)?;
        playback.begin_gesture();

        let from = playback.current_time().floor();
        let window = TimeWindow::new(from, from + self.settings.default_interaction_secs)
            .clamped(playback.duration().floor());
        let mut interaction = Interaction::new(button.uber_name.clone(), window);
        if machine_name(&button.uber_name) == LIB_NIL {
            interaction.label = Some(DEFAULT_NIL_LABEL.to_string());
        }

        let id = self.store.add_interaction(interaction);
        self.emitter.emit(OverlayVisibilityEvent(true));
        self.pressed = Some(id);
        self.new_element = Some(id);
        info!("Created {} at {:.0}s ({})", button.id, from, id);
        Ok(id)
    }

    // === Pointer gestures ===

    /// Pointer down on an element.
    pub fn press(&mut self, id: InteractionId) -> Result<(), EditorError> {
        if self.store.interaction(id).is_none() {
            return Err(StoreError::UnknownInteraction(id).into());
        }
        let playback = self.playback.as_mut().ok_or(EditorError::NoVideo)?;
        self.emitter.emit(OverlayVisibilityEvent(true));
        playback.begin_gesture();
        self.pressed = Some(id);
        Ok(())
    }

    /// Pointer up. Resumes unless playback was halted at press.
    pub fn release(&mut self) -> Result<ReleaseOutcome, EditorError> {
        let playback = self.playback.as_mut().ok_or(EditorError::NoVideo)?;
        self.emitter.emit(OverlayVisibilityEvent(false));
        let resumed = playback.end_gesture();
        self.pressed = None;
        Ok(ReleaseOutcome {
            resumed,
            open_dialog: self.new_element.take(),
        })
    }

    pub fn pressed(&self) -> Option<InteractionId> {
        self.pressed
    }

    pub fn drag_end(&mut self, id: InteractionId, x: f64, y: f64) -> Result<Placement, EditorError> {
        Ok(self.geometry.on_drag_end(&mut self.store, id, x, y)?)
    }

    pub fn resize_end(&mut self, id: InteractionId, width: f64, height: f64) -> Result<Rect, EditorError> {
        self.emitter.emit(OverlayVisibilityEvent(false));
        Ok(self.geometry.on_resize_end(&mut self.store, id, width, height)?)
    }

    // === Edit dialog ===

    /// Content type picked for `id`: its form fields arrive later through `fields`.
    pub fn attach_library_fields(
        &mut self,
        id: InteractionId,
        fields: Readiness<LibraryFields>,
    ) -> Result<(), EditorError> {
        if self.store.interaction(id).is_none() {
            return Err(StoreError::UnknownInteraction(id).into());
        }
        self.policy.attach_fields(id, fields);
        Ok(())
    }

    /// Block (bounded by settings) until the content fields of `id` exist.
    pub fn wait_for_library_fields(&mut self, id: InteractionId) -> Result<(), EditorError> {
        Ok(self.policy.wait_for_fields(id, self.settings.readiness_timeout())?)
    }

    /// Open the edit dialog. The time window check always runs; `validators`
    /// are the form's own fields.
    pub fn open_dialog(
        &mut self,
        id: InteractionId,
        validators: Vec<Box<dyn FieldValidator>>,
    ) -> Result<(), EditorError> {
        let playback = self.playback.as_mut().ok_or(EditorError::NoVideo)?;
        let mut all: Vec<Box<dyn FieldValidator>> = vec![Box::new(TimeWindowValidator {
            duration: playback.duration(),
        })];
        all.extend(validators);
        self.dialog.open(&self.store, playback, id, all)?;

        let draft = self.dialog.draft_mut()?;
        match self.policy.on_dialog_open(draft, &self.store, id) {
            Ok(true) => {}
            Ok(false) => debug!("Content fields for {} not loaded yet", id),
            Err(e) => warn!("Content fields for {}: {}", id, e),
        }
        Ok(())
    }

    pub fn dialog(&self) -> &DialogController {
        &self.dialog
    }

    /// "Edit <type>" heading for the open dialog.
    pub fn dialog_title(&self) -> Option<String> {
        let library = &self.dialog.session()?.draft().action.library;
        let name = machine_name(library);
        let title = self
            .buttons
            .iter()
            .find(|b| machine_name(&b.uber_name) == name)
            .map(|b| b.title.clone())
            .unwrap_or_else(|| name.trim_start_matches("H5P.").to_lowercase());
        Some(texts::fill(texts::POPUP_TITLE, ":type", &title))
    }

    pub fn policy_view(&self) -> &PolicyView {
        self.policy.view()
    }

    /// Form fields to hide for the interaction being edited.
    pub fn dialog_hidden_fields(&self) -> Vec<&'static str> {
        self.dialog
            .session()
            .map(|s| catalog::hidden_fields(&s.draft().action.library))
            .unwrap_or_default()
    }

    fn session_id(&self) -> Result<InteractionId, EditorError> {
        self.dialog
            .session()
            .map(|s| s.interaction())
            .ok_or(EditorError::Dialog(DialogError::NoSession))
    }

    /// Direct access to the draft for fields without policy rules.
    pub fn draft_mut(&mut self) -> Result<&mut Interaction, EditorError> {
        Ok(self.dialog.draft_mut()?)
    }

    pub fn set_requires_completion(&mut self, required: bool) -> Result<PolicyView, EditorError> {
        let id = self.session_id()?;
        let draft = self.dialog.draft_mut()?;
        Ok(self.policy.toggle(draft, &self.store, id, required).clone())
    }

    /// Time window inputs changed. Returns conflicting interactions.
    pub fn set_time_window(&mut self, window: TimeWindow) -> Result<Vec<InteractionId>, EditorError> {
        let id = self.session_id()?;
        let draft = self.dialog.draft_mut()?;
        let start_changed = draft.time_window.from != window.from;
        draft.time_window = window;
        if start_changed {
            return Ok(self.policy.on_start_time_changed(draft, &self.store, id).to_vec());
        }
        Ok(self.policy.view().conflicts.clone())
    }

    /// Returns false if the control is locked.
    pub fn set_pause(&mut self, checked: bool) -> Result<bool, EditorError> {
        let draft = self.dialog.draft_mut()?;
        Ok(self.policy.set_pause(draft, checked))
    }

    /// Returns false if the control is locked or absent.
    pub fn set_retry(&mut self, checked: bool) -> Result<bool, EditorError> {
        let draft = self.dialog.draft_mut()?;
        Ok(self.policy.set_retry(draft, checked))
    }

    /// Image file chosen in the dialog: resize an image element to the picture.
    /// Other content types are left alone (`None`).
    pub fn image_selected(&mut self, width: f64, height: f64) -> Result<Option<Rect>, EditorError> {
        let id = self.session_id()?;
        let current = self.store.interaction(id).ok_or(StoreError::UnknownInteraction(id))?;
        if machine_name(&current.action.library) != LIB_IMAGE {
            debug!("Picture picked for non-image {}; size unchanged", id);
            return Ok(None);
        }
        let rect = self.geometry.fit_image(current.rect, width, height)?;
        self.store.set_rect(id, rect)?;
        Ok(Some(rect))
    }

    /// "Done".
    pub fn done(&mut self) -> Result<DoneOutcome, EditorError> {
        let playback = self.playback.as_mut().ok_or(EditorError::NoVideo)?;
        Ok(self.dialog.done(&mut self.store, playback)?)
    }

    /// "Remove". Without `confirmed` the host is asked to confirm and the
    /// dialog stays open.
    pub fn remove_interaction(&mut self, confirmed: bool) -> Result<Option<(usize, Interaction)>, EditorError> {
        let id = self.session_id()?;
        let playback = self.playback.as_mut().ok_or(EditorError::NoVideo)?;
        let removed = self.dialog.remove(&mut self.store, playback, confirmed)?;
        match removed {
            Some(_) => self.policy.forget(id),
            None => self.emitter.emit(RemoveConfirmationEvent {
                interaction: id,
                message: texts::REMOVE_INTERACTION.to_string(),
            }),
        }
        Ok(removed)
    }

    // === Bookmarks ===

    /// Bookmark at the playhead with the default label.
    ///
    /// A bucket collision shows a transient notice and leaves the store untouched.
    pub fn add_bookmark_at_playhead(&mut self) -> Result<BookmarkId, EditorError> {
        let playback = self.playback.as_ref().ok_or(EditorError::NoVideo)?;
        let time = playback.current_time();
        let label = self.settings.default_bookmark_label.clone();
        match self.store.add_bookmark(time, label) {
            Ok(id) => Ok(id),
            Err(e) => {
                if matches!(e, BookmarkError::Conflict { .. }) {
                    self.notice(texts::BOOKMARK_ALREADY_EXISTS);
                }
                warn!("Bookmark at {:.2}s rejected: {}", time, e);
                Err(e.into())
            }
        }
    }

    pub fn remove_bookmark(&mut self, id: BookmarkId) -> Result<usize, EditorError> {
        Ok(self.store.remove_bookmark(id)?.0)
    }

    /// Inline label edit. Blank labels reset to the default.
    pub fn rename_bookmark(&mut self, id: BookmarkId, label: &str) -> Result<usize, EditorError> {
        let label = self.settings.normalize_bookmark_label(label);
        Ok(self.store.rename_bookmark(id, label)?)
    }

    // === Document ===

    pub fn document(&self) -> InteractiveVideoParams {
        let mut doc = self.store.to_document();
        doc.extra = self.doc_extra.clone();
        doc
    }

    /// Whether `id` requires completion and starts together with another
    /// completion-required interaction.
    pub fn has_collision(&self, id: InteractionId) -> bool {
        conflicts::has_collision(&self.store, id)
    }

    pub fn check(&self) -> CheckReport {
        let duration = self.playback.as_ref().map(|p| p.duration());
        check_store(&self.store, duration, &self.load_report)
    }
}
