//! TimelineStore: ordered interactions and bookmarks with stable handles.
//!
//! Both collections are `IndexMap`s keyed by opaque ids, so insertion order is
//! the document order and a record's position is derived on demand
//! (`*_position`). Removing an item shifts everything after it down by one;
//! handles held by callers stay valid.
//!
//! Invariants:
//! - Bookmarks are sorted by `time` (ordered insertion, never sort-after-append).
//! - No two bookmarks share a [`TimeBucket`].
//!
//! Structural changes are announced on the event bus with `(index, delta)`.

use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::core::event_bus::EditorEventEmitter;
use crate::entities::{
    Bookmark, BookmarkId, Interaction, InteractionId, InteractiveVideoParams, Rect, TimeBucket,
};

use super::editor_events::{BookmarkLabelChangedEvent, BookmarksChangedEvent, InteractionsChangedEvent};

/// Lookup failures
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    UnknownInteraction(InteractionId),
    UnknownBookmark(BookmarkId),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::UnknownInteraction(id) => write!(f, "Unknown interaction {}", id),
            StoreError::UnknownBookmark(id) => write!(f, "Unknown bookmark {}", id),
        }
    }
}

impl std::error::Error for StoreError {}

/// Rejected bookmark insertions. The store is unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum BookmarkError {
    /// Another bookmark already occupies the 0.1 s bucket
    Conflict {
        bucket: TimeBucket,
        existing_index: usize,
    },
    /// Time is negative or not finite
    InvalidTime(f64),
}

impl std::fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookmarkError::Conflict {
                bucket,
                existing_index,
            } => write!(
                f,
                "Bookmark #{} already exists at {}",
                existing_index, bucket
            ),
            BookmarkError::InvalidTime(t) => write!(f, "Invalid bookmark time {}", t),
        }
    }
}

impl std::error::Error for BookmarkError {}

/// Records skipped while loading a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub dropped_bookmarks: Vec<(Bookmark, BookmarkError)>,
}

#[derive(Debug, Default)]
pub struct TimelineStore {
    interactions: IndexMap<InteractionId, Interaction>,
    bookmarks: IndexMap<BookmarkId, Bookmark>,
    emitter: EditorEventEmitter,
}

impl TimelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_emitter(&mut self, emitter: EditorEventEmitter) {
        self.emitter = emitter;
    }

    /// Build a store from a document, re-applying bookmark ordering and
    /// bucket uniqueness. Colliding bookmarks are dropped and reported.
    pub fn from_document(doc: InteractiveVideoParams) -> (Self, LoadReport) {
        let mut store = Self::new();
        let mut report = LoadReport::default();

        for interaction in doc.interactions {
            store.add_interaction(interaction);
        }
        for bookmark in doc.bookmarks {
            if let Err(e) = store.add_bookmark(bookmark.time, bookmark.label.clone()) {
                warn!("Dropping bookmark '{}' on load: {}", bookmark.label, e);
                report.dropped_bookmarks.push((bookmark, e));
            }
        }
        debug!(
            "Loaded {} interactions, {} bookmarks ({} dropped)",
            store.interaction_count(),
            store.bookmark_count(),
            report.dropped_bookmarks.len()
        );
        (store, report)
    }

    /// Snapshot in document order.
    pub fn to_document(&self) -> InteractiveVideoParams {
        InteractiveVideoParams {
            interactions: self.interactions.values().cloned().collect(),
            bookmarks: self.bookmarks.values().cloned().collect(),
            ..Default::default()
        }
    }

    // === Interactions ===

    /// Append an interaction. The returned id stays valid across removals.
    pub fn add_interaction(&mut self, interaction: Interaction) -> InteractionId {
        let id = InteractionId::new();
        trace!("Adding interaction {} ({})", id, interaction.action.library);
        self.interactions.insert(id, interaction);
        let index = self.interactions.len() - 1;
        self.emitter.emit(InteractionsChangedEvent {
            interaction: id,
            index,
            delta: 1,
        });
        id
    }

    /// Remove and compact. Everything after the returned index moves down one.
    pub fn remove_interaction(&mut self, id: InteractionId) -> Result<(usize, Interaction), StoreError> {
        let (index, _, interaction) = self
            .interactions
            .shift_remove_full(&id)
            .ok_or(StoreError::UnknownInteraction(id))?;
        debug!("Removed interaction {} at #{}", id, index);
        self.emitter.emit(InteractionsChangedEvent {
            interaction: id,
            index,
            delta: -1,
        });
        Ok((index, interaction))
    }

    pub fn interaction(&self, id: InteractionId) -> Option<&Interaction> {
        self.interactions.get(&id)
    }

    /// Mutate one interaction in place.
    pub fn modify_interaction<R>(
        &mut self,
        id: InteractionId,
        f: impl FnOnce(&mut Interaction) -> R,
    ) -> Result<R, StoreError> {
        self.interactions
            .get_mut(&id)
            .map(f)
            .ok_or(StoreError::UnknownInteraction(id))
    }

    /// Overwrite an interaction with an edited copy (dialog commit).
    pub fn replace_interaction(&mut self, id: InteractionId, interaction: Interaction) -> Result<(), StoreError> {
        self.modify_interaction(id, |slot| *slot = interaction)
    }

    pub fn set_rect(&mut self, id: InteractionId, rect: Rect) -> Result<(), StoreError> {
        self.modify_interaction(id, |ia| ia.rect = rect)
    }

    /// Current position of an interaction (derived, not cached).
    pub fn interaction_position(&self, id: InteractionId) -> Option<usize> {
        self.interactions.get_index_of(&id)
    }

    pub fn interaction_at(&self, index: usize) -> Option<(InteractionId, &Interaction)> {
        self.interactions.get_index(index).map(|(id, ia)| (*id, ia))
    }

    pub fn interactions(&self) -> impl Iterator<Item = (InteractionId, &Interaction)> {
        self.interactions.iter().map(|(id, ia)| (*id, ia))
    }

    pub fn interaction_count(&self) -> usize {
        self.interactions.len()
    }

    // === Bookmarks ===

    /// Index of the first bookmark whose time is strictly greater than `time`.
    pub fn bookmark_insert_position(&self, time: f64) -> usize {
        self.bookmarks
            .values()
            .position(|b| b.time > time)
            .unwrap_or(self.bookmarks.len())
    }

    /// Position of the bookmark occupying `bucket`, if any.
    pub fn bookmark_in_bucket(&self, bucket: TimeBucket) -> Option<usize> {
        self.bookmarks.values().position(|b| b.bucket() == bucket)
    }

    /// Insert a bookmark in time order. Rejected without mutation on a bucket collision.
    pub fn add_bookmark(&mut self, time: f64, label: impl Into<String>) -> Result<BookmarkId, BookmarkError> {
        if !time.is_finite() || time < 0.0 {
            return Err(BookmarkError::InvalidTime(time));
        }
        let bucket = TimeBucket::of(time);
        if let Some(existing_index) = self.bookmark_in_bucket(bucket) {
            return Err(BookmarkError::Conflict {
                bucket,
                existing_index,
            });
        }

        let index = self.bookmark_insert_position(time);
        let id = BookmarkId::new();
        self.bookmarks.shift_insert(index, id, Bookmark::new(time, label));
        trace!("Bookmark {} inserted at #{} ({:.2}s)", id, index, time);
        self.emitter.emit(BookmarksChangedEvent {
            bookmark: id,
            index,
            delta: 1,
        });
        Ok(id)
    }

    /// Remove a bookmark; later bookmarks shift down by one.
    pub fn remove_bookmark(&mut self, id: BookmarkId) -> Result<(usize, Bookmark), StoreError> {
        let (index, _, bookmark) = self
            .bookmarks
            .shift_remove_full(&id)
            .ok_or(StoreError::UnknownBookmark(id))?;
        debug!("Removed bookmark '{}' at #{}", bookmark.label, index);
        self.emitter.emit(BookmarksChangedEvent {
            bookmark: id,
            index,
            delta: -1,
        });
        Ok((index, bookmark))
    }

    /// Replace a bookmark's label. Returns its position.
    pub fn rename_bookmark(&mut self, id: BookmarkId, label: impl Into<String>) -> Result<usize, StoreError> {
        let (index, _, bookmark) = self
            .bookmarks
            .get_full_mut(&id)
            .ok_or(StoreError::UnknownBookmark(id))?;
        bookmark.label = label.into();
        self.emitter.emit(BookmarkLabelChangedEvent {
            index,
            label: bookmark.label.clone(),
        });
        Ok(index)
    }

    pub fn bookmark(&self, id: BookmarkId) -> Option<&Bookmark> {
        self.bookmarks.get(&id)
    }

    pub fn bookmark_position(&self, id: BookmarkId) -> Option<usize> {
        self.bookmarks.get_index_of(&id)
    }

    pub fn bookmark_at(&self, index: usize) -> Option<(BookmarkId, &Bookmark)> {
        self.bookmarks.get_index(index).map(|(id, b)| (*id, b))
    }

    pub fn bookmarks(&self) -> impl Iterator<Item = (BookmarkId, &Bookmark)> {
        self.bookmarks.iter().map(|(id, b)| (*id, b))
    }

    pub fn bookmark_count(&self) -> usize {
        self.bookmarks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::{events_of, EventBus};
    use crate::entities::TimeWindow;

    fn ia(from: f64) -> Interaction {
        Interaction::new("H5P.Text 1.1", TimeWindow::new(from, from + 10.0))
    }

    fn times(store: &TimelineStore) -> Vec<f64> {
        store.bookmarks().map(|(_, b)| b.time).collect()
    }

    #[test]
    fn test_ordered_bookmark_insert() {
        let mut store = TimelineStore::new();
        store.add_bookmark(5.0, "c").unwrap();
        store.add_bookmark(1.0, "a").unwrap();
        store.add_bookmark(3.0, "b").unwrap();
        assert_eq!(times(&store), vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_bucket_collision_rejected() {
        let mut store = TimelineStore::new();
        store.add_bookmark(12.51, "first").unwrap();
        store.add_bookmark(2.0, "early").unwrap();
        let before = store.to_document();

        let err = store.add_bookmark(12.58, "dupe").unwrap_err();
        assert_eq!(
            err,
            BookmarkError::Conflict {
                bucket: TimeBucket(125),
                existing_index: 1
            }
        );
        assert_eq!(store.to_document(), before);

        // Neighbouring bucket is fine
        store.add_bookmark(12.6, "next").unwrap();
        assert_eq!(store.bookmark_count(), 3);
    }

    #[test]
    fn test_invalid_bookmark_time() {
        let mut store = TimelineStore::new();
        assert!(matches!(store.add_bookmark(f64::NAN, "x"), Err(BookmarkError::InvalidTime(_))));
        assert!(matches!(store.add_bookmark(-1.0, "x"), Err(BookmarkError::InvalidTime(_))));
        assert_eq!(store.bookmark_count(), 0);
    }

    #[test]
    fn test_remove_interaction_compacts() {
        let mut store = TimelineStore::new();
        let ids: Vec<_> = (0..5).map(|i| store.add_interaction(ia(i as f64))).collect();

        let (index, removed) = store.remove_interaction(ids[1]).unwrap();
        assert_eq!(index, 1);
        assert_eq!(removed.time_window.from, 1.0);
        assert_eq!(store.interaction_count(), 4);

        assert_eq!(store.interaction_position(ids[0]), Some(0));
        for (old, id) in ids.iter().enumerate().skip(2) {
            assert_eq!(store.interaction_position(*id), Some(old - 1));
        }
        assert_eq!(store.interaction_position(ids[1]), None);
        assert_eq!(
            store.remove_interaction(ids[1]),
            Err(StoreError::UnknownInteraction(ids[1]))
        );
    }

    #[test]
    fn test_remove_bookmark_notifies_shift() {
        let bus = EventBus::new();
        let mut store = TimelineStore::new();
        store.set_emitter(EditorEventEmitter::from_emitter(bus.emitter()));

        store.add_bookmark(1.0, "a").unwrap();
        let b = store.add_bookmark(2.0, "b").unwrap();
        let c = store.add_bookmark(3.0, "c").unwrap();
        bus.poll();

        store.remove_bookmark(b).unwrap();
        assert_eq!(store.bookmark_position(c), Some(1));

        let shifts = events_of::<BookmarksChangedEvent>(&bus.poll());
        let shift = &shifts[0];
        assert_eq!(shift.index, 1);
        assert_eq!(shift.delta, -1);
    }

    #[test]
    fn test_rename_bookmark() {
        let mut store = TimelineStore::new();
        store.add_bookmark(1.0, "a").unwrap();
        let b = store.add_bookmark(4.0, "b").unwrap();
        assert_eq!(store.rename_bookmark(b, "Chapter 2"), Ok(1));
        assert_eq!(store.bookmark(b).map(|b| b.label.as_str()), Some("Chapter 2"));
    }

    #[test]
    fn test_from_document_drops_collisions() {
        let doc = InteractiveVideoParams {
            interactions: vec![ia(0.0), ia(4.0)],
            bookmarks: vec![
                Bookmark::new(9.0, "late"),
                Bookmark::new(1.0, "early"),
                Bookmark::new(1.05, "dupe"),
            ],
            ..Default::default()
        };
        let (store, report) = TimelineStore::from_document(doc);
        assert_eq!(store.interaction_count(), 2);
        assert_eq!(times(&store), vec![1.0, 9.0]);
        assert_eq!(report.dropped_bookmarks.len(), 1);
        assert_eq!(report.dropped_bookmarks[0].0.label, "dupe");
    }
}
