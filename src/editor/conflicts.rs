//! ConflictDetector: start-time collisions between completion-required interactions.
//!
//! Two completion-required interactions starting at exactly the same `from`
//! would both demand to be finished at the same instant. That is advisory only:
//! it is reported, never blocks saving.
//!
//! Plain O(n) scans over the store; no index is maintained. Bookmark bucket
//! collisions are checked by the store itself on insert.

use crate::entities::InteractionId;

use super::store::TimelineStore;

/// Completion-required interactions other than `exclude` whose `from` equals `from`.
pub fn conflicting_at(
    store: &TimelineStore,
    from: f64,
    exclude: Option<InteractionId>,
) -> Vec<InteractionId> {
    store
        .interactions()
        .filter(|(_, ia)| ia.time_window.from == from)
        .filter(|(_, ia)| ia.requires_completion())
        .filter(|(id, _)| Some(*id) != exclude)
        .map(|(id, _)| id)
        .collect()
}

/// Interactions colliding with `id`. Empty unless `id` itself requires completion.
pub fn conflicts_for(store: &TimelineStore, id: InteractionId) -> Vec<InteractionId> {
    match store.interaction(id) {
        Some(ia) if ia.requires_completion() => conflicting_at(store, ia.time_window.from, Some(id)),
        _ => Vec::new(),
    }
}

/// True if `id` requires completion and shares its start time with another
/// completion-required interaction.
pub fn has_collision(store: &TimelineStore, id: InteractionId) -> bool {
    !conflicts_for(store, id).is_empty()
}

/// Every interaction currently in a start-time conflict, in store order.
pub fn all_conflicts(store: &TimelineStore) -> Vec<(InteractionId, Vec<InteractionId>)> {
    store
        .interactions()
        .map(|(id, _)| (id, conflicts_for(store, id)))
        .filter(|(_, others)| !others.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Interaction, TimeWindow};

    fn required(store: &mut TimelineStore, from: f64) -> InteractionId {
        let mut ia = Interaction::new("H5P.MultiChoice 1.16", TimeWindow::new(from, from + 10.0));
        ia.set_requires_completion(true);
        store.add_interaction(ia)
    }

    #[test]
    fn test_equal_start_collides_both_ways() {
        let mut store = TimelineStore::new();
        let a = required(&mut store, 12.0);
        let b = required(&mut store, 12.0);
        assert!(has_collision(&store, a));
        assert!(has_collision(&store, b));

        store
            .modify_interaction(b, |ia| ia.time_window.from = 20.0)
            .unwrap();
        assert!(!has_collision(&store, a));
        assert!(!has_collision(&store, b));
    }

    #[test]
    fn test_optional_interactions_never_collide() {
        let mut store = TimelineStore::new();
        let a = required(&mut store, 5.0);
        let b = store.add_interaction(Interaction::new("H5P.Text 1.1", TimeWindow::new(5.0, 9.0)));
        assert!(!has_collision(&store, a));
        assert!(!has_collision(&store, b));
        // b does not require completion, so it is not flagged even though a starts with it
        assert_eq!(conflicting_at(&store, 5.0, None), vec![a]);
    }

    #[test]
    fn test_exact_equality_not_bucketed() {
        let mut store = TimelineStore::new();
        let a = required(&mut store, 12.0);
        required(&mut store, 12.01);
        assert!(!has_collision(&store, a));
    }

    #[test]
    fn test_all_conflicts_lists_each_member() {
        let mut store = TimelineStore::new();
        let a = required(&mut store, 3.0);
        required(&mut store, 7.0);
        let c = required(&mut store, 3.0);
        let all = all_conflicts(&store);
        assert_eq!(all, vec![(a, vec![c]), (c, vec![a])]);
    }
}
