//! Document health report: what a save would carry that breaks an invariant.
//!
//! Nothing here blocks saving; start-time conflicts in particular are advisory.

use crate::entities::{Rect, TimeWindow};

use super::conflicts::all_conflicts;
use super::store::{LoadReport, TimelineStore};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    /// `(position, window)` for windows outside `[0, duration]` or reversed
    pub bad_windows: Vec<(usize, TimeWindow)>,
    /// `(position, rect)` for rects leaving the canvas
    pub off_canvas: Vec<(usize, Rect)>,
    /// `(position, conflicting positions)` for equal start times
    pub start_conflicts: Vec<(usize, Vec<usize>)>,
    /// Bookmarks dropped at load for sharing a time bucket
    pub dropped_bookmarks: usize,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.bad_windows.is_empty()
            && self.off_canvas.is_empty()
            && self.start_conflicts.is_empty()
            && self.dropped_bookmarks == 0
    }
}

impl std::fmt::Display for CheckReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_clean() {
            return writeln!(f, "OK");
        }
        for (i, w) in &self.bad_windows {
            writeln!(f, "interaction #{}: time window {:.2}-{:.2}s out of range", i, w.from, w.to)?;
        }
        for (i, r) in &self.off_canvas {
            writeln!(
                f,
                "interaction #{}: rect ({:.1}, {:.1}, {:.1}x{:.1}) leaves the canvas",
                i, r.x, r.y, r.width, r.height
            )?;
        }
        for (i, others) in &self.start_conflicts {
            writeln!(f, "interaction #{}: requires completion at the same start as {:?}", i, others)?;
        }
        if self.dropped_bookmarks > 0 {
            writeln!(f, "{} bookmark(s) dropped: same 0.1s bucket", self.dropped_bookmarks)?;
        }
        Ok(())
    }
}

/// Inspect the store. Windows are only range-checked when `duration` is known.
pub fn check_store(store: &TimelineStore, duration: Option<f64>, load: &LoadReport) -> CheckReport {
    let mut report = CheckReport {
        dropped_bookmarks: load.dropped_bookmarks.len(),
        ..Default::default()
    };

    for (index, (_, ia)) in store.interactions().enumerate() {
        let w = ia.time_window;
        let valid = match duration {
            Some(d) => w.is_valid(d),
            None => w.is_valid(f64::INFINITY),
        };
        if !valid {
            report.bad_windows.push((index, w));
        }
        if !ia.rect.is_inside_canvas() {
            report.off_canvas.push((index, ia.rect));
        }
    }

    for (id, others) in all_conflicts(store) {
        let Some(index) = store.interaction_position(id) else {
            continue;
        };
        let positions = others
            .iter()
            .filter_map(|o| store.interaction_position(*o))
            .collect();
        report.start_conflicts.push((index, positions));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Interaction;

    #[test]
    fn test_clean_store() {
        let mut store = TimelineStore::new();
        store.add_interaction(Interaction::new("H5P.Text 1.1", TimeWindow::new(0.0, 5.0)));
        let report = check_store(&store, Some(10.0), &LoadReport::default());
        assert!(report.is_clean());
        assert_eq!(report.to_string(), "OK\n");
    }

    #[test]
    fn test_reports_every_problem() {
        let mut store = TimelineStore::new();
        let mut a = Interaction::new("H5P.MultiChoice 1.16", TimeWindow::new(4.0, 30.0));
        a.set_requires_completion(true);
        a.rect = Rect::new(95.0, 0.0, 10.0, 10.0);
        store.add_interaction(a);
        let mut b = Interaction::new("H5P.Blanks 1.12", TimeWindow::new(4.0, 8.0));
        b.set_requires_completion(true);
        store.add_interaction(b);

        let report = check_store(&store, Some(20.0), &LoadReport::default());
        assert_eq!(report.bad_windows, vec![(0, TimeWindow::new(4.0, 30.0))]);
        assert_eq!(report.off_canvas.len(), 1);
        assert_eq!(report.start_conflicts, vec![(0, vec![1]), (1, vec![0])]);

        // Without a duration only ordering is checked
        let report = check_store(&store, None, &LoadReport::default());
        assert!(report.bad_windows.is_empty());
    }
}
