//! Chart view
//!
//! Owns the held snapshot, the scene and the layout. The poller is the only
//! writer; HTTP handlers read it to render.

use serde::Serialize;
use std::time::Instant;

use super::layout::Layout;
use super::reconcile::{reconcile, Patch};
use super::scene::{MarkState, Scene};
use super::svg::render_svg;
use crate::feed::refresh;
use crate::records::{Record, RecordId, Snapshot};

/// Serializable view of one mark at an instant
#[derive(Debug, Clone, Serialize)]
pub struct MarkView {
    pub id: RecordId,
    pub word: String,
    pub cx: f64,
    pub cy: f64,
    pub target_x: f64,
    pub fill: String,
    pub state: MarkState,
}

pub struct ChartView {
    layout: Layout,
    snapshot: Snapshot,
    scene: Scene,
}

impl ChartView {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            snapshot: Snapshot::empty(),
            scene: Scene::new(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Currently held record set
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Run one refresh cycle against a fetched response (in response order)
    pub fn apply(&mut self, response: Vec<Record>, now: Instant) -> Patch {
        let snapshot = refresh(&self.snapshot, response);
        self.apply_snapshot(snapshot, now)
    }

    /// Replace the held snapshot and reconcile the scene against it
    pub fn apply_snapshot(&mut self, snapshot: Snapshot, now: Instant) -> Patch {
        let removed = self.scene.sweep(now);
        if !removed.is_empty() {
            tracing::trace!(removed = removed.len(), "Swept exited marks");
        }

        let patch = reconcile(&mut self.scene, &snapshot, &self.layout, now);
        self.snapshot = snapshot;
        patch
    }

    /// Drop exited marks whose transition has finished
    pub fn sweep(&mut self, now: Instant) -> usize {
        self.scene.sweep(now).len()
    }

    pub fn render_svg(&self, now: Instant) -> String {
        render_svg(&self.scene, &self.layout, now)
    }

    /// Marks visible at `now`, in paint order
    pub fn marks_at(&self, now: Instant) -> Vec<MarkView> {
        self.scene
            .marks()
            .into_iter()
            .filter(|m| !m.is_expired(now))
            .map(|m| MarkView {
                id: m.id.clone(),
                word: m.title.clone(),
                cx: m.cx_at(now),
                cy: m.cy,
                target_x: m.target_x(),
                fill: m.fill.clone(),
                state: m.state,
            })
            .collect()
    }
}

impl Default for ChartView {
    fn default() -> Self {
        Self::new(Layout::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn records(ids: &[&str]) -> Vec<Record> {
        ids.iter().map(|id| Record::new(*id, *id, 0.25)).collect()
    }

    #[test]
    fn test_apply_reverses_response_order() {
        let mut view = ChartView::default();
        let now = Instant::now();

        // Newest first from upstream, plotted oldest first
        view.apply(records(&["c", "b", "a"]), now);

        let plotted: Vec<&str> = view
            .snapshot()
            .records
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(plotted, vec!["a", "b", "c"]);
        assert_eq!(view.snapshot().cycle, 1);
        assert_eq!(view.snapshot().added, 3);
    }

    #[test]
    fn test_mark_count_tracks_snapshot() {
        let mut view = ChartView::default();
        let t0 = Instant::now();
        view.apply(records(&["c", "b", "a"]), t0);

        let t1 = t0 + Duration::from_secs(5);
        let patch = view.apply(records(&["d", "c", "b"]), t1);
        assert_eq!(patch.added, 1);
        assert_eq!(view.scene().live_len(), view.snapshot().len());

        let t2 = t1 + Duration::from_secs(5);
        view.sweep(t2);
        assert_eq!(view.scene().len(), view.snapshot().len());
    }

    #[test]
    fn test_marks_at_hides_expired_exits() {
        let mut view = ChartView::default();
        let t0 = Instant::now();
        view.apply(records(&["a"]), t0);
        view.apply(Vec::new(), t0 + Duration::from_secs(5));

        let during = view.marks_at(t0 + Duration::from_millis(5500));
        assert_eq!(during.len(), 1);
        assert_eq!(during[0].state, MarkState::Exiting);

        let after = view.marks_at(t0 + Duration::from_secs(7));
        assert!(after.is_empty());
    }
}
