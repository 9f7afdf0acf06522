//! Keyed reconciliation
//!
//! Synchronizes a `Scene` with a `Snapshot` by record id:
//! - enter: ids without a mark get one, placed `added` slots to the right
//! - update: every id in the snapshot (entered ones too) slides to its slot
//! - exit: marks whose id vanished slide left by `added` slots, then get swept
//!
//! An exiting mark whose id comes back before it is swept is revived as an
//! update.

use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;

use super::layout::Layout;
use super::scene::{Mark, MarkState, Scene};
use crate::records::{RecordId, Snapshot};

/// Position change of one mark
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkMove {
    pub id: RecordId,
    pub from_x: f64,
    pub to_x: f64,
}

/// Newly created mark
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkEntry {
    pub id: RecordId,
    pub word: String,
    pub index: usize,
    pub from_x: f64,
    pub to_x: f64,
    pub cy: f64,
    pub fill: String,
}

/// Outcome of one reconciliation
#[derive(Debug, Clone, Default, Serialize)]
pub struct Patch {
    pub cycle: u64,
    pub added: usize,
    pub entered: Vec<MarkEntry>,
    /// Marks that existed before this cycle, in plotting order
    pub updated: Vec<MarkMove>,
    pub exited: Vec<MarkMove>,
}

impl Patch {
    /// No marks were created or scheduled for removal
    pub fn is_quiet(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

/// Apply `snapshot` to `scene`, starting all transitions at `now`
pub fn reconcile(scene: &mut Scene, snapshot: &Snapshot, layout: &Layout, now: Instant) -> Patch {
    let mut patch = Patch {
        cycle: snapshot.cycle,
        added: snapshot.added,
        ..Patch::default()
    };
    let offset = snapshot.added as f64;
    let mut bound: HashSet<&RecordId> = HashSet::with_capacity(snapshot.len());

    for (index, record) in snapshot.records.iter().enumerate() {
        if !bound.insert(&record.id) {
            // Duplicate id in one response: the first occurrence keeps the mark
            tracing::debug!(id = %record.id, index, "Duplicate record id ignored");
            continue;
        }

        let to_x = layout.x_at(index as f64);

        match scene.get_mut(&record.id) {
            // Title, height and fill are fixed at enter; updates only move
            Some(mark) => {
                mark.state = MarkState::Active;
                mark.cached_x = to_x;
                let from_x = mark.animate_to(to_x, now, layout.transition);
                patch.updated.push(MarkMove {
                    id: record.id.clone(),
                    from_x,
                    to_x,
                });
            }
            None => {
                let cy = layout.cy(record.fraction());
                let fill = layout.fill_for(record.fraction());
                let from_x = layout.x_at(index as f64 + offset);
                let mut mark = Mark::new(record.id.clone(), record.word.clone(), from_x, cy);
                mark.radius = layout.radius;
                mark.fill = fill.clone();
                mark.stroke = layout.stroke.clone();
                mark.stroke_width = layout.stroke_width;
                mark.cached_x = to_x;
                mark.animate_to(to_x, now, layout.transition);
                scene.insert(mark);

                patch.entered.push(MarkEntry {
                    id: record.id.clone(),
                    word: record.word.clone(),
                    index,
                    from_x,
                    to_x,
                    cy,
                    fill,
                });
            }
        }
    }

    let shift = layout.x_at(offset);
    let mut vanished: Vec<RecordId> = scene
        .ids()
        .filter(|id| !bound.contains(id))
        .cloned()
        .collect();
    vanished.sort();

    for id in vanished {
        if let Some(mark) = scene.get_mut(&id) {
            mark.state = MarkState::Exiting;
            let to_x = mark.cached_x - shift;
            let from_x = mark.animate_to(to_x, now, layout.transition);
            patch.exited.push(MarkMove { id, from_x, to_x });
        }
    }

    tracing::debug!(
        cycle = patch.cycle,
        added = patch.added,
        entered = patch.entered.len(),
        updated = patch.updated.len(),
        exited = patch.exited.len(),
        "Scene reconciled"
    );

    patch
}
