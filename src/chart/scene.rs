//! Scene graph
//!
//! Retained marks keyed by record id. Each mark carries at most one running
//! horizontal transition; positions are evaluated against a caller-supplied
//! clock so the scene itself never reads the time.

use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::records::RecordId;

/// Cubic in-out easing on `[0, 1]`
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

/// A running interpolation of one attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: f64,
    pub to: f64,
    pub start: Instant,
    pub duration: Duration,
}

impl Transition {
    pub fn new(from: f64, to: f64, start: Instant, duration: Duration) -> Self {
        Self {
            from,
            to,
            start,
            duration,
        }
    }

    pub fn end(&self) -> Instant {
        self.start + self.duration
    }

    /// Linear progress in `[0, 1]`
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn value_at(&self, now: Instant) -> f64 {
        let t = ease_cubic_in_out(self.progress(now));
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now >= self.end()
    }

    /// Time left until the transition settles
    pub fn remaining(&self, now: Instant) -> Duration {
        self.end().saturating_duration_since(now)
    }
}

/// Lifecycle of a mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkState {
    /// Bound to a record in the current snapshot
    Active,
    /// Record vanished; removed once the exit transition settles
    Exiting,
}

/// One plotted circle
#[derive(Debug, Clone)]
pub struct Mark {
    pub id: RecordId,
    /// Tooltip text (the record's word)
    pub title: String,
    pub cy: f64,
    pub radius: f64,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    /// Last slot position assigned by an update, used to place the exit
    pub cached_x: f64,
    pub state: MarkState,
    /// Insertion order, used for paint order
    pub order: u64,
    cx: f64,
    transition: Option<Transition>,
}

impl Mark {
    /// Create a settled mark at `cx`
    pub fn new(id: RecordId, title: impl Into<String>, cx: f64, cy: f64) -> Self {
        Self {
            id,
            title: title.into(),
            cy,
            radius: 3.0,
            fill: "green".to_string(),
            stroke: "white".to_string(),
            stroke_width: 1.0,
            cached_x: cx,
            state: MarkState::Active,
            order: 0,
            cx,
            transition: None,
        }
    }

    /// Horizontal position at `now`
    pub fn cx_at(&self, now: Instant) -> f64 {
        match &self.transition {
            Some(t) => t.value_at(now),
            None => self.cx,
        }
    }

    /// Where the mark will settle
    pub fn target_x(&self) -> f64 {
        match &self.transition {
            Some(t) => t.to,
            None => self.cx,
        }
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    /// Start a transition of `cx` from the current position to `to`,
    /// interrupting any transition in flight. Returns the start position.
    pub fn animate_to(&mut self, to: f64, now: Instant, duration: Duration) -> f64 {
        let from = self.cx_at(now);
        self.cx = to;
        self.transition = Some(Transition::new(from, to, now, duration));
        from
    }

    /// Drop a transition that has settled
    pub fn settle(&mut self, now: Instant) {
        if self.transition.map_or(false, |t| t.is_finished(now)) {
            self.transition = None;
        }
    }

    pub fn is_exiting(&self) -> bool {
        self.state == MarkState::Exiting
    }

    /// An exiting mark whose transition has run out
    pub fn is_expired(&self, now: Instant) -> bool {
        self.is_exiting() && self.transition.map_or(true, |t| t.is_finished(now))
    }
}

/// All marks currently on the canvas, at most one per record id
#[derive(Debug, Default)]
pub struct Scene {
    marks: HashMap<RecordId, Mark>,
    next_order: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total marks, exiting ones included
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Marks bound to the current snapshot
    pub fn live_len(&self) -> usize {
        self.marks.values().filter(|m| !m.is_exiting()).count()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Mark> {
        self.marks.get(id)
    }

    pub fn get_mut(&mut self, id: &RecordId) -> Option<&mut Mark> {
        self.marks.get_mut(id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.marks.contains_key(id)
    }

    /// Insert a new mark; a mark already holding the id is replaced
    pub fn insert(&mut self, mut mark: Mark) {
        mark.order = self.next_order;
        self.next_order += 1;
        self.marks.insert(mark.id.clone(), mark);
    }

    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.marks.keys()
    }

    /// Marks in paint order
    pub fn marks(&self) -> Vec<&Mark> {
        let mut marks: Vec<&Mark> = self.marks.values().collect();
        marks.sort_by_key(|m| m.order);
        marks
    }

    /// Remove exiting marks whose transition has finished and settle the
    /// rest. Returns the removed ids.
    pub fn sweep(&mut self, now: Instant) -> Vec<RecordId> {
        let expired: Vec<RecordId> = self
            .marks
            .values()
            .filter(|m| m.is_expired(now))
            .map(|m| m.id.clone())
            .collect();

        for id in &expired {
            self.marks.remove(id);
        }
        for mark in self.marks.values_mut() {
            mark.settle(now);
        }

        expired
    }
}
