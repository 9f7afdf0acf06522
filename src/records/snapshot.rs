//! Held record set
//!
//! A `Snapshot` is the immutable result of one refresh cycle: the records in
//! plotting order plus the number of identifiers that were new in that cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::types::{Record, RecordId};

/// Immutable record set produced by a refresh
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Refresh cycle that produced this snapshot (0 = initial empty set)
    pub cycle: u64,
    /// Identifiers not held by the previous snapshot
    pub added: usize,
    /// Records in plotting order (left to right)
    pub records: Arc<[Record]>,
    /// When the snapshot was taken, `None` for the initial empty set
    pub taken_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// The empty set held at startup
    pub fn empty() -> Self {
        Self {
            cycle: 0,
            added: 0,
            records: Arc::from(Vec::new()),
            taken_at: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Identifiers held by this snapshot
    pub fn ids(&self) -> HashSet<&RecordId> {
        self.records.iter().map(|r| &r.id).collect()
    }

    /// Position of a record in plotting order
    pub fn index_of(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|r| &r.id == id)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
