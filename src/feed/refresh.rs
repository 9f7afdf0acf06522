//! Refresh step
//!
//! Turns a fetched response into the next held snapshot.

use chrono::Utc;
use std::sync::Arc;

use crate::records::{Record, Snapshot};

/// Build the snapshot that follows `previous`
///
/// `added` counts records whose id `previous` did not hold, wherever they
/// appear in the response. The response arrives newest first and is held
/// reversed, so the newest record is plotted rightmost.
pub fn refresh(previous: &Snapshot, response: Vec<Record>) -> Snapshot {
    let held = previous.ids();
    let added = response.iter().filter(|r| !held.contains(&r.id)).count();

    let mut records = response;
    records.reverse();

    Snapshot {
        cycle: previous.cycle + 1,
        added,
        records: Arc::from(records),
        taken_at: Some(Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(ids: &[&str]) -> Vec<Record> {
        ids.iter()
            .map(|id| Record::new(*id, format!("w{}", id), 0.4))
            .collect()
    }

    fn plotted(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_first_refresh_counts_everything() {
        let next = refresh(&Snapshot::empty(), records(&["c", "b", "a"]));
        assert_eq!(next.added, 3);
        assert_eq!(next.cycle, 1);
        assert!(next.taken_at.is_some());
    }

    #[test]
    fn test_added_counts_novel_ids_anywhere() {
        let first = refresh(&Snapshot::empty(), records(&["c", "b", "a"]));

        // Two new ids, one at the head and one in the middle
        let next = refresh(&first, records(&["x", "c", "y", "b"]));
        assert_eq!(next.added, 2);

        // Order of the response does not matter
        let shuffled = refresh(&first, records(&["b", "y", "c", "x"]));
        assert_eq!(shuffled.added, 2);
    }

    #[test]
    fn test_identical_response_adds_nothing() {
        let first = refresh(&Snapshot::empty(), records(&["b", "a"]));
        let second = refresh(&first, records(&["b", "a"]));
        assert_eq!(second.added, 0);
        assert_eq!(plotted(&first), plotted(&second));
        assert_eq!(second.cycle, 2);
    }

    #[test]
    fn test_plotting_order_is_reversed_response() {
        let next = refresh(&Snapshot::empty(), records(&["newest", "middle", "oldest"]));
        assert_eq!(plotted(&next), vec!["oldest", "middle", "newest"]);
    }

    #[test]
    fn test_empty_response() {
        let first = refresh(&Snapshot::empty(), records(&["a"]));
        let next = refresh(&first, Vec::new());
        assert!(next.is_empty());
        assert_eq!(next.added, 0);
    }

    #[test]
    fn test_previous_snapshot_untouched() {
        let first = refresh(&Snapshot::empty(), records(&["b", "a"]));
        let _ = refresh(&first, records(&["z"]));
        assert_eq!(plotted(&first), vec!["a", "b"]);
    }
}
