//! Word records
//!
//! Types shared by the feed poller, the chart reconciler and the demo source.

mod snapshot;
mod types;

pub use snapshot::Snapshot;
pub use types::{QueryResponse, QueryResult, Record, RecordId, Vowels};
