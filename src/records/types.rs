//! Record types decoded from the upstream collection
//!
//! - `RecordId`: opaque document id, wrapped as `{"$oid": "..."}` on the wire
//! - `Record`: one word document with its vowel statistics
//! - `QueryResponse`: the `{"result": {"data": [...]}}` envelope

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque document identifier
///
/// Serialized as a single-key wrapper object, the way document stores
/// expose object ids in extended JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId {
    #[serde(rename = "$oid")]
    oid: String,
}

impl RecordId {
    /// Wrap a raw id string
    pub fn new(oid: impl Into<String>) -> Self {
        Self { oid: oid.into() }
    }

    /// The raw id string
    pub fn as_str(&self) -> &str {
        &self.oid
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.oid)
    }
}

impl From<&str> for RecordId {
    fn from(oid: &str) -> Self {
        Self::new(oid)
    }
}

/// Vowel statistics attached to a word
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vowels {
    /// Share of characters that are vowels, in `[0, 1]`
    pub fraction: f64,
    /// Number of vowels (not always present upstream)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

/// A single word record
///
/// Identity is the `_id` field alone: two records with the same id are
/// equal even if the word or fraction differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub word: String,
    pub vowels: Vowels,
}

impl Record {
    /// Create a record with a known vowel fraction
    pub fn new(id: impl Into<RecordId>, word: impl Into<String>, fraction: f64) -> Self {
        Self {
            id: id.into(),
            word: word.into(),
            vowels: Vowels {
                fraction,
                count: None,
            },
        }
    }

    /// Vowel fraction used for vertical placement
    pub fn fraction(&self) -> f64 {
        self.vowels.fraction
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Record {}

/// Response envelope of the collection query endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub result: QueryResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub data: Vec<Record>,
}

impl QueryResponse {
    /// Wrap a list of records
    pub fn new(data: Vec<Record>) -> Self {
        Self {
            result: QueryResult { data },
        }
    }

    /// Unwrap into the record list, in response order
    pub fn into_records(self) -> Vec<Record> {
        self.result.data
    }
}
