//! In-memory document store
//!
//! Holds timestamped word documents, newest last, capped at a fixed number
//! of documents (oldest evicted first).

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::VecDeque;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::filter::{Filter, SortSpec};
use super::vowels::vowel_stats;
use crate::records::{RecordId, Vowels};

/// One stored word document
#[derive(Debug, Clone)]
pub struct Document {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub word: String,
    /// Absent for words without characters
    pub vowels: Option<Vowels>,
}

impl Document {
    pub fn new(word: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let word = word.into();
        Self {
            id: new_object_id(timestamp),
            vowels: vowel_stats(&word),
            timestamp,
            word,
        }
    }

    /// Extended-JSON rendering as served to clients
    pub fn to_json(&self) -> Value {
        let mut doc = json!({
            "_id": self.id,
            "timestamp": { "$date": self.timestamp.timestamp_millis() },
            "word": self.word,
        });
        if let (Some(vowels), Some(object)) = (&self.vowels, doc.as_object_mut()) {
            object.insert(
                "vowels".to_string(),
                json!({ "count": vowels.count, "fraction": vowels.fraction }),
            );
        }
        doc
    }
}

/// 24 hex digits: seconds since the epoch followed by random bits
fn new_object_id(timestamp: DateTime<Utc>) -> RecordId {
    let random = Uuid::new_v4().simple().to_string();
    RecordId::new(format!(
        "{:08x}{}",
        timestamp.timestamp().max(0) as u32,
        &random[..16]
    ))
}

pub struct DocumentStore {
    documents: RwLock<VecDeque<Document>>,
    capacity: usize,
}

impl DocumentStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            documents: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Store a word stamped with the current time
    pub async fn insert_word(&self, word: &str) -> Document {
        let doc = Document::new(word, Utc::now());
        self.insert(doc.clone()).await;
        doc
    }

    pub async fn insert(&self, doc: Document) {
        let mut documents = self.documents.write().await;
        documents.push_back(doc);
        while documents.len() > self.capacity {
            documents.pop_front();
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Matching documents, sorted, truncated to `limit` (0 = unlimited)
    ///
    /// Documents tied on every sort key keep insertion order, newest first
    /// when the leading key is descending.
    pub async fn query(&self, filter: &Filter, sort: &SortSpec, limit: usize) -> Vec<Value> {
        let documents = self.documents.read().await;

        let mut matched: Vec<Value> = documents
            .iter()
            .map(Document::to_json)
            .filter(|doc| filter.matches(doc))
            .collect();
        if sort.leads_descending() {
            matched.reverse();
        }
        matched.sort_by(|a, b| sort.compare(a, b));

        if limit > 0 {
            matched.truncate(limit);
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn chart_filter() -> Filter {
        Filter::parse(&json!({"$and": [
            {"word": {"$exists": true}},
            {"vowels.fraction": {"$exists": true}}
        ]}))
        .unwrap()
    }

    fn newest_first() -> SortSpec {
        SortSpec::parse(&json!([["timestamp", -1]])).unwrap()
    }

    #[test]
    fn test_document_json_shape() {
        let ts = Utc.timestamp_millis_opt(1_511_000_000_000).unwrap();
        let doc = Document::new("aeon", ts);
        let value = doc.to_json();

        assert_eq!(value["word"], "aeon");
        assert_eq!(value["timestamp"]["$date"], 1_511_000_000_000i64);
        assert_eq!(value["vowels"]["count"], 3);
        assert_eq!(value["vowels"]["fraction"], 0.75);
        let oid = value["_id"]["$oid"].as_str().unwrap();
        assert_eq!(oid.len(), 24);
        assert!(oid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_empty_word_has_no_vowels() {
        let doc = Document::new("", Utc::now());
        assert!(doc.to_json().get("vowels").is_none());
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let store = DocumentStore::new(2);
        store.insert_word("one").await;
        store.insert_word("two").await;
        store.insert_word("three").await;

        assert_eq!(store.len().await, 2);
        let docs = store.query(&Filter::All, &newest_first(), 0).await;
        assert_eq!(docs[0]["word"], "three");
        assert_eq!(docs[1]["word"], "two");
    }

    #[tokio::test]
    async fn test_query_filters_and_limits() {
        let store = DocumentStore::new(100);
        store.insert_word("alpha").await;
        store.insert_word("").await;
        store.insert_word("beta").await;
        store.insert_word("gamma").await;

        let docs = store.query(&chart_filter(), &newest_first(), 2).await;
        let words: Vec<&str> = docs.iter().filter_map(|d| d["word"].as_str()).collect();
        assert_eq!(words, vec!["gamma", "beta"]);
    }

    #[tokio::test]
    async fn test_query_sorts_by_timestamp() {
        let store = DocumentStore::new(100);
        let base = Utc.timestamp_millis_opt(1_000_000).unwrap();
        store.insert(Document::new("late", base + chrono::Duration::seconds(10))).await;
        store.insert(Document::new("early", base)).await;

        let docs = store.query(&Filter::All, &newest_first(), 0).await;
        assert_eq!(docs[0]["word"], "late");

        let ascending = SortSpec::parse(&json!([["timestamp", 1]])).unwrap();
        let docs = store.query(&Filter::All, &ascending, 0).await;
        assert_eq!(docs[0]["word"], "early");
    }
}
