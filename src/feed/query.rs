//! Collection query
//!
//! The fixed query the chart issues: every configured field must exist,
//! newest first by the sort field, capped at `limit` documents.

use serde_json::{json, Map, Value};

use crate::config::UpstreamConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    pub collection_path: String,
    pub required_fields: Vec<String>,
    pub limit: usize,
    pub sort_field: String,
}

impl RecordQuery {
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self {
            collection_path: config.collection_path.clone(),
            required_fields: config.required_fields.clone(),
            limit: config.limit,
            sort_field: config.sort_field.clone(),
        }
    }

    /// `{"$and": [{"<field>": {"$exists": true}}, ...]}`
    pub fn filter(&self) -> Value {
        let clauses: Vec<Value> = self
            .required_fields
            .iter()
            .map(|field| {
                let mut clause = Map::new();
                clause.insert(field.clone(), json!({ "$exists": true }));
                Value::Object(clause)
            })
            .collect();
        json!({ "$and": clauses })
    }

    /// `[["<field>", -1]]`
    pub fn sort(&self) -> Value {
        json!([[self.sort_field.as_str(), -1]])
    }

    /// Path plus percent-encoded query string
    pub fn path_and_query(&self) -> String {
        format!(
            "{}?query={}&limit={}&sort={}",
            self.collection_path,
            urlencoding::encode(&self.filter().to_string()),
            self.limit,
            urlencoding::encode(&self.sort().to_string()),
        )
    }

    /// Full request URL against `base_url`
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path_and_query())
    }
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self::from_config(&UpstreamConfig::default())
    }
}
