//! Document filters and sort specs
//!
//! Supports the subset of the document-store query language the chart
//! uses: `$and` over `$exists` clauses on dotted paths, and sort lists of
//! `[field, direction]` pairs.

use serde_json::Value;
use std::cmp::Ordering;

use super::SourceError;

/// Parsed query filter
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    And(Vec<Filter>),
    Exists { path: String, exists: bool },
}

impl Filter {
    /// Parse a filter document
    pub fn parse(value: &Value) -> Result<Self, SourceError> {
        let object = value
            .as_object()
            .ok_or_else(|| SourceError::InvalidFilter("filter must be an object".to_string()))?;

        let mut clauses = Vec::with_capacity(object.len());
        for (key, operand) in object {
            clauses.push(match key.as_str() {
                "$and" => {
                    let items = operand.as_array().ok_or_else(|| {
                        SourceError::InvalidFilter("$and expects an array".to_string())
                    })?;
                    Filter::And(items.iter().map(Filter::parse).collect::<Result<_, _>>()?)
                }
                op if op.starts_with('$') => {
                    return Err(SourceError::InvalidFilter(format!(
                        "unsupported operator {}",
                        op
                    )))
                }
                path => Self::parse_field(path, operand)?,
            });
        }

        Ok(match clauses.len() {
            0 => Filter::All,
            1 => clauses.remove(0),
            _ => Filter::And(clauses),
        })
    }

    fn parse_field(path: &str, operand: &Value) -> Result<Self, SourceError> {
        let exists = operand
            .as_object()
            .filter(|o| o.len() == 1)
            .and_then(|o| o.get("$exists"))
            .ok_or_else(|| {
                SourceError::InvalidFilter(format!("field {} supports only $exists", path))
            })?;

        let exists = match exists {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map_or(false, |v| v != 0.0),
            _ => {
                return Err(SourceError::InvalidFilter(format!(
                    "$exists on {} expects a boolean",
                    path
                )))
            }
        };

        Ok(Filter::Exists {
            path: path.to_string(),
            exists,
        })
    }

    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::And(clauses) => clauses.iter().all(|c| c.matches(doc)),
            Filter::Exists { path, exists } => lookup(doc, path).is_some() == *exists,
        }
    }
}

/// Resolve a dotted path inside a document
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |node, key| node.get(key))
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordered list of sort keys
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortSpec {
    pub keys: Vec<(String, Direction)>,
}

impl SortSpec {
    /// Parse `[["field", -1], ["other", 1]]`
    pub fn parse(value: &Value) -> Result<Self, SourceError> {
        let items = value
            .as_array()
            .ok_or_else(|| SourceError::InvalidSort("sort must be an array".to_string()))?;

        let keys = items
            .iter()
            .map(|item| {
                let pair = item.as_array().filter(|p| p.len() == 2).ok_or_else(|| {
                    SourceError::InvalidSort("sort keys are [field, direction] pairs".to_string())
                })?;
                let field = pair[0]
                    .as_str()
                    .ok_or_else(|| SourceError::InvalidSort("sort field must be a string".into()))?;
                let direction = match pair[1].as_i64() {
                    Some(1) => Direction::Ascending,
                    Some(-1) => Direction::Descending,
                    _ => {
                        return Err(SourceError::InvalidSort(
                            "sort direction must be 1 or -1".to_string(),
                        ))
                    }
                };
                Ok((field.to_string(), direction))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { keys })
    }

    /// Whether the leading key sorts newest first
    pub fn leads_descending(&self) -> bool {
        matches!(self.keys.first(), Some((_, Direction::Descending)))
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for (path, direction) in &self.keys {
            let ord = compare_values(lookup(a, path), lookup(b, path));
            let ord = match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Missing sorts before present; numbers, strings and `{"$date": ms}` compare
/// naturally, anything else is equal
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (sort_key(a), sort_key(b)) {
            (Some(SortKey::Number(x)), Some(SortKey::Number(y))) => {
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Some(SortKey::Text(x)), Some(SortKey::Text(y))) => x.cmp(y),
            _ => Ordering::Equal,
        },
    }
}

enum SortKey<'a> {
    Number(f64),
    Text(&'a str),
}

fn sort_key(value: &Value) -> Option<SortKey<'_>> {
    match value {
        Value::Number(n) => n.as_f64().map(SortKey::Number),
        Value::String(s) => Some(SortKey::Text(s)),
        Value::Object(o) => o.get("$date").and_then(sort_key),
        _ => None,
    }
}
