//! Normalized search results, as produced by an external search backend.
//!
//! The evaluator never runs queries itself. A backend connector (out of
//! scope here) executes each query and hands over a [`QueryResult`] per
//! query: the ranked document ids with their scores and, optionally, field
//! snapshots and highlight fragments for later inspection.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// One retrieved document within a query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    /// Document identifier.
    pub doc_id: String,
    /// Ranking score from the backend. Opaque ordering metadata; the
    /// evaluator never recomputes or interprets it.
    pub score: f64,
    /// Field snapshots for this document (e.g. title, text), if the
    /// backend returned them.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    /// Highlight fragments per field, if the backend returned them.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub highlights: BTreeMap<String, Vec<String>>,
}

impl Hit {
    /// Create a hit with just an id and score.
    pub fn new(doc_id: impl Into<String>, score: f64) -> Self {
        Self {
            doc_id: doc_id.into(),
            score,
            fields: BTreeMap::new(),
            highlights: BTreeMap::new(),
        }
    }
}

/// The ranked results one approach returned for a single query.
///
/// Hit order is the backend's ranking order. It is preserved for display
/// and for top-k truncation, but precision/recall are computed over the
/// retrieved *set*.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Query identifier.
    pub query_id: String,
    /// Retrieved documents in ranking order.
    pub hits: Vec<Hit>,
}

impl QueryResult {
    /// Create a query result from hits.
    pub fn new(query_id: impl Into<String>, hits: Vec<Hit>) -> Self {
        Self {
            query_id: query_id.into(),
            hits,
        }
    }

    /// Check structural invariants: a non-empty query id and no duplicate
    /// document ids within the result.
    pub fn validate(&self) -> Result<()> {
        if self.query_id.is_empty() {
            return Err(EvalError::invalid_input("<unnamed>", "empty query_id"));
        }

        let mut seen = BTreeSet::new();
        for hit in &self.hits {
            if !seen.insert(hit.doc_id.as_str()) {
                return Err(EvalError::invalid_input(
                    &self.query_id,
                    format!("duplicate doc id '{}'", hit.doc_id),
                ));
            }
        }
        Ok(())
    }

    /// Find a hit by document id.
    pub fn hit(&self, doc_id: &str) -> Option<&Hit> {
        self.hits.iter().find(|h| h.doc_id == doc_id)
    }
}

/// A full evaluation run for one approach: its name and one result per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    /// Name of the approach (e.g. "bm25-baseline", "hybrid-rerank").
    pub approach: String,
    /// Per-query results, in the order the backend produced them.
    pub results: Vec<QueryResult>,
}

impl ResultSet {
    /// Create a result set for a named approach.
    pub fn new(approach: impl Into<String>) -> Self {
        Self {
            approach: approach.into(),
            results: Vec::new(),
        }
    }

    /// Add one query's results.
    pub fn push(&mut self, result: QueryResult) {
        self.results.push(result);
    }

    /// Number of queries in this run.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if the run has no queries.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Load a result set from a JSON file.
    ///
    /// Expected format:
    /// ```json
    /// {
    ///   "approach": "bm25-baseline",
    ///   "results": [
    ///     {
    ///       "query_id": "q1",
    ///       "hits": [
    ///         {"doc_id": "d1", "score": 12.3, "fields": {"title": "..."}}
    ///       ]
    ///     }
    ///   ]
    /// }
    /// ```
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        let set: ResultSet = serde_json::from_str(&content)?;
        Ok(set)
    }

    /// Save the result set to a JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| EvalError::io(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn result_with(query_id: &str, doc_ids: &[&str]) -> QueryResult {
        let hits = doc_ids
            .iter()
            .enumerate()
            .map(|(i, id)| Hit::new(*id, 10.0 - i as f64))
            .collect();
        QueryResult::new(query_id, hits)
    }

    #[test]
    fn test_validate_ok() {
        let result = result_with("q1", &["d1", "d2", "d3"]);
        assert!(result.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_doc_ids() {
        let result = result_with("q1", &["d1", "d2", "d1"]);
        let err = result.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate doc id 'd1'"));
    }

    #[test]
    fn test_validate_rejects_empty_query_id() {
        let result = result_with("", &["d1"]);
        assert!(result.validate().is_err());
    }

    #[test]
    fn test_hit_lookup() {
        let result = result_with("q1", &["d1", "d2"]);
        assert!(result.hit("d2").is_some());
        assert!(result.hit("d9").is_none());
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");

        let mut set = ResultSet::new("bm25-baseline");
        let mut hit = Hit::new("d1", 12.3);
        hit.fields
            .insert("title".to_string(), "Rust ownership".to_string());
        hit.highlights.insert(
            "title".to_string(),
            vec!["<em>Rust</em> ownership".to_string()],
        );
        set.push(QueryResult::new("q1", vec![hit]));
        set.save_json(&path).unwrap();

        let loaded = ResultSet::load_json(&path).unwrap();
        assert_eq!(loaded.approach, "bm25-baseline");
        assert_eq!(loaded.len(), 1);
        let hit = loaded.results[0].hit("d1").unwrap();
        assert_eq!(hit.fields.get("title").unwrap(), "Rust ownership");
        assert_eq!(hit.highlights.get("title").unwrap().len(), 1);
    }
}
