//! Relevance judgments: the ground truth of which documents answer which query.
//!
//! A [`JudgmentSet`] maps each query id to the set of document ids judged
//! relevant for it. A document not listed is implicitly non-relevant.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Judgments for a single query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryJudgment {
    /// Query identifier.
    pub query_id: String,
    /// Free-text query payload, opaque to the evaluator. Carried only so
    /// that reports and disjoint-set dumps can show the query next to its
    /// metrics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Document ids judged relevant for this query.
    pub relevant_doc_ids: BTreeSet<String>,
}

/// Ground-truth lookup: query id to set of relevant document ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JudgmentSet {
    judgments: BTreeMap<String, QueryJudgment>,
}

impl JudgmentSet {
    /// Create an empty judgment set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert judgments for one query, replacing any existing entry.
    pub fn insert(&mut self, judgment: QueryJudgment) {
        self.judgments.insert(judgment.query_id.clone(), judgment);
    }

    /// Insert from parts, with no question text.
    pub fn insert_relevant(
        &mut self,
        query_id: impl Into<String>,
        relevant: impl IntoIterator<Item = impl Into<String>>,
    ) {
        let query_id = query_id.into();
        self.insert(QueryJudgment {
            query_id,
            question: None,
            relevant_doc_ids: relevant.into_iter().map(Into::into).collect(),
        });
    }

    /// The relevant document ids for a query, if judged.
    pub fn relevant_for(&self, query_id: &str) -> Option<&BTreeSet<String>> {
        self.judgments.get(query_id).map(|j| &j.relevant_doc_ids)
    }

    /// The full judgment entry for a query, if judged.
    pub fn judgment(&self, query_id: &str) -> Option<&QueryJudgment> {
        self.judgments.get(query_id)
    }

    /// Whether this set has judgments for the given query.
    pub fn contains_query(&self, query_id: &str) -> bool {
        self.judgments.contains_key(query_id)
    }

    /// Number of judged queries.
    pub fn len(&self) -> usize {
        self.judgments.len()
    }

    /// Check if no queries are judged.
    pub fn is_empty(&self) -> bool {
        self.judgments.is_empty()
    }

    /// Iterate over judged query ids in ascending order.
    pub fn query_ids(&self) -> impl Iterator<Item = &str> {
        self.judgments.keys().map(String::as_str)
    }

    /// Load a judgment set from a JSON file.
    ///
    /// Expected format:
    /// ```json
    /// [
    ///   {"query_id": "q1", "question": "what is rust", "relevant_doc_ids": ["d1", "d2"]},
    ///   {"query_id": "q2", "relevant_doc_ids": ["d9"]}
    /// ]
    /// ```
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        let entries: Vec<QueryJudgment> = serde_json::from_str(&content)?;

        let mut set = JudgmentSet::new();
        for entry in entries {
            if entry.query_id.is_empty() {
                return Err(EvalError::invalid_input(
                    "<unnamed>",
                    "judgment entry with empty query_id",
                ));
            }
            set.insert(entry);
        }
        Ok(set)
    }

    /// Save the judgment set to a JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let entries: Vec<&QueryJudgment> = self.judgments.values().collect();
        let content = serde_json::to_string_pretty(&entries)?;
        fs::write(path, content).map_err(|e| EvalError::io(path, e))?;
        Ok(())
    }
}
