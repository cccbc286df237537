//! Per-query metric computation: precision, recall, F-score and the
//! TP/FP/FN partition.
//!
//! Everything here is pure: one query result plus its relevant-document
//! set in, one [`QueryMetrics`] out. Degenerate cases (nothing retrieved,
//! no known relevant documents) resolve to documented values instead of
//! raising, so aggregates never contain NaN.

use crate::error::Result;
use crate::results::QueryResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How to score recall for a query with no known relevant documents.
///
/// This materially changes aggregate scores on query sets that contain
/// such queries, so it is an explicit choice rather than a hardcoded rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroRelevantPolicy {
    /// Recall is 1.0 when nothing was retrieved either (nothing expected,
    /// nothing returned), 0.0 when documents were retrieved anyway.
    #[default]
    PerfectIfEmpty,
    /// Recall is always 0.0, matching tools that treat an unjudged-empty
    /// query as a data problem scoring zero.
    AlwaysZero,
}

/// Configuration for per-query metric computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// β for the F-score: β > 1 weights recall higher, β < 1 precision.
    pub beta: f64,
    /// Optional cutoff: only the top-k hits (in ranking order) count as
    /// retrieved.
    pub top_k: Option<usize>,
    /// Recall policy for queries with an empty relevant set.
    pub zero_relevant_policy: ZeroRelevantPolicy,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            beta: 1.0,
            top_k: None,
            zero_relevant_policy: ZeroRelevantPolicy::default(),
        }
    }
}

/// What is known about one retrieved document, kept alongside the
/// TP/FP/FN sets so downstream inspection can show rank, score and field
/// snapshots without going back to the raw result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocSnapshot {
    /// Rank position within the result (1-based).
    pub position: usize,
    /// Backend ranking score.
    pub score: f64,
    /// Field snapshots, if the backend returned them.
    pub fields: BTreeMap<String, String>,
    /// Highlight fragments per field, if the backend returned them.
    pub highlights: BTreeMap<String, Vec<String>>,
}

/// Computed metrics for a single query. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMetrics {
    /// Query identifier.
    pub query_id: String,
    /// Fraction of retrieved documents that are relevant.
    pub precision: f64,
    /// Fraction of relevant documents that were retrieved.
    pub recall: f64,
    /// β-weighted harmonic mean of precision and recall.
    pub fscore: f64,
    /// Retrieved and relevant.
    pub true_positives: BTreeSet<String>,
    /// Retrieved but not relevant.
    pub false_positives: BTreeSet<String>,
    /// Relevant but not retrieved.
    pub false_negatives: BTreeSet<String>,
    /// Per-document snapshots for every retrieved hit (post-cutoff),
    /// keyed by doc id. False negatives that were never retrieved have
    /// no entry.
    #[serde(default)]
    pub snapshots: BTreeMap<String, DocSnapshot>,
    /// Set when the query retrieved nothing; callers may exclude such
    /// queries from averages.
    pub no_results: bool,
}

impl QueryMetrics {
    /// Snapshot for one retrieved document, if it was retrieved.
    pub fn snapshot(&self, doc_id: &str) -> Option<&DocSnapshot> {
        self.snapshots.get(doc_id)
    }

    /// Number of true positives.
    pub fn tp_count(&self) -> usize {
        self.true_positives.len()
    }

    /// Number of false positives.
    pub fn fp_count(&self) -> usize {
        self.false_positives.len()
    }

    /// Number of false negatives.
    pub fn fn_count(&self) -> usize {
        self.false_negatives.len()
    }
}

/// Compute metrics for one query.
///
/// `relevant` is the judged relevant-document set for this query (possibly
/// empty). Fails with `InvalidInput` if the result contains duplicate
/// document ids.
pub fn evaluate_query(
    result: &QueryResult,
    relevant: &BTreeSet<String>,
    config: &MetricsConfig,
) -> Result<QueryMetrics> {
    result.validate()?;

    // Cutoff applies to ranking order, before set construction.
    let considered = match config.top_k {
        Some(k) => &result.hits[..result.hits.len().min(k)],
        None => &result.hits[..],
    };
    let retrieved: BTreeSet<String> = considered.iter().map(|h| h.doc_id.clone()).collect();

    let snapshots: BTreeMap<String, DocSnapshot> = considered
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            (
                hit.doc_id.clone(),
                DocSnapshot {
                    position: i + 1,
                    score: hit.score,
                    fields: hit.fields.clone(),
                    highlights: hit.highlights.clone(),
                },
            )
        })
        .collect();

    let true_positives: BTreeSet<String> = retrieved.intersection(relevant).cloned().collect();
    let false_positives: BTreeSet<String> = retrieved.difference(relevant).cloned().collect();
    let false_negatives: BTreeSet<String> = relevant.difference(&retrieved).cloned().collect();

    let no_results = retrieved.is_empty();

    let precision = if no_results {
        0.0
    } else {
        true_positives.len() as f64 / retrieved.len() as f64
    };

    let recall = if relevant.is_empty() {
        match config.zero_relevant_policy {
            ZeroRelevantPolicy::PerfectIfEmpty => {
                if no_results {
                    1.0
                } else {
                    0.0
                }
            }
            ZeroRelevantPolicy::AlwaysZero => 0.0,
        }
    } else {
        true_positives.len() as f64 / relevant.len() as f64
    };

    let fscore = fscore(precision, recall, config.beta);

    Ok(QueryMetrics {
        query_id: result.query_id.clone(),
        precision,
        recall,
        fscore,
        true_positives,
        false_positives,
        false_negatives,
        snapshots,
        no_results,
    })
}

/// β-weighted F-score: (1+β²)·P·R / (β²·P + R), 0.0 when P + R = 0.
pub fn fscore(precision: f64, recall: f64, beta: f64) -> f64 {
    let beta_sq = beta * beta;
    let denominator = beta_sq * precision + recall;
    if denominator == 0.0 {
        return 0.0;
    }
    (1.0 + beta_sq) * precision * recall / denominator
}
