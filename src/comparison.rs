//! Two-approach comparison: per-query deltas and disjoint TP/FP/FN sets.
//!
//! Given two [`ApproachReport`]s built over the same query set, [`compare`]
//! produces signed metric deltas (B − A), the documents that changed
//! classification between the approaches, and improved/regressed counts.
//! Mismatched query sets are always an error; there is no silent
//! partial-intersection fallback.

use crate::analyzer::ApproachReport;
use crate::error::{EvalError, Result};
use crate::metrics::QueryMetrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Configuration for a two-approach comparison.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// |ΔF| above which a query counts as changed. 0.0 means any nonzero
    /// delta counts.
    pub changed_threshold: f64,
}

/// Documents classified one way by one approach but not the other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisjointSets {
    /// True positives only approach A found.
    pub tp_only_a: BTreeSet<String>,
    /// True positives only approach B found.
    pub tp_only_b: BTreeSet<String>,
    /// False positives unique to approach A.
    pub fp_only_a: BTreeSet<String>,
    /// False positives unique to approach B.
    pub fp_only_b: BTreeSet<String>,
    /// False negatives unique to approach A.
    pub fn_only_a: BTreeSet<String>,
    /// False negatives unique to approach B.
    pub fn_only_b: BTreeSet<String>,
}

impl DisjointSets {
    fn between(a: &QueryMetrics, b: &QueryMetrics) -> Self {
        let diff = |x: &BTreeSet<String>, y: &BTreeSet<String>| -> BTreeSet<String> {
            x.difference(y).cloned().collect()
        };
        Self {
            tp_only_a: diff(&a.true_positives, &b.true_positives),
            tp_only_b: diff(&b.true_positives, &a.true_positives),
            fp_only_a: diff(&a.false_positives, &b.false_positives),
            fp_only_b: diff(&b.false_positives, &a.false_positives),
            fn_only_a: diff(&a.false_negatives, &b.false_negatives),
            fn_only_b: diff(&b.false_negatives, &a.false_negatives),
        }
    }

    /// Total number of documents that changed classification.
    pub fn changed_count(&self) -> usize {
        self.tp_only_a.len()
            + self.tp_only_b.len()
            + self.fp_only_a.len()
            + self.fp_only_b.len()
            + self.fn_only_a.len()
            + self.fn_only_b.len()
    }

    /// Check if both approaches classified every document identically.
    pub fn is_empty(&self) -> bool {
        self.changed_count() == 0
    }
}

/// Comparison of one query between the two approaches.
///
/// Deltas are signed, B − A, so direction of improvement is preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryComparison {
    /// Query identifier.
    pub query_id: String,
    /// Precision of approach A.
    pub precision_a: f64,
    /// Precision of approach B.
    pub precision_b: f64,
    /// Recall of approach A.
    pub recall_a: f64,
    /// Recall of approach B.
    pub recall_b: f64,
    /// F-score of approach A.
    pub fscore_a: f64,
    /// F-score of approach B.
    pub fscore_b: f64,
    /// precision_b − precision_a.
    pub delta_precision: f64,
    /// recall_b − recall_a.
    pub delta_recall: f64,
    /// fscore_b − fscore_a.
    pub delta_fscore: f64,
    /// Documents that changed classification between the approaches.
    pub disjoint: DisjointSets,
}

/// Macro-averaged deltas and change counts across all queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateComparison {
    /// Mean ΔPrecision across queries.
    pub delta_precision: f64,
    /// Mean ΔRecall across queries.
    pub delta_recall: f64,
    /// Mean ΔF across queries.
    pub delta_fscore: f64,
    /// Queries with ΔF above the changed threshold.
    pub improved: usize,
    /// Queries with ΔF below the negated threshold.
    pub regressed: usize,
    /// Queries within the threshold either way.
    pub unchanged: usize,
}

/// The full comparison of two approach reports. Read-only once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Name of approach A (the baseline).
    pub approach_a: String,
    /// Name of approach B (the candidate).
    pub approach_b: String,
    /// Per-query comparisons, keyed by query id.
    pub queries: BTreeMap<String, QueryComparison>,
    /// Macro-averaged deltas and change counts.
    pub aggregate: AggregateComparison,
}

impl ComparisonReport {
    /// Comparison for one query. Keyed lookup, no re-scan.
    pub fn query(&self, query_id: &str) -> Option<&QueryComparison> {
        self.queries.get(query_id)
    }

    /// Number of compared queries.
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Check if no queries were compared.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Queries ordered by |ΔF| descending (biggest difference first),
    /// ties broken by query id ascending. Restartable.
    pub fn ranked_by_difference(&self) -> impl Iterator<Item = &QueryComparison> {
        let mut entries: Vec<&QueryComparison> = self.queries.values().collect();
        entries.sort_by(|a, b| {
            b.delta_fscore
                .abs()
                .total_cmp(&a.delta_fscore.abs())
                .then_with(|| a.query_id.cmp(&b.query_id))
        });
        entries.into_iter()
    }

    /// The n queries with the biggest F-score difference.
    pub fn biggest_differences(&self, n: usize) -> Vec<&QueryComparison> {
        self.ranked_by_difference().take(n).collect()
    }
}

/// Compare two approach reports built over the same query set.
///
/// Fails with `MismatchedQuerySet` when the reports cover different query
/// ids, listing the ids unique to each side.
pub fn compare(
    report_a: &ApproachReport,
    report_b: &ApproachReport,
    config: &ComparisonConfig,
) -> Result<ComparisonReport> {
    let ids_a: BTreeSet<&str> = report_a.query_ids().collect();
    let ids_b: BTreeSet<&str> = report_b.query_ids().collect();
    if ids_a != ids_b {
        return Err(EvalError::MismatchedQuerySet {
            only_a: ids_a.difference(&ids_b).map(|s| s.to_string()).collect(),
            only_b: ids_b.difference(&ids_a).map(|s| s.to_string()).collect(),
        });
    }

    let mut queries = BTreeMap::new();
    for id in ids_a {
        // Both lookups are covered by the id-set equality check above.
        let a = report_a.query(id).ok_or_else(|| {
            EvalError::invalid_input(id, "query missing from approach A report")
        })?;
        let b = report_b.query(id).ok_or_else(|| {
            EvalError::invalid_input(id, "query missing from approach B report")
        })?;

        queries.insert(
            id.to_string(),
            QueryComparison {
                query_id: id.to_string(),
                precision_a: a.precision,
                precision_b: b.precision,
                recall_a: a.recall,
                recall_b: b.recall,
                fscore_a: a.fscore,
                fscore_b: b.fscore,
                delta_precision: b.precision - a.precision,
                delta_recall: b.recall - a.recall,
                delta_fscore: b.fscore - a.fscore,
                disjoint: DisjointSets::between(a, b),
            },
        );
    }

    let aggregate = aggregate(&queries, config);

    Ok(ComparisonReport {
        approach_a: report_a.approach.clone(),
        approach_b: report_b.approach.clone(),
        queries,
        aggregate,
    })
}

fn aggregate(
    queries: &BTreeMap<String, QueryComparison>,
    config: &ComparisonConfig,
) -> AggregateComparison {
    if queries.is_empty() {
        return AggregateComparison::default();
    }

    let n = queries.len() as f64;
    let mut agg = AggregateComparison {
        delta_precision: queries.values().map(|q| q.delta_precision).sum::<f64>() / n,
        delta_recall: queries.values().map(|q| q.delta_recall).sum::<f64>() / n,
        delta_fscore: queries.values().map(|q| q.delta_fscore).sum::<f64>() / n,
        ..Default::default()
    };

    let threshold = config.changed_threshold;
    for query in queries.values() {
        if query.delta_fscore > threshold {
            agg.improved += 1;
        } else if query.delta_fscore < -threshold {
            agg.regressed += 1;
        } else {
            agg.unchanged += 1;
        }
    }
    agg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Evaluator;
    use crate::judgments::JudgmentSet;
    use crate::results::{Hit, QueryResult, ResultSet};

    fn result_with(query_id: &str, doc_ids: &[&str]) -> QueryResult {
        let hits = doc_ids
            .iter()
            .enumerate()
            .map(|(i, id)| Hit::new(*id, 10.0 - i as f64))
            .collect();
        QueryResult::new(query_id, hits)
    }

    fn judgments() -> JudgmentSet {
        let mut judgments = JudgmentSet::new();
        judgments.insert_relevant("q1", ["d1", "d2"]);
        judgments.insert_relevant("q2", ["d3", "d4"]);
        judgments
    }

    fn report(approach: &str, q1_docs: &[&str], q2_docs: &[&str]) -> ApproachReport {
        let mut results = ResultSet::new(approach);
        results.push(result_with("q1", q1_docs));
        results.push(result_with("q2", q2_docs));
        Evaluator::with_defaults()
            .evaluate(&results, &judgments())
            .unwrap()
    }

    #[test]
    fn test_signed_deltas() {
        // B fixes q1 entirely and drops one relevant doc on q2.
        let a = report("baseline", &["d9"], &["d3", "d4"]);
        let b = report("candidate", &["d1", "d2"], &["d3"]);
        let comparison = compare(&a, &b, &ComparisonConfig::default()).unwrap();

        let q1 = comparison.query("q1").unwrap();
        assert_eq!(q1.delta_fscore, 1.0);
        assert_eq!(q1.delta_precision, 1.0);
        assert_eq!(q1.delta_recall, 1.0);

        let q2 = comparison.query("q2").unwrap();
        assert!(q2.delta_recall < 0.0);
        assert!(q2.delta_fscore < 0.0);
    }

    #[test]
    fn test_disjoint_sets() {
        let a = report("baseline", &["d1", "d9"], &["d3", "d4"]);
        let b = report("candidate", &["d2", "d9"], &["d3", "d4"]);
        let comparison = compare(&a, &b, &ComparisonConfig::default()).unwrap();

        let q1 = comparison.query("q1").unwrap();
        // A found d1, B found d2; d9 is a FP both sides so not disjoint.
        assert_eq!(q1.disjoint.tp_only_a, set(&["d1"]));
        assert_eq!(q1.disjoint.tp_only_b, set(&["d2"]));
        assert!(q1.disjoint.fp_only_a.is_empty());
        assert!(q1.disjoint.fp_only_b.is_empty());
        // Each missed what the other found.
        assert_eq!(q1.disjoint.fn_only_a, set(&["d2"]));
        assert_eq!(q1.disjoint.fn_only_b, set(&["d1"]));

        let q2 = comparison.query("q2").unwrap();
        assert!(q2.disjoint.is_empty());
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_anti_symmetry() {
        let a = report("baseline", &["d1"], &["d3", "d8"]);
        let b = report("candidate", &["d1", "d2"], &["d3"]);

        let forward = compare(&a, &b, &ComparisonConfig::default()).unwrap();
        let backward = compare(&b, &a, &ComparisonConfig::default()).unwrap();

        for (id, fwd) in &forward.queries {
            let bwd = backward.query(id).unwrap();
            assert_eq!(fwd.delta_fscore, -bwd.delta_fscore);
            assert_eq!(fwd.delta_precision, -bwd.delta_precision);
            assert_eq!(fwd.delta_recall, -bwd.delta_recall);
            assert_eq!(fwd.disjoint.tp_only_a, bwd.disjoint.tp_only_b);
            assert_eq!(fwd.disjoint.tp_only_b, bwd.disjoint.tp_only_a);
            assert_eq!(fwd.disjoint.fp_only_a, bwd.disjoint.fp_only_b);
            assert_eq!(fwd.disjoint.fn_only_a, bwd.disjoint.fn_only_b);
        }
        assert_eq!(forward.aggregate.improved, backward.aggregate.regressed);
        assert_eq!(forward.aggregate.regressed, backward.aggregate.improved);
    }

    #[test]
    fn test_biggest_difference_ranking() {
        // q1 swings by a full point, q2 only by half a point.
        let a = report("baseline", &["d9"], &["d3", "d9"]);
        let b = report("candidate", &["d1", "d2"], &["d3", "d4"]);
        let comparison = compare(&a, &b, &ComparisonConfig::default()).unwrap();

        let order: Vec<&str> = comparison
            .ranked_by_difference()
            .map(|q| q.query_id.as_str())
            .collect();
        assert_eq!(order, vec!["q1", "q2"]);

        let top = comparison.biggest_differences(1);
        assert_eq!(top[0].query_id, "q1");
    }

    #[test]
    fn test_ranking_restartable() {
        let a = report("baseline", &["d9"], &["d3"]);
        let b = report("candidate", &["d1"], &["d3", "d4"]);
        let comparison = compare(&a, &b, &ComparisonConfig::default()).unwrap();

        let first: Vec<&str> = comparison
            .ranked_by_difference()
            .map(|q| q.query_id.as_str())
            .collect();
        let second: Vec<&str> = comparison
            .ranked_by_difference()
            .map(|q| q.query_id.as_str())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_improved_regressed_unchanged() {
        let a = report("baseline", &["d9"], &["d3", "d4"]);
        let b = report("candidate", &["d1", "d2"], &["d3"]);
        let comparison = compare(&a, &b, &ComparisonConfig::default()).unwrap();

        assert_eq!(comparison.aggregate.improved, 1);
        assert_eq!(comparison.aggregate.regressed, 1);
        assert_eq!(comparison.aggregate.unchanged, 0);
    }

    #[test]
    fn test_changed_threshold() {
        let a = report("baseline", &["d1"], &["d3", "d4"]);
        let b = report("candidate", &["d1", "d2"], &["d3", "d4"]);
        // q1 moves from F=2/3 to F=1.0; with a generous threshold it
        // counts as unchanged.
        let config = ComparisonConfig {
            changed_threshold: 0.5,
        };
        let comparison = compare(&a, &b, &config).unwrap();
        assert_eq!(comparison.aggregate.improved, 0);
        assert_eq!(comparison.aggregate.unchanged, 2);
    }

    #[test]
    fn test_mismatched_query_sets() {
        let mut results_a = ResultSet::new("baseline");
        results_a.push(result_with("q1", &["d1"]));
        results_a.push(result_with("q2", &["d3"]));
        let mut results_b = ResultSet::new("candidate");
        results_b.push(result_with("q1", &["d1"]));
        results_b.push(result_with("q3", &["d5"]));

        let mut judgments = JudgmentSet::new();
        judgments.insert_relevant("q1", ["d1"]);
        judgments.insert_relevant("q2", ["d3"]);
        judgments.insert_relevant("q3", ["d5"]);

        let evaluator = Evaluator::with_defaults();
        let a = evaluator.evaluate(&results_a, &judgments).unwrap();
        let b = evaluator.evaluate(&results_b, &judgments).unwrap();

        let err = compare(&a, &b, &ComparisonConfig::default()).unwrap_err();
        match err {
            EvalError::MismatchedQuerySet { only_a, only_b } => {
                assert_eq!(only_a, vec!["q2".to_string()]);
                assert_eq!(only_b, vec!["q3".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_identical_reports_compare_to_zero() {
        let a = report("baseline", &["d1", "d2"], &["d3"]);
        let b = report("baseline-copy", &["d1", "d2"], &["d3"]);
        let comparison = compare(&a, &b, &ComparisonConfig::default()).unwrap();

        assert_eq!(comparison.aggregate.delta_fscore, 0.0);
        assert_eq!(comparison.aggregate.unchanged, 2);
        for query in comparison.queries.values() {
            assert!(query.disjoint.is_empty());
        }
    }
}
