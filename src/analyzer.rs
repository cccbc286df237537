//! Single-approach analysis: score every query of one run and aggregate.
//!
//! The [`Evaluator`] walks a [`ResultSet`], invokes the metric calculator
//! once per query, and builds an immutable [`ApproachReport`] with
//! macro-averaged aggregates and worst-first/best-first rankings.

use crate::error::{EvalError, Result};
use crate::judgments::JudgmentSet;
use crate::metrics::{MetricsConfig, QueryMetrics, evaluate_query, fscore};
use crate::results::ResultSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do when a query in the result set has no judgment entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingJudgmentPolicy {
    /// Abort the run, reporting the offending query id.
    #[default]
    Strict,
    /// Exclude the query from aggregates and record it as skipped.
    Lenient,
}

/// Configuration for a single-approach evaluation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Per-query metric settings.
    pub metrics: MetricsConfig,
    /// Strict or lenient handling of queries without judgments.
    pub missing_judgments: MissingJudgmentPolicy,
    /// Exclude queries that retrieved nothing from the macro-average
    /// denominator.
    pub exclude_no_results: bool,
}

/// A structural failure recorded for one query instead of metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryError {
    /// Query identifier.
    pub query_id: String,
    /// Why the query could not be scored.
    pub reason: String,
}

/// Macro-averaged metrics across all scored queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateMetrics {
    /// Mean precision across scored queries.
    pub precision: f64,
    /// Mean recall across scored queries.
    pub recall: f64,
    /// F-score of the aggregate precision and recall.
    pub fscore: f64,
    /// Queries included in the averages.
    pub scored_queries: usize,
    /// Queries flagged `no_results` (excluded from averages when
    /// configured).
    pub no_result_queries: usize,
}

/// The complete evaluation of one approach over a query set.
///
/// Built once by [`Evaluator::evaluate`], read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproachReport {
    /// Name of the evaluated approach.
    pub approach: String,
    /// Per-query metrics, keyed by query id.
    pub metrics: BTreeMap<String, QueryMetrics>,
    /// Macro-averaged aggregates.
    pub aggregate: AggregateMetrics,
    /// Queries excluded for lack of judgments (lenient mode only).
    pub skipped: Vec<String>,
    /// Queries that failed structural validation (lenient mode only).
    pub errors: Vec<QueryError>,
}

impl ApproachReport {
    /// Metrics for one query. Keyed lookup, no re-scan.
    pub fn query(&self, query_id: &str) -> Option<&QueryMetrics> {
        self.metrics.get(query_id)
    }

    /// Query ids covered by this report, ascending.
    pub fn query_ids(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    /// Number of scored queries.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Check if no queries were scored.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Queries ordered by ascending F-score (worst performers first),
    /// ties broken by query id ascending. Restartable: each call yields a
    /// fresh iterator over the same order.
    pub fn ranked_worst_first(&self) -> impl Iterator<Item = &QueryMetrics> {
        self.ranked(false).into_iter()
    }

    /// Queries ordered by descending F-score (best performers first),
    /// ties broken by query id ascending.
    pub fn ranked_best_first(&self) -> impl Iterator<Item = &QueryMetrics> {
        self.ranked(true).into_iter()
    }

    /// The n worst-performing queries.
    pub fn worst(&self, n: usize) -> Vec<&QueryMetrics> {
        self.ranked_worst_first().take(n).collect()
    }

    /// The n best-performing queries.
    pub fn best(&self, n: usize) -> Vec<&QueryMetrics> {
        self.ranked_best_first().take(n).collect()
    }

    fn ranked(&self, descending: bool) -> Vec<&QueryMetrics> {
        let mut entries: Vec<&QueryMetrics> = self.metrics.values().collect();
        // total_cmp keeps the order total; id tiebreak keeps it deterministic.
        entries.sort_by(|a, b| {
            let ord = a.fscore.total_cmp(&b.fscore);
            let ord = if descending { ord.reverse() } else { ord };
            ord.then_with(|| a.query_id.cmp(&b.query_id))
        });
        entries
    }
}

/// Scores a result set against a judgment set.
pub struct Evaluator {
    config: AnalyzerConfig,
}

impl Evaluator {
    /// Create an evaluator with the given configuration.
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Create an evaluator with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(AnalyzerConfig::default())
    }

    /// Score every query of `results` against `judgments` and build the
    /// report.
    ///
    /// In strict mode the first query without judgments fails the run with
    /// `MissingJudgment`, and the first structurally invalid result fails
    /// it with `InvalidInput`. In lenient mode both are recorded in the
    /// report (`skipped` / `errors`) and the remaining queries are scored.
    pub fn evaluate(&self, results: &ResultSet, judgments: &JudgmentSet) -> Result<ApproachReport> {
        let mut metrics = BTreeMap::new();
        let mut skipped = Vec::new();
        let mut errors = Vec::new();

        for result in &results.results {
            let Some(relevant) = judgments.relevant_for(&result.query_id) else {
                match self.config.missing_judgments {
                    MissingJudgmentPolicy::Strict => {
                        return Err(EvalError::MissingJudgment(result.query_id.clone()));
                    }
                    MissingJudgmentPolicy::Lenient => {
                        skipped.push(result.query_id.clone());
                        continue;
                    }
                }
            };

            match evaluate_query(result, relevant, &self.config.metrics) {
                Ok(query_metrics) => {
                    metrics.insert(result.query_id.clone(), query_metrics);
                }
                Err(err @ EvalError::InvalidInput { .. }) => {
                    match self.config.missing_judgments {
                        MissingJudgmentPolicy::Strict => return Err(err),
                        MissingJudgmentPolicy::Lenient => errors.push(QueryError {
                            query_id: result.query_id.clone(),
                            reason: err.to_string(),
                        }),
                    }
                }
                Err(err) => return Err(err),
            }
        }

        let aggregate = self.aggregate(&metrics);

        Ok(ApproachReport {
            approach: results.approach.clone(),
            metrics,
            aggregate,
            skipped,
            errors,
        })
    }

    fn aggregate(&self, metrics: &BTreeMap<String, QueryMetrics>) -> AggregateMetrics {
        let no_result_queries = metrics.values().filter(|m| m.no_results).count();

        let included: Vec<&QueryMetrics> = metrics
            .values()
            .filter(|m| !(self.config.exclude_no_results && m.no_results))
            .collect();

        if included.is_empty() {
            return AggregateMetrics {
                no_result_queries,
                ..Default::default()
            };
        }

        let n = included.len() as f64;
        let precision = included.iter().map(|m| m.precision).sum::<f64>() / n;
        let recall = included.iter().map(|m| m.recall).sum::<f64>() / n;

        AggregateMetrics {
            precision,
            recall,
            fscore: fscore(precision, recall, self.config.metrics.beta),
            scored_queries: included.len(),
            no_result_queries,
        }
    }
}
