//! Search Relevance Eval - precision/recall evaluation for search approaches.
//!
//! This library scores the results of a search configuration ("approach")
//! against relevance judgments, and compares two approaches over the same
//! query set: which queries improved, which regressed, and exactly which
//! documents changed classification between them.
//!
//! It does not run searches itself. A backend connector executes the
//! queries and hands over normalized [`results::ResultSet`]s; report
//! rendering is equally left to the caller.
//!
//! # Quick Start
//!
//! ```
//! use search_relevance_eval::{
//!     analyzer::Evaluator,
//!     comparison::{ComparisonConfig, compare},
//!     judgments::JudgmentSet,
//!     results::{Hit, QueryResult, ResultSet},
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     // Ground truth: which documents answer which query.
//!     let mut judgments = JudgmentSet::new();
//!     judgments.insert_relevant("q1", ["d1", "d2"]);
//!
//!     // One approach's results, as produced by the search backend.
//!     let mut baseline = ResultSet::new("bm25-baseline");
//!     baseline.push(QueryResult::new("q1", vec![Hit::new("d1", 7.3)]));
//!
//!     let mut candidate = ResultSet::new("hybrid-rerank");
//!     candidate.push(QueryResult::new(
//!         "q1",
//!         vec![Hit::new("d1", 0.9), Hit::new("d2", 0.7)],
//!     ));
//!
//!     // Score each approach, then compare.
//!     let evaluator = Evaluator::with_defaults();
//!     let report_a = evaluator.evaluate(&baseline, &judgments)?;
//!     let report_b = evaluator.evaluate(&candidate, &judgments)?;
//!
//!     let comparison = compare(&report_a, &report_b, &ComparisonConfig::default())?;
//!     for query in comparison.ranked_by_difference() {
//!         println!("{}: ΔF = {:+.3}", query.query_id, query.delta_fscore);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **JudgmentSet**: ground-truth lookup of relevant documents per query
//! - **ResultSet**: normalized ranked results for one approach
//! - **metrics**: per-query precision/recall/F and the TP/FP/FN partition
//! - **Evaluator**: aggregates one approach into an `ApproachReport`
//! - **compare**: pairs two reports into a `ComparisonReport`

pub mod analyzer;
pub mod comparison;
pub mod config;
pub mod error;
pub mod judgments;
pub mod metrics;
pub mod persistence;
pub mod results;

// Re-export commonly used types
pub use analyzer::{AnalyzerConfig, ApproachReport, Evaluator, MissingJudgmentPolicy};
pub use comparison::{ComparisonConfig, ComparisonReport, compare};
pub use config::EvalConfig;
pub use error::{EvalError, Result};
pub use judgments::JudgmentSet;
pub use metrics::{DocSnapshot, MetricsConfig, QueryMetrics, ZeroRelevantPolicy, evaluate_query};
pub use persistence::{load_report, save_comparison, save_report};
pub use results::{Hit, QueryResult, ResultSet};
