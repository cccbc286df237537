//! Search Relevance Eval CLI
//!
//! Scores search result runs against relevance judgments and compares
//! two approaches. All rendering happens here; the library only returns
//! read-only report structures.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use search_relevance_eval::{
    analyzer::{AnalyzerConfig, ApproachReport, Evaluator, MissingJudgmentPolicy},
    comparison::{ComparisonConfig, compare},
    config::EvalConfig,
    judgments::JudgmentSet,
    metrics::{QueryMetrics, ZeroRelevantPolicy},
    persistence::{load_report, save_comparison, save_report},
    results::ResultSet,
};
use std::path::PathBuf;

/// Search relevance evaluation - score and compare search approaches
#[derive(Parser)]
#[command(name = "search-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// β for the F-score (β > 1 weights recall higher)
    #[arg(long, global = true)]
    beta: Option<f64>,

    /// Only count the top-k hits of each query as retrieved
    #[arg(short = 'k', long, global = true)]
    top_k: Option<usize>,

    /// Recall policy for queries with no relevant documents
    /// (perfect_if_empty or always_zero)
    #[arg(long, global = true)]
    zero_relevant: Option<String>,

    /// Skip queries without judgments instead of failing the run
    #[arg(long, global = true)]
    lenient: bool,

    /// Exclude queries that retrieved nothing from macro-averages
    #[arg(long, global = true)]
    exclude_no_results: bool,

    /// Number of queries to show in rankings
    #[arg(short = 'n', long, global = true, default_value_t = 5)]
    show: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one approach's results against judgments
    Evaluate {
        /// Path to the result set JSON file
        #[arg(short, long)]
        results: PathBuf,

        /// Path to the judgments JSON file
        #[arg(short, long)]
        judgments: PathBuf,

        /// Save the report to a file (.json or .bin)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare two approaches over the same query set
    Compare {
        /// Path to approach A's result set JSON file
        #[arg(long)]
        results_a: PathBuf,

        /// Path to approach B's result set JSON file
        #[arg(long)]
        results_b: PathBuf,

        /// Path to the judgments JSON file
        #[arg(short, long)]
        judgments: PathBuf,

        /// |ΔF| above which a query counts as changed (overrides the
        /// configured value)
        #[arg(long)]
        changed_threshold: Option<f64>,

        /// Save the comparison report to a file (.json or .bin)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show one query's TP/FP/FN breakdown from a saved report
    Inspect {
        /// Path to a saved approach report
        #[arg(short, long)]
        report: PathBuf,

        /// Query id to inspect
        #[arg(short, long)]
        query: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    match &cli.command {
        Commands::Evaluate {
            results,
            judgments,
            output,
        } => cmd_evaluate(&cli, &config, results, judgments, output.as_deref()),
        Commands::Compare {
            results_a,
            results_b,
            judgments,
            changed_threshold,
            output,
        } => cmd_compare(
            &cli,
            &config,
            results_a,
            results_b,
            judgments,
            *changed_threshold,
            output.as_deref(),
        ),
        Commands::Inspect { report, query } => cmd_inspect(report, query),
    }
}

/// Layer CLI flags over the env/file configuration.
fn build_config(cli: &Cli) -> Result<EvalConfig> {
    let mut config = EvalConfig::load().context("Failed to load configuration")?;

    if let Some(beta) = cli.beta {
        config.analyzer.metrics.beta = beta;
    }
    if let Some(top_k) = cli.top_k {
        config.analyzer.metrics.top_k = Some(top_k);
    }
    if let Some(policy) = &cli.zero_relevant {
        config.analyzer.metrics.zero_relevant_policy = match policy.as_str() {
            "perfect_if_empty" => ZeroRelevantPolicy::PerfectIfEmpty,
            "always_zero" => ZeroRelevantPolicy::AlwaysZero,
            other => bail!("Unknown zero-relevant policy '{other}'"),
        };
    }
    if cli.lenient {
        config.analyzer.missing_judgments = MissingJudgmentPolicy::Lenient;
    }
    if cli.exclude_no_results {
        config.analyzer.exclude_no_results = true;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// The CLI flag overrides the env/file value; otherwise the loaded
/// configuration stands.
fn comparison_config(config: &EvalConfig, flag: Option<f64>) -> ComparisonConfig {
    ComparisonConfig {
        changed_threshold: flag.unwrap_or(config.comparison.changed_threshold),
    }
}

fn evaluate_file(
    analyzer_config: &AnalyzerConfig,
    results_path: &std::path::Path,
    judgments: &JudgmentSet,
) -> Result<ApproachReport> {
    let results = ResultSet::load_json(results_path)
        .with_context(|| format!("Failed to load results from {}", results_path.display()))?;

    println!(
        "Evaluating '{}' ({} queries against {} judged)...",
        results.approach,
        results.len(),
        judgments.len()
    );

    let report = Evaluator::new(analyzer_config.clone())
        .evaluate(&results, judgments)
        .with_context(|| format!("Evaluation of '{}' failed", results.approach))?;
    Ok(report)
}

fn cmd_evaluate(
    cli: &Cli,
    config: &EvalConfig,
    results_path: &std::path::Path,
    judgments_path: &std::path::Path,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let judgments = JudgmentSet::load_json(judgments_path)
        .with_context(|| format!("Failed to load judgments from {}", judgments_path.display()))?;

    let report = evaluate_file(&config.analyzer, results_path, &judgments)?;

    print_report(&report, cli.show);

    if let Some(output_path) = output {
        save_report(&report, output_path)?;
        println!("\nReport saved to {}", output_path.display());
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_compare(
    cli: &Cli,
    config: &EvalConfig,
    results_a_path: &std::path::Path,
    results_b_path: &std::path::Path,
    judgments_path: &std::path::Path,
    changed_threshold: Option<f64>,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let judgments = JudgmentSet::load_json(judgments_path)
        .with_context(|| format!("Failed to load judgments from {}", judgments_path.display()))?;

    let report_a = evaluate_file(&config.analyzer, results_a_path, &judgments)?;
    let report_b = evaluate_file(&config.analyzer, results_b_path, &judgments)?;

    let comparison_config = comparison_config(config, changed_threshold);
    let comparison =
        compare(&report_a, &report_b, &comparison_config).context("Comparison failed")?;

    println!(
        "\n========== Comparison: {} vs {} ==========",
        comparison.approach_a, comparison.approach_b
    );
    println!(
        "Aggregate ΔPrecision: {:+.3}  ΔRecall: {:+.3}  ΔF: {:+.3}",
        comparison.aggregate.delta_precision,
        comparison.aggregate.delta_recall,
        comparison.aggregate.delta_fscore
    );
    println!(
        "Improved: {}  Regressed: {}  Unchanged: {}",
        comparison.aggregate.improved,
        comparison.aggregate.regressed,
        comparison.aggregate.unchanged
    );

    println!("\nBiggest differences:");
    for query in comparison.biggest_differences(cli.show) {
        println!(
            "  {:<12} F {:.3} -> {:.3} (ΔF {:+.3})",
            query.query_id, query.fscore_a, query.fscore_b, query.delta_fscore
        );
        if !query.disjoint.tp_only_a.is_empty() {
            println!(
                "    only {} found: {}",
                comparison.approach_a,
                join(&query.disjoint.tp_only_a)
            );
        }
        if !query.disjoint.tp_only_b.is_empty() {
            println!(
                "    only {} found: {}",
                comparison.approach_b,
                join(&query.disjoint.tp_only_b)
            );
        }
    }

    if let Some(output_path) = output {
        save_comparison(&comparison, output_path)?;
        println!("\nComparison saved to {}", output_path.display());
    }

    Ok(())
}

fn cmd_inspect(report_path: &std::path::Path, query_id: &str) -> Result<()> {
    let report = load_report(report_path)
        .with_context(|| format!("Failed to load report from {}", report_path.display()))?;

    let Some(metrics) = report.query(query_id) else {
        bail!(
            "Query '{}' not found in report for '{}'",
            query_id,
            report.approach
        );
    };

    println!("Query: {} (approach '{}')", query_id, report.approach);
    println!(
        "Precision: {:.3}  Recall: {:.3}  F: {:.3}",
        metrics.precision, metrics.recall, metrics.fscore
    );
    if metrics.no_results {
        println!("(no results retrieved)");
    }
    println!("True positives  ({}):", metrics.tp_count());
    print_docs(metrics, &metrics.true_positives);
    println!("False positives ({}):", metrics.fp_count());
    print_docs(metrics, &metrics.false_positives);
    println!("False negatives ({}):", metrics.fn_count());
    print_docs(metrics, &metrics.false_negatives);

    Ok(())
}

fn print_docs(metrics: &QueryMetrics, docs: &std::collections::BTreeSet<String>) {
    if docs.is_empty() {
        println!("  -");
        return;
    }
    for doc_id in docs {
        match metrics.snapshot(doc_id) {
            Some(snapshot) => {
                println!(
                    "  {} (rank {}, score {:.3})",
                    doc_id, snapshot.position, snapshot.score
                );
                for (field, value) in &snapshot.fields {
                    println!("    {field}: {value}");
                }
                for (field, fragments) in &snapshot.highlights {
                    println!("    {field} highlights: {}", fragments.join(" ... "));
                }
            }
            // Not retrieved (false negatives): id only.
            None => println!("  {doc_id}"),
        }
    }
}

fn print_report(report: &ApproachReport, show: usize) {
    println!("\n========== {} ==========", report.approach);
    println!(
        "Precision: {:.3}  Recall: {:.3}  F: {:.3} ({} queries scored)",
        report.aggregate.precision,
        report.aggregate.recall,
        report.aggregate.fscore,
        report.aggregate.scored_queries
    );
    if report.aggregate.no_result_queries > 0 {
        println!(
            "Queries with no results: {}",
            report.aggregate.no_result_queries
        );
    }
    if !report.skipped.is_empty() {
        println!("Skipped (no judgments): {}", report.skipped.join(", "));
    }
    for error in &report.errors {
        println!("Failed: {} ({})", error.query_id, error.reason);
    }

    println!("\nWorst queries:");
    for metrics in report.worst(show) {
        println!(
            "  {:<12} P {:.3}  R {:.3}  F {:.3}  (TP {} / FP {} / FN {})",
            metrics.query_id,
            metrics.precision,
            metrics.recall,
            metrics.fscore,
            metrics.tp_count(),
            metrics.fp_count(),
            metrics.fn_count()
        );
    }
}

fn join(set: &std::collections::BTreeSet<String>) -> String {
    if set.is_empty() {
        "-".to_string()
    } else {
        set.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_threshold_falls_back_to_config() {
        let mut config = EvalConfig::default();
        config.comparison.changed_threshold = 0.05;

        // No flag: the configured value stands.
        let resolved = comparison_config(&config, None);
        assert_eq!(resolved.changed_threshold, 0.05);

        // Flag set: it overrides the configured value.
        let resolved = comparison_config(&config, Some(0.2));
        assert_eq!(resolved.changed_threshold, 0.2);
    }
}
