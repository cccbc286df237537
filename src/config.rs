//! Configuration for the evaluator.
//!
//! Supports both environment variables and a YAML config file.
//! Environment variables take precedence over config file values.
//! The core analyzers take plain config structs; all file and
//! environment handling lives here.

use crate::analyzer::{AnalyzerConfig, MissingJudgmentPolicy};
use crate::comparison::ComparisonConfig;
use crate::error::{EvalError, Result};
use crate::metrics::{MetricsConfig, ZeroRelevantPolicy};
use std::env;
use std::path::PathBuf;

/// Full evaluator configuration.
#[derive(Debug, Clone, Default)]
pub struct EvalConfig {
    /// Single-approach analysis settings (includes per-query metrics).
    pub analyzer: AnalyzerConfig,
    /// Two-approach comparison settings.
    pub comparison: ComparisonConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, serde::Deserialize)]
struct ConfigFile {
    metrics: Option<MetricsFileSection>,
    analyzer: Option<AnalyzerFileSection>,
    comparison: Option<ComparisonFileSection>,
}

#[derive(Debug, serde::Deserialize)]
struct MetricsFileSection {
    beta: Option<f64>,
    top_k: Option<usize>,
    zero_relevant_policy: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct AnalyzerFileSection {
    missing_judgments: Option<String>,
    exclude_no_results: Option<bool>,
}

#[derive(Debug, serde::Deserialize)]
struct ComparisonFileSection {
    changed_threshold: Option<f64>,
}

impl EvalConfig {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (EVAL_BETA, EVAL_TOP_K, ...)
    /// 2. Config file (~/.config/search-relevance-eval/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = EvalConfig::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        if let Ok(beta) = env::var("EVAL_BETA") {
            config.analyzer.metrics.beta = beta
                .parse()
                .map_err(|_| EvalError::Config(format!("Invalid EVAL_BETA value: {beta}")))?;
        }

        if let Ok(top_k) = env::var("EVAL_TOP_K") {
            config.analyzer.metrics.top_k = Some(
                top_k
                    .parse()
                    .map_err(|_| EvalError::Config(format!("Invalid EVAL_TOP_K value: {top_k}")))?,
            );
        }

        if let Ok(policy) = env::var("EVAL_ZERO_RELEVANT_POLICY") {
            config.analyzer.metrics.zero_relevant_policy = parse_zero_relevant_policy(&policy)?;
        }

        if let Ok(policy) = env::var("EVAL_MISSING_JUDGMENTS") {
            config.analyzer.missing_judgments = parse_missing_judgment_policy(&policy)?;
        }

        if let Ok(threshold) = env::var("EVAL_CHANGED_THRESHOLD") {
            config.comparison.changed_threshold = threshold.parse().map_err(|_| {
                EvalError::Config(format!("Invalid EVAL_CHANGED_THRESHOLD value: {threshold}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;

        let file_config: ConfigFile = serde_yaml::from_str(&content)
            .map_err(|e| EvalError::Config(format!("Failed to parse config file: {e}")))?;

        let mut config = EvalConfig::default();

        if let Some(metrics) = file_config.metrics {
            if let Some(beta) = metrics.beta {
                config.analyzer.metrics.beta = beta;
            }
            if let Some(top_k) = metrics.top_k {
                config.analyzer.metrics.top_k = Some(top_k);
            }
            if let Some(policy) = metrics.zero_relevant_policy {
                config.analyzer.metrics.zero_relevant_policy =
                    parse_zero_relevant_policy(&policy)?;
            }
        }

        if let Some(analyzer) = file_config.analyzer {
            if let Some(policy) = analyzer.missing_judgments {
                config.analyzer.missing_judgments = parse_missing_judgment_policy(&policy)?;
            }
            if let Some(exclude) = analyzer.exclude_no_results {
                config.analyzer.exclude_no_results = exclude;
            }
        }

        if let Some(comparison) = file_config.comparison {
            if let Some(threshold) = comparison.changed_threshold {
                config.comparison.changed_threshold = threshold;
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "search-relevance-eval")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.analyzer.metrics.beta <= 0.0 {
            return Err(EvalError::Config(format!(
                "beta must be positive, got {}",
                self.analyzer.metrics.beta
            )));
        }

        if let Some(top_k) = self.analyzer.metrics.top_k {
            if top_k == 0 {
                return Err(EvalError::Config(
                    "top_k must be at least 1 when set".to_string(),
                ));
            }
        }

        if self.comparison.changed_threshold < 0.0 {
            return Err(EvalError::Config(format!(
                "changed_threshold must be non-negative, got {}",
                self.comparison.changed_threshold
            )));
        }

        Ok(())
    }

    /// Create a config from explicit metric values (useful for testing).
    pub fn with_metrics(metrics: MetricsConfig) -> Self {
        Self {
            analyzer: AnalyzerConfig {
                metrics,
                ..Default::default()
            },
            comparison: ComparisonConfig::default(),
        }
    }
}

fn parse_zero_relevant_policy(s: &str) -> Result<ZeroRelevantPolicy> {
    match s.to_lowercase().as_str() {
        "perfect_if_empty" | "perfect-if-empty" => Ok(ZeroRelevantPolicy::PerfectIfEmpty),
        "always_zero" | "always-zero" => Ok(ZeroRelevantPolicy::AlwaysZero),
        other => Err(EvalError::Config(format!(
            "Unknown zero-relevant policy '{other}' (expected 'perfect_if_empty' or 'always_zero')"
        ))),
    }
}

fn parse_missing_judgment_policy(s: &str) -> Result<MissingJudgmentPolicy> {
    match s.to_lowercase().as_str() {
        "strict" => Ok(MissingJudgmentPolicy::Strict),
        "lenient" => Ok(MissingJudgmentPolicy::Lenient),
        other => Err(EvalError::Config(format!(
            "Unknown missing-judgment policy '{other}' (expected 'strict' or 'lenient')"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EvalConfig::default();
        assert_eq!(config.analyzer.metrics.beta, 1.0);
        assert!(config.analyzer.metrics.top_k.is_none());
        assert_eq!(config.analyzer.missing_judgments, MissingJudgmentPolicy::Strict);
        assert_eq!(config.comparison.changed_threshold, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_beta() {
        let mut config = EvalConfig::default();
        config.analyzer.metrics.beta = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = EvalConfig::default();
        config.analyzer.metrics.top_k = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let mut config = EvalConfig::default();
        config.comparison.changed_threshold = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            r#"
metrics:
  beta: 2.0
  top_k: 10
  zero_relevant_policy: always_zero
analyzer:
  missing_judgments: lenient
  exclude_no_results: true
comparison:
  changed_threshold: 0.05
"#,
        )
        .unwrap();

        let config = EvalConfig::load_from_file(&path).unwrap();
        assert_eq!(config.analyzer.metrics.beta, 2.0);
        assert_eq!(config.analyzer.metrics.top_k, Some(10));
        assert_eq!(
            config.analyzer.metrics.zero_relevant_policy,
            ZeroRelevantPolicy::AlwaysZero
        );
        assert_eq!(
            config.analyzer.missing_judgments,
            MissingJudgmentPolicy::Lenient
        );
        assert!(config.analyzer.exclude_no_results);
        assert_eq!(config.comparison.changed_threshold, 0.05);
    }

    #[test]
    fn test_load_from_file_partial() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "metrics:\n  beta: 0.5\n").unwrap();

        let config = EvalConfig::load_from_file(&path).unwrap();
        assert_eq!(config.analyzer.metrics.beta, 0.5);
        assert!(config.analyzer.metrics.top_k.is_none());
    }

    #[test]
    fn test_unknown_policy_is_config_error() {
        assert!(parse_zero_relevant_policy("sometimes").is_err());
        assert!(parse_missing_judgment_policy("maybe").is_err());
    }
}
