//! Persistence layer for saving/loading evaluation reports.
//!
//! Supports both JSON (human-readable) and bincode (efficient binary) formats.

use crate::analyzer::ApproachReport;
use crate::comparison::ComparisonReport;
use crate::error::{EvalError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Save format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// JSON format (human-readable, larger).
    Json,
    /// Bincode format (binary, compact).
    Bincode,
}

impl SaveFormat {
    /// Determine format from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => SaveFormat::Json,
            Some("bin") | Some("bincode") => SaveFormat::Bincode,
            _ => SaveFormat::Json, // Default to JSON
        }
    }
}

/// Save an approach report to a file, format detected from the extension.
pub fn save_report(report: &ApproachReport, path: &Path) -> Result<()> {
    save(report, path)
}

/// Load an approach report from a file.
pub fn load_report(path: &Path) -> Result<ApproachReport> {
    load(path)
}

/// Save a comparison report to a file.
pub fn save_comparison(report: &ComparisonReport, path: &Path) -> Result<()> {
    save(report, path)
}

/// Load a comparison report from a file.
pub fn load_comparison(path: &Path) -> Result<ComparisonReport> {
    load(path)
}

fn save<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| EvalError::io(parent, e))?;
        }
    }

    let data = match SaveFormat::from_path(path) {
        SaveFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| EvalError::Serialization(e.to_string()))?
            .into_bytes(),
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            bincode::serde::encode_to_vec(value, config)
                .map_err(|e| EvalError::Serialization(e.to_string()))?
        }
    };

    fs::write(path, &data).map_err(|e| EvalError::io(path, e))?;

    Ok(())
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(EvalError::ReportNotFound(path.to_path_buf()));
    }

    let data = fs::read(path).map_err(|e| EvalError::io(path, e))?;

    let value = match SaveFormat::from_path(path) {
        SaveFormat::Json => {
            let json_str = String::from_utf8(data)
                .map_err(|e| EvalError::Serialization(e.to_string()))?;
            serde_json::from_str(&json_str)
                .map_err(|e| EvalError::Serialization(e.to_string()))?
        }
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            let (value, _): (T, usize) = bincode::serde::decode_from_slice(&data, config)
                .map_err(|e| EvalError::Serialization(e.to_string()))?;
            value
        }
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Evaluator;
    use crate::comparison::{ComparisonConfig, compare};
    use crate::judgments::JudgmentSet;
    use crate::results::{Hit, QueryResult, ResultSet};
    use tempfile::TempDir;

    fn create_test_report() -> ApproachReport {
        let mut results = ResultSet::new("bm25-baseline");
        results.push(QueryResult::new(
            "q1",
            vec![Hit::new("d1", 3.2), Hit::new("d4", 1.1)],
        ));
        let mut judgments = JudgmentSet::new();
        judgments.insert_relevant("q1", ["d1", "d2"]);
        Evaluator::with_defaults()
            .evaluate(&results, &judgments)
            .unwrap()
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");

        let original = create_test_report();
        save_report(&original, &path).unwrap();

        let loaded = load_report(&path).unwrap();
        assert_eq!(loaded.approach, original.approach);
        assert_eq!(loaded.len(), original.len());
        assert_eq!(
            loaded.query("q1").unwrap().fscore,
            original.query("q1").unwrap().fscore
        );
    }

    #[test]
    fn test_save_and_load_bincode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.bin");

        let original = create_test_report();
        save_report(&original, &path).unwrap();

        let loaded = load_report(&path).unwrap();
        assert_eq!(loaded.approach, original.approach);
        assert_eq!(loaded.aggregate.scored_queries, original.aggregate.scored_queries);
    }

    #[test]
    fn test_save_and_load_comparison() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("comparison.json");

        let a = create_test_report();
        let mut b = create_test_report();
        b.approach = "candidate".to_string();
        let original = compare(&a, &b, &ComparisonConfig::default()).unwrap();

        save_comparison(&original, &path).unwrap();
        let loaded = load_comparison(&path).unwrap();
        assert_eq!(loaded.approach_a, "bm25-baseline");
        assert_eq!(loaded.approach_b, "candidate");
        assert_eq!(loaded.len(), original.len());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            SaveFormat::from_path(Path::new("report.json")),
            SaveFormat::Json
        );
        assert_eq!(
            SaveFormat::from_path(Path::new("report.bin")),
            SaveFormat::Bincode
        );
        assert_eq!(SaveFormat::from_path(Path::new("report")), SaveFormat::Json);
    }

    #[test]
    fn test_load_nonexistent() {
        let result = load_report(Path::new("/nonexistent/report.json"));
        assert!(matches!(result, Err(EvalError::ReportNotFound(_))));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/reports/report.json");

        let report = create_test_report();
        save_report(&report, &path).unwrap();
        assert!(path.exists());
    }
}
