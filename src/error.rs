//! Error types for loading, analysis and chart rendering.
//!
//! Library-level failures are typed here; the binary wraps them with
//! `anyhow` context naming the report step that failed.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading the input table.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to open data file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV at line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("Schema error: required column '{0}' is missing")]
    MissingColumn(&'static str),

    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("Data file contains no records")]
    Empty,
}

/// Failures raised by a reduction or statistical test.
#[derive(Error, Debug, PartialEq)]
pub enum AnalysisError {
    #[error("No rows match {dimension} = '{value}'")]
    EmptyGroup {
        dimension: &'static str,
        value: String,
    },

    #[error("Not enough observations for {test}: {observed} rows, at least {required} required")]
    InsufficientObservations {
        test: &'static str,
        observed: usize,
        required: usize,
    },

    #[error("Dataset is empty")]
    EmptyDataset,
}

/// Failures while drawing a chart.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to save chart: {0}")]
    FileSave(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_message_names_column() {
        let err = LoadError::MissingColumn("net_profit");
        assert!(err.to_string().contains("net_profit"));
    }

    #[test]
    fn test_empty_group_message() {
        let err = AnalysisError::EmptyGroup {
            dimension: "tier",
            value: "Tier_9".to_string(),
        };
        assert_eq!(err.to_string(), "No rows match tier = 'Tier_9'");
    }
}
