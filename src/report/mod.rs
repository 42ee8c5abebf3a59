//! Report rendering.
//!
//! The analysis layer produces plain tables; this module bundles them into
//! a [`Report`] and renders it for the console, Markdown or JSON.

pub mod console;
pub mod format;
pub mod markdown;

use crate::analysis::{
    CategoryPerformance, ChainPerformance, CorrelationMatrix, CorrelationPair, DataQuality,
    ExecutiveSummary, MonthlyTrend, OverallPerformance, PivotTable, RegionPerformance,
    Seasonality, StoreEfficiency, StoreRanking, TTestResult, TierPerformance,
};
use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::Path;

pub use console::{print_analysis_sections, print_executive_summary};
pub use markdown::generate_markdown_report;

/// Metadata about one report run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Input file the dataset was loaded from.
    pub data_file: String,
    /// When the report was generated.
    pub generated_at: DateTime<Local>,
    /// Number of input records.
    pub records: usize,
    /// Months shown in the recent-performance block.
    pub recent_months: usize,
    /// Wall-clock time spent on the analyses.
    pub duration_seconds: f64,
}

/// Every table produced by one run, in report order.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub quality: DataQuality,
    pub overall: OverallPerformance,
    pub chains: Vec<ChainPerformance>,
    pub categories: Vec<CategoryPerformance>,
    pub regions: Vec<RegionPerformance>,
    pub tiers: Vec<TierPerformance>,
    pub monthly: Vec<MonthlyTrend>,
    pub seasonality: Seasonality,
    pub stores: Vec<StoreEfficiency>,
    pub store_ranking: StoreRanking,
    pub correlations: CorrelationMatrix,
    pub strong_correlations: Vec<CorrelationPair>,
    pub tier_test: TTestResult,
    pub category_margin_by_chain: PivotTable,
    pub summary: ExecutiveSummary,
}

/// Generate a JSON report. Undefined values serialize as `null`.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Render `report` in `format` and write it to `path`.
pub fn write_export(report: &Report, path: &Path, format: OutputFormat) -> Result<()> {
    let content = match format {
        OutputFormat::Json => generate_json_report(report)?,
        OutputFormat::Markdown => generate_markdown_report(report),
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::Config;
    use crate::models::fixtures::sample_dataset;

    /// A complete report over the sample fixture.
    pub fn sample_report() -> Report {
        crate::pipeline::build_report(&sample_dataset(), &Config::default(), "fixtures/retail_sample.csv")
            .expect("sample report must build")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::sample_report;
    use super::*;

    #[test]
    fn test_generate_json_report() {
        let report = sample_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"chains\""));
        assert!(json.contains("\"tier_test\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        // First month has no predecessor
        assert!(value["monthly"][0]["sales_growth"].is_null());
        assert_eq!(value["quality"]["rows"], 48);
    }

    #[test]
    fn test_write_export_both_formats() {
        let report = sample_report();
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("report.json");
        write_export(&report, &json_path, OutputFormat::Json).unwrap();
        let json = std::fs::read_to_string(&json_path).unwrap();
        assert!(json.starts_with('{'));

        let md_path = dir.path().join("report.md");
        write_export(&report, &md_path, OutputFormat::Markdown).unwrap();
        let markdown = std::fs::read_to_string(&md_path).unwrap();
        assert!(markdown.starts_with("# Retail Performance Report"));
    }

    #[test]
    fn test_write_export_bad_path() {
        let report = sample_report();
        let result = write_export(
            &report,
            Path::new("/nonexistent/dir/report.md"),
            OutputFormat::Markdown,
        );
        assert!(result.is_err());
    }
}
