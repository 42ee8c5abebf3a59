//! Command-line interface argument parsing.
//!
//! Every flag is optional: running the binary with no arguments executes
//! the full report sequence with the defaults from the configuration.

use clap::Parser;
use std::path::PathBuf;

/// Retail Insights - performance analytics for retail chains
///
/// Loads a (store, month) retail table, prints financial, category,
/// regional, time-series, operational and statistical reports, and
/// renders summary charts.
///
/// Examples:
///   retail-insights
///   retail-insights --data indian_retail_complete.csv --output-dir reports
///   retail-insights --no-charts --export summary.json --format json
///   retail-insights --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// CSV file with one row per store and month
    ///
    /// Defaults to the config value, or indian_retail_complete.csv.
    #[arg(short, long, value_name = "FILE", env = "RETAIL_INSIGHTS_DATA")]
    pub data: Option<PathBuf>,

    /// Directory for chart images
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .retail-insights.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Also write every summary table to this file
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Export format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Number of stores in the top and bottom rankings
    #[arg(long, value_name = "N")]
    pub top_n: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no progress bar)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .retail-insights.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the exported report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top_n == Some(0) {
            return Err("--top-n must be at least 1".to_string());
        }

        if let Some(ref data) = self.data {
            if data.is_dir() {
                return Err(format!("Data path is a directory: {}", data.display()));
            }
        }

        if let Some(ref dir) = self.output_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(format!(
                    "Output path is not a directory: {}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            data: None,
            output_dir: None,
            config: None,
            no_charts: false,
            export: None,
            format: OutputFormat::Markdown,
            top_n: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_no_arguments_is_valid() {
        let args = Args::try_parse_from(["retail-insights"]).unwrap();
        assert!(!args.no_charts);
        assert_eq!(args.format, OutputFormat::Markdown);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "retail-insights",
            "--data",
            "sales.csv",
            "--no-charts",
            "--export",
            "out.json",
            "--format",
            "json",
            "--top-n",
            "3",
        ])
        .unwrap();
        assert_eq!(args.data, Some(PathBuf::from("sales.csv")));
        assert!(args.no_charts);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.top_n, Some(3));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_top_n() {
        let mut args = make_args();
        args.top_n = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_merge_only_overrides_explicit_values() {
        let mut config = crate::config::Config::default();
        config.analysis.top_n = 7;

        let mut args = make_args();
        args.data = Some(PathBuf::from("other.csv"));
        args.no_charts = true;
        config.merge_with_args(&args);

        assert_eq!(config.general.data_file, PathBuf::from("other.csv"));
        assert_eq!(config.analysis.top_n, 7);
        assert!(!config.charts.enabled);
    }
}
