//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.retail-insights.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".retail-insights.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Analysis thresholds and tier selection.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Chart rendering settings.
    #[serde(default)]
    pub charts: ChartConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Input CSV file.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Directory for chart images and exported reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_data_file() -> PathBuf {
    PathBuf::from("indian_retail_complete.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Thresholds used by the analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Stores listed in each of the top and bottom rankings.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Months shown in the recent-performance block.
    #[serde(default = "default_recent_months")]
    pub recent_months: usize,

    /// Correlations with `|r|` above this are reported as strong.
    #[serde(default = "default_strong_correlation")]
    pub strong_correlation: f64,

    /// Significance level for the tier t-test.
    #[serde(default = "default_significance_level")]
    pub significance_level: f64,

    /// First tier compared in the t-test.
    #[serde(default = "default_tier_a")]
    pub tier_a: String,

    /// Second tier compared in the t-test.
    #[serde(default = "default_tier_b")]
    pub tier_b: String,

    /// Margins above this percentage are tagged healthy.
    #[serde(default = "default_healthy_margin")]
    pub healthy_margin_pct: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            recent_months: default_recent_months(),
            strong_correlation: default_strong_correlation(),
            significance_level: default_significance_level(),
            tier_a: default_tier_a(),
            tier_b: default_tier_b(),
            healthy_margin_pct: default_healthy_margin(),
        }
    }
}

fn default_top_n() -> usize {
    5
}

fn default_recent_months() -> usize {
    6
}

fn default_strong_correlation() -> f64 {
    0.5
}

fn default_significance_level() -> f64 {
    0.05
}

fn default_tier_a() -> String {
    "Metro".to_string()
}

fn default_tier_b() -> String {
    "Tier_1".to_string()
}

fn default_healthy_margin() -> f64 {
    5.0
}

/// Chart rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Render PNG charts after the console report.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Image width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Image height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_width() -> u32 {
    1600
}

fn default_height() -> u32 {
    1200
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.general.data_file = data.clone();
        }
        if let Some(ref output_dir) = args.output_dir {
            self.general.output_dir = output_dir.clone();
        }
        if let Some(top_n) = args.top_n {
            self.analysis.top_n = top_n;
        }
        if args.no_charts {
            self.charts.enabled = false;
        }
    }

    /// Check values that would make an analysis meaningless.
    pub fn validate(&self) -> Result<(), String> {
        if self.analysis.top_n == 0 {
            return Err("top_n must be at least 1".to_string());
        }
        let alpha = self.analysis.significance_level;
        if alpha <= 0.0 || alpha >= 1.0 || alpha.is_nan() {
            return Err("significance_level must be between 0 and 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.analysis.strong_correlation) {
            return Err("strong_correlation must be between 0.0 and 1.0".to_string());
        }
        if self.charts.width < 200 || self.charts.height < 200 {
            return Err("Chart dimensions must be at least 200x200 pixels".to_string());
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.data_file, PathBuf::from("indian_retail_complete.csv"));
        assert_eq!(config.analysis.top_n, 5);
        assert_eq!(config.analysis.tier_a, "Metro");
        assert_eq!(config.analysis.tier_b, "Tier_1");
        assert_eq!(config.analysis.significance_level, 0.05);
        assert!(config.charts.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
data_file = "data/retail.csv"
output_dir = "reports"

[analysis]
top_n = 3
tier_b = "Tier_2"

[charts]
enabled = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.data_file, PathBuf::from("data/retail.csv"));
        assert_eq!(config.general.output_dir, PathBuf::from("reports"));
        assert_eq!(config.analysis.top_n, 3);
        assert_eq!(config.analysis.tier_a, "Metro");
        assert_eq!(config.analysis.tier_b, "Tier_2");
        assert_eq!(config.analysis.recent_months, 6);
        assert!(!config.charts.enabled);
        assert_eq!(config.charts.width, 1600);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.analysis.top_n = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.significance_level = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.charts.width = 50;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[analysis]"));
        assert!(toml_str.contains("[charts]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.analysis.top_n, 5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[analysis]\nrecent_months = 12\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.analysis.recent_months, 12);
        assert!(Config::load(&dir.path().join("missing.toml")).is_err());
    }
}
