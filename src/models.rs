//! Data models for the retail analytics engine.
//!
//! This module contains the immutable input table (`Record`, `Dataset`)
//! and the small value types shared by the analysis and report layers.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One (store, month) observation.
///
/// Blank numeric cells are missing values: measures read as `NaN` and
/// counts as `None`. Reductions skip them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub store_id: String,
    pub chain_name: String,
    pub category: String,
    pub region: String,
    pub tier: String,
    pub year: i32,
    pub month: u32,
    /// Revenue in rupees. Never negative.
    #[serde(deserialize_with = "blank_as_nan")]
    pub sales_amount: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub net_profit: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub gross_margin_pct: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub net_margin_pct: f64,
    pub customer_count: Option<u64>,
    #[serde(deserialize_with = "blank_as_nan")]
    pub avg_basket_value: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub inventory_turnover_ratio: f64,
    /// Satisfaction on a 1-5 scale.
    #[serde(deserialize_with = "blank_as_nan")]
    pub customer_satisfaction_score: f64,
    pub total_items_sold: Option<u64>,
}

fn blank_as_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl Record {
    /// Calendar month of this observation.
    pub fn period(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }
}

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// The first day of the month, or `None` for an out-of-range month.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Human-readable label such as "Jan 2023".
    pub fn long_label(&self) -> String {
        match self.first_day() {
            Some(date) => date.format("%b %Y").to_string(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Counts gathered while reading the raw table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QualityCounts {
    /// Empty fields across all rows.
    pub missing_values: usize,
    /// Rows identical to an earlier row in every field.
    pub duplicate_rows: usize,
}

/// The immutable input table. Loaded once, never mutated.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    quality: QualityCounts,
}

impl Dataset {
    #[cfg(test)]
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            quality: QualityCounts::default(),
        }
    }

    pub(crate) fn with_quality(records: Vec<Record>, quality: QualityCounts) -> Self {
        Self { records, quality }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn quality(&self) -> QualityCounts {
        self.quality
    }

    /// Rows whose `tier` equals `tier` exactly.
    pub fn filter_tier<'a>(&'a self, tier: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records.iter().filter(move |r| r.tier == tier)
    }
}

/// Qualitative tag attached to a margin figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginHealth {
    /// Margin above the healthy threshold.
    Healthy,
    /// Positive margin at or below the threshold.
    Marginal,
    /// Zero or negative margin.
    Loss,
    /// Margin could not be computed.
    Undefined,
}

impl MarginHealth {
    /// Classify a percentage margin against `healthy_threshold`.
    pub fn classify(margin_pct: f64, healthy_threshold: f64) -> Self {
        if margin_pct.is_nan() {
            MarginHealth::Undefined
        } else if margin_pct > healthy_threshold {
            MarginHealth::Healthy
        } else if margin_pct > 0.0 {
            MarginHealth::Marginal
        } else {
            MarginHealth::Loss
        }
    }

    /// Returns an emoji representation of the health tag.
    pub fn emoji(&self) -> &'static str {
        match self {
            MarginHealth::Healthy => "✅",
            MarginHealth::Marginal => "⚠️",
            MarginHealth::Loss => "❌",
            MarginHealth::Undefined => "❔",
        }
    }
}

impl fmt::Display for MarginHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginHealth::Healthy => write!(f, "healthy"),
            MarginHealth::Marginal => write!(f, "marginal"),
            MarginHealth::Loss => write!(f, "loss"),
            MarginHealth::Undefined => write!(f, "N/A"),
        }
    }
}

/// Direction indicator for a period-over-period growth rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthTrend {
    Up,
    Down,
    Flat,
}

impl GrowthTrend {
    /// Up when growth is positive, down when it falls below -5%.
    pub fn from_growth(growth_pct: f64) -> Self {
        if growth_pct > 0.0 {
            GrowthTrend::Up
        } else if growth_pct < -5.0 {
            GrowthTrend::Down
        } else {
            GrowthTrend::Flat
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            GrowthTrend::Up => "📈",
            GrowthTrend::Down => "📉",
            GrowthTrend::Flat => "📊",
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build a record with the measures that matter for most tests.
    pub fn record(store: &str, chain: &str, sales: f64, profit: f64) -> Record {
        Record {
            store_id: store.to_string(),
            chain_name: chain.to_string(),
            category: "Grocery".to_string(),
            region: "North".to_string(),
            tier: "Metro".to_string(),
            year: 2023,
            month: 1,
            sales_amount: sales,
            net_profit: profit,
            gross_margin_pct: 20.0,
            net_margin_pct: if sales == 0.0 { 0.0 } else { profit / sales * 100.0 },
            customer_count: Some(100),
            avg_basket_value: 500.0,
            inventory_turnover_ratio: 6.0,
            customer_satisfaction_score: 4.0,
            total_items_sold: Some(1000),
        }
    }

    /// The shared 12-store, 4-month sample table.
    pub fn sample_dataset() -> Dataset {
        crate::loader::load_from_reader(
            include_str!("../fixtures/retail_sample.csv").as_bytes(),
        )
        .expect("fixture must load")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_month_ordering_and_label() {
        let a = YearMonth { year: 2023, month: 12 };
        let b = YearMonth { year: 2024, month: 1 };
        assert!(a < b);
        assert_eq!(a.to_string(), "2023-12");
        assert_eq!(b.long_label(), "Jan 2024");
        assert_eq!(a.first_day(), NaiveDate::from_ymd_opt(2023, 12, 1));
    }

    #[test]
    fn test_margin_health_classification() {
        assert_eq!(MarginHealth::classify(12.0, 5.0), MarginHealth::Healthy);
        assert_eq!(MarginHealth::classify(5.0, 5.0), MarginHealth::Marginal);
        assert_eq!(MarginHealth::classify(0.1, 5.0), MarginHealth::Marginal);
        assert_eq!(MarginHealth::classify(0.0, 5.0), MarginHealth::Loss);
        assert_eq!(MarginHealth::classify(-3.0, 5.0), MarginHealth::Loss);
        assert_eq!(MarginHealth::classify(f64::NAN, 5.0), MarginHealth::Undefined);
    }

    #[test]
    fn test_growth_trend() {
        assert_eq!(GrowthTrend::from_growth(0.5), GrowthTrend::Up);
        assert_eq!(GrowthTrend::from_growth(-2.0), GrowthTrend::Flat);
        assert_eq!(GrowthTrend::from_growth(-7.5), GrowthTrend::Down);
        assert_eq!(GrowthTrend::from_growth(f64::NAN), GrowthTrend::Flat);
    }

    #[test]
    fn test_filter_tier_is_exact_match() {
        let mut metro = fixtures::record("S1", "A", 100.0, 10.0);
        metro.tier = "Metro".to_string();
        let mut lower = metro.clone();
        lower.tier = "metro".to_string();
        let dataset = Dataset::new(vec![metro, lower]);
        assert_eq!(dataset.filter_tier("Metro").count(), 1);
    }
}
