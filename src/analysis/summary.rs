//! Executive summary: headline totals, leaders by mean margin, and
//! recommendations derived from the segment tables.

use crate::analysis::aggregator::{group_by, Dimension, Measure, Metric};
use crate::analysis::financial::{data_quality, overall_performance};
use crate::analysis::metrics::{argmax_first, argmin_first};
use crate::error::AnalysisError;
use crate::models::{Dataset, YearMonth};
use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ExecutiveSummary {
    pub total_revenue: f64,
    pub total_profit: f64,
    pub overall_margin: f64,
    pub store_count: usize,
    pub first_period: YearMonth,
    pub last_period: YearMonth,
    pub period_count: usize,
    pub best_chain: String,
    pub best_category: String,
    pub best_region: String,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Local>,
}

impl ExecutiveSummary {
    /// e.g. "4 months (Nov 2023 - Feb 2024)".
    pub fn period_label(&self) -> String {
        format!(
            "{} months ({} - {})",
            self.period_count,
            self.first_period.long_label(),
            self.last_period.long_label()
        )
    }
}

/// The group of `dimension` with the highest (or lowest) value of `metric`.
/// Ties go to the first group in key order.
fn leader(dataset: &Dataset, dimension: Dimension, metric: Metric, highest: bool) -> Option<String> {
    let groups = group_by(dataset.records(), &[dimension]);
    let values: Vec<f64> = groups.iter().map(|g| g.eval(metric)).collect();
    let index = if highest {
        argmax_first(&values)
    } else {
        argmin_first(&values)
    }?;
    Some(groups[index].key.text(0))
}

fn required_leader(
    dataset: &Dataset,
    dimension: Dimension,
    metric: Metric,
    highest: bool,
) -> Result<String, AnalysisError> {
    leader(dataset, dimension, metric, highest).ok_or(AnalysisError::EmptyDataset)
}

pub fn executive_summary(dataset: &Dataset) -> Result<ExecutiveSummary, AnalysisError> {
    let quality = data_quality(dataset)?;
    let overall = overall_performance(dataset)?;
    let mean_margin = Metric::Mean(Measure::NetMarginPct);
    let total_sales = Metric::Sum(Measure::SalesAmount);

    let best_chain = required_leader(dataset, Dimension::ChainName, mean_margin, true)?;
    let best_category = required_leader(dataset, Dimension::Category, mean_margin, true)?;
    let best_region = required_leader(dataset, Dimension::Region, mean_margin, true)?;

    let mut recommendations = vec![format!(
        "Expand the {} category, which leads on average margin",
        best_category
    )];
    if let Some(weakest) = leader(dataset, Dimension::Category, mean_margin, false) {
        if weakest != best_category {
            recommendations.push(format!("Optimize {} category operations", weakest));
        }
    }
    if let Some(top_region) = leader(dataset, Dimension::Region, total_sales, true) {
        recommendations.push(format!(
            "Focus growth investments in the {} region, the largest by revenue",
            top_region
        ));
    }
    if let Some(weak_tier) = leader(dataset, Dimension::Tier, mean_margin, false) {
        recommendations.push(format!(
            "Implement operational efficiency programs in {} cities",
            weak_tier
        ));
    }

    Ok(ExecutiveSummary {
        total_revenue: overall.total_revenue,
        total_profit: overall.total_profit,
        overall_margin: overall.overall_margin,
        store_count: quality.store_count,
        first_period: quality.first_period,
        last_period: quality.last_period,
        period_count: quality.period_count,
        best_chain,
        best_category,
        best_region,
        recommendations,
        generated_at: Local::now(),
    })
}
