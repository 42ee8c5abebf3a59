//! Data-quality and financial summaries: whole-table totals and the
//! per-chain performance table.

use crate::analysis::aggregator::{group_by, Dimension, Measure, Metric, PROFIT_MARGIN};
use crate::analysis::metrics::{roi_score, to_crores};
use crate::error::AnalysisError;
use crate::loader::REQUIRED_COLUMNS;
use crate::models::{Dataset, Record, YearMonth};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Shape and validity of the loaded table.
#[derive(Debug, Clone, Serialize)]
pub struct DataQuality {
    pub rows: usize,
    pub columns: usize,
    pub first_period: YearMonth,
    pub last_period: YearMonth,
    pub missing_values: usize,
    pub duplicate_rows: usize,
    pub total_revenue: f64,
    /// Mean of per-row `net_margin_pct`.
    pub mean_net_margin: f64,
    pub store_count: usize,
    pub period_count: usize,
}

pub fn data_quality(dataset: &Dataset) -> Result<DataQuality, AnalysisError> {
    let records = dataset.records();
    let first_period = records
        .iter()
        .map(Record::period)
        .min()
        .ok_or(AnalysisError::EmptyDataset)?;
    let last_period = records
        .iter()
        .map(Record::period)
        .max()
        .ok_or(AnalysisError::EmptyDataset)?;
    let all: Vec<&Record> = records.iter().collect();
    let quality = dataset.quality();

    Ok(DataQuality {
        rows: records.len(),
        columns: REQUIRED_COLUMNS.len(),
        first_period,
        last_period,
        missing_values: quality.missing_values,
        duplicate_rows: quality.duplicate_rows,
        total_revenue: Metric::Sum(Measure::SalesAmount).evaluate(&all),
        mean_net_margin: Metric::Mean(Measure::NetMarginPct).evaluate(&all),
        store_count: Metric::CountDistinct(Dimension::StoreId).evaluate(&all) as usize,
        period_count: records.iter().map(Record::period).collect::<HashSet<_>>().len(),
    })
}

/// Whole-table totals with both margin aggregations side by side.
#[derive(Debug, Clone, Serialize)]
pub struct OverallPerformance {
    pub total_revenue: f64,
    pub total_profit: f64,
    /// `Σ net_profit / Σ sales_amount × 100`.
    pub overall_margin: f64,
    /// Mean of per-row `net_margin_pct`.
    pub average_margin: f64,
}

pub fn overall_performance(dataset: &Dataset) -> Result<OverallPerformance, AnalysisError> {
    if dataset.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }

    let all: Vec<&Record> = dataset.records().iter().collect();
    Ok(OverallPerformance {
        total_revenue: Metric::Sum(Measure::SalesAmount).evaluate(&all),
        total_profit: Metric::Sum(Measure::NetProfit).evaluate(&all),
        overall_margin: PROFIT_MARGIN.evaluate(&all) * 100.0,
        average_margin: Metric::Mean(Measure::NetMarginPct).evaluate(&all),
    })
}

/// One row of the per-chain table.
#[derive(Debug, Clone, Serialize)]
pub struct ChainPerformance {
    pub chain: String,
    pub total_sales: f64,
    pub avg_sales: f64,
    pub total_profit: f64,
    /// Mean of per-row `net_margin_pct`.
    pub avg_margin: f64,
    /// Ratio of sums: `total_profit / total_sales × 100`.
    pub profit_margin: f64,
    pub total_customers: f64,
    pub avg_satisfaction: f64,
    pub store_count: usize,
    /// `total_sales / 10,000,000`.
    pub sales_crores: f64,
    /// `avg_margin × total_customers / 100,000`.
    pub roi_score: f64,
}

pub fn chain_performance(dataset: &Dataset) -> Vec<ChainPerformance> {
    group_by(dataset.records(), &[Dimension::ChainName])
        .into_iter()
        .map(|group| {
            let total_sales = group.eval(Metric::Sum(Measure::SalesAmount));
            let total_profit = group.eval(Metric::Sum(Measure::NetProfit));
            let avg_margin = group.eval(Metric::Mean(Measure::NetMarginPct));
            let total_customers = group.eval(Metric::Sum(Measure::CustomerCount));

            ChainPerformance {
                chain: group.key.text(0),
                total_sales,
                avg_sales: group.eval(Metric::Mean(Measure::SalesAmount)),
                total_profit,
                avg_margin,
                profit_margin: group.eval(PROFIT_MARGIN) * 100.0,
                total_customers,
                avg_satisfaction: group.eval(Metric::Mean(Measure::CustomerSatisfactionScore)),
                store_count: group.eval(Metric::CountDistinct(Dimension::StoreId)) as usize,
                sales_crores: to_crores(total_sales),
                roi_score: roi_score(avg_margin, total_customers),
            }
        })
        .collect()
}

/// Chains ordered by mean margin, highest first. Ties keep table order and
/// undefined margins sort last.
pub fn rank_chains_by_margin(chains: &[ChainPerformance]) -> Vec<&ChainPerformance> {
    let mut ranked: Vec<&ChainPerformance> = chains.iter().collect();
    ranked.sort_by(|a, b| descending_nan_last(a.avg_margin, b.avg_margin));
    ranked
}

pub(crate) fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}
