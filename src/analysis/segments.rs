//! Category, region and city-tier performance tables.

use crate::analysis::aggregator::{group_by, Dimension, Measure, Metric, PROFIT_MARGIN};
use crate::analysis::financial::descending_nan_last;
use crate::analysis::metrics::{ratio, share_pct};
use crate::models::{Dataset, MarginHealth};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CategoryPerformance {
    pub category: String,
    pub total_sales: f64,
    pub total_profit: f64,
    pub avg_gross_margin: f64,
    pub avg_net_margin: f64,
    pub total_customers: f64,
    pub avg_inventory_turnover: f64,
    /// Share of all-category sales, in percent.
    pub sales_share_pct: f64,
    /// Share of all-category profit, in percent.
    pub profit_contribution_pct: f64,
    pub health: MarginHealth,
}

pub fn category_performance(dataset: &Dataset, healthy_margin_pct: f64) -> Vec<CategoryPerformance> {
    let groups = group_by(dataset.records(), &[Dimension::Category]);

    let sales: Vec<f64> = groups
        .iter()
        .map(|g| g.eval(Metric::Sum(Measure::SalesAmount)))
        .collect();
    let profits: Vec<f64> = groups
        .iter()
        .map(|g| g.eval(Metric::Sum(Measure::NetProfit)))
        .collect();
    let sales_shares = share_pct(&sales);
    let profit_shares = share_pct(&profits);

    groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let avg_net_margin = group.eval(Metric::Mean(Measure::NetMarginPct));
            CategoryPerformance {
                category: group.key.text(0),
                total_sales: sales[i],
                total_profit: profits[i],
                avg_gross_margin: group.eval(Metric::Mean(Measure::GrossMarginPct)),
                avg_net_margin,
                total_customers: group.eval(Metric::Sum(Measure::CustomerCount)),
                avg_inventory_turnover: group.eval(Metric::Mean(Measure::InventoryTurnoverRatio)),
                sales_share_pct: sales_shares[i],
                profit_contribution_pct: profit_shares[i],
                health: MarginHealth::classify(avg_net_margin, healthy_margin_pct),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionPerformance {
    pub region: String,
    pub total_sales: f64,
    pub total_profit: f64,
    pub store_count: usize,
    pub total_customers: f64,
    /// `total_sales / store_count`.
    pub sales_per_store: f64,
    /// Ratio of sums: `total_profit / total_sales × 100`.
    pub profit_margin: f64,
    pub sales_share_pct: f64,
}

pub fn region_performance(dataset: &Dataset) -> Vec<RegionPerformance> {
    let groups = group_by(dataset.records(), &[Dimension::Region]);
    let sales: Vec<f64> = groups
        .iter()
        .map(|g| g.eval(Metric::Sum(Measure::SalesAmount)))
        .collect();
    let shares = share_pct(&sales);

    groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let total_profit = group.eval(Metric::Sum(Measure::NetProfit));
            let store_count = group.eval(Metric::CountDistinct(Dimension::StoreId));
            RegionPerformance {
                region: group.key.text(0),
                total_sales: sales[i],
                total_profit,
                store_count: store_count as usize,
                total_customers: group.eval(Metric::Sum(Measure::CustomerCount)),
                sales_per_store: ratio(sales[i], store_count),
                profit_margin: group.eval(PROFIT_MARGIN) * 100.0,
                sales_share_pct: shares[i],
            }
        })
        .collect()
}

/// Regions ordered by total sales, highest first (stable).
pub fn rank_regions_by_sales(regions: &[RegionPerformance]) -> Vec<&RegionPerformance> {
    let mut ranked: Vec<&RegionPerformance> = regions.iter().collect();
    ranked.sort_by(|a, b| descending_nan_last(a.total_sales, b.total_sales));
    ranked
}

#[derive(Debug, Clone, Serialize)]
pub struct TierPerformance {
    pub tier: String,
    pub total_sales: f64,
    pub avg_net_margin: f64,
    pub avg_basket_value: f64,
    pub avg_satisfaction: f64,
}

pub fn tier_performance(dataset: &Dataset) -> Vec<TierPerformance> {
    group_by(dataset.records(), &[Dimension::Tier])
        .into_iter()
        .map(|group| TierPerformance {
            tier: group.key.text(0),
            total_sales: group.eval(Metric::Sum(Measure::SalesAmount)),
            avg_net_margin: group.eval(Metric::Mean(Measure::NetMarginPct)),
            avg_basket_value: group.eval(Metric::Mean(Measure::AvgBasketValue)),
            avg_satisfaction: group.eval(Metric::Mean(Measure::CustomerSatisfactionScore)),
        })
        .collect()
}
