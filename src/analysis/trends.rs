//! Monthly time series, growth rates and seasonality.

use crate::analysis::aggregator::{group_by, Dimension, Measure, Metric, PROFIT_MARGIN};
use crate::analysis::metrics::{argmax_first, argmin_first, growth_rates};
use crate::error::AnalysisError;
use crate::models::{Dataset, GrowthTrend, YearMonth};
use serde::Serialize;

/// Totals for one calendar month, in chronological order.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyTrend {
    pub period: YearMonth,
    pub total_sales: f64,
    pub total_profit: f64,
    pub total_customers: f64,
    pub profit_margin: f64,
    /// Growth over the previous month; `NaN` for the first month.
    pub sales_growth: f64,
    pub customer_growth: f64,
}

impl MonthlyTrend {
    pub fn trend(&self) -> GrowthTrend {
        GrowthTrend::from_growth(self.sales_growth)
    }
}

pub fn monthly_trends(dataset: &Dataset) -> Vec<MonthlyTrend> {
    // (year, month) keys sort chronologically
    let groups = group_by(dataset.records(), &[Dimension::Year, Dimension::Month]);

    let sales: Vec<f64> = groups
        .iter()
        .map(|g| g.eval(Metric::Sum(Measure::SalesAmount)))
        .collect();
    let customers: Vec<f64> = groups
        .iter()
        .map(|g| g.eval(Metric::Sum(Measure::CustomerCount)))
        .collect();
    let sales_growth = growth_rates(&sales);
    let customer_growth = growth_rates(&customers);

    groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            MonthlyTrend {
                period: group.rows[0].period(),
                total_sales: sales[i],
                total_profit: group.eval(Metric::Sum(Measure::NetProfit)),
                total_customers: customers[i],
                profit_margin: group.eval(PROFIT_MARGIN) * 100.0,
                sales_growth: sales_growth[i],
                customer_growth: customer_growth[i],
            }
        })
        .collect()
}

/// The last `n` months of a chronological series.
pub fn recent(trends: &[MonthlyTrend], n: usize) -> &[MonthlyTrend] {
    &trends[trends.len().saturating_sub(n)..]
}

/// Mean row sales per calendar month across all years.
#[derive(Debug, Clone, Serialize)]
pub struct Seasonality {
    /// `(month, mean sales_amount)` for months present, ascending by month.
    pub monthly_means: Vec<(u32, f64)>,
    pub peak_month: u32,
    pub peak_sales: f64,
    pub low_month: u32,
    pub low_sales: f64,
}

pub fn seasonality(dataset: &Dataset) -> Result<Seasonality, AnalysisError> {
    let monthly_means: Vec<(u32, f64)> = group_by(dataset.records(), &[Dimension::Month])
        .iter()
        .map(|g| (g.rows[0].month, g.eval(Metric::Mean(Measure::SalesAmount))))
        .collect();

    let means: Vec<f64> = monthly_means.iter().map(|(_, mean)| *mean).collect();
    let peak = argmax_first(&means).ok_or(AnalysisError::EmptyDataset)?;
    let low = argmin_first(&means).ok_or(AnalysisError::EmptyDataset)?;

    Ok(Seasonality {
        peak_month: monthly_means[peak].0,
        peak_sales: monthly_means[peak].1,
        low_month: monthly_means[low].0,
        low_sales: monthly_means[low].1,
        monthly_means,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{record, sample_dataset};
    use crate::models::Record;

    fn at(year: i32, month: u32, sales: f64, customers: u64) -> Record {
        let mut r = record("S1", "A", sales, sales / 10.0);
        r.year = year;
        r.month = month;
        r.customer_count = Some(customers);
        r
    }

    #[test]
    fn test_monthly_trends_chronological_with_growth() {
        let dataset = Dataset::new(vec![
            at(2024, 1, 60.0, 10),
            at(2023, 12, 100.0, 10),
            at(2024, 1, 60.0, 10),
            at(2023, 11, 80.0, 20),
        ]);
        let trends = monthly_trends(&dataset);

        let labels: Vec<String> = trends.iter().map(|t| t.period.to_string()).collect();
        assert_eq!(labels, vec!["2023-11", "2023-12", "2024-01"]);
        assert!(trends[0].sales_growth.is_nan());
        assert!(trends[0].customer_growth.is_nan());
        assert_eq!(trends[1].sales_growth, 25.0);
        assert_eq!(trends[1].customer_growth, -50.0);
        assert_eq!(trends[2].sales_growth, 20.0);
        assert_eq!(trends[2].total_sales, 120.0);
        assert_eq!(trends[2].trend(), GrowthTrend::Up);
    }

    #[test]
    fn test_recent_months_window() {
        let trends = monthly_trends(&sample_dataset());
        assert_eq!(trends.len(), 4);
        assert_eq!(recent(&trends, 6).len(), 4);
        let last_two = recent(&trends, 2);
        assert_eq!(last_two[0].period, YearMonth { year: 2024, month: 1 });
        assert_eq!(last_two[1].period, YearMonth { year: 2024, month: 2 });
    }

    #[test]
    fn test_seasonality_uses_row_means_across_years() {
        let dataset = Dataset::new(vec![
            at(2023, 1, 100.0, 1),
            at(2024, 1, 300.0, 1),
            at(2023, 6, 250.0, 1),
            at(2023, 6, 50.0, 1),
            at(2023, 7, 150.0, 1),
        ]);
        let season = seasonality(&dataset).unwrap();
        assert_eq!(season.monthly_means, vec![(1, 200.0), (6, 150.0), (7, 150.0)]);
        assert_eq!(season.peak_month, 1);
        assert_eq!(season.peak_sales, 200.0);
        // Tie between June and July: first in month order wins
        assert_eq!(season.low_month, 6);
    }

    #[test]
    fn test_seasonality_empty_dataset() {
        assert_eq!(
            seasonality(&Dataset::new(Vec::new())).unwrap_err(),
            AnalysisError::EmptyDataset
        );
    }
}
