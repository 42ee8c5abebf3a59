//! Grouped reductions over the retail table.
//!
//! A reduction groups rows by one or more categorical [`Dimension`]s and
//! evaluates a list of [`Metric`]s over each group. Groups come back in
//! ascending key order; rows inside a group keep their input order.

use crate::analysis::metrics::ratio;
use crate::models::{Dataset, Record};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Categorical columns usable as grouping keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    StoreId,
    ChainName,
    Category,
    Region,
    Tier,
    Year,
    Month,
}

impl Dimension {
    /// Column name in the input table.
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::StoreId => "store_id",
            Dimension::ChainName => "chain_name",
            Dimension::Category => "category",
            Dimension::Region => "region",
            Dimension::Tier => "tier",
            Dimension::Year => "year",
            Dimension::Month => "month",
        }
    }

    pub fn value(&self, record: &Record) -> KeyValue {
        match self {
            Dimension::StoreId => KeyValue::Text(record.store_id.clone()),
            Dimension::ChainName => KeyValue::Text(record.chain_name.clone()),
            Dimension::Category => KeyValue::Text(record.category.clone()),
            Dimension::Region => KeyValue::Text(record.region.clone()),
            Dimension::Tier => KeyValue::Text(record.tier.clone()),
            Dimension::Year => KeyValue::Int(i64::from(record.year)),
            Dimension::Month => KeyValue::Int(i64::from(record.month)),
        }
    }
}

/// Numeric columns usable as reduction inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    SalesAmount,
    NetProfit,
    GrossMarginPct,
    NetMarginPct,
    CustomerCount,
    AvgBasketValue,
    InventoryTurnoverRatio,
    CustomerSatisfactionScore,
    TotalItemsSold,
}

impl Measure {
    pub fn column(&self) -> &'static str {
        match self {
            Measure::SalesAmount => "sales_amount",
            Measure::NetProfit => "net_profit",
            Measure::GrossMarginPct => "gross_margin_pct",
            Measure::NetMarginPct => "net_margin_pct",
            Measure::CustomerCount => "customer_count",
            Measure::AvgBasketValue => "avg_basket_value",
            Measure::InventoryTurnoverRatio => "inventory_turnover_ratio",
            Measure::CustomerSatisfactionScore => "customer_satisfaction_score",
            Measure::TotalItemsSold => "total_items_sold",
        }
    }

    /// Value of this measure in `record`; `NaN` when the cell was blank.
    pub fn value(&self, record: &Record) -> f64 {
        match self {
            Measure::SalesAmount => record.sales_amount,
            Measure::NetProfit => record.net_profit,
            Measure::GrossMarginPct => record.gross_margin_pct,
            Measure::NetMarginPct => record.net_margin_pct,
            Measure::CustomerCount => record.customer_count.map_or(f64::NAN, |c| c as f64),
            Measure::AvgBasketValue => record.avg_basket_value,
            Measure::InventoryTurnoverRatio => record.inventory_turnover_ratio,
            Measure::CustomerSatisfactionScore => record.customer_satisfaction_score,
            Measure::TotalItemsSold => record.total_items_sold.map_or(f64::NAN, |c| c as f64),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A reduction evaluated over the rows of one group.
///
/// `Sum` and `Mean` skip missing values; a mean with nothing left to
/// average is `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Sum(Measure),
    Mean(Measure),
    CountDistinct(Dimension),
    /// `Σ numerator / Σ denominator`. Not the mean of per-row ratios.
    RatioOfSums {
        numerator: Measure,
        denominator: Measure,
    },
}

impl Metric {
    /// Evaluate over `rows`. Undefined results (empty mean, zero
    /// denominator) are `NaN`.
    pub fn evaluate(&self, rows: &[&Record]) -> f64 {
        match self {
            Metric::Sum(measure) => present(rows, *measure).sum(),
            Metric::Mean(measure) => {
                let (total, count) = present(rows, *measure)
                    .fold((0.0, 0usize), |(total, count), v| (total + v, count + 1));
                ratio(total, count as f64)
            }
            Metric::CountDistinct(dimension) => {
                let distinct: HashSet<KeyValue> = rows.iter().map(|r| dimension.value(r)).collect();
                distinct.len() as f64
            }
            Metric::RatioOfSums {
                numerator,
                denominator,
            } => ratio(
                present(rows, *numerator).sum(),
                present(rows, *denominator).sum(),
            ),
        }
    }
}

/// `Σ net_profit / Σ sales_amount`, the pooled profit margin as a fraction.
pub const PROFIT_MARGIN: Metric = Metric::RatioOfSums {
    numerator: Measure::NetProfit,
    denominator: Measure::SalesAmount,
};

fn present<'a>(rows: &'a [&Record], measure: Measure) -> impl Iterator<Item = f64> + 'a {
    rows.iter().map(move |r| measure.value(r)).filter(|v| !v.is_nan())
}

/// One component of a grouping key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(i) => write!(f, "{}", i),
            KeyValue::Text(s) => f.write_str(s),
        }
    }
}

/// A full grouping key, one value per grouped dimension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupKey(pub Vec<KeyValue>);

impl GroupKey {
    /// Text of the key component at `index`, or an empty string.
    pub fn text(&self, index: usize) -> String {
        self.0.get(index).map(ToString::to_string).unwrap_or_default()
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" / "))
    }
}

/// Rows sharing one key value.
#[derive(Debug, Clone)]
pub struct Group<'a> {
    pub key: GroupKey,
    pub rows: Vec<&'a Record>,
}

impl Group<'_> {
    pub fn eval(&self, metric: Metric) -> f64 {
        metric.evaluate(&self.rows)
    }
}

/// Partition records by `dimensions`, in ascending key order.
pub fn group_by<'a>(records: &'a [Record], dimensions: &[Dimension]) -> Vec<Group<'a>> {
    let mut grouped: BTreeMap<GroupKey, Vec<&'a Record>> = BTreeMap::new();

    for record in records {
        let key = GroupKey(dimensions.iter().map(|d| d.value(record)).collect());
        grouped.entry(key).or_default().push(record);
    }

    grouped
        .into_iter()
        .map(|(key, rows)| Group { key, rows })
        .collect()
}

/// One output row of [`aggregate`].
#[derive(Debug, Clone, Serialize)]
pub struct AggregateRow {
    pub key: GroupKey,
    pub values: Vec<f64>,
}

/// Result of a grouped reduction: one row per distinct key.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateTable {
    /// Values follow the order of the requested metrics.
    pub rows: Vec<AggregateRow>,
}

/// Group `dataset` by `dimensions` and evaluate every metric per group.
pub fn aggregate(dataset: &Dataset, dimensions: &[Dimension], metrics: &[Metric]) -> AggregateTable {
    let rows = group_by(dataset.records(), dimensions)
        .into_iter()
        .map(|group| AggregateRow {
            values: metrics.iter().map(|m| group.eval(*m)).collect(),
            key: group.key,
        })
        .collect();

    AggregateTable { rows }
}

/// A two-dimensional table of one metric, e.g. margin by category × chain.
#[derive(Debug, Clone, Serialize)]
pub struct PivotTable {
    pub row_dimension: Dimension,
    pub column_dimension: Dimension,
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    /// `cells[row][column]`; `NaN` where no rows exist for the pair.
    pub cells: Vec<Vec<f64>>,
}

/// Pivot `metric` over `rows` × `columns`.
pub fn pivot(dataset: &Dataset, rows: Dimension, columns: Dimension, metric: Metric) -> PivotTable {
    let table = aggregate(dataset, &[rows, columns], &[metric]);

    let mut row_keys: Vec<KeyValue> = table.rows.iter().map(|r| r.key.0[0].clone()).collect();
    row_keys.dedup();
    let mut column_keys: Vec<KeyValue> = table.rows.iter().map(|r| r.key.0[1].clone()).collect();
    column_keys.sort();
    column_keys.dedup();

    let mut cells = vec![vec![f64::NAN; column_keys.len()]; row_keys.len()];
    for row in &table.rows {
        let r = row_keys.iter().position(|k| *k == row.key.0[0]);
        let c = column_keys.iter().position(|k| *k == row.key.0[1]);
        if let (Some(r), Some(c)) = (r, c) {
            cells[r][c] = row.values[0];
        }
    }

    PivotTable {
        row_dimension: rows,
        column_dimension: columns,
        row_labels: row_keys.iter().map(ToString::to_string).collect(),
        column_labels: column_keys.iter().map(ToString::to_string).collect(),
        cells,
    }
}
