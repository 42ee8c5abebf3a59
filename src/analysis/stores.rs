//! Per-store operational efficiency and top/bottom selection.

use crate::analysis::aggregator::{group_by, Dimension, Measure, Metric, PROFIT_MARGIN};
use crate::analysis::metrics::ratio;
use crate::models::Dataset;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreEfficiency {
    pub store_id: String,
    pub chain_name: String,
    pub tier: String,
    pub total_sales: f64,
    pub total_profit: f64,
    pub total_customers: f64,
    pub total_items_sold: f64,
    pub avg_inventory_turnover: f64,
    pub avg_satisfaction: f64,
    pub sales_per_customer: f64,
    /// Ratio of sums: `total_profit / total_sales × 100`.
    pub profit_margin: f64,
}

/// Group by (store_id, chain_name, tier).
pub fn store_efficiency(dataset: &Dataset) -> Vec<StoreEfficiency> {
    group_by(
        dataset.records(),
        &[Dimension::StoreId, Dimension::ChainName, Dimension::Tier],
    )
    .into_iter()
    .map(|group| {
        let total_sales = group.eval(Metric::Sum(Measure::SalesAmount));
        let total_customers = group.eval(Metric::Sum(Measure::CustomerCount));

        StoreEfficiency {
            store_id: group.key.text(0),
            chain_name: group.key.text(1),
            tier: group.key.text(2),
            total_sales,
            total_profit: group.eval(Metric::Sum(Measure::NetProfit)),
            total_customers,
            total_items_sold: group.eval(Metric::Sum(Measure::TotalItemsSold)),
            avg_inventory_turnover: group.eval(Metric::Mean(Measure::InventoryTurnoverRatio)),
            avg_satisfaction: group.eval(Metric::Mean(Measure::CustomerSatisfactionScore)),
            sales_per_customer: ratio(total_sales, total_customers),
            profit_margin: group.eval(PROFIT_MARGIN) * 100.0,
        }
    })
    .collect()
}

/// A partition of the per-store table into best, worst and the remainder.
///
/// Every store appears exactly once across the three lists unless fewer
/// than `2 × n` stores have a defined margin, in which case `top` and
/// `bottom` may share stores.
#[derive(Debug, Clone, Serialize)]
pub struct StoreRanking {
    /// Highest margins first.
    pub top: Vec<StoreEfficiency>,
    /// Lowest margins first.
    pub bottom: Vec<StoreEfficiency>,
    /// Stores in neither list, in table order. Includes undefined margins.
    pub rest: Vec<StoreEfficiency>,
}

/// Select the `n` highest and `n` lowest profit margins.
///
/// Ties keep table order. Stores with an undefined margin are never ranked.
pub fn rank_stores(stores: &[StoreEfficiency], n: usize) -> StoreRanking {
    let mut ascending: Vec<usize> = (0..stores.len())
        .filter(|&i| !stores[i].profit_margin.is_nan())
        .collect();
    ascending.sort_by(|&a, &b| stores[a].profit_margin.total_cmp(&stores[b].profit_margin));

    let mut descending: Vec<usize> = ascending.clone();
    descending.sort_by(|&a, &b| stores[b].profit_margin.total_cmp(&stores[a].profit_margin));

    let top: Vec<usize> = descending.into_iter().take(n).collect();
    let bottom: Vec<usize> = ascending.into_iter().take(n).collect();

    let rest = (0..stores.len())
        .filter(|i| !top.contains(i) && !bottom.contains(i))
        .map(|i| stores[i].clone())
        .collect();

    StoreRanking {
        top: top.iter().map(|&i| stores[i].clone()).collect(),
        bottom: bottom.iter().map(|&i| stores[i].clone()).collect(),
        rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{record, sample_dataset};
    use std::collections::HashSet;

    fn store(id: &str, margin: f64) -> StoreEfficiency {
        StoreEfficiency {
            store_id: id.to_string(),
            chain_name: "A".to_string(),
            tier: "Metro".to_string(),
            total_sales: 100.0,
            total_profit: margin,
            total_customers: 10.0,
            total_items_sold: 10.0,
            avg_inventory_turnover: 5.0,
            avg_satisfaction: 4.0,
            sales_per_customer: 10.0,
            profit_margin: margin,
        }
    }

    #[test]
    fn test_store_efficiency_groups_by_store_chain_tier() {
        let mut a = record("S1", "A", 100.0, 10.0);
        a.customer_count = Some(4);
        let mut b = record("S1", "A", 300.0, 20.0);
        b.customer_count = Some(6);
        let stores = store_efficiency(&Dataset::new(vec![a, b, record("S2", "B", 50.0, 1.0)]));

        assert_eq!(stores.len(), 2);
        assert_eq!(stores[0].store_id, "S1");
        assert_eq!(stores[0].chain_name, "A");
        assert_eq!(stores[0].tier, "Metro");
        assert_eq!(stores[0].total_sales, 400.0);
        assert_eq!(stores[0].sales_per_customer, 40.0);
        assert!((stores[0].profit_margin - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_rank_stores_partitions_fixture() {
        let stores = store_efficiency(&sample_dataset());
        assert_eq!(stores.len(), 12);

        let ranking = rank_stores(&stores, 5);
        assert_eq!(ranking.top.len(), 5);
        assert_eq!(ranking.bottom.len(), 5);
        assert_eq!(ranking.rest.len(), 2);

        let top: HashSet<&str> = ranking.top.iter().map(|s| s.store_id.as_str()).collect();
        let bottom: HashSet<&str> = ranking.bottom.iter().map(|s| s.store_id.as_str()).collect();
        assert!(top.is_disjoint(&bottom));

        let mut all: Vec<&str> = ranking
            .top
            .iter()
            .chain(&ranking.bottom)
            .chain(&ranking.rest)
            .map(|s| s.store_id.as_str())
            .collect();
        all.sort();
        let mut expected: Vec<&str> = stores.iter().map(|s| s.store_id.as_str()).collect();
        expected.sort();
        assert_eq!(all, expected);

        for pair in ranking.top.windows(2) {
            assert!(pair[0].profit_margin >= pair[1].profit_margin);
        }
        for pair in ranking.bottom.windows(2) {
            assert!(pair[0].profit_margin <= pair[1].profit_margin);
        }
    }

    #[test]
    fn test_rank_stores_ties_keep_table_order() {
        let stores = vec![
            store("S1", 5.0),
            store("S2", 9.0),
            store("S3", 5.0),
            store("S4", 9.0),
            store("S5", 1.0),
        ];
        let ranking = rank_stores(&stores, 2);

        let top: Vec<&str> = ranking.top.iter().map(|s| s.store_id.as_str()).collect();
        let bottom: Vec<&str> = ranking.bottom.iter().map(|s| s.store_id.as_str()).collect();
        let rest: Vec<&str> = ranking.rest.iter().map(|s| s.store_id.as_str()).collect();
        assert_eq!(top, vec!["S2", "S4"]);
        assert_eq!(bottom, vec!["S5", "S1"]);
        assert_eq!(rest, vec!["S3"]);
    }

    #[test]
    fn test_undefined_margin_is_never_ranked() {
        let stores = vec![store("S1", f64::NAN), store("S2", 3.0), store("S3", 4.0)];
        let ranking = rank_stores(&stores, 1);
        assert_eq!(ranking.top[0].store_id, "S3");
        assert_eq!(ranking.bottom[0].store_id, "S2");
        assert_eq!(ranking.rest.len(), 1);
        assert_eq!(ranking.rest[0].store_id, "S1");
    }
}
