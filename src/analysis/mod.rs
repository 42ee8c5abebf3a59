//! Analysis modules.
//!
//! Every function here is a pure reduction over an immutable [`Dataset`];
//! none of them reads another's output.
//!
//! [`Dataset`]: crate::models::Dataset

pub mod aggregator;
pub mod financial;
pub mod metrics;
pub mod segments;
pub mod statistics;
pub mod stores;
pub mod summary;
pub mod trends;

pub use aggregator::{pivot, Dimension, Measure, Metric, PivotTable};
pub use financial::{
    chain_performance, data_quality, overall_performance, rank_chains_by_margin, ChainPerformance,
    DataQuality, OverallPerformance,
};
pub use segments::{
    category_performance, rank_regions_by_sales, region_performance, tier_performance,
    CategoryPerformance, RegionPerformance, TierPerformance,
};
pub use statistics::{
    correlation_matrix, tier_sales_ttest, CorrelationMatrix, CorrelationPair, TTestResult,
    CORRELATION_MEASURES,
};
pub use stores::{rank_stores, store_efficiency, StoreEfficiency, StoreRanking};
pub use summary::{executive_summary, ExecutiveSummary};
pub use trends::{monthly_trends, recent, seasonality, MonthlyTrend, Seasonality};
