//! The fixed report sequence.
//!
//! Each step runs one independent reduction over the same dataset. The
//! first failing step aborts the run with its name in the error context.

use crate::analysis::{self, Dimension, Measure, Metric};
use crate::config::Config;
use crate::models::Dataset;
use crate::report::{Report, ReportMetadata};
use anyhow::{Context, Result};
use chrono::Local;
use std::time::Instant;
use tracing::{debug, info};

/// Run every analysis over `dataset` and collect the results.
pub fn build_report(dataset: &Dataset, config: &Config, data_file: &str) -> Result<Report> {
    let start = Instant::now();
    let settings = &config.analysis;

    info!("Running data quality assessment");
    let quality = analysis::data_quality(dataset).context("Data quality assessment failed")?;

    info!("Running financial analysis");
    let overall =
        analysis::overall_performance(dataset).context("Financial performance analysis failed")?;
    let chains = analysis::chain_performance(dataset);
    debug!("{} chains", chains.len());

    info!("Running category analysis");
    let categories = analysis::category_performance(dataset, settings.healthy_margin_pct);

    info!("Running regional analysis");
    let regions = analysis::region_performance(dataset);
    let tiers = analysis::tier_performance(dataset);

    info!("Running time series analysis");
    let monthly = analysis::monthly_trends(dataset);
    let seasonality = analysis::seasonality(dataset).context("Time series analysis failed")?;

    info!("Running operational analysis");
    let stores = analysis::store_efficiency(dataset);
    let store_ranking = analysis::rank_stores(&stores, settings.top_n);
    debug!(
        "{} stores ranked, {} unranked",
        stores.len() - store_ranking.rest.len(),
        store_ranking.rest.len()
    );

    info!("Running statistical analysis");
    let correlations = analysis::correlation_matrix(dataset, &analysis::CORRELATION_MEASURES);
    let strong_correlations = correlations.strong_pairs(settings.strong_correlation);
    let tier_test = analysis::tier_sales_ttest(
        dataset,
        &settings.tier_a,
        &settings.tier_b,
        settings.significance_level,
    )
    .with_context(|| {
        format!(
            "Statistical insights failed: {} vs {} sales t-test",
            settings.tier_a, settings.tier_b
        )
    })?;

    let category_margin_by_chain = analysis::pivot(
        dataset,
        Dimension::Category,
        Dimension::ChainName,
        Metric::Mean(Measure::NetMarginPct),
    );

    info!("Building executive summary");
    let summary = analysis::executive_summary(dataset).context("Executive summary failed")?;

    let metadata = ReportMetadata {
        data_file: data_file.to_string(),
        generated_at: Local::now(),
        records: dataset.len(),
        recent_months: settings.recent_months,
        duration_seconds: start.elapsed().as_secs_f64(),
    };

    Ok(Report {
        metadata,
        quality,
        overall,
        chains,
        categories,
        regions,
        tiers,
        monthly,
        seasonality,
        stores,
        store_ranking,
        correlations,
        strong_correlations,
        tier_test,
        category_margin_by_chain,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::sample_dataset;

    #[test]
    fn test_build_report_on_fixture() {
        let report = build_report(&sample_dataset(), &Config::default(), "sample.csv").unwrap();

        assert_eq!(report.metadata.records, 48);
        assert_eq!(report.chains.len(), 3);
        assert_eq!(report.categories.len(), 3);
        assert_eq!(report.regions.len(), 4);
        assert_eq!(report.tiers.len(), 3);
        assert_eq!(report.monthly.len(), 4);
        assert_eq!(report.stores.len(), 12);
        assert_eq!(report.store_ranking.top.len(), 5);
        assert_eq!(report.category_margin_by_chain.row_labels.len(), 3);
        assert_eq!(report.tier_test.group_a, "Metro");
    }

    #[test]
    fn test_profit_margins_are_pooled_in_every_table() {
        let report = build_report(&sample_dataset(), &Config::default(), "sample.csv").unwrap();
        let pooled = |profit: f64, sales: f64| profit / sales * 100.0;
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;

        let o = &report.overall;
        assert!(close(o.overall_margin, pooled(o.total_profit, o.total_revenue)));
        for c in &report.chains {
            assert!(close(c.profit_margin, pooled(c.total_profit, c.total_sales)), "{}", c.chain);
        }
        for r in &report.regions {
            assert!(close(r.profit_margin, pooled(r.total_profit, r.total_sales)), "{}", r.region);
        }
        for s in &report.stores {
            assert!(close(s.profit_margin, pooled(s.total_profit, s.total_sales)), "{}", s.store_id);
        }
        for m in &report.monthly {
            assert!(close(m.profit_margin, pooled(m.total_profit, m.total_sales)), "{}", m.period);
        }
    }

    #[test]
    fn test_missing_tier_aborts_with_step_name() {
        let mut config = Config::default();
        config.analysis.tier_b = "Tier_9".to_string();

        let err = build_report(&sample_dataset(), &config, "sample.csv").unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Statistical insights failed"));
        assert!(message.contains("Tier_9"));
    }

    #[test]
    fn test_empty_dataset_fails_first_step() {
        let err = build_report(&Dataset::new(Vec::new()), &Config::default(), "empty.csv")
            .unwrap_err();
        assert!(err.to_string().contains("Data quality assessment failed"));
    }
}
