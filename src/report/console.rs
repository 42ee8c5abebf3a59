//! Console report.
//!
//! Each section renders to a `String` so the layout can be tested; the
//! `print_*` functions write those strings to stdout.

use super::format::{crores, crores_short, grouped, millions, number, percent, NOT_AVAILABLE};
use super::Report;
use crate::analysis::{
    rank_chains_by_margin, rank_regions_by_sales, recent, ExecutiveSummary, StoreEfficiency,
};
use chrono::NaiveDate;

const RULE_WIDTH: usize = 60;

fn heading(title: &str) -> String {
    format!("\n{}\n{}\n", title, "=".repeat(RULE_WIDTH))
}

fn month_name(month: u32) -> String {
    NaiveDate::from_ymd_opt(2000, month, 1)
        .map(|d| d.format("%B").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Print every analysis section in report order.
pub fn print_analysis_sections(report: &Report) {
    print!("{}", render_data_quality(report));
    print!("{}", render_financial(report));
    print!("{}", render_categories(report));
    print!("{}", render_regional(report));
    print!("{}", render_time_series(report));
    print!("{}", render_operational(report));
    print!("{}", render_statistics(report));
}

/// Print the closing executive summary.
pub fn print_executive_summary(summary: &ExecutiveSummary) {
    print!("{}", render_executive_summary(summary));
}

pub fn render_data_quality(report: &Report) -> String {
    let q = &report.quality;
    let mut out = heading("📋 DATA QUALITY ASSESSMENT");

    out.push_str(&format!("   Records: {} rows x {} columns\n", q.rows, q.columns));
    out.push_str(&format!(
        "   Date range: {} to {} ({} months)\n",
        q.first_period, q.last_period, q.period_count
    ));
    out.push_str(&format!("   Stores: {}\n", q.store_count));
    out.push_str(&format!("   Missing values: {}\n", q.missing_values));
    out.push_str(&format!("   Duplicate rows: {}\n", q.duplicate_rows));
    out.push_str(&format!("   Total revenue: {}\n", crores(q.total_revenue)));
    out.push_str(&format!(
        "   Average net margin: {}\n",
        percent(q.mean_net_margin, 2)
    ));

    out
}

pub fn render_financial(report: &Report) -> String {
    let o = &report.overall;
    let mut out = heading("💰 FINANCIAL PERFORMANCE");

    out.push_str(&format!("   Total revenue: {}\n", crores(o.total_revenue)));
    out.push_str(&format!("   Total profit: {}\n", crores(o.total_profit)));
    out.push_str(&format!(
        "   Overall margin (profit / sales): {}\n",
        percent(o.overall_margin, 2)
    ));
    out.push_str(&format!(
        "   Average margin (mean of rows): {}\n",
        percent(o.average_margin, 2)
    ));

    out.push_str("\n   Chain ranking by average margin:\n");
    for (i, chain) in rank_chains_by_margin(&report.chains).iter().enumerate() {
        out.push_str(&format!(
            "   {}. {}: {} Cr, {} margin ({} stores, ROI score {})\n",
            i + 1,
            chain.chain,
            number(chain.sales_crores, 1),
            percent(chain.avg_margin, 2),
            chain.store_count,
            number(chain.roi_score, 1)
        ));
    }

    out
}

pub fn render_categories(report: &Report) -> String {
    let mut out = heading("🛒 CATEGORY PERFORMANCE");

    for category in &report.categories {
        out.push_str(&format!(
            "   {} {}: {} sales ({} share), {} net margin, {} of profit\n",
            category.health.emoji(),
            category.category,
            crores_short(category.total_sales),
            percent(category.sales_share_pct, 1),
            percent(category.avg_net_margin, 2),
            percent(category.profit_contribution_pct, 1)
        ));
    }

    out
}

pub fn render_regional(report: &Report) -> String {
    let mut out = heading("🗺️  REGIONAL PERFORMANCE");

    for region in rank_regions_by_sales(&report.regions) {
        out.push_str(&format!(
            "   {}: {} ({} share), {} stores, {} per store, {} margin\n",
            region.region,
            crores_short(region.total_sales),
            percent(region.sales_share_pct, 1),
            region.store_count,
            millions(region.sales_per_store),
            percent(region.profit_margin, 2)
        ));
    }

    out.push_str("\n   City tiers:\n");
    for tier in &report.tiers {
        out.push_str(&format!(
            "   {}: {} sales, {} margin, basket ₹{}, satisfaction {}\n",
            tier.tier,
            crores_short(tier.total_sales),
            percent(tier.avg_net_margin, 2),
            number(tier.avg_basket_value, 0),
            number(tier.avg_satisfaction, 2)
        ));
    }

    out
}

pub fn render_time_series(report: &Report) -> String {
    let mut out = heading("📅 TIME SERIES ANALYSIS");

    out.push_str(&format!(
        "   Recent performance (last {} months):\n",
        report.metadata.recent_months
    ));
    for month in recent(&report.monthly, report.metadata.recent_months) {
        out.push_str(&format!(
            "   {} {}: {} sales, {} growth, {} margin\n",
            month.trend().emoji(),
            month.period,
            crores_short(month.total_sales),
            percent(month.sales_growth, 1),
            percent(month.profit_margin, 2)
        ));
    }

    let s = &report.seasonality;
    out.push_str(&format!(
        "\n   Peak month: {} ({} average sales)\n",
        month_name(s.peak_month),
        millions(s.peak_sales)
    ));
    out.push_str(&format!(
        "   Low month: {} ({} average sales)\n",
        month_name(s.low_month),
        millions(s.low_sales)
    ));

    out
}

fn store_line(rank: usize, store: &StoreEfficiency) -> String {
    format!(
        "   {}. {} ({}, {}): {} sales, {} margin, {} customers\n",
        rank,
        store.store_id,
        store.chain_name,
        store.tier,
        crores_short(store.total_sales),
        percent(store.profit_margin, 2),
        grouped(store.total_customers)
    )
}

pub fn render_operational(report: &Report) -> String {
    let ranking = &report.store_ranking;
    let mut out = heading("⚙️  OPERATIONAL EFFICIENCY");

    out.push_str(&format!("   Top {} stores by profit margin:\n", ranking.top.len()));
    for (i, store) in ranking.top.iter().enumerate() {
        out.push_str(&store_line(i + 1, store));
    }

    out.push_str(&format!(
        "\n   Bottom {} stores by profit margin:\n",
        ranking.bottom.len()
    ));
    for (i, store) in ranking.bottom.iter().enumerate() {
        out.push_str(&store_line(i + 1, store));
    }

    out
}

pub fn render_statistics(report: &Report) -> String {
    let mut out = heading("📊 STATISTICAL INSIGHTS");

    if report.strong_correlations.is_empty() {
        out.push_str("   No strong correlations found.\n");
    } else {
        out.push_str("   Strong correlations:\n");
        for pair in &report.strong_correlations {
            out.push_str(&format!(
                "   • {} & {}: {} correlation ({})\n",
                pair.first,
                pair.second,
                pair.direction,
                number(pair.r, 2)
            ));
        }
    }

    let test = &report.tier_test;
    let verdict = if test.significant {
        "Significant"
    } else {
        "Not Significant"
    };
    out.push_str(&format!(
        "\n   {} vs {} Sales Difference: {} (p={})\n",
        test.group_a,
        test.group_b,
        verdict,
        number(test.p_value, 4)
    ));
    out.push_str(&format!(
        "   t = {}, df = {}, n = {} / {}\n",
        number(test.t_statistic, 3),
        number(test.degrees_of_freedom, 0),
        test.n_a,
        test.n_b
    ));

    out
}

pub fn render_executive_summary(summary: &ExecutiveSummary) -> String {
    let mut out = heading("🎯 EXECUTIVE SUMMARY");

    out.push_str(&format!("   Analysis period: {}\n", summary.period_label()));
    out.push_str(&format!("   Stores analysed: {}\n", summary.store_count));
    out.push_str(&format!("   Total revenue: {}\n", crores(summary.total_revenue)));
    out.push_str(&format!("   Total profit: {}\n", crores(summary.total_profit)));
    out.push_str(&format!(
        "   Overall margin: {}\n",
        percent(summary.overall_margin, 2)
    ));
    out.push_str(&format!("\n   🏆 Best chain: {}\n", summary.best_chain));
    out.push_str(&format!("   🏆 Best category: {}\n", summary.best_category));
    out.push_str(&format!("   🏆 Best region: {}\n", summary.best_region));

    if !summary.recommendations.is_empty() {
        out.push_str("\n   💡 Recommendations:\n");
        for (i, rec) in summary.recommendations.iter().enumerate() {
            out.push_str(&format!("   {}. {}\n", i + 1, rec));
        }
    }

    out.push_str(&format!(
        "\n   Generated: {}\n",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    out
}
