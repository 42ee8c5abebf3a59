//! Markdown report generation.
//!
//! This module renders every summary table of a [`Report`] as a
//! Markdown document.

use super::format::{crores, grouped, number, percent};
use super::{Report, ReportMetadata};
use crate::analysis::metrics::to_crores;
use crate::analysis::{
    rank_chains_by_margin, rank_regions_by_sales, CorrelationMatrix, PivotTable, StoreEfficiency,
};

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Retail Performance Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_summary_section(report));
    output.push_str(&generate_quality_section(report));
    output.push_str(&generate_chain_section(report));
    output.push_str(&generate_category_section(report));
    output.push_str(&generate_region_section(report));
    output.push_str(&generate_monthly_section(report));
    output.push_str(&generate_store_section(report));
    output.push_str(&generate_statistics_section(report));
    output.push_str(&generate_recommendations_section(
        &report.summary.recommendations,
    ));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Data File:** `{}`\n", metadata.data_file));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    section.push_str(&format!("- **Records:** {}\n", metadata.records));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    for title in [
        "Executive Summary",
        "Data Quality",
        "Chain Performance",
        "Category Performance",
        "Regional Performance",
        "Monthly Trends",
        "Store Efficiency",
        "Statistical Insights",
    ] {
        let anchor = title.replace(' ', "-").to_lowercase();
        toc.push_str(&format!("- [{}](#{})\n", title, anchor));
    }
    if !report.summary.recommendations.is_empty() {
        toc.push_str("- [Recommendations](#recommendations)\n");
    }
    toc.push('\n');

    toc
}

fn generate_summary_section(report: &Report) -> String {
    let summary = &report.summary;
    let mut section = String::new();

    section.push_str("## Executive Summary\n\n");
    section.push_str("| Metric | Value |\n");
    section.push_str("|:---|:---|\n");
    section.push_str(&format!("| Analysis Period | {} |\n", summary.period_label()));
    section.push_str(&format!("| Stores | {} |\n", summary.store_count));
    section.push_str(&format!("| Total Revenue | {} |\n", crores(summary.total_revenue)));
    section.push_str(&format!("| Total Profit | {} |\n", crores(summary.total_profit)));
    section.push_str(&format!(
        "| Overall Margin | {} |\n",
        percent(summary.overall_margin, 2)
    ));
    section.push_str(&format!(
        "| Average Margin | {} |\n",
        percent(report.overall.average_margin, 2)
    ));
    section.push_str(&format!("| Best Chain | {} |\n", summary.best_chain));
    section.push_str(&format!("| Best Category | {} |\n", summary.best_category));
    section.push_str(&format!("| Best Region | {} |\n", summary.best_region));
    section.push('\n');

    section
}

fn generate_quality_section(report: &Report) -> String {
    let q = &report.quality;
    let mut section = String::new();

    section.push_str("## Data Quality\n\n");
    section.push_str("| Rows | Columns | First Month | Last Month | Missing | Duplicates |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} | {} |\n\n",
        q.rows, q.columns, q.first_period, q.last_period, q.missing_values, q.duplicate_rows
    ));

    section
}

fn generate_chain_section(report: &Report) -> String {
    let mut section = String::new();

    section.push_str("## Chain Performance\n\n");
    section.push_str(
        "| Chain | Sales (Cr) | Avg Margin | Profit Margin | Customers | Stores | ROI Score |\n",
    );
    section.push_str("|:---|---:|---:|---:|---:|---:|---:|\n");
    for chain in rank_chains_by_margin(&report.chains) {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            chain.chain,
            number(chain.sales_crores, 2),
            percent(chain.avg_margin, 2),
            percent(chain.profit_margin, 2),
            grouped(chain.total_customers),
            chain.store_count,
            number(chain.roi_score, 1)
        ));
    }
    section.push('\n');

    section.push_str("### Net Margin by Category and Chain\n\n");
    section.push_str(&generate_pivot_table(&report.category_margin_by_chain));

    section
}

fn generate_pivot_table(pivot: &PivotTable) -> String {
    let mut table = String::new();

    table.push_str(&format!("| {} |", pivot.row_dimension.column()));
    for label in &pivot.column_labels {
        table.push_str(&format!(" {} |", label));
    }
    table.push('\n');
    table.push_str("|:---|");
    table.push_str(&"---:|".repeat(pivot.column_labels.len()));
    table.push('\n');

    for (label, cells) in pivot.row_labels.iter().zip(&pivot.cells) {
        table.push_str(&format!("| {} |", label));
        for value in cells {
            table.push_str(&format!(" {} |", number(*value, 1)));
        }
        table.push('\n');
    }
    table.push('\n');

    table
}

fn generate_category_section(report: &Report) -> String {
    let mut section = String::new();

    section.push_str("## Category Performance\n\n");
    section.push_str(
        "| Category | Sales (Cr) | Share | Net Margin | Gross Margin | Profit Contribution | Turnover | Health |\n",
    );
    section.push_str("|:---|---:|---:|---:|---:|---:|---:|:---:|\n");
    for category in &report.categories {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} {} |\n",
            category.category,
            number(to_crores(category.total_sales), 2),
            percent(category.sales_share_pct, 1),
            percent(category.avg_net_margin, 2),
            percent(category.avg_gross_margin, 2),
            percent(category.profit_contribution_pct, 1),
            number(category.avg_inventory_turnover, 2),
            category.health.emoji(),
            category.health
        ));
    }
    section.push('\n');

    section
}

fn generate_region_section(report: &Report) -> String {
    let mut section = String::new();

    section.push_str("## Regional Performance\n\n");
    section.push_str("| Region | Sales (Cr) | Share | Stores | Sales per Store | Margin |\n");
    section.push_str("|:---|---:|---:|---:|---:|---:|\n");
    for region in rank_regions_by_sales(&report.regions) {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            region.region,
            number(to_crores(region.total_sales), 2),
            percent(region.sales_share_pct, 1),
            region.store_count,
            grouped(region.sales_per_store),
            percent(region.profit_margin, 2)
        ));
    }
    section.push('\n');

    section.push_str("### City Tiers\n\n");
    section.push_str("| Tier | Sales (Cr) | Net Margin | Basket Value | Satisfaction |\n");
    section.push_str("|:---|---:|---:|---:|---:|\n");
    for tier in &report.tiers {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            tier.tier,
            number(to_crores(tier.total_sales), 2),
            percent(tier.avg_net_margin, 2),
            number(tier.avg_basket_value, 0),
            number(tier.avg_satisfaction, 2)
        ));
    }
    section.push('\n');

    section
}

fn generate_monthly_section(report: &Report) -> String {
    let mut section = String::new();

    section.push_str("## Monthly Trends\n\n");
    section.push_str("| Month | Sales (Cr) | Profit (Cr) | Customers | Margin | Sales Growth | Customer Growth |\n");
    section.push_str("|:---|---:|---:|---:|---:|---:|---:|\n");
    for month in &report.monthly {
        section.push_str(&format!(
            "| {} {} | {} | {} | {} | {} | {} | {} |\n",
            month.trend().emoji(),
            month.period,
            number(to_crores(month.total_sales), 2),
            number(to_crores(month.total_profit), 2),
            grouped(month.total_customers),
            percent(month.profit_margin, 2),
            percent(month.sales_growth, 1),
            percent(month.customer_growth, 1)
        ));
    }
    section.push('\n');

    let s = &report.seasonality;
    section.push_str(&format!(
        "**Peak month:** {} (mean sales {}) | **Low month:** {} (mean sales {})\n\n",
        s.peak_month,
        grouped(s.peak_sales),
        s.low_month,
        grouped(s.low_sales)
    ));

    section
}

fn store_rows(stores: &[StoreEfficiency]) -> String {
    let mut rows = String::new();
    for store in stores {
        rows.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            store.store_id,
            store.chain_name,
            store.tier,
            grouped(store.total_sales),
            percent(store.profit_margin, 2),
            number(store.sales_per_customer, 2),
            number(store.avg_satisfaction, 2)
        ));
    }
    rows
}

fn generate_store_section(report: &Report) -> String {
    const HEADER: &str = "| Store | Chain | Tier | Sales | Margin | Sales per Customer | Satisfaction |\n|:---|:---|:---|---:|---:|---:|---:|\n";
    let ranking = &report.store_ranking;
    let mut section = String::new();

    section.push_str("## Store Efficiency\n\n");

    section.push_str(&format!("### Top {} Stores\n\n", ranking.top.len()));
    section.push_str(HEADER);
    section.push_str(&store_rows(&ranking.top));
    section.push('\n');

    section.push_str(&format!("### Bottom {} Stores\n\n", ranking.bottom.len()));
    section.push_str(HEADER);
    section.push_str(&store_rows(&ranking.bottom));
    section.push('\n');

    section
}

fn generate_correlation_table(matrix: &CorrelationMatrix) -> String {
    let mut table = String::new();

    table.push_str("| |");
    for measure in &matrix.measures {
        table.push_str(&format!(" {} |", measure));
    }
    table.push('\n');
    table.push_str("|:---|");
    table.push_str(&":---:|".repeat(matrix.measures.len()));
    table.push('\n');

    for (measure, row) in matrix.measures.iter().zip(&matrix.values) {
        table.push_str(&format!("| {} |", measure));
        for r in row {
            table.push_str(&format!(" {} |", number(*r, 2)));
        }
        table.push('\n');
    }
    table.push('\n');

    table
}

fn generate_statistics_section(report: &Report) -> String {
    let mut section = String::new();

    section.push_str("## Statistical Insights\n\n");
    section.push_str("### Correlation Matrix\n\n");
    section.push_str(&generate_correlation_table(&report.correlations));

    if !report.strong_correlations.is_empty() {
        section.push_str("### Strong Correlations\n\n");
        for pair in &report.strong_correlations {
            section.push_str(&format!(
                "- **{} & {}:** {} ({})\n",
                pair.first,
                pair.second,
                pair.direction,
                number(pair.r, 2)
            ));
        }
        section.push('\n');
    }

    let test = &report.tier_test;
    section.push_str(&format!(
        "### {} vs {} Sales t-test\n\n",
        test.group_a, test.group_b
    ));
    section.push_str("| n | Mean Sales | t | df | p-value | Significant |\n");
    section.push_str("|:---|---:|---:|---:|---:|:---:|\n");
    section.push_str(&format!(
        "| {} / {} | {} / {} | {} | {} | {} | {} |\n\n",
        test.n_a,
        test.n_b,
        grouped(test.mean_a),
        grouped(test.mean_b),
        number(test.t_statistic, 3),
        number(test.degrees_of_freedom, 0),
        number(test.p_value, 4),
        if test.significant { "yes" } else { "no" }
    ));

    section
}

fn generate_recommendations_section(recommendations: &[String]) -> String {
    if recommendations.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Recommendations\n\n");
    for (i, rec) in recommendations.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, rec));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by retail-insights*\n".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::sample_report;

    #[test]
    fn test_generate_markdown_report() {
        let report = sample_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.starts_with("# Retail Performance Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Executive Summary"));
        assert!(markdown.contains("## Chain Performance"));
        assert!(markdown.contains("## Statistical Insights"));
        assert!(markdown.contains("4 months (Nov 2023 - Feb 2024)"));
        assert!(markdown.contains("fixtures/retail_sample.csv"));
    }

    #[test]
    fn test_first_month_growth_is_na() {
        let report = sample_report();
        let markdown = generate_markdown_report(&report);

        let first = &report.monthly[0];
        let cell = format!("| {} {} |", first.trend().emoji(), first.period);
        let row = markdown.lines().find(|l| l.starts_with(&cell)).unwrap();
        assert!(row.contains("N/A"));
    }

    #[test]
    fn test_pivot_missing_cell_renders_na() {
        let mut report = sample_report();
        report.category_margin_by_chain.cells[0][0] = f64::NAN;
        let table = generate_pivot_table(&report.category_margin_by_chain);
        assert!(table.contains("N/A"));
        assert!(table.starts_with("| category |"));
    }

    #[test]
    fn test_recommendations_section_empty() {
        assert!(generate_recommendations_section(&[]).is_empty());

        let section = generate_recommendations_section(&["Expand Grocery".to_string()]);
        assert!(section.contains("## Recommendations"));
        assert!(section.contains("1. Expand Grocery"));
    }
}
