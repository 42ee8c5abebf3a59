//! Chart rendering.
//!
//! Three PNG charts are drawn with the [`plotters`] bitmap backend:
//! chain performance bars, a category by chain margin heatmap, and the
//! monthly sales and profit trend on two axes.

use crate::analysis::metrics::to_crores;
use crate::analysis::{ChainPerformance, MonthlyTrend, PivotTable};
use crate::config::ChartConfig;
use crate::error::ChartError;
use crate::report::format::number;
use crate::report::Report;
use indicatif::{ProgressBar, ProgressStyle};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type Result<T> = core::result::Result<T, ChartError>;

pub const CHAIN_CHART_FILE: &str = "chain_performance_analysis.png";
pub const HEATMAP_FILE: &str = "category_margin_heatmap.png";
pub const MONTHLY_CHART_FILE: &str = "monthly_trends.png";

const MISSING_CELL: RGBColor = RGBColor(200, 200, 200);
const LOSS_COLOR: RGBColor = RGBColor(215, 48, 39);
const NEUTRAL_COLOR: RGBColor = RGBColor(255, 255, 191);
const GAIN_COLOR: RGBColor = RGBColor(26, 152, 80);

/// Render every chart into `output_dir`, returning the written paths.
pub fn render_all(
    report: &Report,
    output_dir: &Path,
    config: &ChartConfig,
    show_progress: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let size = (config.width, config.height);

    let pb = if show_progress {
        let pb = ProgressBar::new(3);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut written = Vec::with_capacity(3);

    pb.set_message(CHAIN_CHART_FILE);
    let path = output_dir.join(CHAIN_CHART_FILE);
    chain_performance_chart(&report.chains, &path, size)?;
    written.push(path);
    pb.inc(1);

    pb.set_message(HEATMAP_FILE);
    let path = output_dir.join(HEATMAP_FILE);
    margin_heatmap(&report.category_margin_by_chain, &path, size)?;
    written.push(path);
    pb.inc(1);

    pb.set_message(MONTHLY_CHART_FILE);
    let path = output_dir.join(MONTHLY_CHART_FILE);
    monthly_trends_chart(&report.monthly, &path, size)?;
    written.push(path);
    pb.inc(1);

    pb.finish_with_message("charts saved");
    info!("Saved {} charts to {}", written.len(), output_dir.display());

    Ok(written)
}

/// 2x2 bars by chain: total sales, mean margin, total customers and mean
/// satisfaction.
pub fn chain_performance_chart(
    chains: &[ChainPerformance],
    path: &Path,
    size: (u32, u32),
) -> Result<()> {
    if chains.is_empty() {
        return Err(ChartError::InvalidData("No chains to plot".to_string()));
    }

    let labels: Vec<String> = chains.iter().map(|c| c.chain.clone()).collect();
    let panels: [(&str, Vec<f64>, RGBColor); 4] = [
        (
            "Total Sales (Crores)",
            chains.iter().map(|c| to_crores(c.total_sales)).collect(),
            RGBColor(31, 119, 180),
        ),
        (
            "Average Net Margin (%)",
            chains.iter().map(|c| c.avg_margin).collect(),
            RGBColor(44, 160, 44),
        ),
        (
            "Total Customers",
            chains.iter().map(|c| c.total_customers).collect(),
            RGBColor(255, 127, 14),
        ),
        (
            "Average Satisfaction",
            chains.iter().map(|c| c.avg_satisfaction).collect(),
            RGBColor(148, 103, 189),
        ),
    ];

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ChartError::DrawingArea(e.to_string()))?;
    let root = root
        .titled("Chain Performance Analysis", ("sans-serif", 40))
        .map_err(|e| ChartError::DrawingArea(e.to_string()))?;

    for (area, (title, values, color)) in root.split_evenly((2, 2)).iter().zip(panels.iter()) {
        draw_bar_panel(area, title, &labels, values, color)?;
    }

    root.present()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn draw_bar_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    labels: &[String],
    values: &[f64],
    color: &RGBColor,
) -> Result<()> {
    let y_range = value_range(values)
        .ok_or_else(|| ChartError::InvalidData(format!("{}: no defined values", title)))?;

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d((0..labels.len()).into_segmented(), y_range)
        .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|v| segment_label(v, labels))
        .label_style(("sans-serif", 16))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    chart
        .draw_series(
            values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_finite())
                .map(|(i, v)| {
                    let mut bar = Rectangle::new(
                        [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
                        color.filled(),
                    );
                    bar.set_margin(0, 0, 12, 12);
                    bar
                }),
        )
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    Ok(())
}

/// Mean net margin by category and chain on a red-yellow-green scale
/// centred at zero. Missing cells are grey and labelled "N/A".
pub fn margin_heatmap(pivot: &PivotTable, path: &Path, size: (u32, u32)) -> Result<()> {
    if pivot.row_labels.is_empty() || pivot.column_labels.is_empty() {
        return Err(ChartError::InvalidData("Heatmap has no cells".to_string()));
    }

    let limit = pivot
        .cells
        .iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));

    let rows = &pivot.row_labels;
    let columns = &pivot.column_labels;

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ChartError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Net Margin % by Category and Chain", ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(160)
        .build_cartesian_2d(
            (0..columns.len()).into_segmented(),
            (0..rows.len()).into_segmented(),
        )
        .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(columns.len())
        .y_labels(rows.len())
        .x_label_formatter(&|v| segment_label(v, columns))
        .y_label_formatter(&|v| segment_label(v, rows))
        .x_desc(pivot.column_dimension.column())
        .y_desc(pivot.row_dimension.column())
        .label_style(("sans-serif", 20))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    let cells: Vec<(usize, usize, f64)> = pivot
        .cells
        .iter()
        .enumerate()
        .flat_map(|(r, row)| row.iter().enumerate().map(move |(c, v)| (r, c, *v)))
        .collect();

    chart
        .draw_series(cells.iter().map(|&(r, c, v)| {
            Rectangle::new(
                [
                    (SegmentValue::Exact(c), SegmentValue::Exact(r)),
                    (SegmentValue::Exact(c + 1), SegmentValue::Exact(r + 1)),
                ],
                margin_color(v, limit).filled(),
            )
        }))
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    let centred = TextStyle::from(("sans-serif", 24).into_font())
        .pos(Pos::new(HPos::Center, VPos::Center));
    chart
        .draw_series(cells.iter().map(|&(r, c, v)| {
            Text::new(
                number(v, 1),
                (SegmentValue::CenterOf(c), SegmentValue::CenterOf(r)),
                centred.clone(),
            )
        }))
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Monthly sales on the left axis and profit on the right, both in Crores.
pub fn monthly_trends_chart(months: &[MonthlyTrend], path: &Path, size: (u32, u32)) -> Result<()> {
    if months.is_empty() {
        return Err(ChartError::InvalidData("No months to plot".to_string()));
    }

    let labels: Vec<String> = months.iter().map(|m| m.period.to_string()).collect();
    let sales: Vec<f64> = months.iter().map(|m| to_crores(m.total_sales)).collect();
    let profit: Vec<f64> = months.iter().map(|m| to_crores(m.total_profit)).collect();

    let sales_range = value_range(&sales)
        .ok_or_else(|| ChartError::InvalidData("No defined sales values".to_string()))?;
    let profit_range = value_range(&profit)
        .ok_or_else(|| ChartError::InvalidData("No defined profit values".to_string()))?;

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ChartError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Sales and Profit Trends", ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(85)
        .right_y_label_area_size(85)
        .build_cartesian_2d((0..months.len()).into_segmented(), sales_range)
        .map_err(|e| ChartError::ChartConfig(e.to_string()))?
        .set_secondary_coord((0..months.len()).into_segmented(), profit_range);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|v| segment_label(v, &labels))
        .y_desc("Sales (Crores)")
        .label_style(("sans-serif", 18))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    chart
        .configure_secondary_axes()
        .y_desc("Profit (Crores)")
        .label_style(("sans-serif", 18))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    chart
        .draw_series(LineSeries::new(
            finite_points(&sales),
            BLUE.stroke_width(3),
        ))
        .map_err(|e| ChartError::Drawing(e.to_string()))?
        .label("Sales")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart
        .draw_secondary_series(LineSeries::new(
            finite_points(&profit),
            GAIN_COLOR.stroke_width(3),
        ))
        .map_err(|e| ChartError::Drawing(e.to_string()))?
        .label("Profit")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &GAIN_COLOR));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 20))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn finite_points(values: &[f64]) -> Vec<(SegmentValue<usize>, f64)> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, v)| (SegmentValue::CenterOf(i), *v))
        .collect()
}

fn segment_label(value: &SegmentValue<usize>, labels: &[String]) -> String {
    match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            labels.get(*i).cloned().unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    }
}

/// Axis range covering zero and every finite value, padded by 10%.
/// `None` when no value is finite.
fn value_range(values: &[f64]) -> Option<Range<f64>> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }

    let low = finite.iter().copied().fold(0.0_f64, f64::min);
    let high = finite.iter().copied().fold(0.0_f64, f64::max);
    let pad = (high - low) * 0.1;
    if pad == 0.0 {
        return Some(low - 1.0..high + 1.0);
    }
    Some(low - pad..high + pad)
}

/// Diverging colour for a margin: red below zero, yellow at zero, green
/// above. `limit` is the magnitude that maps to full saturation.
fn margin_color(value: f64, limit: f64) -> RGBColor {
    if !value.is_finite() {
        return MISSING_CELL;
    }
    if limit <= 0.0 {
        return NEUTRAL_COLOR;
    }

    let t = (value / limit).clamp(-1.0, 1.0);
    if t < 0.0 {
        blend(NEUTRAL_COLOR, LOSS_COLOR, -t)
    } else {
        blend(NEUTRAL_COLOR, GAIN_COLOR, t)
    }
}

fn blend(from: RGBColor, to: RGBColor, t: f64) -> RGBColor {
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}
