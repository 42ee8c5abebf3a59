//! CSV loader for the retail performance table.
//!
//! Expected CSV columns:
//!   store_id, chain_name, category, region, tier, year, month,
//!   sales_amount, net_profit, gross_margin_pct, net_margin_pct,
//!   customer_count, avg_basket_value, inventory_turnover_ratio,
//!   customer_satisfaction_score, total_items_sold
//!
//! Extra columns are ignored. A missing column is a schema error and is
//! reported before any row is read. Blank numeric cells load as missing
//! values and are counted rather than rejected.

use crate::error::LoadError;
use crate::models::{Dataset, QualityCounts, Record};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Column names the engine depends on.
pub const REQUIRED_COLUMNS: [&str; 16] = [
    "store_id",
    "chain_name",
    "category",
    "region",
    "tier",
    "year",
    "month",
    "sales_amount",
    "net_profit",
    "gross_margin_pct",
    "net_margin_pct",
    "customer_count",
    "avg_basket_value",
    "inventory_turnover_ratio",
    "customer_satisfaction_score",
    "total_items_sold",
];

/// Load the dataset from a CSV file path.
pub fn load_dataset(path: &Path) -> Result<Dataset, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let dataset = load_from_reader(file)?;
    info!(
        "Loaded {} records from {}",
        dataset.len(),
        path.display()
    );

    Ok(dataset)
}

/// Load the dataset from any CSV reader.
pub fn load_from_reader<R: Read>(reader: R) -> Result<Dataset, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|source| LoadError::Csv { line: 1, source })?
        .clone();

    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadError::MissingColumn(column));
        }
    }

    let mut records = Vec::new();
    let mut quality = QualityCounts::default();
    let mut seen: HashSet<RowKey> = HashSet::new();

    for (index, result) in csv_reader.records().enumerate() {
        // Header occupies line 1
        let line = index as u64 + 2;
        let raw = result.map_err(|source| LoadError::Csv { line, source })?;

        quality.missing_values += raw.iter().filter(|field| field.is_empty()).count();

        let record: Record = raw
            .deserialize(Some(&headers))
            .map_err(|source| LoadError::Csv { line, source })?;
        validate_record(&record, line)?;

        if !seen.insert(RowKey::new(&record)) {
            quality.duplicate_rows += 1;
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(LoadError::Empty);
    }

    debug!(
        "Quality counts: {} missing values, {} duplicate rows",
        quality.missing_values, quality.duplicate_rows
    );

    Ok(Dataset::with_quality(records, quality))
}

/// Parsed field values of one row, so `100` and `100.0` compare equal.
#[derive(PartialEq, Eq, Hash)]
struct RowKey {
    labels: [String; 5],
    period: (i32, u32),
    measures: [u64; 7],
    counts: [Option<u64>; 2],
}

impl RowKey {
    fn new(record: &Record) -> Self {
        Self {
            labels: [
                record.store_id.clone(),
                record.chain_name.clone(),
                record.category.clone(),
                record.region.clone(),
                record.tier.clone(),
            ],
            period: (record.year, record.month),
            measures: [
                record.sales_amount,
                record.net_profit,
                record.gross_margin_pct,
                record.net_margin_pct,
                record.avg_basket_value,
                record.inventory_turnover_ratio,
                record.customer_satisfaction_score,
            ]
            .map(value_bits),
            counts: [record.customer_count, record.total_items_sold],
        }
    }
}

/// Bit pattern with every NaN and both zeros folded together.
fn value_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

fn validate_record(record: &Record, line: u64) -> Result<(), LoadError> {
    // NaN is a blank cell, not a bad value
    if record.sales_amount.is_infinite() || record.sales_amount < 0.0 {
        return Err(LoadError::InvalidRecord {
            line,
            reason: format!("sales_amount must be non-negative, got {}", record.sales_amount),
        });
    }

    if record.period().first_day().is_none() {
        return Err(LoadError::InvalidRecord {
            line,
            reason: format!(
                "year/month {}-{} is not a calendar month",
                record.year, record.month
            ),
        });
    }

    Ok(())
}
