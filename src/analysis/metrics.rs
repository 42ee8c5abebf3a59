//! Derived metrics computed from already-reduced values.
//!
//! Every formula here is a pure function. Division by zero yields `NaN`,
//! which the report layer renders as "N/A".

/// Rupees per Crore.
pub const CRORE: f64 = 10_000_000.0;

/// Rupees per Million.
pub const MILLION: f64 = 1_000_000.0;

/// Divisor applied to `avg_margin × total_customers` in the ROI score.
pub const ROI_DIVISOR: f64 = 100_000.0;

/// `numerator / denominator`, or `NaN` when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// `part / whole × 100`, or `NaN` when `whole` is zero.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    ratio(part, whole) * 100.0
}

/// Rupees to Crores (`/ 10,000,000`).
pub fn to_crores(rupees: f64) -> f64 {
    rupees / CRORE
}

/// Rupees to Millions (`/ 1,000,000`).
pub fn to_millions(rupees: f64) -> f64 {
    rupees / MILLION
}

/// `avg_margin × total_customers / 100,000`.
pub fn roi_score(avg_margin: f64, total_customers: f64) -> f64 {
    avg_margin * total_customers / ROI_DIVISOR
}

/// Each value as a percentage of the sum of all values.
pub fn share_pct(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    values.iter().map(|v| percent_of(*v, total)).collect()
}

/// Period-over-period growth in percent.
///
/// `growth[i] = (value[i] - value[i-1]) / value[i-1] × 100`. The first
/// entry has no predecessor and is `NaN`, as is any step from zero.
pub fn growth_rates(values: &[f64]) -> Vec<f64> {
    let mut rates = Vec::with_capacity(values.len());
    if values.is_empty() {
        return rates;
    }

    rates.push(f64::NAN);
    for pair in values.windows(2) {
        rates.push(percent_of(pair[1] - pair[0], pair[0]));
    }

    rates
}

/// Index of the largest value; the first one wins ties. `NaN` is skipped.
pub fn argmax_first(values: &[f64]) -> Option<usize> {
    select_first(values, |candidate, best| candidate > best)
}

/// Index of the smallest value; the first one wins ties. `NaN` is skipped.
pub fn argmin_first(values: &[f64]) -> Option<usize> {
    select_first(values, |candidate, best| candidate < best)
}

fn select_first(values: &[f64], better: impl Fn(f64, f64) -> bool) -> Option<usize> {
    let mut best: Option<usize> = None;

    for (index, value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some(b) if !better(*value, values[b]) => {}
            _ => best = Some(index),
        }
    }

    best
}
