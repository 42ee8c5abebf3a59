//! Number formatting shared by the console and Markdown renderers.
//!
//! Undefined values (`NaN`, infinities) always render as "N/A".

use crate::analysis::metrics::{to_crores, to_millions};

pub const NOT_AVAILABLE: &str = "N/A";

/// Fixed-point with `decimals` places.
pub fn number(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{:.*}", decimals, value)
    } else {
        NOT_AVAILABLE.to_string()
    }
}

/// Percentage with `decimals` places, e.g. "5.83%".
pub fn percent(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{:.*}%", decimals, value)
    } else {
        NOT_AVAILABLE.to_string()
    }
}

/// Rupees in Crores, e.g. "₹12.3 Crores".
pub fn crores(rupees: f64) -> String {
    let value = to_crores(rupees);
    if value.is_finite() {
        format!("₹{:.1} Crores", value)
    } else {
        NOT_AVAILABLE.to_string()
    }
}

/// Rupees in Crores, short form, e.g. "₹12.3Cr".
pub fn crores_short(rupees: f64) -> String {
    let value = to_crores(rupees);
    if value.is_finite() {
        format!("₹{:.1}Cr", value)
    } else {
        NOT_AVAILABLE.to_string()
    }
}

/// Rupees in Millions, e.g. "₹4.5M".
pub fn millions(rupees: f64) -> String {
    let value = to_millions(rupees);
    if value.is_finite() {
        format!("₹{:.1}M", value)
    } else {
        NOT_AVAILABLE.to_string()
    }
}

/// Integer with thousands separators, e.g. "12,345".
pub fn grouped(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    let rounded = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(rounded.len() + rounded.len() / 3 + 1);
    for (i, ch) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    if value < 0.0 && rounded != "0" {
        format!("-{}", out)
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_renders_na() {
        assert_eq!(number(f64::NAN, 2), "N/A");
        assert_eq!(percent(f64::INFINITY, 1), "N/A");
        assert_eq!(crores(f64::NAN), "N/A");
        assert_eq!(millions(f64::NAN), "N/A");
        assert_eq!(grouped(f64::NAN), "N/A");
    }

    #[test]
    fn test_currency_units() {
        assert_eq!(crores(123_000_000.0), "₹12.3 Crores");
        assert_eq!(crores_short(50_000_000.0), "₹5.0Cr");
        assert_eq!(millions(4_540_000.0), "₹4.5M");
    }

    #[test]
    fn test_percent_and_number() {
        assert_eq!(percent(5.833_333, 2), "5.83%");
        assert_eq!(number(0.0, 1), "0.0");
    }

    #[test]
    fn test_grouped_thousands() {
        assert_eq!(grouped(0.0), "0");
        assert_eq!(grouped(999.0), "999");
        assert_eq!(grouped(1_000.0), "1,000");
        assert_eq!(grouped(1_234_567.4), "1,234,567");
        assert_eq!(grouped(-45_000.0), "-45,000");
    }
}
