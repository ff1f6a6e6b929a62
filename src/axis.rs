//! Axis scales, tick selection and tick label formatting.

use num_format::{Locale, ToFormattedString};
use serde::Deserialize;

/// Mapping from data values to chart coordinates.
///
/// Charts are always drawn on a linear canvas; a logarithmic axis is a
/// linear axis over `log_base(value)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    Linear,
    Log { base: f64 },
}

impl Scale {
    pub fn forward(self, value: f64) -> f64 {
        match self {
            Scale::Linear => value,
            Scale::Log { base } => value.ln() / base.ln(),
        }
    }

    pub fn inverse(self, coord: f64) -> f64 {
        match self {
            Scale::Linear => coord,
            Scale::Log { base } => base.powf(coord),
        }
    }

    pub fn is_log(self) -> bool {
        matches!(self, Scale::Log { .. })
    }

    /// Ticks for `lo..=hi` (data values) when none are requested.
    ///
    /// Log axes get the integer powers of the base inside the range, or the
    /// range ends when no power falls inside. Linear axes get 1-2-5 steps.
    pub fn default_ticks(self, lo: f64, hi: f64) -> Vec<f64> {
        match self {
            Scale::Log { base } => {
                let first = (self.forward(lo) - EXPONENT_SLACK).ceil() as i32;
                let last = (self.forward(hi) + EXPONENT_SLACK).floor() as i32;
                if first > last {
                    return vec![lo, hi];
                }
                (first..=last).map(|k| base.powi(k)).collect()
            }
            Scale::Linear => nice_ticks(lo, hi, 6),
        }
    }
}

/// Absorbs rounding in `ln(x) / ln(base)` for exact powers
const EXPONENT_SLACK: f64 = 1e-9;

/// Evenly spaced ticks on a 1-2-5 step covering `lo..=hi`
fn nice_ticks(lo: f64, hi: f64, target: usize) -> Vec<f64> {
    if !(hi > lo) {
        return vec![lo];
    }
    let raw = (hi - lo) / target.max(1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|step| *step >= raw)
        .unwrap_or(10.0 * magnitude);

    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

/// `numpy.isclose` with its default tolerances
pub fn is_close(a: f64, b: f64) -> bool {
    const RTOL: f64 = 1e-5;
    const ATOL: f64 = 1e-8;
    (a - b).abs() <= ATOL + RTOL * b.abs()
}

/// Union of several value lists, sorted ascending.
///
/// Values close to one already kept are dropped, so floating noise between
/// series does not produce near-duplicate ticks.
pub fn merge_ticks<I, V>(lists: I) -> Vec<f64>
where
    I: IntoIterator<Item = V>,
    V: IntoIterator<Item = f64>,
{
    let mut merged: Vec<f64> = Vec::new();
    let mut lists = lists.into_iter();
    if let Some(first) = lists.next() {
        merged.extend(first);
    }
    for list in lists {
        for value in list {
            if !merged.iter().any(|kept| is_close(*kept, value)) {
                merged.push(value);
            }
        }
    }
    merged.sort_by(f64::total_cmp);
    merged
}

/// Every element at an even index
pub fn every_other(values: &[f64]) -> Vec<f64> {
    values.iter().step_by(2).copied().collect()
}

/// Tick label format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickFormat {
    /// Powers of the base on log axes, short decimals otherwise
    #[default]
    Auto,
    /// Fixed number of decimals
    Fixed(usize),
    /// Scientific notation with the given number of decimals
    Scientific(usize),
    /// Integers with thousands separators
    Grouped,
    /// Durations in ns/µs/ms/s
    Seconds,
}

impl TickFormat {
    pub fn format(self, value: f64, scale: Scale) -> String {
        match self {
            TickFormat::Auto => match scale {
                Scale::Log { base } => {
                    format_power(value, base).unwrap_or_else(|| format_short(value))
                }
                Scale::Linear => format_short(value),
            },
            TickFormat::Fixed(decimals) => format!("{:.*}", decimals, value),
            TickFormat::Scientific(decimals) => format!("{:.*e}", decimals, value),
            TickFormat::Grouped => (value.round() as i64).to_formatted_string(&Locale::en),
            TickFormat::Seconds => format_seconds(value),
        }
    }
}

const SUPERSCRIPT_DIGITS: [char; 10] = [
    '⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹',
];

/// Render an integer with superscript digits
pub fn superscript(value: i64) -> String {
    let mut out = String::new();
    if value < 0 {
        out.push('⁻');
    }
    for digit in value.unsigned_abs().to_string().bytes() {
        out.push(SUPERSCRIPT_DIGITS[(digit - b'0') as usize]);
    }
    out
}

/// `10³`-style label when `value` is an integer power of an integer base
fn format_power(value: f64, base: f64) -> Option<String> {
    if value <= 0.0 || base.fract() != 0.0 {
        return None;
    }
    let exponent = (value.ln() / base.ln()).round();
    if (base.powf(exponent) - value).abs() > 1e-9 * value {
        return None;
    }
    Some(format!("{}{}", base as i64, superscript(exponent as i64)))
}

/// Up to three decimals with trailing zeros trimmed, scientific outside
/// a readable range
fn format_short(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 {
        "0".to_string()
    } else if (1e-3..1e5).contains(&magnitude) {
        let text = format!("{:.3}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        format!("{:.1e}", value)
    }
}

/// Format a duration in seconds with an adaptive unit
pub fn format_seconds(secs: f64) -> String {
    let magnitude = secs.abs();
    if magnitude == 0.0 {
        "0 s".to_string()
    } else if magnitude >= 1.0 {
        format!("{} s", trim(secs))
    } else if magnitude >= 1e-3 {
        format!("{} ms", trim(secs * 1e3))
    } else if magnitude >= 1e-6 {
        format!("{} µs", trim(secs * 1e6))
    } else {
        format!("{} ns", trim(secs * 1e9))
    }
}

fn trim(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
