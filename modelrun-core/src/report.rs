//! Tab separated reports of a [`ResultsStore`].
//!
//! A report starts with a `LATA` line listing the years, followed by one line per series:
//!
//! ```text
//! LATA	2020	2021	2022
//! Y	2	4	4
//! ```
//!
//! Values are rounded by magnitude: at most one fractional digit from 10 upwards, two from
//! 1 upwards and three below that.

use crate::errors::{ModelRunError, ModelRunResult};
use crate::loader::HEADER_TOKEN;
use crate::results::ResultsStore;
use crate::timeseries::{FloatValue, Years};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// How report values are rounded and written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingPolicy {
    /// Trailing zeros trimmed, `,` as the decimal separator and the integer part grouped
    /// in threes with spaces (`1 234,6`)
    #[default]
    Grouped,
    /// A fixed number of fractional digits per band with `.` as the decimal separator
    /// (`1234.6`, `9.96`, `0.001`)
    Plain,
}

/// Number of fractional digits kept for a value.
fn fractional_digits(value: FloatValue) -> usize {
    if value >= 10.0 {
        1
    } else if value >= 1.0 {
        2
    } else {
        3
    }
}

/// Format a single value under a rounding policy.
///
/// Rounding is half-to-even on the exact binary value. Negative zero is written as `0`.
pub fn format_value(value: FloatValue, policy: RoundingPolicy) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let digits = fractional_digits(value);
    let fixed = format!("{:.*}", digits, value);
    let negative_zero = fixed
        .strip_prefix('-')
        .is_some_and(|magnitude| magnitude.bytes().all(|b| b == b'0' || b == b'.'));
    let fixed = if negative_zero {
        fixed[1..].to_string()
    } else {
        fixed
    };

    match policy {
        RoundingPolicy::Plain => fixed,
        RoundingPolicy::Grouped => {
            let trimmed = if fixed.contains('.') {
                fixed.trim_end_matches('0').trim_end_matches('.')
            } else {
                fixed.as_str()
            };
            group(trimmed)
        }
    }
}

/// Insert a space every three integer digits and swap the decimal point for a comma.
fn group(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut out = String::with_capacity(number.len() + integer.len() / 3);
    out.push_str(sign);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(digit);
    }
    if let Some(fraction) = fraction {
        out.push(',');
        out.push_str(fraction);
    }
    out
}

/// Renders a [`ResultsStore`] as a tab separated report.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportFormatter {
    rounding: RoundingPolicy,
}

impl ReportFormatter {
    pub fn new(rounding: RoundingPolicy) -> Self {
        Self { rounding }
    }

    pub fn rounding(&self) -> RoundingPolicy {
        self.rounding
    }

    /// Render the year header followed by one row per series, in store order.
    ///
    /// Fails with [`ModelRunError::EmptyHorizon`] when there are no years.
    pub fn render(&self, store: &ResultsStore, years: &Years) -> ModelRunResult<String> {
        if years.is_empty() {
            return Err(ModelRunError::EmptyHorizon);
        }

        let mut out = String::from(HEADER_TOKEN);
        for year in years.iter() {
            // Writing to a String cannot fail
            let _ = write!(out, "\t{year}");
        }
        out.push('\n');

        for (name, values) in store.iter() {
            out.push_str(name);
            for value in values.iter() {
                out.push('\t');
                out.push_str(&format_value(*value, self.rounding));
            }
            out.push('\n');
        }
        Ok(out)
    }
}

/// A report split back into cells, for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    /// Split tab separated report text. The first non-empty line is the header.
    pub fn parse(text: &str) -> Self {
        let mut lines = text
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| line.split('\t').map(str::to_string).collect::<Vec<_>>());

        let header = lines.next().unwrap_or_default();
        Self {
            header,
            rows: lines.collect(),
        }
    }

    /// Column aligned text: names left aligned, values right aligned.
    pub fn to_aligned(&self) -> String {
        let columns = std::iter::once(&self.header)
            .chain(&self.rows)
            .map(Vec::len)
            .max()
            .unwrap_or(0);
        let mut widths = vec![0; columns];
        for row in std::iter::once(&self.header).chain(&self.rows) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        for row in std::iter::once(&self.header).chain(&self.rows) {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                if i == 0 {
                    let _ = write!(line, "{:<width$}", cell, width = widths[0]);
                } else {
                    let _ = write!(line, "  {:>width$}", cell, width = widths[i]);
                }
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}
