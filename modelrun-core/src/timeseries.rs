//! Basic time series types shared by every stage of a run.
//!
//! A series is a one-dimensional array with one value per horizon position.
//! The positions are labelled by a [`Years`] axis, which is only needed for reporting.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

pub type FloatValue = f64;

/// Values of a named series, one per horizon position.
pub type Series = Array1<FloatValue>;

/// Pad or truncate `values` to exactly `horizon` entries.
///
/// Short inputs repeat their last supplied value; excess values are dropped.
/// An empty input stays empty as there is no value to carry forward.
pub fn forward_fill(values: &[FloatValue], horizon: usize) -> Series {
    let Some(&last) = values.last() else {
        return Series::zeros(0);
    };

    (0..horizon)
        .map(|i| values.get(i).copied().unwrap_or(last))
        .collect()
}

/// How the year axis of a report is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum YearPolicy {
    /// Use the years listed on the `LATA` header verbatim.
    #[default]
    Header,
    /// Ignore the header values and number the positions `start, start + 1, ...`.
    Synthesized { start: i32 },
}

/// Ordered labels for the horizon positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Years(Vec<i32>);

impl Years {
    pub fn new(values: Vec<i32>) -> Self {
        Self(values)
    }

    /// A consecutive axis starting at `start`
    pub fn synthesized(start: i32, horizon: usize) -> Self {
        Self((0..horizon).map(|i| start + i as i32).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[i32] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &i32> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn forward_fill_pads_with_last_value() {
        assert_eq!(forward_fill(&[1.0, 2.0, 3.0], 5), array![1.0, 2.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn forward_fill_truncates_excess() {
        assert_eq!(forward_fill(&[1.0, 2.0, 3.0, 4.0], 2), array![1.0, 2.0]);
    }

    #[test]
    fn forward_fill_single_value() {
        assert_eq!(forward_fill(&[1.03], 4), array![1.03, 1.03, 1.03, 1.03]);
    }

    #[test]
    fn forward_fill_empty() {
        assert_eq!(forward_fill(&[], 3).len(), 0);
    }

    #[test]
    fn synthesized_years() {
        let years = Years::synthesized(2015, 3);
        assert_eq!(years.values(), &[2015, 2016, 2017]);
        assert!(Years::synthesized(2015, 0).is_empty());
    }

    #[test]
    fn year_policy_deserialization() {
        #[derive(Deserialize)]
        struct Wrapper {
            years: YearPolicy,
        }

        let header: Wrapper = toml::from_str("[years]\npolicy = \"header\"\n").unwrap();
        assert_eq!(header.years, YearPolicy::Header);

        let synthesized: Wrapper =
            toml::from_str("[years]\npolicy = \"synthesized\"\nstart = 2015\n").unwrap();
        assert_eq!(synthesized.years, YearPolicy::Synthesized { start: 2015 });
    }
}
