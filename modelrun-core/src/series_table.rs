use crate::timeseries::Series;
use indexmap::IndexMap;

/// Series parsed from a data file, in file order.
///
/// Every series has the same length, the horizon declared by the `LATA` header.
/// The table is a parse artifact: the values are also bound onto the model while loading,
/// so nothing needs to query the table afterwards other than for inspection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesTable {
    horizon: usize,
    series: IndexMap<String, Series>,
}

impl SeriesTable {
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            series: IndexMap::new(),
        }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Insert a series, replacing any earlier series with the same name.
    ///
    /// Returns the replaced values, if any.
    pub fn insert(&mut self, name: impl Into<String>, values: Series) -> Option<Series> {
        debug_assert_eq!(values.len(), self.horizon);
        self.series.insert(name.into(), values)
    }

    pub fn get(&self, name: &str) -> Option<&Series> {
        self.series.get(name)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Series)> {
        self.series.iter().map(|(name, values)| (name.as_str(), values))
    }
}
