use crate::errors::{ModelRunError, ModelRunResult};
use crate::timeseries::Series;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// The named series produced by a run.
///
/// Filled first from the model's output attributes and then extended by script
/// applications. Names are unique: writing an existing name replaces its values and keeps
/// its position, new names are appended.
/// Every series has exactly `horizon` values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsStore {
    horizon: usize,
    series: IndexMap<String, Series>,
}

impl ResultsStore {
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            series: IndexMap::new(),
        }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Add or replace a series
    ///
    /// Fails if the series does not have one value per horizon position.
    pub fn insert(&mut self, name: impl Into<String>, values: Series) -> ModelRunResult<()> {
        let name = name.into();
        if values.len() != self.horizon {
            return Err(ModelRunError::HorizonMismatch {
                name,
                expected: self.horizon,
                found: values.len(),
            });
        }
        self.series.insert(name, values);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Series> {
        self.series.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
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

impl IntoIterator for ResultsStore {
    type Item = (String, Series);
    type IntoIter = indexmap::map::IntoIter<String, Series>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.into_iter()
    }
}

/// Serialized as a map of name to values, in insertion order.
impl Serialize for ResultsStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.series.iter().map(|(name, values)| (name, values.to_vec())))
    }
}
