//! Bindable attributes and the store that holds their values.
//!
//! A model declares its attributes up front with [`AttributeDefinition`]s.
//! The values live in an [`AttributeStore`] owned by the model's handle rather than on the
//! model itself, so binding data never needs to reach into a model's fields.

use crate::errors::{ModelRunError, ModelRunResult};
use crate::timeseries::Series;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Conventional name of the horizon attribute
pub const HORIZON_ATTRIBUTE: &str = "LL";

/// The type of value an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Number of time positions in every series
    Horizon,
    /// One value per horizon position
    Series,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Horizon => write!(f, "horizon"),
            AttributeKind::Series => write!(f, "series"),
        }
    }
}

/// How a model uses an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeRole {
    /// Read by the model and supplied by the data file
    Input,
    /// Written by the model
    Output,
    /// Supplied by the data file and then updated by the model
    State,
}

impl AttributeRole {
    /// Whether the attribute is harvested into the results after a run.
    pub fn is_output(&self) -> bool {
        matches!(self, AttributeRole::Output | AttributeRole::State)
    }
}

/// Declaration of a single bindable attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    pub kind: AttributeKind,
    pub role: AttributeRole,
}

impl AttributeDefinition {
    pub fn new(name: &str, kind: AttributeKind, role: AttributeRole) -> Self {
        Self {
            name: name.to_string(),
            kind,
            role,
        }
    }

    /// The horizon attribute, named [`HORIZON_ATTRIBUTE`].
    pub fn horizon() -> Self {
        Self::new(HORIZON_ATTRIBUTE, AttributeKind::Horizon, AttributeRole::Input)
    }

    pub fn series_input(name: &str) -> Self {
        Self::new(name, AttributeKind::Series, AttributeRole::Input)
    }

    pub fn series_output(name: &str) -> Self {
        Self::new(name, AttributeKind::Series, AttributeRole::Output)
    }

    pub fn series_state(name: &str) -> Self {
        Self::new(name, AttributeKind::Series, AttributeRole::State)
    }
}

/// Current value of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Horizon(usize),
    Series(Series),
}

impl AttributeValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Horizon(_) => AttributeKind::Horizon,
            AttributeValue::Series(_) => AttributeKind::Series,
        }
    }

    pub fn as_horizon(&self) -> Option<usize> {
        match self {
            AttributeValue::Horizon(value) => Some(*value),
            AttributeValue::Series(_) => None,
        }
    }

    pub fn as_series(&self) -> Option<&Series> {
        match self {
            AttributeValue::Horizon(_) => None,
            AttributeValue::Series(values) => Some(values),
        }
    }
}

impl From<usize> for AttributeValue {
    fn from(value: usize) -> Self {
        AttributeValue::Horizon(value)
    }
}

impl From<Series> for AttributeValue {
    fn from(value: Series) -> Self {
        AttributeValue::Series(value)
    }
}

/// Values of every attribute a model declares, keyed by name in declaration order.
///
/// A fresh store is zero-initialised: the horizon is 0 and every series is empty until it
/// is bound or written by the model.
#[derive(Debug, Clone)]
pub struct AttributeStore {
    model: String,
    horizon_name: String,
    definitions: Vec<AttributeDefinition>,
    values: IndexMap<String, AttributeValue>,
}

impl AttributeStore {
    /// Create a store for the given definitions
    ///
    /// The definitions must contain exactly one horizon attribute and no duplicated names.
    pub fn new(model: &str, definitions: Vec<AttributeDefinition>) -> Result<Self, String> {
        let mut values = IndexMap::new();
        let mut horizon_name = None;

        for definition in &definitions {
            if values.contains_key(&definition.name) {
                return Err(format!("attribute '{}' is declared twice", definition.name));
            }
            let initial = match definition.kind {
                AttributeKind::Horizon => {
                    if let Some(existing) = &horizon_name {
                        return Err(format!(
                            "declares more than one horizon attribute ('{}' and '{}')",
                            existing, definition.name
                        ));
                    }
                    horizon_name = Some(definition.name.clone());
                    AttributeValue::Horizon(0)
                }
                AttributeKind::Series => AttributeValue::Series(Series::zeros(0)),
            };
            values.insert(definition.name.clone(), initial);
        }

        let horizon_name = horizon_name.ok_or_else(|| "declares no horizon attribute".to_string())?;

        Ok(Self {
            model: model.to_string(),
            horizon_name,
            definitions,
            values,
        })
    }

    pub fn definitions(&self) -> &[AttributeDefinition] {
        &self.definitions
    }

    pub fn definition(&self, name: &str) -> Option<&AttributeDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn horizon_name(&self) -> &str {
        &self.horizon_name
    }

    /// The current horizon
    pub fn horizon(&self) -> usize {
        self.values
            .get(&self.horizon_name)
            .and_then(AttributeValue::as_horizon)
            .unwrap_or(0)
    }

    pub fn get(&self, name: &str) -> ModelRunResult<&AttributeValue> {
        self.values.get(name).ok_or_else(|| self.unknown(name))
    }

    /// Replace the value of a declared attribute.
    ///
    /// The value must match the declared kind and series must have one value per horizon
    /// position. On error the store is left unchanged.
    pub fn set(&mut self, name: &str, value: AttributeValue) -> ModelRunResult<()> {
        let definition = self.definition(name).ok_or_else(|| self.unknown(name))?;

        if definition.kind != value.kind() {
            return Err(ModelRunError::AttributeType {
                model: self.model.clone(),
                name: name.to_string(),
                expected: definition.kind.to_string(),
                found: value.kind().to_string(),
            });
        }

        if let AttributeValue::Series(values) = &value {
            let horizon = self.horizon();
            if values.len() != horizon {
                return Err(ModelRunError::HorizonMismatch {
                    name: name.to_string(),
                    expected: horizon,
                    found: values.len(),
                });
            }
        }

        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn set_horizon(&mut self, horizon: usize) {
        self.values
            .insert(self.horizon_name.clone(), AttributeValue::Horizon(horizon));
    }

    pub fn set_series(&mut self, name: &str, values: Series) -> ModelRunResult<()> {
        self.set(name, AttributeValue::Series(values))
    }

    /// Current values of a series attribute, bound or not.
    pub fn series(&self, name: &str) -> ModelRunResult<&Series> {
        match self.get(name)? {
            AttributeValue::Series(values) => Ok(values),
            AttributeValue::Horizon(_) => Err(self.wrong_kind(name, AttributeKind::Series)),
        }
    }

    /// Values of a series the model needs as input.
    ///
    /// Fails if the series has not been bound to the current horizon.
    pub fn input(&self, name: &str) -> ModelRunResult<&Series> {
        let values = self.series(name)?;
        if values.len() != self.horizon() {
            return Err(ModelRunError::ModelExecution {
                model: self.model.clone(),
                cause: format!(
                    "input '{}' is not bound ({} values for a horizon of {})",
                    name,
                    values.len(),
                    self.horizon()
                ),
            });
        }
        Ok(values)
    }

    /// Mutable access to a series, allocated with zeros if it does not cover the horizon yet.
    pub fn output(&mut self, name: &str) -> ModelRunResult<&mut Series> {
        let horizon = self.horizon();
        let model = self.model.clone();
        match self.values.get_mut(name) {
            Some(AttributeValue::Series(values)) => {
                if values.len() != horizon {
                    *values = Series::zeros(horizon);
                }
                Ok(values)
            }
            Some(AttributeValue::Horizon(_)) => Err(ModelRunError::AttributeType {
                model,
                name: name.to_string(),
                expected: AttributeKind::Series.to_string(),
                found: AttributeKind::Horizon.to_string(),
            }),
            None => Err(ModelRunError::UnknownAttribute {
                model,
                name: name.to_string(),
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    fn unknown(&self, name: &str) -> ModelRunError {
        ModelRunError::UnknownAttribute {
            model: self.model.clone(),
            name: name.to_string(),
        }
    }

    fn wrong_kind(&self, name: &str, expected: AttributeKind) -> ModelRunError {
        let found = match expected {
            AttributeKind::Horizon => AttributeKind::Series,
            AttributeKind::Series => AttributeKind::Horizon,
        };
        ModelRunError::AttributeType {
            model: self.model.clone(),
            name: name.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
