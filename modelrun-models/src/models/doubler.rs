//! Scale a series by a constant factor

use modelrun_core::attribute::{AttributeDefinition, AttributeStore};
use modelrun_core::errors::ModelRunResult;
use modelrun_core::model::Model;
use modelrun_core::register_model;
use modelrun_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

const VAR_X: &str = "X";
const VAR_Y: &str = "Y";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoublerParameters {
    pub factor: FloatValue,
}

impl Default for DoublerParameters {
    fn default() -> Self {
        Self { factor: 2.0 }
    }
}

/// `Y = factor * X`, with a factor of 2 by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Doubler {
    parameters: DoublerParameters,
}

impl Doubler {
    pub fn from_parameters(parameters: DoublerParameters) -> Self {
        Self { parameters }
    }
}

impl Model for Doubler {
    fn definitions(&self) -> Vec<AttributeDefinition> {
        vec![
            AttributeDefinition::horizon(),
            AttributeDefinition::series_input(VAR_X),
            AttributeDefinition::series_output(VAR_Y),
        ]
    }

    fn run(&self, attributes: &mut AttributeStore) -> ModelRunResult<()> {
        let y = attributes.input(VAR_X)? * self.parameters.factor;
        attributes.set_series(VAR_Y, y)
    }
}

register_model!(Doubler, name = "Doubler", description = "Y = 2 * X");
