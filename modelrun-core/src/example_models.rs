//! Small models used by the unit tests of this crate.

use crate::attribute::{AttributeDefinition, AttributeKind, AttributeRole, AttributeStore};
use crate::errors::{ModelRunError, ModelRunResult};
use crate::model::Model;

/// `Y = 2 * X`
#[derive(Debug, Default)]
pub(crate) struct TestDoubler;

impl Model for TestDoubler {
    fn definitions(&self) -> Vec<AttributeDefinition> {
        vec![
            AttributeDefinition::horizon(),
            AttributeDefinition::series_input("X"),
            AttributeDefinition::series_output("Y"),
        ]
    }

    fn run(&self, attributes: &mut AttributeStore) -> ModelRunResult<()> {
        let doubled = attributes.input("X")? * 2.0;
        attributes.set_series("Y", doubled)
    }
}

/// Running total of `X` written back onto the state attribute `S`, plus an output that the
/// model never writes.
#[derive(Debug, Default)]
pub(crate) struct TestAccumulator;

impl Model for TestAccumulator {
    fn definitions(&self) -> Vec<AttributeDefinition> {
        vec![
            AttributeDefinition::series_input("X"),
            AttributeDefinition::series_state("S"),
            AttributeDefinition::horizon(),
            AttributeDefinition::series_output("Unused"),
        ]
    }

    fn run(&self, attributes: &mut AttributeStore) -> ModelRunResult<()> {
        let x = attributes.input("X")?.clone();
        let s = attributes.output("S")?;
        let mut total = 0.0;
        for (i, value) in x.iter().enumerate() {
            total += value;
            s[i] += total;
        }
        Ok(())
    }
}

/// Always fails with an execution error.
#[derive(Debug, Default)]
pub(crate) struct TestFailing;

impl Model for TestFailing {
    fn definitions(&self) -> Vec<AttributeDefinition> {
        vec![
            AttributeDefinition::horizon(),
            AttributeDefinition::series_input("X"),
            AttributeDefinition::series_output("Y"),
        ]
    }

    fn run(&self, _attributes: &mut AttributeStore) -> ModelRunResult<()> {
        Err(ModelRunError::ModelExecution {
            model: "TestFailing".to_string(),
            cause: "division by zero".to_string(),
        })
    }
}

/// Panics while running.
#[derive(Debug, Default)]
pub(crate) struct TestPanicking;

impl Model for TestPanicking {
    fn definitions(&self) -> Vec<AttributeDefinition> {
        vec![AttributeDefinition::horizon()]
    }

    fn run(&self, _attributes: &mut AttributeStore) -> ModelRunResult<()> {
        panic!("index out of bounds")
    }
}

/// Declares two horizons, which is not loadable.
#[derive(Debug, Default)]
pub(crate) struct TestTwoHorizons;

impl Model for TestTwoHorizons {
    fn definitions(&self) -> Vec<AttributeDefinition> {
        vec![
            AttributeDefinition::horizon(),
            AttributeDefinition::new("N", AttributeKind::Horizon, AttributeRole::Input),
        ]
    }

    fn run(&self, _attributes: &mut AttributeStore) -> ModelRunResult<()> {
        Ok(())
    }
}
