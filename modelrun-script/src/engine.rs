//! The `series` engine, registered with the script engine registry.

use crate::error::ScriptLangResult;
use crate::interpreter::Interpreter;
use crate::parser::parse;
use modelrun_core::register_script_engine;
use modelrun_core::script::{ScriptEngine, VariableBag};
use std::error::Error;
use tracing::debug;

/// Name the engine is registered under
pub const ENGINE_NAME: &str = "series";

/// Parse and run `source` with `bag` as the initial variables.
pub fn run(source: &str, bag: VariableBag) -> ScriptLangResult<VariableBag> {
    let statements = parse(source)?;
    debug!(statements = statements.len(), "parsed script");
    let mut interpreter = Interpreter::new(bag);
    interpreter.execute(&statements)?;
    Ok(interpreter.into_bag())
}

#[derive(Debug, Default)]
pub struct SeriesScriptEngine;

impl ScriptEngine for SeriesScriptEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn evaluate(
        &self,
        bag: VariableBag,
        source: &str,
    ) -> Result<VariableBag, Box<dyn Error + Send + Sync>> {
        Ok(run(source, bag)?)
    }
}

register_script_engine!(SeriesScriptEngine, name = ENGINE_NAME);

#[cfg(test)]
mod tests {
    use super::*;
    use modelrun_core::script::{script_engine_by_name, ScriptValue};
    use ndarray::array;

    #[test]
    fn test_registered() {
        let engine = script_engine_by_name("series").unwrap();
        assert_eq!(engine.name(), "series");
    }

    #[test]
    fn test_evaluate() {
        let bag = VariableBag::from([(
            "Y".to_string(),
            ScriptValue::Series(array![2.0, 4.0]),
        )]);
        let out = SeriesScriptEngine.evaluate(bag, "H = Y / 2").unwrap();
        assert_eq!(out["H"], ScriptValue::Series(array![1.0, 2.0]));
    }

    #[test]
    fn test_errors_are_boxed() {
        let err = SeriesScriptEngine
            .evaluate(VariableBag::new(), "Y = Q")
            .unwrap_err();
        assert_eq!(err.to_string(), "line 1: undefined variable 'Q'");
    }
}
