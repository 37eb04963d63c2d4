use modelrun_core::script::ScriptValue;
use modelrun_core::timeseries::{FloatValue, Series};
use ndarray::Zip;

/// Longest series a script may create
pub const MAX_SERIES_LENGTH: usize = 10_000_000;

/// Result of evaluating part of a statement; the message gets its line attached by the
/// interpreter.
pub(crate) type EvalResult<T> = Result<T, String>;

/// Runtime value of a `series` expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(FloatValue),
    Bool(bool),
    Text(String),
    Series(Series),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::Text(_) => "text",
            Value::Series(_) => "series",
        }
    }

    pub(crate) fn as_number(&self, what: &str) -> EvalResult<FloatValue> {
        match self {
            Value::Number(value) => Ok(*value),
            other => Err(format!("{what} must be a number, got {}", other.type_name())),
        }
    }

    pub(crate) fn as_bool(&self, what: &str) -> EvalResult<bool> {
        match self {
            Value::Bool(value) => Ok(*value),
            other => Err(format!("{what} must be a bool, got {}", other.type_name())),
        }
    }

    pub(crate) fn as_series(&self, what: &str) -> EvalResult<&Series> {
        match self {
            Value::Series(values) => Ok(values),
            other => Err(format!("{what} must be a series, got {}", other.type_name())),
        }
    }

    pub(crate) fn as_integer(&self, what: &str) -> EvalResult<i64> {
        let value = self.as_number(what)?;
        if value.fract() != 0.0 || !value.is_finite() {
            return Err(format!("{what} must be a whole number, got {value}"));
        }
        Ok(value as i64)
    }

    /// A non-negative whole number, such as a length or an index
    pub(crate) fn as_count(&self, what: &str) -> EvalResult<usize> {
        let value = self.as_integer(what)?;
        usize::try_from(value).map_err(|_| format!("{what} must not be negative, got {value}"))
    }

    /// A count used to size a new series, at most [`MAX_SERIES_LENGTH`]
    pub(crate) fn as_length(&self, what: &str) -> EvalResult<usize> {
        let length = self.as_count(what)?;
        if length > MAX_SERIES_LENGTH {
            return Err(format!(
                "{what} {length} exceeds the maximum series length of {MAX_SERIES_LENGTH}"
            ));
        }
        Ok(length)
    }
}

impl From<ScriptValue> for Value {
    fn from(value: ScriptValue) -> Self {
        match value {
            ScriptValue::Integer(value) => Value::Number(value as FloatValue),
            ScriptValue::Number(value) => Value::Number(value),
            ScriptValue::Bool(value) => Value::Bool(value),
            ScriptValue::Text(value) => Value::Text(value),
            ScriptValue::Series(values) => Value::Series(values),
        }
    }
}

impl From<Value> for ScriptValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(value) => ScriptValue::Number(value),
            Value::Bool(value) => ScriptValue::Bool(value),
            Value::Text(value) => ScriptValue::Text(value),
            Value::Series(values) => ScriptValue::Series(values),
        }
    }
}

/// Apply `f` element-wise, broadcasting numbers against series.
///
/// Two numbers give a number; anything involving a series gives a series. Series must have
/// equal lengths.
pub(crate) fn broadcast(
    lhs: &Value,
    rhs: &Value,
    what: &str,
    f: impl Fn(FloatValue, FloatValue) -> FloatValue,
) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(f(*a, *b))),
        (Value::Series(a), Value::Number(b)) => Ok(Value::Series(a.mapv(|x| f(x, *b)))),
        (Value::Number(a), Value::Series(b)) => Ok(Value::Series(b.mapv(|x| f(*a, x)))),
        (Value::Series(a), Value::Series(b)) => {
            if a.len() != b.len() {
                return Err(format!(
                    "{what}: series lengths differ ({} and {})",
                    a.len(),
                    b.len()
                ));
            }
            Ok(Value::Series(
                Zip::from(a).and(b).map_collect(|&x, &y| f(x, y)),
            ))
        }
        (a, b) => Err(format!(
            "{what} is not defined for {} and {}",
            a.type_name(),
            b.type_name()
        )),
    }
}

/// Apply `f` to a number or to every element of a series.
pub(crate) fn map_numeric(
    value: &Value,
    what: &str,
    f: impl Fn(FloatValue) -> FloatValue,
) -> EvalResult<Value> {
    match value {
        Value::Number(x) => Ok(Value::Number(f(*x))),
        Value::Series(values) => Ok(Value::Series(values.mapv(f))),
        other => Err(format!("{what} is not defined for {}", other.type_name())),
    }
}
