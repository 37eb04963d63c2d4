//! Tree-walking evaluator for parsed scripts.
//!
//! All variables live in a single scope that starts out as the incoming variable bag.
//! Arithmetic broadcasts numbers against series; comparing series gives a mask of `1` and
//! `0` values while comparing numbers gives a bool.

use crate::ast::{BinaryOp, Expr, Stmt, StmtKind, UnaryOp};
use crate::builtins;
use crate::error::{ScriptLangError, ScriptLangResult};
use crate::value::{broadcast, EvalResult, Value};
use indexmap::IndexMap;
use modelrun_core::script::{ScriptValue, VariableBag};
use modelrun_core::timeseries::{FloatValue, Series};
use std::collections::HashSet;

/// Upper bound on the iterations of a single `for` loop
pub const MAX_LOOP_ITERATIONS: i64 = 10_000_000;

fn flag(value: bool) -> FloatValue {
    if value {
        1.0
    } else {
        0.0
    }
}

fn is_comparison(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::And
            | BinaryOp::Or
    )
}

fn arithmetic(op: BinaryOp, a: FloatValue, b: FloatValue) -> FloatValue {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        BinaryOp::Pow => a.powf(b),
        BinaryOp::Eq => flag(a == b),
        BinaryOp::Ne => flag(a != b),
        BinaryOp::Lt => flag(a < b),
        BinaryOp::Le => flag(a <= b),
        BinaryOp::Gt => flag(a > b),
        BinaryOp::Ge => flag(a >= b),
        BinaryOp::And => flag(a != 0.0 && b != 0.0),
        BinaryOp::Or => flag(a != 0.0 || b != 0.0),
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    let what = format!("'{}'", op.symbol());
    match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinaryOp::Eq => Ok(Value::Bool(a == b)),
            BinaryOp::Ne => Ok(Value::Bool(a != b)),
            BinaryOp::And => Ok(Value::Bool(*a && *b)),
            BinaryOp::Or => Ok(Value::Bool(*a || *b)),
            _ => Err(format!("{what} is not defined for bool and bool")),
        },
        (Value::Number(a), Value::Number(b)) if is_comparison(op) => {
            Ok(Value::Bool(arithmetic(op, *a, *b) != 0.0))
        }
        _ => broadcast(lhs, rhs, &what, |a, b| arithmetic(op, a, b)),
    }
}

/// Evaluates statements against a set of variables.
#[derive(Debug, Default)]
pub struct Interpreter {
    variables: IndexMap<String, Value>,
    integers: HashSet<String>,
}

impl Interpreter {
    /// Start from the variables of a bag.
    pub fn new(bag: VariableBag) -> Self {
        let mut integers = HashSet::new();
        let variables = bag
            .into_iter()
            .map(|(name, value)| {
                if matches!(value, ScriptValue::Integer(_)) {
                    integers.insert(name.clone());
                }
                (name, Value::from(value))
            })
            .collect();
        Self {
            variables,
            integers,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Every variable, in the order it was first defined.
    ///
    /// Variables that came in as integers are handed back as integers while they still
    /// hold a whole number.
    pub fn into_bag(self) -> VariableBag {
        let integers = self.integers;
        self.variables
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::Number(x) if integers.contains(&name) && x.fract() == 0.0 => {
                        ScriptValue::Integer(x as i64)
                    }
                    other => ScriptValue::from(other),
                };
                (name, value)
            })
            .collect()
    }

    pub fn execute(&mut self, statements: &[Stmt]) -> ScriptLangResult<()> {
        statements
            .iter()
            .try_for_each(|statement| self.statement(statement))
    }

    fn statement(&mut self, statement: &Stmt) -> ScriptLangResult<()> {
        let at = |message: String| ScriptLangError::Runtime {
            line: statement.line,
            message,
        };

        match &statement.kind {
            StmtKind::Assign { name, value } => {
                let value = self.eval(value).map_err(at)?;
                self.variables.insert(name.clone(), value);
            }
            StmtKind::AssignIndex { name, index, value } => {
                let index = self
                    .eval(index)
                    .and_then(|i| i.as_count("index"))
                    .map_err(at)?;
                let value = self
                    .eval(value)
                    .and_then(|v| v.as_number("series element"))
                    .map_err(at)?;
                let series = match self.variables.get_mut(name) {
                    Some(Value::Series(series)) => series,
                    Some(other) => {
                        return Err(at(format!(
                            "'{name}' is a {} and cannot be indexed",
                            other.type_name()
                        )))
                    }
                    None => return Err(at(format!("undefined variable '{name}'"))),
                };
                let length = series.len();
                let slot = series.get_mut(index).ok_or_else(|| {
                    at(format!(
                        "index {index} is out of range for '{name}' of length {length}"
                    ))
                })?;
                *slot = value;
            }
            StmtKind::For {
                var,
                start,
                end,
                body,
            } => {
                let start = self
                    .eval(start)
                    .and_then(|v| v.as_integer("range start"))
                    .map_err(at)?;
                let end = self
                    .eval(end)
                    .and_then(|v| v.as_integer("range end"))
                    .map_err(at)?;
                if end.saturating_sub(start) > MAX_LOOP_ITERATIONS {
                    return Err(at(format!(
                        "loop over {start}..{end} exceeds {MAX_LOOP_ITERATIONS} iterations"
                    )));
                }
                for i in start..end {
                    self.variables
                        .insert(var.clone(), Value::Number(i as FloatValue));
                    self.execute(body)?;
                }
            }
            StmtKind::If {
                condition,
                then_body,
                else_body,
            } => {
                let condition = self
                    .eval(condition)
                    .and_then(|c| c.as_bool("condition"))
                    .map_err(at)?;
                if condition {
                    self.execute(then_body)?;
                } else {
                    self.execute(else_body)?;
                }
            }
            StmtKind::Expr(expr) => {
                self.eval(expr).map_err(at)?;
            }
        }
        Ok(())
    }

    fn eval(&self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Number(value) => Ok(Value::Number(*value)),
            Expr::Bool(value) => Ok(Value::Bool(*value)),
            Expr::Variable(name) => self
                .variables
                .get(name)
                .cloned()
                .ok_or_else(|| format!("undefined variable '{name}'")),
            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval(item)?.as_number("series element"))
                .collect::<EvalResult<Series>>()
                .map(Value::Series),
            Expr::Index { target, index } => {
                let target = self.eval(target)?;
                let values = target.as_series("indexed value")?;
                let index = self.eval(index)?.as_count("index")?;
                values.get(index).map(|v| Value::Number(*v)).ok_or_else(|| {
                    format!(
                        "index {index} is out of range for a series of length {}",
                        values.len()
                    )
                })
            }
            Expr::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<EvalResult<Vec<_>>>()?;
                builtins::call(name, &args)
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                match (op, operand) {
                    (UnaryOp::Neg, Value::Number(x)) => Ok(Value::Number(-x)),
                    (UnaryOp::Neg, Value::Series(values)) => Ok(Value::Series(-values)),
                    (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (UnaryOp::Neg, other) => {
                        Err(format!("cannot negate a {}", other.type_name()))
                    }
                    (UnaryOp::Not, other) => {
                        Err(format!("'!' is not defined for {}", other.type_name()))
                    }
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                if let (Value::Bool(a), BinaryOp::And | BinaryOp::Or) = (&lhs, op) {
                    let short_circuit = match op {
                        BinaryOp::And => !a,
                        _ => *a,
                    };
                    if short_circuit {
                        return Ok(Value::Bool(*a));
                    }
                }
                let rhs = self.eval(rhs)?;
                binary(*op, &lhs, &rhs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use ndarray::array;

    fn run(source: &str, bag: VariableBag) -> ScriptLangResult<Interpreter> {
        let mut interpreter = Interpreter::new(bag);
        interpreter.execute(&parse(source)?)?;
        Ok(interpreter)
    }

    fn bag() -> VariableBag {
        VariableBag::from([
            ("X".to_string(), ScriptValue::Series(array![1.0, 2.0, 3.0])),
            ("LL".to_string(), ScriptValue::Integer(3)),
        ])
    }

    fn series(interpreter: &Interpreter, name: &str) -> Series {
        match interpreter.get(name) {
            Some(Value::Series(values)) => values.clone(),
            other => panic!("{name} is not a series: {other:?}"),
        }
    }

    #[test]
    fn test_broadcast_arithmetic() {
        let interpreter = run("Y = X * 2 + 1\nZ = X - X / 2", bag()).unwrap();
        assert_eq!(series(&interpreter, "Y"), array![3.0, 5.0, 7.0]);
        assert_eq!(series(&interpreter, "Z"), array![0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_scalars_and_power() {
        let interpreter = run("a = 2 ^ 3 ^ 2; b = -2 ^ 2; c = 7 % 4", bag()).unwrap();
        assert_eq!(interpreter.get("a"), Some(&Value::Number(512.0)));
        assert_eq!(interpreter.get("b"), Some(&Value::Number(-4.0)));
        assert_eq!(interpreter.get("c"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn test_loop_and_index_assignment() {
        let source = "
            G = zeros(LL)
            G[0] = X[0]
            for i in 1..LL {
                G[i] = G[i - 1] + X[i]
            }
        ";
        let interpreter = run(source, bag()).unwrap();
        assert_eq!(series(&interpreter, "G"), array![1.0, 3.0, 6.0]);
        assert_eq!(interpreter.get("i"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_conditionals() {
        let source = "
            S = zeros(LL)
            for i in 0..LL {
                if X[i] < 2 { S[i] = -1 } else if X[i] == 2 { S[i] = 0 } else { S[i] = 1 }
            }
        ";
        let interpreter = run(source, bag()).unwrap();
        assert_eq!(series(&interpreter, "S"), array![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_series_comparison_gives_mask() {
        let interpreter = run("M = X >= 2\nN = (X > 1) && (X < 3)", bag()).unwrap();
        assert_eq!(series(&interpreter, "M"), array![0.0, 1.0, 1.0]);
        assert_eq!(series(&interpreter, "N"), array![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_short_circuit() {
        let interpreter = run("ok = false && missing\nyes = true || missing", bag()).unwrap();
        assert_eq!(interpreter.get("ok"), Some(&Value::Bool(false)));
        assert_eq!(interpreter.get("yes"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_array_literal() {
        let interpreter = run("A = [1, 2, 3] + X", bag()).unwrap();
        assert_eq!(series(&interpreter, "A"), array![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_into_bag_keeps_order_and_integers() {
        let interpreter = run("Y = -X\nLL = LL + 0", bag()).unwrap();
        let out = interpreter.into_bag();

        let names: Vec<&str> = out.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["X", "LL", "Y"]);
        assert_eq!(out["LL"], ScriptValue::Integer(3));
        assert_eq!(out["Y"], ScriptValue::Series(array![-1.0, -2.0, -3.0]));
    }

    #[test]
    fn test_undefined_variable_reports_line() {
        let err = run("Y = X\nZ = Q + 1", bag()).err().unwrap();
        assert_eq!(
            err,
            ScriptLangError::Runtime {
                line: 2,
                message: "undefined variable 'Q'".to_string()
            }
        );
    }

    #[test]
    fn test_error_inside_loop_reports_inner_line() {
        let err = run("for i in 0..4 {\n  Y = X[i]\n}", bag()).err().unwrap();
        assert_eq!(err.line(), 2);
        assert!(err
            .to_string()
            .contains("index 3 is out of range for a series of length 3"));
    }

    #[test]
    fn test_length_mismatch() {
        let err = run("Y = X + [1, 2]", bag()).err().unwrap();
        assert!(err.to_string().contains("series lengths differ (3 and 2)"));
    }

    #[test]
    fn test_type_errors() {
        assert!(run("if X { Y = 1 }", bag()).is_err());
        assert!(run("Y = !X", bag()).is_err());
        assert!(run("LL[0] = 1", bag()).is_err());
        assert!(run("Y = true + 1", bag()).is_err());
    }

    #[test]
    fn test_loop_limit() {
        let err = run("for i in 0..100000000 { }", bag()).err().unwrap();
        assert!(err.to_string().contains("exceeds"));
    }
}
