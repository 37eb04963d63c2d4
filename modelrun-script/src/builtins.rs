//! Functions callable from scripts.

use crate::value::{broadcast, map_numeric, EvalResult, Value};
use modelrun_core::timeseries::{FloatValue, Series};

fn arity(name: &str, args: &[Value], expected: &[usize]) -> EvalResult<()> {
    if expected.contains(&args.len()) {
        return Ok(());
    }
    let expected = expected
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" or ");
    let plural = if expected == "1" { "" } else { "s" };
    Err(format!(
        "function '{name}' expects {expected} argument{plural}, got {}",
        args.len()
    ))
}

fn non_empty<'a>(name: &str, values: &'a Series) -> EvalResult<&'a Series> {
    if values.is_empty() {
        Err(format!("{name} of an empty series"))
    } else {
        Ok(values)
    }
}

/// Call a builtin function with evaluated arguments.
pub(crate) fn call(name: &str, args: &[Value]) -> EvalResult<Value> {
    match name {
        "zeros" => {
            arity(name, args, &[1])?;
            Ok(Value::Series(Series::zeros(args[0].as_length("length")?)))
        }
        "fill" => {
            arity(name, args, &[2])?;
            let length = args[0].as_length("length")?;
            let value = args[1].as_number("fill value")?;
            Ok(Value::Series(Series::from_elem(length, value)))
        }
        "len" => {
            arity(name, args, &[1])?;
            Ok(Value::Number(args[0].as_series("argument of len")?.len() as FloatValue))
        }
        "sum" => {
            arity(name, args, &[1])?;
            Ok(Value::Number(args[0].as_series("argument of sum")?.sum()))
        }
        "mean" => {
            arity(name, args, &[1])?;
            let values = non_empty(name, args[0].as_series("argument of mean")?)?;
            Ok(Value::Number(values.sum() / values.len() as FloatValue))
        }
        "min" | "max" => {
            arity(name, args, &[1, 2])?;
            let pick: fn(FloatValue, FloatValue) -> FloatValue = if name == "min" {
                FloatValue::min
            } else {
                FloatValue::max
            };
            if args.len() == 2 {
                return broadcast(&args[0], &args[1], name, pick);
            }
            let values = non_empty(name, args[0].as_series(&format!("argument of {name}"))?)?;
            Ok(Value::Number(
                values.iter().copied().reduce(pick).unwrap_or(FloatValue::NAN),
            ))
        }
        "abs" => {
            arity(name, args, &[1])?;
            map_numeric(&args[0], name, FloatValue::abs)
        }
        "sqrt" => {
            arity(name, args, &[1])?;
            map_numeric(&args[0], name, FloatValue::sqrt)
        }
        "exp" => {
            arity(name, args, &[1])?;
            map_numeric(&args[0], name, FloatValue::exp)
        }
        "ln" => {
            arity(name, args, &[1])?;
            map_numeric(&args[0], name, FloatValue::ln)
        }
        "round" => {
            arity(name, args, &[1, 2])?;
            let digits = match args.get(1) {
                Some(digits) => digits.as_integer("number of digits")?,
                None => 0,
            };
            let scale = (10.0 as FloatValue).powi(digits.unsigned_abs() as i32);
            if digits >= 0 {
                map_numeric(&args[0], name, |x| (x * scale).round() / scale)
            } else {
                map_numeric(&args[0], name, |x| (x / scale).round() * scale)
            }
        }
        "cumsum" => {
            arity(name, args, &[1])?;
            let mut total = 0.0;
            let values = args[0].as_series("argument of cumsum")?.mapv(|x| {
                total += x;
                total
            });
            Ok(Value::Series(values))
        }
        "shift" => {
            arity(name, args, &[2])?;
            let values = args[0].as_series("first argument of shift")?;
            let by = args[1].as_integer("shift amount")?;
            let shifted = (0..values.len() as i64)
                .map(|i| {
                    usize::try_from(i - by)
                        .ok()
                        .and_then(|source| values.get(source).copied())
                        .unwrap_or(0.0)
                })
                .collect();
            Ok(Value::Series(shifted))
        }
        "growth" => {
            arity(name, args, &[1])?;
            let values = args[0].as_series("argument of growth")?;
            let index = (0..values.len())
                .map(|t| if t == 0 { 1.0 } else { values[t] / values[t - 1] })
                .collect();
            Ok(Value::Series(index))
        }
        _ => Err(format!("unknown function '{name}'")),
    }
}
