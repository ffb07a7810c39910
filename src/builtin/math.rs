//! `sass:math`, grounded in spec.md §4.2's numeric-function list and the
//! teacher's `unit`/arithmetic handling, generalized to operate on
//! `SassNumber` directly instead of bare `f64`.

use std::rc::Rc;

use crate::error::{SassError, SassResult};
use crate::value::{Callable, SassNumber, Value};

use super::builtin;

pub fn functions() -> Vec<(String, Rc<Callable>)> {
    vec![
        builtin("ceil", |_, args, span| {
            let n = args.get(0, "number").ok_or_else(missing("number", span))?;
            let n = n.assert_number_with_name("number", span)?;
            Ok(Value::Number(with_value(n, n.value.ceil())))
        }),
        builtin("floor", |_, args, span| {
            let n = args.get(0, "number").ok_or_else(missing("number", span))?;
            let n = n.assert_number_with_name("number", span)?;
            Ok(Value::Number(with_value(n, n.value.floor())))
        }),
        builtin("round", |_, args, span| {
            let n = args.get(0, "number").ok_or_else(missing("number", span))?;
            let n = n.assert_number_with_name("number", span)?;
            Ok(Value::Number(with_value(n, round_half_away_from_zero(n.value))))
        }),
        builtin("abs", |_, args, span| {
            let n = args.get(0, "number").ok_or_else(missing("number", span))?;
            let n = n.assert_number_with_name("number", span)?;
            Ok(Value::Number(with_value(n, n.value.abs())))
        }),
        builtin("sqrt", |_, args, span| {
            let n = args.get(0, "number").ok_or_else(missing("number", span))?;
            let n = n.assert_number_with_name("number", span)?;
            if !n.is_unitless() {
                return Err(SassError::ty(
                    format!("$number: Expected {} to have no units.", n),
                    span,
                ));
            }
            Ok(Value::number(n.value.sqrt()))
        }),
        builtin("pow", |_, args, span| {
            let base = args
                .get(0, "base")
                .ok_or_else(missing("base", span))?
                .assert_number_with_name("base", span)?;
            let exponent = args
                .get(1, "exponent")
                .ok_or_else(missing("exponent", span))?
                .assert_number_with_name("exponent", span)?;
            if !base.is_unitless() || !exponent.is_unitless() {
                return Err(SassError::ty(
                    "$base and $exponent: Expected no units.".to_string(),
                    span,
                ));
            }
            Ok(Value::number(base.value.powf(exponent.value)))
        }),
        builtin("log", |_, args, span| {
            let n = args
                .get(0, "number")
                .ok_or_else(missing("number", span))?
                .assert_number_with_name("number", span)?;
            let result = match args.get(1, "base") {
                Some(base) => {
                    let base = base.assert_number_with_name("base", span)?;
                    n.value.log(base.value)
                }
                None => n.value.ln(),
            };
            Ok(Value::number(result))
        }),
        builtin("div", |_, args, span| {
            let a = args
                .get(0, "number1")
                .ok_or_else(missing("number1", span))?
                .assert_number_with_name("number1", span)?;
            let b = args
                .get(1, "number2")
                .ok_or_else(missing("number2", span))?
                .assert_number_with_name("number2", span)?;
            Ok(Value::Number(a.div(b)))
        }),
        builtin("percentage", |_, args, span| {
            let n = args
                .get(0, "number")
                .ok_or_else(missing("number", span))?
                .assert_number_with_name("number", span)?;
            if !n.is_unitless() {
                return Err(SassError::ty(
                    format!("$number: Expected {} to have no units.", n),
                    span,
                ));
            }
            Ok(Value::number_with_unit(
                n.value * 100.0,
                crate::value::Unit::Percent,
            ))
        }),
        builtin("min", |_, args, span| {
            fold_compare(&args, span, std::cmp::Ordering::Less)
        }),
        builtin("max", |_, args, span| {
            fold_compare(&args, span, std::cmp::Ordering::Greater)
        }),
        builtin("clamp", |_, args, span| {
            let min = args
                .get(0, "min")
                .ok_or_else(missing("min", span))?
                .assert_number_with_name("min", span)?;
            let value = args
                .get(1, "value")
                .ok_or_else(missing("value", span))?
                .assert_number_with_name("value", span)?;
            let max = args
                .get(2, "max")
                .ok_or_else(missing("max", span))?
                .assert_number_with_name("max", span)?;
            if value.fuzzy_cmp(min) == Some(std::cmp::Ordering::Less) {
                Ok(Value::Number(min.clone()))
            } else if value.fuzzy_cmp(max) == Some(std::cmp::Ordering::Greater) {
                Ok(Value::Number(max.clone()))
            } else {
                Ok(Value::Number(value.clone()))
            }
        }),
        builtin("is-unitless", |_, args, span| {
            let n = args
                .get(0, "number")
                .ok_or_else(missing("number", span))?
                .assert_number_with_name("number", span)?;
            Ok(Value::Boolean(n.is_unitless()))
        }),
        builtin("unit", |_, args, span| {
            let n = args
                .get(0, "number")
                .ok_or_else(missing("number", span))?
                .assert_number_with_name("number", span)?;
            Ok(Value::quoted_string(n.to_string().trim_start_matches(|c: char| {
                c.is_ascii_digit() || c == '-' || c == '.'
            }).to_string()))
        }),
        builtin("compatible", |_, args, span| {
            let a = args
                .get(0, "number1")
                .ok_or_else(missing("number1", span))?
                .assert_number_with_name("number1", span)?;
            let b = args
                .get(1, "number2")
                .ok_or_else(missing("number2", span))?
                .assert_number_with_name("number2", span)?;
            Ok(Value::Boolean(a.fuzzy_cmp(b).is_some()))
        }),
    ]
}

fn missing(name: &'static str, span: codemap::Span) -> impl Fn() -> SassError {
    move || SassError::arity(format!("Missing argument ${}.", name), span)
}

fn with_value(n: &SassNumber, value: f64) -> SassNumber {
    let mut out = n.clone();
    out.value = value;
    out.as_slash = None;
    out
}

fn round_half_away_from_zero(v: f64) -> f64 {
    if v >= 0.0 {
        (v + 0.5).floor()
    } else {
        (v - 0.5).ceil()
    }
}

fn fold_compare(
    args: &crate::value::ArgList,
    span: codemap::Span,
    want: std::cmp::Ordering,
) -> SassResult<Value> {
    let mut all: Vec<&Value> = args.positional.iter().collect();
    let named: Vec<&Value> = args.named.iter().map(|(_, v)| v).collect();
    all.extend(named);
    if all.is_empty() {
        return Err(SassError::arity("At least one argument must be passed.".to_string(), span));
    }
    let mut best = all[0].assert_number(span)?.clone();
    for v in &all[1..] {
        let n = v.assert_number(span)?;
        match best.fuzzy_cmp(n) {
            Some(ord) if ord != want && ord != std::cmp::Ordering::Equal => best = n.clone(),
            Some(_) => {}
            None => {
                return Err(SassError::ty(
                    format!("{} and {} are incompatible.", best, n),
                    span,
                ))
            }
        }
    }
    Ok(Value::Number(best))
}
