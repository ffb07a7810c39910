//! `sass:string`, grounded in spec.md §4.2's string-function list.

use std::rc::Rc;

use crate::error::{SassError, SassResult};
use crate::value::{Callable, Value};

use super::builtin;

pub fn functions() -> Vec<(String, Rc<Callable>)> {
    vec![
        builtin("quote", |_, args, span| {
            let (s, _) = args
                .get(0, "string")
                .ok_or_else(|| SassError::arity("Missing argument $string.", span))?
                .assert_string(span)?;
            Ok(Value::quoted_string(s.to_string()))
        }),
        builtin("unquote", |_, args, span| {
            let (s, _) = args
                .get(0, "string")
                .ok_or_else(|| SassError::arity("Missing argument $string.", span))?
                .assert_string(span)?;
            Ok(Value::unquoted_string(s.to_string()))
        }),
        builtin("to-upper-case", |_, args, span| {
            let (s, q) = args
                .get(0, "string")
                .ok_or_else(|| SassError::arity("Missing argument $string.", span))?
                .assert_string(span)?;
            Ok(Value::String(s.to_uppercase(), q))
        }),
        builtin("to-lower-case", |_, args, span| {
            let (s, q) = args
                .get(0, "string")
                .ok_or_else(|| SassError::arity("Missing argument $string.", span))?
                .assert_string(span)?;
            Ok(Value::String(s.to_lowercase(), q))
        }),
        builtin("length", |_, args, span| {
            let (s, _) = args
                .get(0, "string")
                .ok_or_else(|| SassError::arity("Missing argument $string.", span))?
                .assert_string(span)?;
            Ok(Value::number(s.chars().count() as f64))
        }),
        builtin("index", |_, args, span| {
            let (s, _) = args
                .get(0, "string")
                .ok_or_else(|| SassError::arity("Missing argument $string.", span))?
                .assert_string(span)?;
            let (needle, _) = args
                .get(1, "substring")
                .ok_or_else(|| SassError::arity("Missing argument $substring.", span))?
                .assert_string(span)?;
            Ok(match s.find(needle) {
                Some(byte_idx) => Value::number((s[..byte_idx].chars().count() + 1) as f64),
                None => Value::Null,
            })
        }),
        builtin("insert", |_, args, span| {
            let (s, q) = args
                .get(0, "string")
                .ok_or_else(|| SassError::arity("Missing argument $string.", span))?
                .assert_string(span)?;
            let (insert, _) = args
                .get(1, "insert")
                .ok_or_else(|| SassError::arity("Missing argument $insert.", span))?
                .assert_string(span)?;
            let index = args
                .get(2, "index")
                .ok_or_else(|| SassError::arity("Missing argument $index.", span))?
                .assert_number_with_name("index", span)?;
            let chars: Vec<char> = s.chars().collect();
            let at = string_index(index.value, chars.len());
            let mut out: String = chars[..at].iter().collect();
            out.push_str(insert);
            out.extend(chars[at..].iter());
            Ok(Value::String(out, q))
        }),
        builtin("slice", |_, args, span| {
            let (s, q) = args
                .get(0, "string")
                .ok_or_else(|| SassError::arity("Missing argument $string.", span))?
                .assert_string(span)?;
            let chars: Vec<char> = s.chars().collect();
            let start = args
                .get(1, "start-at")
                .map(|v| v.assert_number_with_name("start-at", span))
                .transpose()?
                .map(|n| string_index(n.value, chars.len()))
                .unwrap_or(0);
            let end = args
                .get(2, "end-at")
                .map(|v| v.assert_number_with_name("end-at", span))
                .transpose()?
                .map(|n| string_index_inclusive(n.value, chars.len()))
                .unwrap_or(chars.len());
            if start >= end {
                return Ok(Value::String(String::new(), q));
            }
            Ok(Value::String(chars[start..end].iter().collect(), q))
        }),
    ]
}

fn string_index(i: f64, len: usize) -> usize {
    let i = i.round() as i64;
    if i < 0 {
        (len as i64 + i + 1).max(0) as usize
    } else if i == 0 {
        0
    } else {
        (i as usize - 1).min(len)
    }
}

fn string_index_inclusive(i: f64, len: usize) -> usize {
    let i = i.round() as i64;
    if i < 0 {
        (len as i64 + i + 1).max(0) as usize
    } else {
        (i as usize).min(len)
    }
}
