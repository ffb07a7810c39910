//! `sass:list`, per spec.md §4.2's list-function list. Index arguments use
//! Sass's 1-based, negative-from-end convention throughout.

use std::rc::Rc;

use crate::common::ListSeparator;
use crate::error::{SassError, SassResult};
use crate::value::{Callable, Value};

use super::builtin;

pub fn functions() -> Vec<(String, Rc<Callable>)> {
    vec![
        builtin("length", |_, args, span| {
            let v = args
                .get(0, "list")
                .ok_or_else(|| SassError::arity("Missing argument $list.", span))?;
            Ok(Value::number(v.as_list().len() as f64))
        }),
        builtin("nth", |_, args, span| {
            let v = args
                .get(0, "list")
                .ok_or_else(|| SassError::arity("Missing argument $list.", span))?;
            let n = args
                .get(1, "n")
                .ok_or_else(|| SassError::arity("Missing argument $n.", span))?
                .assert_number_with_name("n", span)?;
            let items = v.as_list();
            let idx = list_index(n.value, items.len(), span)?;
            Ok(items[idx].clone())
        }),
        builtin("set-nth", |_, args, span| {
            let v = args
                .get(0, "list")
                .ok_or_else(|| SassError::arity("Missing argument $list.", span))?;
            let n = args
                .get(1, "n")
                .ok_or_else(|| SassError::arity("Missing argument $n.", span))?
                .assert_number_with_name("n", span)?;
            let value = args
                .get(2, "value")
                .ok_or_else(|| SassError::arity("Missing argument $value.", span))?;
            let mut items = v.as_list();
            let idx = list_index(n.value, items.len(), span)?;
            items[idx] = value.clone();
            Ok(Value::List(items, v.separator(), false))
        }),
        builtin("join", |_, args, span| {
            let a = args
                .get(0, "list1")
                .ok_or_else(|| SassError::arity("Missing argument $list1.", span))?;
            let b = args
                .get(1, "list2")
                .ok_or_else(|| SassError::arity("Missing argument $list2.", span))?;
            let separator = match args.get(2, "separator") {
                Some(Value::String(s, _)) if s == "comma" => ListSeparator::Comma,
                Some(Value::String(s, _)) if s == "space" => ListSeparator::Space,
                _ => {
                    let a_sep = a.separator();
                    if a_sep != ListSeparator::Undecided {
                        a_sep
                    } else {
                        b.separator()
                    }
                }
            };
            let bracketed = matches!(args.get(3, "bracketed"), Some(v) if v.is_truthy());
            let mut items = a.as_list();
            items.extend(b.as_list());
            Ok(Value::List(items, separator, bracketed))
        }),
        builtin("append", |_, args, span| {
            let v = args
                .get(0, "list")
                .ok_or_else(|| SassError::arity("Missing argument $list.", span))?;
            let value = args
                .get(1, "val")
                .ok_or_else(|| SassError::arity("Missing argument $val.", span))?;
            let separator = match args.get(2, "separator") {
                Some(Value::String(s, _)) if s == "comma" => ListSeparator::Comma,
                Some(Value::String(s, _)) if s == "space" => ListSeparator::Space,
                _ => v.separator(),
            };
            let mut items = v.as_list();
            items.push(value.clone());
            Ok(Value::List(items, separator, false))
        }),
        builtin("zip", |_, args, _span| {
            let lists: Vec<Vec<Value>> = args.positional.iter().map(Value::as_list).collect();
            let min_len = lists.iter().map(Vec::len).min().unwrap_or(0);
            let mut out = Vec::with_capacity(min_len);
            for i in 0..min_len {
                out.push(Value::List(
                    lists.iter().map(|l| l[i].clone()).collect(),
                    ListSeparator::Space,
                    false,
                ));
            }
            Ok(Value::List(out, ListSeparator::Comma, false))
        }),
        builtin("index", |_, args, span| {
            let v = args
                .get(0, "list")
                .ok_or_else(|| SassError::arity("Missing argument $list.", span))?;
            let value = args
                .get(1, "value")
                .ok_or_else(|| SassError::arity("Missing argument $value.", span))?;
            let items = v.as_list();
            Ok(match items.iter().position(|item| item.fuzzy_eq(value)) {
                Some(i) => Value::number((i + 1) as f64),
                None => Value::Null,
            })
        }),
        builtin("separator", |_, args, span| {
            let v = args
                .get(0, "list")
                .ok_or_else(|| SassError::arity("Missing argument $list.", span))?;
            Ok(Value::unquoted_string(match v.separator() {
                ListSeparator::Comma => "comma",
                ListSeparator::Slash => "slash",
                _ => "space",
            }))
        }),
        builtin("is-bracketed", |_, args, span| {
            let v = args
                .get(0, "list")
                .ok_or_else(|| SassError::arity("Missing argument $list.", span))?;
            Ok(Value::Boolean(matches!(v, Value::List(_, _, true))))
        }),
    ]
}

fn list_index(n: f64, len: usize, span: codemap::Span) -> SassResult<usize> {
    let i = n.round() as i64;
    let idx = if i < 0 { len as i64 + i } else { i - 1 };
    if idx < 0 || idx as usize >= len {
        return Err(SassError::new(
            crate::error::SassErrorKind::Range,
            format!("$n: Invalid index {} for a list with {} elements.", n, len),
            span,
        ));
    }
    Ok(idx as usize)
}
