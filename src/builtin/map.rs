//! `sass:map`, per spec.md §4.2's map-function list.

use std::rc::Rc;

use crate::error::SassError;
use crate::value::{Callable, SassMap, Value};

use super::builtin;

pub fn functions() -> Vec<(String, Rc<Callable>)> {
    vec![
        builtin("get", |_, args, span| {
            let map = args
                .get(0, "map")
                .ok_or_else(|| SassError::arity("Missing argument $map.", span))?
                .assert_map(span)?;
            let key = args
                .get(1, "key")
                .ok_or_else(|| SassError::arity("Missing argument $key.", span))?;
            Ok(map.get(key).unwrap_or(Value::Null))
        }),
        builtin("has-key", |_, args, span| {
            let map = args
                .get(0, "map")
                .ok_or_else(|| SassError::arity("Missing argument $map.", span))?
                .assert_map(span)?;
            let key = args
                .get(1, "key")
                .ok_or_else(|| SassError::arity("Missing argument $key.", span))?;
            Ok(Value::Boolean(map.get(key).is_some()))
        }),
        builtin("keys", |_, args, span| {
            let map = args
                .get(0, "map")
                .ok_or_else(|| SassError::arity("Missing argument $map.", span))?
                .assert_map(span)?;
            Ok(Value::List(map.keys(), crate::common::ListSeparator::Comma, false))
        }),
        builtin("values", |_, args, span| {
            let map = args
                .get(0, "map")
                .ok_or_else(|| SassError::arity("Missing argument $map.", span))?
                .assert_map(span)?;
            Ok(Value::List(map.values(), crate::common::ListSeparator::Comma, false))
        }),
        builtin("merge", |_, args, span| {
            let a = args
                .get(0, "map1")
                .ok_or_else(|| SassError::arity("Missing argument $map1.", span))?
                .assert_map(span)?;
            let b = args
                .get(1, "map2")
                .ok_or_else(|| SassError::arity("Missing argument $map2.", span))?
                .assert_map(span)?;
            let mut out = a.clone();
            out.merge(b.clone());
            Ok(Value::Map(out))
        }),
        builtin("remove", |_, args, span| {
            let map = args
                .get(0, "map")
                .ok_or_else(|| SassError::arity("Missing argument $map.", span))?
                .assert_map(span)?;
            let mut out = map.clone();
            for key in args.positional.get(1..).unwrap_or(&[]) {
                out.remove(key);
            }
            for (_, key) in args.named.iter().filter(|(n, _)| n == "key") {
                out.remove(key);
            }
            Ok(Value::Map(out))
        }),
        builtin("set", |_, args, span| {
            let map = args
                .get(0, "map")
                .ok_or_else(|| SassError::arity("Missing argument $map.", span))?
                .assert_map(span)?;
            let key = args
                .get(1, "key")
                .ok_or_else(|| SassError::arity("Missing argument $key.", span))?;
            let value = args
                .get(2, "value")
                .ok_or_else(|| SassError::arity("Missing argument $value.", span))?;
            let mut out: SassMap = map.clone();
            out.insert(key.clone(), value.clone());
            Ok(Value::Map(out))
        }),
    ]
}
