//! `sass:meta`, per spec.md §4.2's reflection-function list.

use std::rc::Rc;

use crate::common::ListSeparator;
use crate::error::SassError;
use crate::value::{ArgList, Callable, Value};

use super::builtin;

pub fn functions() -> Vec<(String, Rc<Callable>)> {
    vec![
        builtin("type-of", |_, args, span| {
            let v = args
                .get(0, "value")
                .ok_or_else(|| SassError::arity("Missing argument $value.", span))?;
            Ok(Value::unquoted_string(v.type_name()))
        }),
        builtin("inspect", |_, args, span| {
            let v = args
                .get(0, "value")
                .ok_or_else(|| SassError::arity("Missing argument $value.", span))?;
            Ok(Value::unquoted_string(v.inspect()))
        }),
        builtin("feature-exists", |_, args, span| {
            let (name, _) = args
                .get(0, "feature")
                .ok_or_else(|| SassError::arity("Missing argument $feature.", span))?
                .assert_string(span)?;
            // Matches the set of feature flags modern Sass implementations
            // report; none of the legacy-only features this crate doesn't
            // model are claimed.
            Ok(Value::Boolean(matches!(
                name,
                "global-variable-shadowing" | "extend-selector-pseudoclass" | "at-error" | "units-level-3"
            )))
        }),
        builtin("variable-exists", |visitor, args, span| {
            let (name, _) = args
                .get(0, "name")
                .ok_or_else(|| SassError::arity("Missing argument $name.", span))?
                .assert_string(span)?;
            Ok(Value::Boolean(visitor.env.has_variable(name)))
        }),
        builtin("global-variable-exists", |visitor, args, span| {
            let (name, _) = args
                .get(0, "name")
                .ok_or_else(|| SassError::arity("Missing argument $name.", span))?
                .assert_string(span)?;
            let (globals, ..) = visitor.env.global_bindings();
            Ok(Value::Boolean(globals.contains_key(name)))
        }),
        builtin("function-exists", |visitor, args, span| {
            let (name, _) = args
                .get(0, "name")
                .ok_or_else(|| SassError::arity("Missing argument $name.", span))?
                .assert_string(span)?;
            Ok(Value::Boolean(visitor.env.get_function(name).is_some()))
        }),
        builtin("mixin-exists", |visitor, args, span| {
            let (name, _) = args
                .get(0, "name")
                .ok_or_else(|| SassError::arity("Missing argument $name.", span))?
                .assert_string(span)?;
            Ok(Value::Boolean(visitor.env.get_mixin(name).is_some()))
        }),
        builtin("content-exists", |visitor, _args, _span| {
            Ok(Value::Boolean(visitor.content_stack.last().cloned().flatten().is_some()))
        }),
        builtin("get-function", |visitor, args, span| {
            let (name, _) = args
                .get(0, "name")
                .ok_or_else(|| SassError::arity("Missing argument $name.", span))?
                .assert_string(span)?;
            let callable = visitor
                .env
                .get_function(name)
                .ok_or_else(|| SassError::undefined_function(name, span))?;
            Ok(Value::Function(callable))
        }),
        builtin("get-mixin", |visitor, args, span| {
            let (name, _) = args
                .get(0, "name")
                .ok_or_else(|| SassError::arity("Missing argument $name.", span))?
                .assert_string(span)?;
            let callable = visitor
                .env
                .get_mixin(name)
                .ok_or_else(|| SassError::undefined_mixin(name, span))?;
            Ok(Value::Mixin(callable))
        }),
        builtin("call", |visitor, args, span| {
            let target = args
                .get(0, "function")
                .ok_or_else(|| SassError::arity("Missing argument $function.", span))?
                .clone();
            let callable = match target {
                Value::Function(f) => f,
                Value::String(name, _) => visitor
                    .env
                    .get_function(&name)
                    .ok_or_else(|| SassError::undefined_function(&name, span))?,
                other => {
                    return Err(SassError::ty(
                        format!("{} is not a function reference.", other.inspect()),
                        span,
                    ))
                }
            };
            let rest = ArgList::new(
                args.positional.get(1..).unwrap_or(&[]).to_vec(),
                args.named
                    .iter()
                    .filter(|(n, _)| n.as_str() != "function")
                    .cloned()
                    .collect(),
                ListSeparator::Comma,
            );
            visitor.call_with_arglist(&callable, rest, span)
        }),
    ]
}
