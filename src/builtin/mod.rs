//! Built-in function registry, per spec.md §2's "Built-in functions" module
//! and §4.2's global-vs-namespaced resolution. Grounded in the `grass` forks'
//! `builtin::modules` layout (`other_examples/*grass*`): one file per
//! `sass:*` module, each exporting a flat list of `(name, Callable)` pairs
//! that are registered both globally (legacy, unprefixed) and behind their
//! `sass:*` module namespace.

pub mod color;
pub mod list;
pub mod map;
pub mod math;
pub mod meta;
pub mod selector;
pub mod string;

use std::rc::Rc;

use codemap::Span;

use crate::ast::args::ArgumentDeclaration;
use crate::error::SassResult;
use crate::evaluate::module::Module;
use crate::evaluate::Visitor;
use crate::selector::extend::ExtensionStore;
use crate::value::{ArgList, Callable, Value};

pub(crate) fn builtin(
    name: &'static str,
    func: impl Fn(&mut Visitor, ArgList, Span) -> SassResult<Value> + 'static,
) -> (String, Rc<Callable>) {
    (
        name.to_string(),
        Rc::new(Callable::BuiltIn {
            name,
            arguments: ArgumentDeclaration::empty(),
            func: Rc::new(func),
        }),
    )
}

pub fn register_all(visitor: &mut Visitor) {
    for (name, callable) in all_functions() {
        visitor.env.set_function_local(&name, callable);
    }
}

fn all_functions() -> Vec<(String, Rc<Callable>)> {
    let mut out = Vec::new();
    out.extend(math::functions());
    out.extend(color::functions());
    out.extend(string::functions());
    out.extend(list::functions());
    out.extend(map::functions());
    out.extend(selector::functions());
    out.extend(meta::functions());
    out
}

/// Resolves `@use "sass:math"` and friends to a synthetic `Module` exposing
/// that category's functions under the module's own (unprefixed) names.
pub fn builtin_module(url: &str) -> Option<Rc<Module>> {
    let functions = match url {
        "sass:math" => math::functions(),
        "sass:color" => color::functions(),
        "sass:string" => string::functions(),
        "sass:list" => list::functions(),
        "sass:map" => map::functions(),
        "sass:selector" => selector::functions(),
        "sass:meta" => meta::functions(),
        _ => return None,
    };
    Some(Rc::new(Module {
        url: url.to_string(),
        upstream: Vec::new(),
        variables: Default::default(),
        functions: functions.into_iter().collect(),
        mixins: Default::default(),
        css_root: None,
        extension_store: ExtensionStore::new(),
    }))
}
