//! The SassScript value model, per spec.md §3.1.

pub mod calculation;
pub mod color;
pub mod map;
pub mod named_colors;
pub mod number;
pub mod unit;

use std::fmt;
use std::rc::Rc;

use codemap::Span;

use crate::ast::args::ArgumentDeclaration;
use crate::ast::stmt::{FunctionDecl, MixinDecl};
use crate::common::{ListSeparator, QuoteKind};
use crate::error::{SassError, SassResult};
use crate::evaluate::environment::Environment;

pub use calculation::{CalcArg, CalcOp, SassCalculation};
pub use color::{ColorSpace, SassColor};
pub use map::SassMap;
pub use number::SassNumber;
pub use unit::Unit;

/// A first-class callable: either a user-defined function/mixin closing over
/// the environment it was declared in, or a built-in implemented in Rust.
/// Per spec.md §9: "First-class callables become an enum of `UserDefined
/// { decl, captured_env }`, `BuiltIn { overloads: [(ArgumentDecl, fn)] }`,
/// `PlainCss { name }`."
#[derive(Clone)]
pub enum Callable {
    UserFunction {
        decl: Rc<FunctionDecl>,
        captured_env: Environment,
    },
    UserMixin {
        decl: Rc<MixinDecl>,
        captured_env: Environment,
    },
    BuiltIn {
        name: &'static str,
        arguments: ArgumentDeclaration,
        func: Rc<dyn Fn(&mut crate::evaluate::Visitor, ArgList, Span) -> SassResult<Value>>,
    },
    /// A bare CSS function call left uninterpreted, e.g. `translateX(1px)`.
    PlainCss { name: String },
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::UserFunction { .. } => write!(f, "Callable::UserFunction"),
            Callable::UserMixin { .. } => write!(f, "Callable::UserMixin"),
            Callable::BuiltIn { name, .. } => write!(f, "Callable::BuiltIn({})", name),
            Callable::PlainCss { name } => write!(f, "Callable::PlainCss({})", name),
        }
    }
}

impl Callable {
    pub fn name(&self) -> String {
        match self {
            Callable::UserFunction { decl, .. } => decl.name.clone(),
            Callable::UserMixin { decl, .. } => decl.name.clone(),
            Callable::BuiltIn { name, .. } => (*name).to_string(),
            Callable::PlainCss { name } => name.clone(),
        }
    }
}

/// A `List` that also carries keyword arguments, produced by `...`-splatted
/// rest parameters (spec.md §3.1).
#[derive(Debug, Clone, Default)]
pub struct ArgList {
    pub positional: Vec<Value>,
    pub named: Vec<(String, Value)>,
    pub separator: ListSeparator,
}

impl ArgList {
    pub fn new(positional: Vec<Value>, named: Vec<(String, Value)>, separator: ListSeparator) -> Self {
        ArgList {
            positional,
            named,
            separator,
        }
    }

    /// Look up the argument at `index` positionally, falling back to `name`
    /// among the keyword arguments — the binding builtins use since they
    /// aren't matched against an `ArgumentDeclaration` (spec.md §4.2's note
    /// that built-ins read their own arguments directly).
    pub fn get(&self, index: usize, name: &str) -> Option<&Value> {
        self.positional
            .get(index)
            .or_else(|| self.named.iter().find(|(n, _)| n == name).map(|(_, v)| v))
    }

    pub fn get_or_default<'a>(&'a self, index: usize, name: &str, default: &'a Value) -> &'a Value {
        self.get(index, name).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(SassNumber),
    String(String, QuoteKind),
    Color(SassColor),
    List(Vec<Value>, ListSeparator, bool),
    Map(SassMap),
    ArgList(Rc<ArgList>),
    Function(Rc<Callable>),
    Mixin(Rc<Callable>),
    Calculation(Box<SassCalculation>),
}

impl Value {
    pub fn number(value: f64) -> Self {
        Value::Number(SassNumber::new_unitless(value))
    }

    pub fn number_with_unit(value: f64, unit: Unit) -> Self {
        Value::Number(SassNumber::new_with_unit(value, unit))
    }

    pub fn quoted_string(s: impl Into<String>) -> Self {
        Value::String(s.into(), QuoteKind::Quoted)
    }

    pub fn unquoted_string(s: impl Into<String>) -> Self {
        Value::String(s.into(), QuoteKind::None)
    }

    /// "Blank" per spec.md §4.2 `visitDeclaration`: an empty unquoted
    /// string, empty list, or null.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s, QuoteKind::None) => s.is_empty(),
            Value::List(items, ..) => items.iter().all(Value::is_blank),
            _ => false,
        }
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(..) => "bool",
            Value::Number(..) => "number",
            Value::String(..) => "string",
            Value::Color(..) => "color",
            Value::List(..) => "list",
            Value::Map(..) => "map",
            Value::ArgList(..) => "arglist",
            Value::Function(..) => "function",
            Value::Mixin(..) => "mixin",
            Value::Calculation(..) => "calculation",
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Value::String(s, QuoteKind::None) if s.starts_with("var("))
    }

    pub fn is_special_function(&self) -> bool {
        matches!(self, Value::String(s, QuoteKind::None)
            if s.starts_with("calc(") || s.starts_with("var(") || s.starts_with("env(") || s.starts_with("clamp("))
    }

    /// Items view: a singleton for scalars, the backing vec for lists/maps
    /// (maps become `(k, v)` space lists), and positional args for arglists.
    pub fn as_list(&self) -> Vec<Value> {
        match self {
            Value::List(items, ..) => items.clone(),
            Value::Map(m) => m.as_list(),
            Value::ArgList(a) => a.positional.clone(),
            Value::Null => Vec::new(),
            other => vec![other.clone()],
        }
    }

    pub fn separator(&self) -> ListSeparator {
        match self {
            Value::List(_, sep, _) => *sep,
            Value::ArgList(a) => a.separator,
            _ => ListSeparator::Undecided,
        }
    }

    pub fn assert_number(&self, span: Span) -> SassResult<&SassNumber> {
        match self {
            Value::Number(n) => Ok(n),
            other => Err(SassError::ty(
                format!("{} is not a number.", other.inspect()),
                span,
            )),
        }
    }

    pub fn assert_number_with_name(&self, name: &str, span: Span) -> SassResult<&SassNumber> {
        match self {
            Value::Number(n) => Ok(n),
            other => Err(SassError::ty(
                format!("${}: {} is not a number.", name, other.inspect()),
                span,
            )),
        }
    }

    pub fn assert_color(&self, span: Span) -> SassResult<&SassColor> {
        match self {
            Value::Color(c) => Ok(c),
            other => Err(SassError::ty(
                format!("{} is not a color.", other.inspect()),
                span,
            )),
        }
    }

    pub fn assert_color_with_name(&self, name: &str, span: Span) -> SassResult<&SassColor> {
        match self {
            Value::Color(c) => Ok(c),
            other => Err(SassError::ty(
                format!("${}: {} is not a color.", name, other.inspect()),
                span,
            )),
        }
    }

    pub fn assert_string(&self, span: Span) -> SassResult<(&str, QuoteKind)> {
        match self {
            Value::String(s, q) => Ok((s.as_str(), *q)),
            other => Err(SassError::ty(
                format!("{} is not a string.", other.inspect()),
                span,
            )),
        }
    }

    pub fn assert_map(&self, span: Span) -> SassResult<&SassMap> {
        match self {
            Value::Map(m) => Ok(m),
            other => Err(SassError::ty(
                format!("{} is not a map.", other.inspect()),
                span,
            )),
        }
    }

    /// Fuzzy structural equality, per spec.md §3: numbers within
    /// `FUZZY_EPSILON` after unit conversion, maps compared by keys only.
    pub fn fuzzy_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.fuzzy_eq(b),
            (Value::String(a, _), Value::String(b, _)) => a == b,
            (Value::Color(a), Value::Color(b)) => a == b,
            (Value::List(a, sep_a, br_a), Value::List(b, sep_b, br_b)) => {
                sep_a == sep_b
                    && br_a == br_b
                    && a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| x.fuzzy_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }

    /// Render this value's *text* contribution inside an interpolation:
    /// quoted strings contribute their unescaped text, not their quoted
    /// form; `null` contributes the empty string (spec.md §4.2).
    pub fn to_interpolated_string(&self, span: Span, compressed: bool) -> SassResult<String> {
        match self {
            Value::Null => Ok(String::new()),
            Value::String(s, _) => Ok(s.clone()),
            other => other.to_css_string(span, compressed),
        }
    }

    /// Render this value the way it would appear as a CSS output value.
    pub fn to_css_string(&self, span: Span, compressed: bool) -> SassResult<String> {
        match self {
            Value::Null => Err(SassError::ty("null is not a valid CSS value.", span)),
            Value::Boolean(b) => Ok(b.to_string()),
            Value::Number(n) => Ok(crate::serializer::format_number_with_units(n, compressed)),
            Value::String(s, QuoteKind::Quoted) => Ok(format!("\"{}\"", escape_for_quotes(s))),
            Value::String(s, QuoteKind::None) => Ok(s.clone()),
            Value::Color(c) => Ok(crate::serializer::format_color(c, compressed)),
            Value::List(items, sep, brackets) => {
                if items.is_empty() && !*brackets {
                    return Err(SassError::ty("() isn't a valid CSS value.", span));
                }
                let rendered = items
                    .iter()
                    .filter(|v| !matches!(v, Value::Null))
                    .map(|v| v.to_css_string(span, compressed))
                    .collect::<SassResult<Vec<_>>>()?;
                let joined = rendered.join(sep.as_str(compressed));
                Ok(if *brackets {
                    format!("[{}]", joined)
                } else {
                    joined
                })
            }
            Value::Map(..) => Err(SassError::ty(
                format!("{} is not a valid CSS value.", self.inspect()),
                span,
            )),
            Value::ArgList(a) => {
                let list = Value::List(a.positional.clone(), a.separator, false);
                list.to_css_string(span, compressed)
            }
            Value::Function(f) => Ok(format!("get-function(\"{}\")", f.name())),
            Value::Mixin(m) => Ok(format!("get-mixin(\"{}\")", m.name())),
            Value::Calculation(c) => Ok(c.to_string()),
        }
    }

    /// Debug-style rendering used by `@debug`, `@error`, and `meta.inspect`.
    pub fn inspect(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s, QuoteKind::Quoted) => format!("\"{}\"", s),
            Value::String(s, QuoteKind::None) => s.clone(),
            Value::Color(c) => c.to_string(),
            Value::List(items, sep, brackets) => {
                let inner = items
                    .iter()
                    .map(Value::inspect)
                    .collect::<Vec<_>>()
                    .join(sep.as_str(false));
                if *brackets {
                    format!("[{}]", inner)
                } else if items.len() == 1 && matches!(sep, ListSeparator::Comma) {
                    format!("({},)", inner)
                } else {
                    format!("({})", inner)
                }
            }
            Value::Map(m) => {
                let inner = m
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.inspect(), v.inspect()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({})", inner)
            }
            Value::ArgList(a) => Value::List(a.positional.clone(), a.separator, false).inspect(),
            Value::Function(f) => format!("get-function(\"{}\")", f.name()),
            Value::Mixin(m) => format!("get-mixin(\"{}\")", m.name()),
            Value::Calculation(c) => c.to_string(),
        }
    }
}

fn escape_for_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inspect())
    }
}
