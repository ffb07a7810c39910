//! Error and result types shared by every stage of the compiler.

use std::fmt;

use codemap::Span;

/// The taxonomy of errors the core can raise, per the error-handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SassErrorKind {
    Syntax,
    Type,
    Arity,
    Range,
    UndefinedVariable,
    UndefinedFunction,
    UndefinedMixin,
    ModuleLoadFailure,
    ExtendTargetNotFound,
    RecursionLimit,
    InternalError,
}

impl fmt::Display for SassErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Syntax => "Syntax Error",
            Self::Type => "Type Error",
            Self::Arity => "Arity Error",
            Self::Range => "Range Error",
            Self::UndefinedVariable => "Undefined Variable",
            Self::UndefinedFunction => "Undefined Function",
            Self::UndefinedMixin => "Undefined Mixin",
            Self::ModuleLoadFailure => "Module Load Failure",
            Self::ExtendTargetNotFound => "Extend Target Not Found",
            Self::RecursionLimit => "Recursion Limit",
            Self::InternalError => "Internal Error",
        };
        write!(f, "{}", s)
    }
}

/// One frame of a mixin/function call stack, attached to errors raised while
/// evaluating nested invocations.
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub name: String,
    pub span: Span,
}

/// A located, kinded error. Every fallible operation in the core returns
/// `SassResult<T>` rather than panicking, except for invariants the parser
/// itself already enforces (see individual `unwrap()` call sites).
#[derive(Debug, Clone)]
pub struct SassError {
    pub kind: SassErrorKind,
    pub message: String,
    pub span: Span,
    pub trace: Vec<StackFrame>,
}

pub type SassResult<T> = Result<T, SassError>;

impl SassError {
    pub fn new(kind: SassErrorKind, message: impl Into<String>, span: Span) -> Self {
        SassError {
            kind,
            message: message.into(),
            span,
            trace: Vec::new(),
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(SassErrorKind::Syntax, message, span)
    }

    pub fn ty(message: impl Into<String>, span: Span) -> Self {
        Self::new(SassErrorKind::Type, message, span)
    }

    pub fn arity(message: impl Into<String>, span: Span) -> Self {
        Self::new(SassErrorKind::Arity, message, span)
    }

    pub fn undefined_variable(name: &str, span: Span) -> Self {
        Self::new(
            SassErrorKind::UndefinedVariable,
            format!("Undefined variable: \"${}\".", name),
            span,
        )
    }

    pub fn undefined_function(name: &str, span: Span) -> Self {
        Self::new(
            SassErrorKind::UndefinedFunction,
            format!("Undefined function: \"{}\".", name),
            span,
        )
    }

    pub fn undefined_mixin(name: &str, span: Span) -> Self {
        Self::new(
            SassErrorKind::UndefinedMixin,
            format!("Undefined mixin: \"{}\".", name),
            span,
        )
    }

    pub fn recursion_limit(span: Span) -> Self {
        Self::new(
            SassErrorKind::RecursionLimit,
            "Too much recursion. This may be an infinite loop.",
            span,
        )
    }

    /// Push a call frame, innermost first, building the trace as the error
    /// unwinds back through nested `@include`/function-call evaluation.
    pub fn with_frame(mut self, name: impl Into<String>, span: Span) -> Self {
        self.trace.push(StackFrame {
            name: name.into(),
            span,
        });
        self
    }

    /// Render the error the way the CLI and `Logger` impls present it:
    /// kind, message, then one line per stack frame.
    pub fn format_message(&self) -> String {
        let mut out = format!("Error: {}", self.message);
        for frame in &self.trace {
            out.push_str(&format!("\n    at {}", frame.name));
        }
        out
    }
}

impl fmt::Display for SassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_message())
    }
}

impl std::error::Error for SassError {}
