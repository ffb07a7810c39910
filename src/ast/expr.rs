//! SassScript expressions, per spec.md §3.2.

use codemap::Span;

use crate::ast::args::ArgumentInvocation;
use crate::common::{BinaryOp, ListSeparator, QuoteKind, UnaryOp};
use crate::value::unit::Unit;

/// An ordered sequence of literal-text chunks and expressions, with no two
/// adjacent literal chunks (spec.md §3.2). `#{...}` interpolation is a first
/// class grammar fragment produced by both statement- and expression-level
/// parsers.
#[derive(Debug, Clone, Default)]
pub struct Interpolation {
    pub parts: Vec<InterpolationPart>,
}

#[derive(Debug, Clone)]
pub enum InterpolationPart {
    Literal(String),
    Expr(Expression),
}

impl Interpolation {
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Interpolation { parts: Vec::new() }
        } else {
            Interpolation {
                parts: vec![InterpolationPart::Literal(text)],
            }
        }
    }

    pub fn push_literal(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        if let Some(InterpolationPart::Literal(last)) = self.parts.last_mut() {
            last.push_str(&text);
        } else {
            self.parts.push(InterpolationPart::Literal(text));
        }
    }

    pub fn push_expr(&mut self, expr: Expression) {
        self.parts.push(InterpolationPart::Expr(expr));
    }

    pub fn is_plain(&self) -> bool {
        matches!(
            self.parts.as_slice(),
            [] | [InterpolationPart::Literal(_)]
        )
    }

    pub fn as_plain(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [] => Some(""),
            [InterpolationPart::Literal(s)] => Some(s.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expression {
    Number {
        value: f64,
        unit: Unit,
        span: Span,
    },
    String {
        text: Interpolation,
        quote: QuoteKind,
        span: Span,
    },
    Boolean(bool, Span),
    Null(Span),
    Color {
        argb: u32,
        span: Span,
    },
    Variable {
        namespace: Option<String>,
        name: String,
        span: Span,
    },
    List {
        items: Vec<Expression>,
        separator: ListSeparator,
        brackets: bool,
        span: Span,
    },
    Map {
        pairs: Vec<(Expression, Expression)>,
        span: Span,
    },
    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
        /// Whether this `/` came from a literal-number slash position that
        /// should additionally be tagged as `as_slash` on the result.
        allows_slash: bool,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
        span: Span,
    },
    Paren(Box<Expression>, Span),
    FunctionCall {
        namespace: Option<String>,
        name: String,
        args: ArgumentInvocation,
        span: Span,
    },
    /// A call whose name itself contains interpolation, e.g. `#{$fn}(1)`,
    /// which forces plain-CSS-function treatment.
    InterpolatedFunctionCall {
        name: Interpolation,
        args: ArgumentInvocation,
        span: Span,
    },
    If {
        args: ArgumentInvocation,
        span: Span,
    },
    Selector(Span),
    Supports(Box<SupportsCondition>, Span),
    Interpolation(Interpolation, Span),
    /// A raw CSS value passed through largely unparsed, used for values this
    /// implementation doesn't need to manipulate (e.g. `url(...)`).
    ValueLiteral(String, Span),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Number { span, .. }
            | Expression::String { span, .. }
            | Expression::Boolean(_, span)
            | Expression::Null(span)
            | Expression::Color { span, .. }
            | Expression::Variable { span, .. }
            | Expression::List { span, .. }
            | Expression::Map { span, .. }
            | Expression::Binary { span, .. }
            | Expression::Unary { span, .. }
            | Expression::Paren(_, span)
            | Expression::FunctionCall { span, .. }
            | Expression::InterpolatedFunctionCall { span, .. }
            | Expression::If { span, .. }
            | Expression::Selector(span)
            | Expression::Supports(_, span)
            | Expression::Interpolation(_, span)
            | Expression::ValueLiteral(_, span) => *span,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SupportsCondition {
    Declaration {
        name: Interpolation,
        value: Interpolation,
    },
    Negation(Box<SupportsCondition>),
    Operation {
        left: Box<SupportsCondition>,
        operator: String,
        right: Box<SupportsCondition>,
    },
    Interpolation(Interpolation),
    Anything(Interpolation),
}
