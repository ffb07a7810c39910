//! Small shared enums used across the value model, parser, and evaluator.

use std::fmt;

/// Separator used to join a `Value::List`'s items on emission, and to decide
/// list-vs-list equality/compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListSeparator {
    Space,
    Comma,
    Slash,
    /// An empty or single-element list with no separator committed yet;
    /// adopts whichever separator a later concatenation imposes.
    Undecided,
}

impl Default for ListSeparator {
    fn default() -> Self {
        ListSeparator::Undecided
    }
}

impl ListSeparator {
    pub fn as_str(self, compressed: bool) -> &'static str {
        match self {
            ListSeparator::Space | ListSeparator::Undecided => " ",
            ListSeparator::Comma => {
                if compressed {
                    ","
                } else {
                    ", "
                }
            }
            ListSeparator::Slash => "/",
        }
    }
}

/// Whether a `Value::String` was written with quotes in the source. Quoted
/// strings resolve escapes eagerly; unquoted strings keep literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteKind {
    Quoted,
    None,
}

/// Binary SassScript operators, ordered here roughly by the Pratt parser's
/// precedence table (loosest to tightest binds last in this list).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Plus,
    Minus,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// Binding power used by the Pratt expression parser. Higher binds
    /// tighter. `not` is a unary operator handled outside this table.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::LessThan
            | BinaryOp::LessThanOrEqual
            | BinaryOp::GreaterThan
            | BinaryOp::GreaterThanOrEqual => 3,
            BinaryOp::Plus | BinaryOp::Minus => 4,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 5,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

/// Output style requested of the serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    Expanded,
    Compressed,
}

/// Surface syntax a stylesheet is parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Scss,
    Indented,
    Css,
}

impl Syntax {
    pub fn from_path(path: &std::path::Path) -> Syntax {
        match path.extension().and_then(|e| e.to_str()) {
            Some("sass") => Syntax::Indented,
            Some("css") => Syntax::Css,
            _ => Syntax::Scss,
        }
    }

    pub fn is_indented(self) -> bool {
        matches!(self, Syntax::Indented)
    }

    pub fn disallows_sass(self) -> bool {
        matches!(self, Syntax::Css)
    }
}
