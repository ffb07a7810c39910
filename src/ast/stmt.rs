//! Sass statement AST, per spec.md §3.2.

use codemap::Span;
use std::rc::Rc;

use crate::ast::args::{ArgumentDeclaration, ArgumentInvocation};
use crate::ast::expr::{Expression, Interpolation, SupportsCondition};

#[derive(Debug, Clone)]
pub struct Stylesheet {
    pub body: Vec<Statement>,
    pub url: String,
    /// The whole-file span, used as the `CssTree` root span and as the
    /// anchor for synthesized nodes when this stylesheet is evaluated.
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Statement {
    StyleRule {
        selector: Interpolation,
        body: Vec<Statement>,
        span: Span,
    },
    Declaration {
        name: Interpolation,
        value: Option<Expression>,
        children: Vec<Statement>,
        span: Span,
    },
    VariableDecl {
        namespace: Option<String>,
        name: String,
        value: Expression,
        is_default: bool,
        is_global: bool,
        span: Span,
    },
    If(IfRule),
    Each {
        variables: Vec<String>,
        list: Expression,
        body: Vec<Statement>,
        span: Span,
    },
    For {
        variable: String,
        from: Expression,
        to: Expression,
        is_exclusive: bool,
        body: Vec<Statement>,
        span: Span,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
        span: Span,
    },
    FunctionDecl(Rc<FunctionDecl>),
    MixinDecl(Rc<MixinDecl>),
    Include {
        namespace: Option<String>,
        name: String,
        args: ArgumentInvocation,
        content: Option<ContentBlock>,
        span: Span,
    },
    Content {
        args: ArgumentInvocation,
        span: Span,
    },
    Return {
        value: Expression,
        span: Span,
    },
    AtRoot {
        query: Option<Interpolation>,
        body: Vec<Statement>,
        span: Span,
    },
    Media {
        query: Interpolation,
        body: Vec<Statement>,
        span: Span,
    },
    Supports {
        condition: SupportsCondition,
        body: Vec<Statement>,
        span: Span,
    },
    Import {
        imports: Vec<ImportArgument>,
        span: Span,
    },
    Use {
        url: String,
        namespace: UseNamespace,
        configuration: Vec<(String, Expression, bool)>,
        span: Span,
    },
    Forward {
        url: String,
        prefix: Option<String>,
        visibility: ForwardVisibility,
        configuration: Vec<(String, Expression, bool)>,
        span: Span,
    },
    Extend {
        selector: Interpolation,
        is_optional: bool,
        span: Span,
    },
    Error {
        value: Expression,
        span: Span,
    },
    Warn {
        value: Expression,
        span: Span,
    },
    Debug {
        value: Expression,
        span: Span,
    },
    LoudComment(String, Span),
    SilentComment(String, Span),
    /// A plain at-rule with no Sass-specific handling, e.g. `@font-face`,
    /// `@keyframes`, `@page`. Its name and value may themselves contain
    /// interpolation.
    UnknownAtRule {
        name: String,
        value: Option<Interpolation>,
        body: Vec<Statement>,
        span: Span,
    },
}

#[derive(Debug, Clone)]
pub struct IfRule {
    pub clauses: Vec<(Expression, Vec<Statement>)>,
    pub else_clause: Option<Vec<Statement>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ContentBlock {
    pub args: ArgumentDeclaration,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub arguments: ArgumentDeclaration,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct MixinDecl {
    pub name: String,
    pub arguments: ArgumentDeclaration,
    pub body: Vec<Statement>,
    pub accepts_content: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ImportArgument {
    pub url: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum UseNamespace {
    /// `@use "a"` — namespace derived from the basename.
    Default,
    /// `@use "a" as b`.
    Named(String),
    /// `@use "a" as *`.
    None,
}

#[derive(Debug, Clone, Default)]
pub struct ForwardVisibility {
    pub hide: Vec<String>,
    pub show: Vec<String>,
}

impl ForwardVisibility {
    pub fn all() -> Self {
        ForwardVisibility::default()
    }

    pub fn is_visible(&self, name: &str) -> bool {
        if !self.show.is_empty() {
            return self.show.iter().any(|n| n == name);
        }
        !self.hide.iter().any(|n| n == name)
    }
}
