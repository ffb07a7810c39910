//! `@content` plumbing, per spec.md §4.2: "A content block stack for
//! `@content`."

use crate::ast::args::ArgumentDeclaration;
use crate::ast::stmt::Statement;
use crate::evaluate::environment::Environment;

/// A captured `@include ... { ... }` block, ready to be run by a `@content`
/// statement inside the mixin body it was passed to. Captures the calling
/// environment (not the mixin's), matching lexical-scope semantics: content
/// blocks see the variables visible at the `@include` call site.
#[derive(Debug, Clone)]
pub struct ContentBlock {
    pub params: ArgumentDeclaration,
    pub body: Vec<Statement>,
    pub env: Environment,
}
