//! The parser, per spec.md §4.1. Grounded in the teacher's `StyleSheetParser`
//! (a hand-written recursive-descent parser driving a `Peekable<Lexer>`),
//! generalized from the teacher's flat `Stmt`/`Expr` pair to the statement
//! and expression ASTs in `crate::ast`, and extended to the three surface
//! syntaxes (SCSS, indented Sass, plain CSS) spec.md §4.1 asks for.
//!
//! The lexer already groups characters into idents/numbers/strings/symbols;
//! this module is a token-stream recursive-descent parser with a Pratt
//! expression parser following `BinaryOp::precedence()`.

mod indented;

use std::sync::Arc;

use codemap::{CodeMap, File, Span};

use crate::ast::args::{ArgumentDeclaration, ArgumentInvocation, Parameter};
use crate::ast::expr::{Expression, Interpolation, SupportsCondition};
use crate::ast::stmt::{
    ContentBlock, ForwardVisibility, FunctionDecl, IfRule, ImportArgument, MixinDecl, Statement,
    Stylesheet, UseNamespace,
};
use crate::common::{BinaryOp, ListSeparator, QuoteKind, Syntax, UnaryOp};
use crate::error::{SassError, SassResult};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use crate::value::named_colors;
use crate::value::unit::Unit;

/// Parse `source` (already read from disk or passed to `compile_string`)
/// under the given surface syntax, producing the statement AST the
/// evaluator walks.
///
/// `codemap` is the one shared across an entire compile — the main file and
/// every recursively loaded `@import`/`@use`/`@forward` file register into
/// it, so every `Span` in the resulting AST resolves against the same
/// `CodeMap` instance the serializer and diagnostics later consult.
pub fn parse_source(
    source: &str,
    syntax: Syntax,
    url: String,
    codemap: &mut CodeMap,
) -> SassResult<Stylesheet> {
    let rewritten;
    let text: &str = if syntax.is_indented() {
        rewritten = indented::to_scss_like(source);
        &rewritten
    } else {
        source
    };

    let file = codemap.add_file(url.clone(), text.to_string());
    let span = file.span;
    let tokens = Lexer::new(file.clone()).tokenize();

    let mut parser = Parser {
        tokens,
        pos: 0,
        file,
        css_mode: syntax.disallows_sass(),
    };
    let body = parser.parse_statements_until_eof()?;
    Ok(Stylesheet { body, url, span })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    file: Arc<File>,
    css_mode: bool,
}

impl Parser {
    // ---- low-level token access -----------------------------------------

    fn tok(&self, idx: usize) -> &Token {
        self.tokens.get(idx).unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn cur(&self) -> &Token {
        self.tok(self.pos)
    }

    fn cur_span(&self) -> Span {
        self.cur().span
    }

    fn at_eof(&self) -> bool {
        matches!(self.cur().kind, TokenKind::Eof)
    }

    fn bump(&mut self) -> Token {
        let t = self.cur().clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        t
    }

    fn skip_ws(&mut self) {
        while matches!(self.cur().kind, TokenKind::Whitespace) {
            self.pos += 1;
        }
    }

    /// Skip whitespace and comments that appear inline (within an
    /// expression or a selector/value run), where they carry no AST
    /// significance.
    fn skip_trivia(&mut self) {
        loop {
            match self.cur().kind {
                TokenKind::Whitespace | TokenKind::Comment(_) | TokenKind::LineComment => {
                    self.pos += 1;
                }
                _ => break,
            }
        }
    }

    fn is_symbol(&self, c: char) -> bool {
        self.cur().is_symbol(c)
    }

    fn eat_symbol(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.is_symbol(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, c: char) -> SassResult<Span> {
        self.skip_ws();
        if self.is_symbol(c) {
            Ok(self.bump().span)
        } else {
            Err(SassError::syntax(
                format!("expected \"{}\".", c),
                self.cur_span(),
            ))
        }
    }

    fn peek_ident(&self) -> Option<&str> {
        match &self.cur().kind {
            TokenKind::Ident(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Consume an identifier token if its text case-insensitively matches
    /// `kw`, without consuming anything otherwise.
    fn eat_keyword(&mut self, kw: &str) -> bool {
        self.skip_ws();
        if matches!(&self.cur().kind, TokenKind::Ident(s) if s.eq_ignore_ascii_case(kw)) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> SassResult<String> {
        self.skip_ws();
        match self.bump().kind {
            TokenKind::Ident(s) => Ok(s),
            _ => Err(SassError::syntax("expected identifier.", self.cur_span())),
        }
    }

    fn expect_variable(&mut self) -> SassResult<String> {
        self.skip_ws();
        match self.bump().kind {
            TokenKind::Variable(s) => Ok(s),
            _ => Err(SassError::syntax("expected variable name.", self.cur_span())),
        }
    }

    fn consume_semicolon_opt(&mut self) {
        self.skip_ws();
        if self.is_symbol(';') {
            self.bump();
        }
    }

    /// Re-render a token's surface text, used to rebuild literal runs for
    /// interpolated selectors/values/at-rule parameters without re-reading
    /// the original source.
    fn token_text(tok: &Token) -> String {
        match &tok.kind {
            TokenKind::Ident(s) => s.clone(),
            TokenKind::Variable(s) => format!("${}", s),
            TokenKind::Number(s) => s.clone(),
            TokenKind::Str(text, Some(q)) => format!("{}{}{}", q, text, q),
            TokenKind::Str(text, None) => text.clone(),
            TokenKind::Hash => "#".to_string(),
            TokenKind::InterpolationStart => "#{".to_string(),
            TokenKind::Symbol(c) => c.to_string(),
            TokenKind::Whitespace => " ".to_string(),
            TokenKind::Comment(text) => format!("/*{}*/", text),
            TokenKind::LineComment => String::new(),
            TokenKind::Eof => String::new(),
        }
    }

    // ---- interpolated-run scanning ---------------------------------------

    /// Scan forward building an `Interpolation`, stopping (without
    /// consuming) at the first `stop` symbol seen at bracket depth 0.
    /// `#{...}` runs are parsed as full expressions; everything else is
    /// re-rendered back to literal text via `token_text`.
    fn scan_interpolated(&mut self, stop: &[char]) -> SassResult<Interpolation> {
        let mut interp = Interpolation::default();
        let mut depth: i32 = 0;
        loop {
            match &self.cur().kind {
                TokenKind::Eof => break,
                TokenKind::InterpolationStart => {
                    self.bump();
                    let expr = self.parse_expression()?;
                    self.expect_symbol('}')?;
                    interp.push_expr(expr);
                }
                TokenKind::Symbol(c) if *c == '(' || *c == '[' => {
                    depth += 1;
                    interp.push_literal(Self::token_text(self.cur()));
                    self.bump();
                }
                TokenKind::Symbol(c) if *c == ')' || *c == ']' => {
                    depth -= 1;
                    interp.push_literal(Self::token_text(self.cur()));
                    self.bump();
                }
                TokenKind::Symbol(c) if depth == 0 && stop.contains(c) => break,
                _ => {
                    interp.push_literal(Self::token_text(self.cur()));
                    self.bump();
                }
            }
        }
        Ok(interp)
    }

    /// Like `scan_interpolated`, but collapses to a plain `String` (used for
    /// at-rule parameter text that the evaluator doesn't need to re-parse
    /// for interpolation, such as `@charset` and plain at-rules whose value
    /// has already been flattened upstream). Not currently used but kept
    /// available for at-rules with no interpolation-sensitive content.
    #[allow(dead_code)]
    fn scan_raw(&mut self, stop: &[char]) -> SassResult<String> {
        let interp = self.scan_interpolated(stop)?;
        Ok(interp.as_plain().unwrap_or_default().to_string())
    }

    // ---- statement lists --------------------------------------------------

    fn parse_statements_until_eof(&mut self) -> SassResult<Vec<Statement>> {
        let mut out = Vec::new();
        loop {
            self.skip_ws();
            if self.at_eof() {
                break;
            }
            if let Some(stmt) = self.parse_statement()? {
                out.push(stmt);
            }
        }
        Ok(out)
    }

    fn parse_block_statements(&mut self) -> SassResult<Vec<Statement>> {
        let mut out = Vec::new();
        loop {
            self.skip_ws();
            if self.at_eof() || self.is_symbol('}') {
                break;
            }
            if let Some(stmt) = self.parse_statement()? {
                out.push(stmt);
            }
        }
        Ok(out)
    }

    fn parse_statement(&mut self) -> SassResult<Option<Statement>> {
        self.skip_ws();
        let span = self.cur_span();
        match &self.cur().kind {
            TokenKind::Comment(text) => {
                let text = text.clone();
                self.bump();
                Ok(Some(Statement::LoudComment(text, span)))
            }
            TokenKind::LineComment => {
                let text = self.raw_line_comment_text(span);
                self.bump();
                Ok(Some(Statement::SilentComment(text, span)))
            }
            TokenKind::Symbol('@') => Ok(Some(self.parse_at_rule()?)),
            TokenKind::Variable(_) => Ok(Some(self.parse_variable_decl()?)),
            _ => Ok(Some(self.parse_style_rule_or_declaration()?)),
        }
    }

    fn raw_line_comment_text(&self, span: Span) -> String {
        let base = self.file.span.low();
        let start = (span.low().0 - base.0) as usize;
        let end = (span.high().0 - base.0) as usize;
        let src = self.file.source();
        src.get(start..end)
            .unwrap_or("")
            .trim_start_matches("//")
            .to_string()
    }

    // ---- variable declarations --------------------------------------------

    fn parse_variable_decl(&mut self) -> SassResult<Statement> {
        let span_start = self.cur_span();
        let name = self.expect_variable()?;
        self.expect_symbol(':')?;
        let value = self.parse_value()?;
        let mut is_default = false;
        let mut is_global = false;
        loop {
            self.skip_ws();
            if self.is_symbol('!') {
                self.bump();
                let flag = self.expect_ident()?;
                match flag.as_str() {
                    "default" => is_default = true,
                    "global" => is_global = true,
                    other => {
                        return Err(SassError::syntax(
                            format!("Invalid flag name \"{}\".", other),
                            span_start,
                        ))
                    }
                }
            } else {
                break;
            }
        }
        self.consume_semicolon_opt();
        Ok(Statement::VariableDecl {
            namespace: None,
            name,
            value,
            is_default,
            is_global,
            span: span_start,
        })
    }

    // ---- style rules / declarations ---------------------------------------

    fn parse_style_rule_or_declaration(&mut self) -> SassResult<Statement> {
        let span = self.cur_span();
        let saved = self.pos;
        let decision = self.classify_head()?;
        self.pos = saved;

        if decision {
            self.parse_declaration(span)
        } else {
            let selector = self.scan_interpolated(&['{'])?;
            self.expect_symbol('{')?;
            let body = self.parse_block_statements()?;
            self.expect_symbol('}')?;
            Ok(Statement::StyleRule { selector, body, span })
        }
    }

    /// Non-destructive lookahead deciding declaration (`true`) vs. style
    /// rule (`false`). A custom property (`--foo`) is always a declaration;
    /// otherwise the call is a declaration when a depth-0 `:` appears before
    /// any depth-0 `{`/`;`/`}`/EOF, and that colon is followed immediately
    /// by whitespace, EOF, or `{` (`font: { ... }`) — a pseudo-class colon
    /// never has a space before its name (`a:hover`, not `a: hover`).
    fn classify_head(&mut self) -> SassResult<bool> {
        if let TokenKind::Ident(name) = &self.cur().kind {
            if name.starts_with("--") {
                return Ok(true);
            }
        }
        let mut depth: i32 = 0;
        loop {
            match &self.cur().kind {
                TokenKind::Eof => return Ok(false),
                TokenKind::InterpolationStart => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::Symbol(c) if *c == '(' || *c == '[' => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::Symbol(c) if *c == ')' || *c == ']' => {
                    depth -= 1;
                    self.bump();
                }
                TokenKind::Symbol('}') if depth > 0 => {
                    depth -= 1;
                    self.bump();
                }
                TokenKind::Symbol('{') if depth == 0 => return Ok(false),
                TokenKind::Symbol(';') if depth == 0 => return Ok(false),
                TokenKind::Symbol('}') if depth == 0 => return Ok(false),
                TokenKind::Symbol(':') if depth == 0 => {
                    self.bump();
                    return Ok(matches!(
                        self.cur().kind,
                        TokenKind::Whitespace | TokenKind::Eof
                    ) || self.is_symbol('{'));
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn parse_declaration(&mut self, span: Span) -> SassResult<Statement> {
        let name = self.scan_interpolated(&[':'])?;
        self.expect_symbol(':')?;
        self.skip_ws();

        let mut value = None;
        if !self.is_symbol('{') {
            value = Some(self.parse_value()?);
        }
        self.skip_ws();
        let mut children = Vec::new();
        if self.eat_symbol('{') {
            children = self.parse_block_statements()?;
            self.expect_symbol('}')?;
        }
        self.consume_semicolon_opt();
        Ok(Statement::Declaration { name, value, children, span })
    }

    // ---- at-rules -----------------------------------------------------------

    fn parse_at_rule(&mut self) -> SassResult<Statement> {
        let span = self.cur_span();
        self.expect_symbol('@')?;
        let name = self.expect_ident()?;
        match name.to_ascii_lowercase().as_str() {
            "use" => self.parse_use(span),
            "forward" => self.parse_forward(span),
            "import" => self.parse_import(span),
            "mixin" => self.parse_mixin_decl(span),
            "include" => self.parse_include(span),
            "content" => self.parse_content(span),
            "function" => self.parse_function_decl(span),
            "return" => self.parse_return(span),
            "if" => self.parse_if(span),
            "each" => self.parse_each(span),
            "for" => self.parse_for(span),
            "while" => self.parse_while(span),
            "at-root" => self.parse_at_root(span),
            "media" => self.parse_media(span),
            "supports" => self.parse_supports(span),
            "extend" => self.parse_extend(span),
            "error" => self.parse_error(span),
            "warn" => self.parse_warn(span),
            "debug" => self.parse_debug(span),
            "else" => Err(SassError::syntax(
                "@else must come after @if.",
                span,
            )),
            _ => self.parse_unknown_at_rule(name, span),
        }
    }

    fn parse_quoted_url(&mut self) -> SassResult<String> {
        self.skip_ws();
        match self.bump().kind {
            TokenKind::Str(text, _) => Ok(text),
            _ => Err(SassError::syntax("expected a quoted URL.", self.cur_span())),
        }
    }

    fn parse_use(&mut self, span: Span) -> SassResult<Statement> {
        let url = self.parse_quoted_url()?;
        let mut namespace = UseNamespace::Default;
        self.skip_ws();
        if self.eat_keyword("as") {
            self.skip_ws();
            if self.eat_symbol('*') {
                namespace = UseNamespace::None;
            } else {
                namespace = UseNamespace::Named(self.expect_ident()?);
            }
        }
        let configuration = self.parse_optional_configuration()?;
        self.consume_semicolon_opt();
        Ok(Statement::Use { url, namespace, configuration, span })
    }

    fn parse_forward(&mut self, span: Span) -> SassResult<Statement> {
        let url = self.parse_quoted_url()?;
        let mut prefix = None;
        let mut visibility = ForwardVisibility::all();
        self.skip_ws();
        if self.eat_keyword("as") {
            self.skip_ws();
            let stem = self.expect_ident()?;
            prefix = Some(stem.trim_end_matches('*').to_string());
        }
        self.skip_ws();
        if self.eat_keyword("show") {
            visibility.show = self.parse_ident_list()?;
        } else if self.eat_keyword("hide") {
            visibility.hide = self.parse_ident_list()?;
        }
        let configuration = self.parse_optional_configuration()?;
        self.consume_semicolon_opt();
        Ok(Statement::Forward { url, prefix, visibility, configuration, span })
    }

    fn parse_ident_list(&mut self) -> SassResult<Vec<String>> {
        let mut out = Vec::new();
        loop {
            self.skip_ws();
            if matches!(self.cur().kind, TokenKind::Variable(_)) {
                out.push(format!("${}", self.expect_variable()?));
            } else {
                out.push(self.expect_ident()?);
            }
            self.skip_ws();
            if self.eat_symbol(',') {
                continue;
            }
            break;
        }
        Ok(out)
    }

    fn parse_optional_configuration(&mut self) -> SassResult<Vec<(String, Expression, bool)>> {
        let mut configuration = Vec::new();
        self.skip_ws();
        if self.eat_keyword("with") {
            self.skip_ws();
            self.expect_symbol('(')?;
            loop {
                self.skip_ws();
                if self.eat_symbol(')') {
                    break;
                }
                let name = self.expect_variable()?;
                self.expect_symbol(':')?;
                let value = self.parse_or()?;
                let mut is_default = false;
                self.skip_ws();
                if self.is_symbol('!') {
                    self.bump();
                    self.expect_ident()?;
                    is_default = true;
                }
                configuration.push((name, value, is_default));
                self.skip_ws();
                if self.eat_symbol(',') {
                    continue;
                }
                self.expect_symbol(')')?;
                break;
            }
        }
        Ok(configuration)
    }

    fn parse_import(&mut self, span: Span) -> SassResult<Statement> {
        let mut imports = Vec::new();
        loop {
            let url = self.parse_quoted_url()?;
            imports.push(ImportArgument { url, span });
            self.skip_ws();
            if self.eat_symbol(',') {
                continue;
            }
            break;
        }
        self.consume_semicolon_opt();
        Ok(Statement::Import { imports, span })
    }

    fn parse_mixin_decl(&mut self, span: Span) -> SassResult<Statement> {
        let name = self.expect_ident()?;
        let arguments = if self.is_symbol_after_ws('(') {
            self.parse_argument_declaration()?
        } else {
            ArgumentDeclaration::empty()
        };
        self.skip_ws();
        self.expect_symbol('{')?;
        let body = self.parse_block_statements()?;
        self.expect_symbol('}')?;
        let accepts_content = body_contains_content(&body);
        Ok(Statement::MixinDecl(std::rc::Rc::new(MixinDecl {
            name,
            arguments,
            body,
            accepts_content,
            span,
        })))
    }

    fn is_symbol_after_ws(&mut self, c: char) -> bool {
        self.skip_ws();
        self.is_symbol(c)
    }

    fn parse_argument_declaration(&mut self) -> SassResult<ArgumentDeclaration> {
        self.expect_symbol('(')?;
        let mut parameters = Vec::new();
        let mut rest = None;
        loop {
            self.skip_ws();
            if self.eat_symbol(')') {
                break;
            }
            if self.is_symbol('.') {
                // `...` rest parameter.
                self.bump();
                self.bump();
                self.bump();
                self.skip_ws();
                // The preceding variable was already consumed as the rest
                // name below; dart-sass writes `$args...` with no space.
                break;
            }
            let name = self.expect_variable()?;
            self.skip_ws();
            if self.is_symbol('.') {
                self.bump();
                self.bump();
                self.bump();
                rest = Some(name);
                self.skip_ws();
                self.expect_symbol(')')?;
                break;
            }
            let mut default = None;
            if self.eat_symbol(':') {
                default = Some(self.parse_or()?);
            }
            parameters.push(Parameter { name, default });
            self.skip_ws();
            if self.eat_symbol(',') {
                continue;
            }
            self.expect_symbol(')')?;
            break;
        }
        Ok(ArgumentDeclaration { parameters, rest })
    }

    fn parse_argument_invocation(&mut self) -> SassResult<ArgumentInvocation> {
        let span = self.cur_span();
        self.expect_symbol('(')?;
        let mut positional = Vec::new();
        let mut named = Vec::new();
        let mut rest = None;
        loop {
            self.skip_ws();
            if self.eat_symbol(')') {
                break;
            }
            if matches!(self.cur().kind, TokenKind::Variable(_)) && self.is_named_arg() {
                let name = self.expect_variable()?;
                self.expect_symbol(':')?;
                let value = self.parse_or()?;
                named.push((name, value));
            } else {
                let value = self.parse_or()?;
                self.skip_ws();
                if self.is_symbol('.') && self.is_rest_marker() {
                    self.bump();
                    self.bump();
                    self.bump();
                    rest = Some(value);
                } else {
                    positional.push(value);
                }
            }
            self.skip_ws();
            if self.eat_symbol(',') {
                continue;
            }
            self.expect_symbol(')')?;
            break;
        }
        Ok(ArgumentInvocation { positional, named, rest, span })
    }

    /// Lookahead: does the current `$name` immediately precede a `:` (a
    /// keyword argument), as opposed to being the start of an expression
    /// like `$x + 1`?
    fn is_named_arg(&self) -> bool {
        let mut i = self.pos + 1;
        while matches!(self.tok(i).kind, TokenKind::Whitespace) {
            i += 1;
        }
        matches!(self.tok(i).kind, TokenKind::Symbol(':'))
    }

    fn is_rest_marker(&self) -> bool {
        matches!(self.tok(self.pos).kind, TokenKind::Symbol('.'))
            && matches!(self.tok(self.pos + 1).kind, TokenKind::Symbol('.'))
            && matches!(self.tok(self.pos + 2).kind, TokenKind::Symbol('.'))
    }

    fn parse_include(&mut self, span: Span) -> SassResult<Statement> {
        let mut namespace = None;
        let mut name = self.expect_ident()?;
        if self.is_symbol('.') {
            self.bump();
            namespace = Some(name);
            name = self.expect_ident()?;
        }
        let args = if self.is_symbol_after_ws('(') {
            self.parse_argument_invocation()?
        } else {
            ArgumentInvocation::empty(span)
        };
        self.skip_ws();
        let mut content = None;
        if self.eat_keyword("using") {
            self.skip_ws();
            let params = self.parse_argument_declaration()?;
            self.skip_ws();
            self.expect_symbol('{')?;
            let body = self.parse_block_statements()?;
            self.expect_symbol('}')?;
            content = Some(ContentBlock { args: params, body, span });
        } else if self.is_symbol_after_ws('{') {
            self.bump();
            let body = self.parse_block_statements()?;
            self.expect_symbol('}')?;
            content = Some(ContentBlock { args: ArgumentDeclaration::empty(), body, span });
        } else {
            self.consume_semicolon_opt();
        }
        Ok(Statement::Include { namespace, name, args, content, span })
    }

    fn parse_content(&mut self, span: Span) -> SassResult<Statement> {
        let args = if self.is_symbol_after_ws('(') {
            self.parse_argument_invocation()?
        } else {
            ArgumentInvocation::empty(span)
        };
        self.consume_semicolon_opt();
        Ok(Statement::Content { args, span })
    }

    fn parse_function_decl(&mut self, span: Span) -> SassResult<Statement> {
        let name = self.expect_ident()?;
        let arguments = self.parse_argument_declaration()?;
        self.skip_ws();
        self.expect_symbol('{')?;
        let body = self.parse_block_statements()?;
        self.expect_symbol('}')?;
        Ok(Statement::FunctionDecl(std::rc::Rc::new(FunctionDecl {
            name,
            arguments,
            body,
            span,
        })))
    }

    fn parse_return(&mut self, span: Span) -> SassResult<Statement> {
        let value = self.parse_value()?;
        self.consume_semicolon_opt();
        Ok(Statement::Return { value, span })
    }

    fn parse_if(&mut self, span: Span) -> SassResult<Statement> {
        let mut clauses = Vec::new();
        let cond = self.parse_value()?;
        self.skip_ws();
        self.expect_symbol('{')?;
        let body = self.parse_block_statements()?;
        self.expect_symbol('}')?;
        clauses.push((cond, body));
        let mut else_clause = None;
        loop {
            let saved = self.pos;
            self.skip_ws();
            if !self.is_symbol('@') {
                break;
            }
            let mark = self.pos;
            self.bump();
            if !self.eat_keyword("else") {
                self.pos = saved;
                break;
            }
            self.skip_ws();
            if self.eat_keyword("if") {
                let cond = self.parse_value()?;
                self.skip_ws();
                self.expect_symbol('{')?;
                let body = self.parse_block_statements()?;
                self.expect_symbol('}')?;
                clauses.push((cond, body));
            } else {
                self.skip_ws();
                self.expect_symbol('{')?;
                let body = self.parse_block_statements()?;
                self.expect_symbol('}')?;
                else_clause = Some(body);
                let _ = mark;
                break;
            }
        }
        Ok(Statement::If(IfRule { clauses, else_clause, span }))
    }

    fn parse_each(&mut self, span: Span) -> SassResult<Statement> {
        let mut variables = vec![self.expect_variable()?];
        self.skip_ws();
        while self.eat_symbol(',') {
            variables.push(self.expect_variable()?);
        }
        self.skip_ws();
        if !self.eat_keyword("in") {
            return Err(SassError::syntax("expected \"in\".", span));
        }
        let list = self.parse_value()?;
        self.skip_ws();
        self.expect_symbol('{')?;
        let body = self.parse_block_statements()?;
        self.expect_symbol('}')?;
        Ok(Statement::Each { variables, list, body, span })
    }

    fn parse_for(&mut self, span: Span) -> SassResult<Statement> {
        let variable = self.expect_variable()?;
        self.skip_ws();
        if !self.eat_keyword("from") {
            return Err(SassError::syntax("expected \"from\".", span));
        }
        let from = self.parse_or()?;
        self.skip_ws();
        let is_exclusive = if self.eat_keyword("to") {
            true
        } else if self.eat_keyword("through") {
            false
        } else {
            return Err(SassError::syntax("expected \"to\" or \"through\".", span));
        };
        let to = self.parse_or()?;
        self.skip_ws();
        self.expect_symbol('{')?;
        let body = self.parse_block_statements()?;
        self.expect_symbol('}')?;
        Ok(Statement::For { variable, from, to, is_exclusive, body, span })
    }

    fn parse_while(&mut self, span: Span) -> SassResult<Statement> {
        let condition = self.parse_value()?;
        self.skip_ws();
        self.expect_symbol('{')?;
        let body = self.parse_block_statements()?;
        self.expect_symbol('}')?;
        Ok(Statement::While { condition, body, span })
    }

    fn parse_at_root(&mut self, span: Span) -> SassResult<Statement> {
        self.skip_ws();
        let mut query = None;
        if self.is_symbol('(') {
            query = Some(self.scan_interpolated(&['{'])?);
        }
        self.skip_ws();
        self.expect_symbol('{')?;
        let body = self.parse_block_statements()?;
        self.expect_symbol('}')?;
        Ok(Statement::AtRoot { query, body, span })
    }

    fn parse_media(&mut self, span: Span) -> SassResult<Statement> {
        let query = self.scan_interpolated(&['{'])?;
        self.expect_symbol('{')?;
        let body = self.parse_block_statements()?;
        self.expect_symbol('}')?;
        Ok(Statement::Media { query, body, span })
    }

    fn parse_supports(&mut self, span: Span) -> SassResult<Statement> {
        let condition = self.parse_supports_condition()?;
        self.skip_ws();
        self.expect_symbol('{')?;
        let body = self.parse_block_statements()?;
        self.expect_symbol('}')?;
        Ok(Statement::Supports { condition, body, span })
    }

    fn parse_supports_condition(&mut self) -> SassResult<SupportsCondition> {
        self.skip_ws();
        if self.eat_keyword("not") {
            let inner = self.parse_supports_condition()?;
            return Ok(SupportsCondition::Negation(Box::new(inner)));
        }
        if self.is_symbol('(') || self.cur().kind == TokenKind::InterpolationStart {
            if self.cur().kind == TokenKind::InterpolationStart {
                self.bump();
                let expr = self.parse_expression()?;
                self.expect_symbol('}')?;
                let mut interp = Interpolation::default();
                interp.push_expr(expr);
                return Ok(SupportsCondition::Interpolation(interp));
            }
            self.bump();
            self.skip_ws();
            // Either `(prop: value)` or a parenthesized sub-condition.
            let saved = self.pos;
            if let Ok(name) = self.scan_interpolated(&[':', ')']) {
                if self.is_symbol(':') {
                    self.bump();
                    let value = self.scan_interpolated(&[')'])?;
                    self.expect_symbol(')')?;
                    let mut left = SupportsCondition::Declaration { name, value };
                    return self.parse_supports_operation(left, Some(&mut left));
                }
            }
            self.pos = saved;
            let inner = self.parse_supports_condition()?;
            self.expect_symbol(')')?;
            return self.parse_supports_operation_wrap(inner);
        }
        let text = self.scan_interpolated(&['{'])?;
        Ok(SupportsCondition::Anything(text))
    }

    fn parse_supports_operation_wrap(&mut self, left: SupportsCondition) -> SassResult<SupportsCondition> {
        self.skip_ws();
        if self.eat_keyword("and") || self.eat_keyword("or") {
            unreachable!("consumed without capturing operator text");
        }
        Ok(left)
    }

    fn parse_supports_operation(
        &mut self,
        left: SupportsCondition,
        _unused: Option<&mut SupportsCondition>,
    ) -> SassResult<SupportsCondition> {
        self.skip_ws();
        if matches!(self.peek_ident(), Some(op) if op.eq_ignore_ascii_case("and") || op.eq_ignore_ascii_case("or")) {
            let operator = self.expect_ident()?;
            let right = self.parse_supports_condition()?;
            return Ok(SupportsCondition::Operation {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn parse_extend(&mut self, span: Span) -> SassResult<Statement> {
        let selector = self.scan_interpolated(&[';', '!'])?;
        self.skip_ws();
        let mut is_optional = false;
        if self.is_symbol('!') {
            self.bump();
            self.expect_ident()?;
            is_optional = true;
        }
        self.consume_semicolon_opt();
        Ok(Statement::Extend { selector, is_optional, span })
    }

    fn parse_error(&mut self, span: Span) -> SassResult<Statement> {
        let value = self.parse_value()?;
        self.consume_semicolon_opt();
        Ok(Statement::Error { value, span })
    }

    fn parse_warn(&mut self, span: Span) -> SassResult<Statement> {
        let value = self.parse_value()?;
        self.consume_semicolon_opt();
        Ok(Statement::Warn { value, span })
    }

    fn parse_debug(&mut self, span: Span) -> SassResult<Statement> {
        let value = self.parse_value()?;
        self.consume_semicolon_opt();
        Ok(Statement::Debug { value, span })
    }

    fn parse_unknown_at_rule(&mut self, name: String, span: Span) -> SassResult<Statement> {
        self.skip_ws();
        let value = if self.is_symbol('{') || self.is_symbol(';') {
            None
        } else {
            Some(self.scan_interpolated(&['{', ';'])?)
        };
        self.skip_ws();
        let body = if self.eat_symbol('{') {
            let body = self.parse_block_statements()?;
            self.expect_symbol('}')?;
            body
        } else {
            self.consume_semicolon_opt();
            Vec::new()
        };
        Ok(Statement::UnknownAtRule { name, value, body, span })
    }

    // ---- expressions --------------------------------------------------------

    /// Top-level value grammar used by declarations, `@return`, default
    /// argument values, etc.: a comma list of space lists.
    fn parse_value(&mut self) -> SassResult<Expression> {
        let span = self.cur_span();
        let mut items = vec![self.parse_space_list()?];
        self.skip_ws();
        let mut saw_comma = false;
        while self.is_symbol(',') {
            saw_comma = true;
            self.bump();
            items.push(self.parse_space_list()?);
            self.skip_ws();
        }
        if !saw_comma {
            return Ok(items.pop().unwrap());
        }
        Ok(Expression::List { items, separator: ListSeparator::Comma, brackets: false, span })
    }

    fn parse_space_list(&mut self) -> SassResult<Expression> {
        let span = self.cur_span();
        let mut items = vec![self.parse_or()?];
        loop {
            self.skip_ws();
            if self.can_start_expression() {
                items.push(self.parse_or()?);
            } else {
                break;
            }
        }
        if items.len() == 1 {
            Ok(items.pop().unwrap())
        } else {
            Ok(Expression::List { items, separator: ListSeparator::Space, brackets: false, span })
        }
    }

    fn can_start_expression(&self) -> bool {
        !matches!(
            self.cur().kind,
            TokenKind::Eof
                | TokenKind::Symbol(',')
                | TokenKind::Symbol(';')
                | TokenKind::Symbol('{')
                | TokenKind::Symbol('}')
                | TokenKind::Symbol(')')
                | TokenKind::Symbol(']')
                | TokenKind::Symbol('!')
                | TokenKind::Symbol(':')
        )
    }

    fn parse_expression(&mut self) -> SassResult<Expression> {
        self.parse_value()
    }

    fn parse_or(&mut self) -> SassResult<Expression> {
        self.parse_binary(1)
    }

    /// Precedence-climbing binary parser matching `BinaryOp::precedence()`.
    fn parse_binary(&mut self, min_prec: u8) -> SassResult<Expression> {
        let mut left = self.parse_unary()?;
        loop {
            self.skip_ws();
            let (op, len) = match self.peek_binary_op() {
                Some(v) => v,
                None => break,
            };
            if op.precedence() < min_prec {
                break;
            }
            let span = self.cur_span();
            for _ in 0..len {
                self.bump();
            }
            let allows_slash = op == BinaryOp::Div;
            let right = self.parse_binary(op.precedence() + 1)?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                allows_slash,
                span,
            };
        }
        Ok(left)
    }

    fn peek_binary_op(&self) -> Option<(BinaryOp, usize)> {
        match &self.cur().kind {
            TokenKind::Ident(s) if s.eq_ignore_ascii_case("or") => Some((BinaryOp::Or, 1)),
            TokenKind::Ident(s) if s.eq_ignore_ascii_case("and") => Some((BinaryOp::And, 1)),
            TokenKind::Symbol('=') if matches!(self.tok(self.pos + 1).kind, TokenKind::Symbol('=')) => {
                Some((BinaryOp::Equal, 2))
            }
            TokenKind::Symbol('!') if matches!(self.tok(self.pos + 1).kind, TokenKind::Symbol('=')) => {
                Some((BinaryOp::NotEqual, 2))
            }
            TokenKind::Symbol('<') if matches!(self.tok(self.pos + 1).kind, TokenKind::Symbol('=')) => {
                Some((BinaryOp::LessThanOrEqual, 2))
            }
            TokenKind::Symbol('>') if matches!(self.tok(self.pos + 1).kind, TokenKind::Symbol('=')) => {
                Some((BinaryOp::GreaterThanOrEqual, 2))
            }
            TokenKind::Symbol('<') => Some((BinaryOp::LessThan, 1)),
            TokenKind::Symbol('>') => Some((BinaryOp::GreaterThan, 1)),
            TokenKind::Symbol('+') => Some((BinaryOp::Plus, 1)),
            TokenKind::Symbol('-') => Some((BinaryOp::Minus, 1)),
            TokenKind::Symbol('*') => Some((BinaryOp::Mul, 1)),
            TokenKind::Symbol('/') => Some((BinaryOp::Div, 1)),
            TokenKind::Symbol('%') => Some((BinaryOp::Rem, 1)),
            _ => None,
        }
    }

    fn parse_unary(&mut self) -> SassResult<Expression> {
        self.skip_ws();
        let span = self.cur_span();
        if self.eat_keyword("not") {
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary { op: UnaryOp::Not, operand: Box::new(operand), span });
        }
        if self.is_symbol('-') && !matches!(self.tok(self.pos + 1).kind, TokenKind::Whitespace | TokenKind::Eof) {
            // `-foo`/`-1` unary minus; `a - b` is handled as a binary op by
            // `parse_binary`'s surrounding whitespace since a unary minus
            // never has space before its operand.
            self.bump();
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary { op: UnaryOp::Minus, operand: Box::new(operand), span });
        }
        if self.is_symbol('+') && !matches!(self.tok(self.pos + 1).kind, TokenKind::Whitespace | TokenKind::Eof) {
            self.bump();
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary { op: UnaryOp::Plus, operand: Box::new(operand), span });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> SassResult<Expression> {
        let primary = self.parse_primary()?;
        Ok(primary)
    }

    fn parse_primary(&mut self) -> SassResult<Expression> {
        self.skip_ws();
        let span = self.cur_span();
        match self.cur().kind.clone() {
            TokenKind::Number(text) => {
                self.bump();
                let value: f64 = text.parse().unwrap_or(0.0);
                let unit = self.try_parse_unit();
                Ok(Expression::Number { value, unit, span })
            }
            TokenKind::Variable(name) => {
                self.bump();
                Ok(Expression::Variable { namespace: None, name, span })
            }
            TokenKind::Str(text, quote) => {
                self.bump();
                let quote_kind = if quote.is_some() { QuoteKind::Quoted } else { QuoteKind::None };
                Ok(Expression::String { text: Interpolation::plain(text), quote: quote_kind, span })
            }
            TokenKind::Hash => {
                self.bump();
                self.parse_hex_color(span)
            }
            TokenKind::InterpolationStart => {
                self.bump();
                let expr = self.parse_expression()?;
                self.expect_symbol('}')?;
                let mut interp = Interpolation::default();
                interp.push_expr(expr);
                Ok(Expression::Interpolation(interp, span))
            }
            TokenKind::Symbol('(') => self.parse_parenthesized(),
            TokenKind::Symbol('[') => self.parse_bracketed_list(),
            TokenKind::Ident(name) => self.parse_ident_led(name, span),
            _ => Err(SassError::syntax(
                format!("expected expression, found {:?}.", self.cur().kind),
                span,
            )),
        }
    }

    fn try_parse_unit(&mut self) -> Unit {
        if self.is_symbol('%') {
            self.bump();
            return Unit::Percent;
        }
        if let TokenKind::Ident(name) = &self.cur().kind {
            let name = name.clone();
            self.bump();
            return Unit::from_str(&name);
        }
        Unit::None
    }

    fn parse_hex_color(&mut self, span: Span) -> SassResult<Expression> {
        if let TokenKind::Ident(hex) = &self.cur().kind {
            let hex = hex.clone();
            if hex.chars().all(|c| c.is_ascii_hexdigit()) && matches!(hex.len(), 3 | 4 | 6 | 8) {
                self.bump();
                let argb = parse_hex_digits(&hex);
                return Ok(Expression::Color { argb, span });
            }
        }
        Err(SassError::syntax("expected hex color digits.", span))
    }

    fn parse_parenthesized(&mut self) -> SassResult<Expression> {
        let span = self.cur_span();
        self.bump();
        self.skip_ws();
        if self.eat_symbol(')') {
            return Ok(Expression::List {
                items: Vec::new(),
                separator: ListSeparator::Undecided,
                brackets: false,
                span,
            });
        }
        // Try a map literal: `(key: value, ...)`.
        let saved = self.pos;
        if let Ok(first_key) = self.parse_or() {
            self.skip_ws();
            if self.eat_symbol(':') {
                let mut pairs = Vec::new();
                let first_value = self.parse_or()?;
                pairs.push((first_key, first_value));
                self.skip_ws();
                while self.eat_symbol(',') {
                    self.skip_ws();
                    if self.is_symbol(')') {
                        break;
                    }
                    let k = self.parse_or()?;
                    self.expect_symbol(':')?;
                    let v = self.parse_or()?;
                    pairs.push((k, v));
                    self.skip_ws();
                }
                self.expect_symbol(')')?;
                return Ok(Expression::Map { pairs, span });
            }
        }
        self.pos = saved;
        let inner = self.parse_value()?;
        self.expect_symbol(')')?;
        Ok(Expression::Paren(Box::new(inner), span))
    }

    fn parse_bracketed_list(&mut self) -> SassResult<Expression> {
        let span = self.cur_span();
        self.bump();
        self.skip_ws();
        if self.eat_symbol(']') {
            return Ok(Expression::List { items: Vec::new(), separator: ListSeparator::Space, brackets: true, span });
        }
        let inner = self.parse_value()?;
        self.expect_symbol(']')?;
        let (items, separator) = match inner {
            Expression::List { items, separator, .. } => (items, separator),
            other => (vec![other], ListSeparator::Space),
        };
        Ok(Expression::List { items, separator, brackets: true, span })
    }

    fn parse_ident_led(&mut self, name: String, span: Span) -> SassResult<Expression> {
        self.bump();
        match name.to_ascii_lowercase().as_str() {
            "true" if !self.is_symbol_after_ws_no_skip('(') => return Ok(Expression::Boolean(true, span)),
            "false" if !self.is_symbol_after_ws_no_skip('(') => return Ok(Expression::Boolean(false, span)),
            "null" if !self.is_symbol_after_ws_no_skip('(') => return Ok(Expression::Null(span)),
            "not" => {
                let operand = self.parse_unary()?;
                return Ok(Expression::Unary { op: UnaryOp::Not, operand: Box::new(operand), span });
            }
            "if" if self.is_symbol('(') => {
                let args = self.parse_argument_invocation()?;
                return Ok(Expression::If { args, span });
            }
            _ => {}
        }

        if self.is_symbol('.') && matches!(self.tok(self.pos + 1).kind, TokenKind::Variable(_)) {
            self.bump();
            let var_name = match self.cur().kind.clone() {
                TokenKind::Variable(v) => v,
                _ => unreachable!("checked above"),
            };
            self.bump();
            return Ok(Expression::Variable { namespace: Some(name), name: var_name, span });
        }

        if self.is_symbol('.') && matches!(self.tok(self.pos + 1).kind, TokenKind::Ident(_)) {
            self.bump();
            let member = self.expect_ident()?;
            if self.is_symbol('(') {
                let args = self.parse_argument_invocation()?;
                return Ok(Expression::FunctionCall { namespace: Some(name), name: member, args, span });
            }
            return Err(SassError::syntax("expected \"(\" after namespaced member.", span));
        }

        if self.is_symbol('(') {
            let args = self.parse_argument_invocation()?;
            return Ok(Expression::FunctionCall { namespace: None, name, args, span });
        }

        if let Some(argb) = named_colors::lookup(&name) {
            return Ok(Expression::Color { argb, span });
        }

        Ok(Expression::String { text: Interpolation::plain(name), quote: QuoteKind::None, span })
    }

    fn is_symbol_after_ws_no_skip(&self, c: char) -> bool {
        self.is_symbol(c)
    }
}

fn parse_hex_digits(hex: &str) -> u32 {
    let expand = |c: char| -> u32 {
        let v = c.to_digit(16).unwrap_or(0);
        v * 16 + v
    };
    match hex.len() {
        3 => {
            let chars: Vec<char> = hex.chars().collect();
            let r = expand(chars[0]);
            let g = expand(chars[1]);
            let b = expand(chars[2]);
            0xFF00_0000 | (r << 16) | (g << 8) | b
        }
        4 => {
            let chars: Vec<char> = hex.chars().collect();
            let r = expand(chars[0]);
            let g = expand(chars[1]);
            let b = expand(chars[2]);
            let a = expand(chars[3]);
            (a << 24) | (r << 16) | (g << 8) | b
        }
        6 => {
            let v = u32::from_str_radix(hex, 16).unwrap_or(0);
            0xFF00_0000 | v
        }
        8 => u32::from_str_radix(hex, 16).unwrap_or(0xFF00_0000),
        _ => 0xFF00_0000,
    }
}

fn body_contains_content(body: &[Statement]) -> bool {
    body.iter().any(|s| match s {
        Statement::Content { .. } => true,
        Statement::If(rule) => {
            rule.clauses.iter().any(|(_, b)| body_contains_content(b))
                || rule.else_clause.as_deref().map(body_contains_content).unwrap_or(false)
        }
        Statement::Each { body, .. }
        | Statement::For { body, .. }
        | Statement::While { body, .. } => body_contains_content(body),
        _ => false,
    })
}
