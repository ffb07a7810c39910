//! The tree-walking evaluator, per spec.md §4.2.

pub mod content;
pub mod environment;
pub mod import_cache;
pub mod module;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use codemap::{CodeMap, Span};

use crate::ast::args::{ArgumentDeclaration, ArgumentInvocation};
use crate::ast::expr::{Expression, Interpolation, InterpolationPart};
use crate::ast::stmt::{
    ContentBlock as ContentBlockAst, ForwardVisibility, FunctionDecl, IfRule, MixinDecl, Statement,
    Stylesheet, UseNamespace,
};
use crate::common::{BinaryOp, ListSeparator, QuoteKind, UnaryOp};
use crate::css_tree::{CssNodeId, CssNodeKind, CssTree};
use crate::error::{SassError, SassErrorKind, SassResult, StackFrame};
use crate::importer::{CanonicalizeContext, Importer};
use crate::logger::Logger;
use crate::options::Options;
use crate::selector::extend::ExtensionStore;
use crate::selector::{parse_selector_list, SelectorList};
use crate::value::{ArgList, Callable, SassColor, SassMap, SassNumber, Unit, Value};

use content::ContentBlock;
use environment::Environment;
use import_cache::ImportCache;
use module::{ForwardedView, Module, ModuleRegistry};

const RECURSION_LIMIT: usize = 1024;

/// Non-local control flow produced by executing a statement list: only
/// `@return` escapes a block early, since Sass has no `break`/`continue`.
enum Flow {
    Normal,
    Return(Value),
}

pub struct CompileOutput {
    pub css: CssTree,
    pub loaded_urls: Vec<String>,
}

/// Evaluate `stylesheet`, resolving every span it and its recursively
/// loaded `@import`/`@use`/`@forward` dependencies carry against the single
/// shared `codemap` they were all parsed into (see `parse::parse_source`).
/// Mixing spans from unrelated `CodeMap`s would make `serializer::serialize`
/// and diagnostics resolve to the wrong file/line.
pub fn evaluate(
    stylesheet: &Stylesheet,
    options: &Options,
    codemap: Rc<RefCell<CodeMap>>,
) -> SassResult<CompileOutput> {
    let mut visitor = Visitor {
        css: CssTree::new(stylesheet.span),
        current_parent: 0,
        env: Environment::new(),
        extension_store: ExtensionStore::new(),
        modules: ModuleRegistry::new(),
        import_cache: ImportCache::new(),
        options,
        codemap,
        call_stack: Vec::new(),
        content_stack: Vec::new(),
        selector_stack: Vec::new(),
        loaded_urls: vec![stylesheet.url.clone()],
        depth: 0,
    };
    register_builtins(&mut visitor);
    visitor.visit_statements(&stylesheet.body)?;
    visitor.extension_store.finalize()?;
    visitor.css.prune_empty(visitor.css.root());
    Ok(CompileOutput {
        css: visitor.css,
        loaded_urls: visitor.loaded_urls,
    })
}

pub struct Visitor<'a> {
    pub css: CssTree,
    pub current_parent: CssNodeId,
    pub env: Environment,
    pub extension_store: ExtensionStore,
    pub modules: ModuleRegistry,
    pub import_cache: ImportCache,
    pub options: &'a Options,
    /// Shared across the main stylesheet and every recursively loaded
    /// module/import, so all spans they mint resolve against one `CodeMap`.
    pub codemap: Rc<RefCell<CodeMap>>,
    pub call_stack: Vec<StackFrame>,
    pub content_stack: Vec<Option<ContentBlock>>,
    pub selector_stack: Vec<SelectorList>,
    pub loaded_urls: Vec<String>,
    pub depth: usize,
}

impl<'a> Visitor<'a> {
    pub fn logger(&self) -> &dyn Logger {
        &*self.options.logger
    }

    fn check_recursion(&self, span: Span) -> SassResult<()> {
        if self.depth > RECURSION_LIMIT {
            return Err(SassError::recursion_limit(span));
        }
        Ok(())
    }

    fn current_selector(&self) -> SelectorList {
        self.selector_stack.last().cloned().unwrap_or_default()
    }

    // ---- statement execution -------------------------------------------------

    fn visit_statements(&mut self, stmts: &[Statement]) -> SassResult<Flow> {
        for stmt in stmts {
            match self.visit_statement(stmt)? {
                Flow::Normal => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn visit_statement(&mut self, stmt: &Statement) -> SassResult<Flow> {
        match stmt {
            Statement::StyleRule { selector, body, span } => self.visit_style_rule(selector, body, *span),
            Statement::Declaration { name, value, children, span } => {
                self.visit_declaration(name, value.as_ref(), children, *span)
            }
            Statement::VariableDecl {
                namespace,
                name,
                value,
                is_default,
                is_global,
                span,
            } => {
                self.visit_variable_decl(namespace.as_deref(), name, value, *is_default, *is_global, *span)
            }
            Statement::If(rule) => self.visit_if(rule),
            Statement::Each { variables, list, body, span } => {
                self.visit_each(variables, list, body, *span)
            }
            Statement::For {
                variable,
                from,
                to,
                is_exclusive,
                body,
                span,
            } => self.visit_for(variable, from, to, *is_exclusive, body, *span),
            Statement::While { condition, body, span } => self.visit_while(condition, body, *span),
            Statement::FunctionDecl(decl) => {
                let callable = Callable::UserFunction {
                    decl: decl.clone(),
                    captured_env: self.env.snapshot(),
                };
                self.env.set_function_local(&decl.name, Rc::new(callable));
                Ok(Flow::Normal)
            }
            Statement::MixinDecl(decl) => {
                let callable = Callable::UserMixin {
                    decl: decl.clone(),
                    captured_env: self.env.snapshot(),
                };
                self.env.set_mixin_local(&decl.name, Rc::new(callable));
                Ok(Flow::Normal)
            }
            Statement::Include {
                namespace,
                name,
                args,
                content,
                span,
            } => self.visit_include(namespace.as_deref(), name, args, content.as_ref(), *span),
            Statement::Content { args, span } => self.visit_content(args, *span),
            Statement::Return { value, span } => {
                let v = self.evaluate_expr(value)?;
                let _ = span;
                Ok(Flow::Return(v))
            }
            Statement::AtRoot { body, span, .. } => self.visit_at_root(body, *span),
            Statement::Media { query, body, span } => self.visit_media(query, body, *span),
            Statement::Supports { condition, body, span } => self.visit_supports(condition, body, *span),
            Statement::Import { imports, span } => self.visit_import(imports, *span),
            Statement::Use {
                url,
                namespace,
                configuration,
                span,
            } => self.visit_use(url, namespace, configuration, *span),
            Statement::Forward {
                url,
                prefix,
                visibility,
                configuration,
                span,
            } => self.visit_forward(url, prefix.as_deref(), visibility, configuration, *span),
            Statement::Extend {
                selector,
                is_optional,
                span,
            } => self.visit_extend(selector, *is_optional, *span),
            Statement::Error { value, span } => {
                let v = self.evaluate_expr(value)?;
                Err(SassError::new(
                    SassErrorKind::InternalError,
                    v.to_interpolated_string(*span, self.options.is_compressed())?,
                    *span,
                ))
            }
            Statement::Warn { value, span } => {
                let v = self.evaluate_expr(value)?;
                let text = v.to_interpolated_string(*span, self.options.is_compressed())?;
                self.logger().warn_with_span(*span, &text);
                Ok(Flow::Normal)
            }
            Statement::Debug { value, span } => {
                let v = self.evaluate_expr(value)?;
                self.logger().debug(*span, &v.inspect());
                Ok(Flow::Normal)
            }
            Statement::LoudComment(text, span) => {
                self.css.add_child(
                    self.current_parent,
                    CssNodeKind::Comment(text.clone()),
                    *span,
                );
                Ok(Flow::Normal)
            }
            Statement::SilentComment(..) => Ok(Flow::Normal),
            Statement::UnknownAtRule { name, value, body, span } => {
                self.visit_unknown_at_rule(name, value.as_ref(), body, *span)
            }
        }
    }

    fn visit_style_rule(&mut self, selector: &Interpolation, body: &[Statement], span: Span) -> SassResult<Flow> {
        self.check_recursion(span)?;
        let text = self.evaluate_interpolation(selector, span)?;
        let parsed = parse_selector_list(text.trim(), span)?;
        let resolved = if self.selector_stack.is_empty() {
            parsed
        } else {
            parsed.resolve_parent(&self.current_selector())
        };

        let node = self
            .css
            .add_child(self.current_parent, CssNodeKind::StyleRule {
                selector: Rc::new(std::cell::RefCell::new(SelectorList::default())),
            }, span);
        let extended = self.extension_store.add_selector(node, &resolved, span)?;
        if let CssNodeKind::StyleRule { selector } = &self.css.node(node).kind {
            *selector.borrow_mut() = extended;
        }

        let parent = self.current_parent;
        self.current_parent = node;
        self.selector_stack.push(resolved);
        self.env.push_scope();
        self.depth += 1;
        let result = self.visit_statements(body);
        self.depth -= 1;
        self.env.pop_scope();
        self.selector_stack.pop();
        self.current_parent = parent;
        result
    }

    fn visit_declaration(
        &mut self,
        name: &Interpolation,
        value: Option<&Expression>,
        children: &[Statement],
        span: Span,
    ) -> SassResult<Flow> {
        let name_text = self.evaluate_interpolation(name, span)?;
        let is_custom_property = name_text.starts_with("--");
        if let Some(expr) = value {
            let v = self.evaluate_expr(expr)?;
            let keep = is_custom_property && matches!(v, Value::Null) || !v.is_blank();
            if keep {
                let rendered = if is_custom_property {
                    match &v {
                        Value::Null => "null".to_string(),
                        other => other.to_css_string(span, self.options.is_compressed())?,
                    }
                } else {
                    v.to_css_string(span, self.options.is_compressed())?
                };
                self.css.add_child(
                    self.current_parent,
                    CssNodeKind::Declaration {
                        name: name_text.clone(),
                        value: rendered,
                    },
                    span,
                );
            }
        }
        if !children.is_empty() {
            // Nested declarations: `font: { family: sans; }` style. The
            // parent name is a namespace prefix for each child declaration.
            let parent = self.current_parent;
            for child in children {
                if let Statement::Declaration { name: cname, value: cvalue, children: cchildren, span: cspan } = child {
                    let mut prefixed = Interpolation::plain(format!("{}-", name_text));
                    prefixed.parts.extend(cname.parts.clone());
                    self.visit_declaration(&prefixed, cvalue.as_ref(), cchildren, *cspan)?;
                }
            }
            self.current_parent = parent;
        }
        Ok(Flow::Normal)
    }

    fn visit_variable_decl(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        value: &Expression,
        is_default: bool,
        is_global: bool,
        span: Span,
    ) -> SassResult<Flow> {
        let _ = namespace;
        if is_default {
            let exists = self.env.has_variable(name);
            if exists {
                let current = self.env.get_variable(name);
                if !matches!(current, Some(Value::Null) | None) {
                    return Ok(Flow::Normal);
                }
            }
        }
        let v = self.evaluate_expr(value)?;
        if is_global || self.selector_stack.is_empty() && self.env.depth() == 1 {
            self.env.set_variable_global(name, v);
        } else {
            self.env.set_variable_local(name, v);
        }
        let _ = span;
        Ok(Flow::Normal)
    }

    fn visit_if(&mut self, rule: &IfRule) -> SassResult<Flow> {
        for (cond, body) in &rule.clauses {
            let v = self.evaluate_expr(cond)?;
            if v.is_truthy() {
                self.env.push_scope();
                let result = self.visit_statements(body);
                self.env.pop_scope();
                return result;
            }
        }
        if let Some(body) = &rule.else_clause {
            self.env.push_scope();
            let result = self.visit_statements(body);
            self.env.pop_scope();
            return result;
        }
        Ok(Flow::Normal)
    }

    fn visit_each(
        &mut self,
        variables: &[String],
        list: &Expression,
        body: &[Statement],
        span: Span,
    ) -> SassResult<Flow> {
        let v = self.evaluate_expr(list)?;
        let items = v.as_list();
        for item in items {
            self.env.push_scope();
            if variables.len() == 1 {
                self.env.set_variable_local(&variables[0], item);
            } else {
                let parts = item.as_list();
                for (i, var) in variables.iter().enumerate() {
                    self.env
                        .set_variable_local(var, parts.get(i).cloned().unwrap_or(Value::Null));
                }
            }
            let flow = self.visit_statements(body)?;
            self.env.pop_scope();
            if let Flow::Return(_) = flow {
                return Ok(flow);
            }
        }
        let _ = span;
        Ok(Flow::Normal)
    }

    fn visit_for(
        &mut self,
        variable: &str,
        from: &Expression,
        to: &Expression,
        is_exclusive: bool,
        body: &[Statement],
        span: Span,
    ) -> SassResult<Flow> {
        let from_v = self.evaluate_expr(from)?.assert_number(span)?.value;
        let to_v = self.evaluate_expr(to)?.assert_number(span)?.value;
        let (from_i, to_i) = (from_v.round() as i64, to_v.round() as i64);
        let range: Box<dyn Iterator<Item = i64>> = if from_i <= to_i {
            if is_exclusive {
                Box::new(from_i..to_i)
            } else {
                Box::new(from_i..=to_i)
            }
        } else if is_exclusive {
            Box::new((to_i + 1..=from_i).rev())
        } else {
            Box::new((to_i..=from_i).rev())
        };
        for i in range {
            self.env.push_scope();
            self.env.set_variable_local(variable, Value::number(i as f64));
            let flow = self.visit_statements(body)?;
            self.env.pop_scope();
            if let Flow::Return(_) = flow {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn visit_while(&mut self, condition: &Expression, body: &[Statement], span: Span) -> SassResult<Flow> {
        let mut iterations = 0usize;
        loop {
            let v = self.evaluate_expr(condition)?;
            if !v.is_truthy() {
                break;
            }
            self.env.push_scope();
            let flow = self.visit_statements(body)?;
            self.env.pop_scope();
            if let Flow::Return(_) = flow {
                return Ok(flow);
            }
            iterations += 1;
            if iterations > 1_000_000 {
                return Err(SassError::recursion_limit(span));
            }
        }
        Ok(Flow::Normal)
    }

    fn visit_include(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        args: &ArgumentInvocation,
        content: Option<&ContentBlockAst>,
        span: Span,
    ) -> SassResult<Flow> {
        let qualified = match namespace {
            Some(ns) => format!("{}.{}", ns, name),
            None => name.to_string(),
        };
        let callable = self
            .env
            .get_mixin(&qualified)
            .ok_or_else(|| SassError::undefined_mixin(&qualified, span))?;
        let content_block = content.map(|c| ContentBlock {
            params: c.args.clone(),
            body: c.body.clone(),
            env: self.env.snapshot(),
        });
        self.call_stack.push(StackFrame {
            name: qualified,
            span,
        });
        self.check_recursion(span)?;
        self.depth += 1;
        let result = self.invoke_mixin(&callable, args, content_block, span);
        self.depth -= 1;
        self.call_stack.pop();
        result.map(|_| Flow::Normal)
    }

    fn invoke_mixin(
        &mut self,
        callable: &Callable,
        args: &ArgumentInvocation,
        content: Option<ContentBlock>,
        span: Span,
    ) -> SassResult<Value> {
        match callable {
            Callable::UserMixin { decl, captured_env } => {
                let bound = self.bind_arguments(&decl.arguments, args, captured_env, span)?;
                let saved_env = std::mem::replace(&mut self.env, captured_env.clone());
                self.env.push_scope();
                for (name, value) in bound {
                    self.env.set_variable_local(&name, value);
                }
                self.content_stack.push(content);
                let flow = self.visit_statements(&decl.body);
                self.content_stack.pop();
                self.env.pop_scope();
                self.env = saved_env;
                flow.map(|_| Value::Null)
            }
            _ => Err(SassError::undefined_mixin(&callable.name(), span)),
        }
    }

    fn visit_content(&mut self, args: &ArgumentInvocation, span: Span) -> SassResult<Flow> {
        let block = match self.content_stack.last().cloned().flatten() {
            Some(b) => b,
            None => return Ok(Flow::Normal),
        };
        let bound = self.bind_arguments(&block.params, args, &block.env, span)?;
        let saved_env = std::mem::replace(&mut self.env, block.env.clone());
        self.env.push_scope();
        for (name, value) in bound {
            self.env.set_variable_local(&name, value);
        }
        let flow = self.visit_statements(&block.body);
        self.env.pop_scope();
        self.env = saved_env;
        flow
    }

    fn visit_at_root(&mut self, body: &[Statement], span: Span) -> SassResult<Flow> {
        let parent = self.current_parent;
        let saved_selectors = std::mem::take(&mut self.selector_stack);
        self.current_parent = self.css.root();
        let result = self.visit_statements(body);
        self.current_parent = parent;
        self.selector_stack = saved_selectors;
        let _ = span;
        result
    }

    fn visit_media(&mut self, query: &Interpolation, body: &[Statement], span: Span) -> SassResult<Flow> {
        let text = self.evaluate_interpolation(query, span)?;
        let node = self.css.add_child(
            self.current_parent,
            CssNodeKind::Media { query: text },
            span,
        );
        let parent = self.current_parent;
        self.current_parent = node;
        let result = self.visit_statements(body);
        self.current_parent = parent;
        result
    }

    fn visit_supports(
        &mut self,
        condition: &crate::ast::expr::SupportsCondition,
        body: &[Statement],
        span: Span,
    ) -> SassResult<Flow> {
        let text = self.render_supports_condition(condition, span)?;
        let node = self.css.add_child(
            self.current_parent,
            CssNodeKind::Supports { condition: text },
            span,
        );
        let parent = self.current_parent;
        self.current_parent = node;
        let result = self.visit_statements(body);
        self.current_parent = parent;
        result
    }

    fn render_supports_condition(
        &mut self,
        condition: &crate::ast::expr::SupportsCondition,
        span: Span,
    ) -> SassResult<String> {
        use crate::ast::expr::SupportsCondition as SC;
        Ok(match condition {
            SC::Declaration { name, value } => format!(
                "({}: {})",
                self.evaluate_interpolation(name, span)?,
                self.evaluate_interpolation(value, span)?
            ),
            SC::Negation(inner) => format!("not {}", self.render_supports_condition(inner, span)?),
            SC::Operation { left, operator, right } => format!(
                "{} {} {}",
                self.render_supports_condition(left, span)?,
                operator,
                self.render_supports_condition(right, span)?
            ),
            SC::Interpolation(i) | SC::Anything(i) => self.evaluate_interpolation(i, span)?,
        })
    }

    fn visit_unknown_at_rule(
        &mut self,
        name: &str,
        value: Option<&Interpolation>,
        body: &[Statement],
        span: Span,
    ) -> SassResult<Flow> {
        let params = match value {
            Some(v) => self.evaluate_interpolation(v, span)?,
            None => String::new(),
        };
        let node = self.css.add_child(
            self.current_parent,
            CssNodeKind::AtRule {
                name: name.to_string(),
                params,
            },
            span,
        );
        if body.is_empty() {
            return Ok(Flow::Normal);
        }
        let parent = self.current_parent;
        self.current_parent = node;
        let result = self.visit_statements(body);
        self.current_parent = parent;
        result
    }

    fn visit_extend(&mut self, selector: &Interpolation, is_optional: bool, span: Span) -> SassResult<Flow> {
        let text = self.evaluate_interpolation(selector, span)?;
        let target_list = parse_selector_list(text.trim(), span)?;
        let extender = self.current_selector();
        for complex in extender.complexes {
            for target_complex in &target_list.complexes {
                if let Some(target_compound) = target_complex.last_compound() {
                    for target in &target_compound.components {
                        self.extension_store.add_extension(
                            complex.clone(),
                            target.clone(),
                            is_optional,
                            span,
                            &mut self.css,
                        )?;
                    }
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn visit_import(&mut self, imports: &[crate::ast::stmt::ImportArgument], span: Span) -> SassResult<Flow> {
        for import in imports {
            self.run_import(&import.url, span)?;
        }
        Ok(Flow::Normal)
    }

    fn run_import(&mut self, url: &str, span: Span) -> SassResult<()> {
        let (canonical, stylesheet) = self.load_stylesheet(url, span, true)?;
        self.loaded_urls.push(canonical);
        // `@import` evaluates into the *current* scope/parent, unlike
        // `@use`'s isolated module evaluation (spec.md §4.2).
        self.check_recursion(span)?;
        self.depth += 1;
        let flow = self.visit_statements(&stylesheet.body);
        self.depth -= 1;
        flow.map(|_| ())
    }

    fn visit_use(
        &mut self,
        url: &str,
        namespace: &UseNamespace,
        configuration: &[(String, Expression, bool)],
        span: Span,
    ) -> SassResult<Flow> {
        let module = self.load_module(url, configuration, span)?;
        let ns = match namespace {
            UseNamespace::Default => Some(default_namespace(url)),
            UseNamespace::Named(n) => Some(n.clone()),
            UseNamespace::None => None,
        };
        match ns {
            Some(ns) => {
                for (name, value) in &module.variables {
                    self.env
                        .set_variable_local(&format!("{}.{}", ns, name), value.clone());
                }
                for (name, func) in &module.functions {
                    self.env
                        .set_function_local(&format!("{}.{}", ns, name), func.clone());
                }
                for (name, mixin) in &module.mixins {
                    self.env
                        .set_mixin_local(&format!("{}.{}", ns, name), mixin.clone());
                }
            }
            None => {
                for (name, value) in &module.variables {
                    self.env.set_variable_local(name, value.clone());
                }
                for (name, func) in &module.functions {
                    self.env.set_function_local(name, func.clone());
                }
                for (name, mixin) in &module.mixins {
                    self.env.set_mixin_local(name, mixin.clone());
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn visit_forward(
        &mut self,
        url: &str,
        prefix: Option<&str>,
        visibility: &ForwardVisibility,
        configuration: &[(String, Expression, bool)],
        span: Span,
    ) -> SassResult<Flow> {
        let module = self.load_module(url, configuration, span)?;
        let view = ForwardedView {
            module,
            prefix: prefix.map(|s| s.to_string()),
            visibility: visibility.clone(),
        };
        for (name, value) in view.variables() {
            self.env.set_variable_local(&name, value);
        }
        for (name, func) in view.functions() {
            self.env.set_function_local(&name, func);
        }
        for (name, mixin) in view.mixins() {
            self.env.set_mixin_local(&name, mixin);
        }
        Ok(Flow::Normal)
    }

    /// Evaluate a URL into a `Module`, using the registry so repeated
    /// `@use`/`@forward` of the same canonical URL share one evaluation
    /// (spec.md §8 "Module identity").
    fn load_module(
        &mut self,
        url: &str,
        configuration: &[(String, Expression, bool)],
        span: Span,
    ) -> SassResult<Rc<Module>> {
        if let Some(builtin) = crate::builtin::builtin_module(url) {
            return Ok(builtin);
        }
        let (canonical, stylesheet) = self.load_stylesheet(url, span, false)?;
        if let Some(existing) = self.modules.get(&canonical) {
            return Ok(existing);
        }
        self.loaded_urls.push(canonical.clone());

        let mut module_env = Environment::new();
        for (name, expr, is_default) in configuration {
            let _ = is_default;
            let v = self.evaluate_expr(expr)?;
            module_env.set_variable_global(name, v);
        }

        let mut sub_visitor = Visitor {
            css: CssTree::new(span),
            current_parent: 0,
            env: module_env,
            extension_store: ExtensionStore::new(),
            modules: std::mem::take(&mut self.modules),
            import_cache: std::mem::take(&mut self.import_cache),
            options: self.options,
            codemap: self.codemap.clone(),
            call_stack: Vec::new(),
            content_stack: Vec::new(),
            selector_stack: Vec::new(),
            loaded_urls: Vec::new(),
            depth: self.depth + 1,
        };
        sub_visitor.check_recursion(span)?;
        register_builtins(&mut sub_visitor);
        sub_visitor.visit_statements(&stylesheet.body)?;
        sub_visitor.extension_store.finalize()?;
        let (variables, functions, mixins) = sub_visitor.env.global_bindings();

        self.modules = std::mem::take(&mut sub_visitor.modules);
        self.import_cache = std::mem::take(&mut sub_visitor.import_cache);
        self.loaded_urls.extend(sub_visitor.loaded_urls);

        // A module's own top-level CSS is emitted exactly once, the first
        // time it's loaded, spliced in at the `@use`/`@forward` site.
        let root = sub_visitor.css.root();
        self.css.graft(self.current_parent, &sub_visitor.css, root);

        let module = Rc::new(Module {
            url: canonical.clone(),
            upstream: Vec::new(),
            variables,
            functions,
            mixins,
            css_root: Some(root),
            extension_store: sub_visitor.extension_store,
        });
        self.modules.insert(canonical, module.clone());
        Ok(module)
    }

    fn load_stylesheet(
        &mut self,
        url: &str,
        span: Span,
        from_import: bool,
    ) -> SassResult<(String, Rc<Stylesheet>)> {
        let ctx = CanonicalizeContext {
            from_import,
            containing_url: self.options.url.clone(),
        };
        let importers: Vec<&dyn Importer> = self.options.importers.iter().map(|i| i.as_ref()).collect();
        for importer in &importers {
            if let Some(canonical) = importer.canonicalize(url, &ctx) {
                if let Some(cached) = self.import_cache.get_stylesheet(&canonical) {
                    return Ok((canonical, cached));
                }
                if let Some(result) = importer.load(&canonical) {
                    let parsed = crate::parse::parse_source(
                        &result.contents,
                        result.syntax,
                        canonical.clone(),
                        &mut self.codemap.borrow_mut(),
                    )?;
                    let rc = Rc::new(parsed);
                    self.import_cache.insert_stylesheet(canonical.clone(), rc.clone());
                    return Ok((canonical, rc));
                }
            }
        }
        Err(SassError::new(
            SassErrorKind::ModuleLoadFailure,
            format!("Can't find stylesheet to import: \"{}\"", url),
            span,
        ))
    }

    // ---- expression evaluation ------------------------------------------------

    pub fn evaluate_interpolation(&mut self, interp: &Interpolation, span: Span) -> SassResult<String> {
        if let Some(plain) = interp.as_plain() {
            return Ok(plain.to_string());
        }
        let mut out = String::new();
        for part in &interp.parts {
            match part {
                InterpolationPart::Literal(s) => out.push_str(s),
                InterpolationPart::Expr(e) => {
                    let v = self.evaluate_expr(e)?;
                    out.push_str(&v.to_interpolated_string(span, self.options.is_compressed())?);
                }
            }
        }
        let _ = span;
        Ok(out)
    }

    pub fn evaluate_expr(&mut self, expr: &Expression) -> SassResult<Value> {
        match expr {
            Expression::Number { value, unit, .. } => Ok(Value::number_with_unit(*value, unit.clone())),
            Expression::String { text, quote, span } => {
                let s = self.evaluate_interpolation(text, *span)?;
                Ok(Value::String(s, *quote))
            }
            Expression::Boolean(b, _) => Ok(Value::Boolean(*b)),
            Expression::Null(_) => Ok(Value::Null),
            Expression::Color { argb, .. } => Ok(Value::Color(SassColor::from_argb32(*argb))),
            Expression::Variable { namespace, name, span } => self.lookup_variable(namespace.as_deref(), name, *span),
            Expression::List { items, separator, brackets, .. } => {
                let values = items
                    .iter()
                    .map(|e| self.evaluate_expr(e))
                    .collect::<SassResult<Vec<_>>>()?;
                Ok(Value::List(values, *separator, *brackets))
            }
            Expression::Map { pairs, .. } => {
                let mut map = SassMap::new();
                for (k, v) in pairs {
                    let key = self.evaluate_expr(k)?;
                    let value = self.evaluate_expr(v)?;
                    map.insert(key, value);
                }
                Ok(Value::Map(map))
            }
            Expression::Binary { left, op, right, allows_slash, span } => {
                self.evaluate_binary(left, *op, right, *allows_slash, *span)
            }
            Expression::Unary { op, operand, span } => self.evaluate_unary(*op, operand, *span),
            Expression::Paren(inner, _) => self.evaluate_expr(inner),
            Expression::FunctionCall { namespace, name, args, span } => {
                self.evaluate_function_call(namespace.as_deref(), name, args, *span)
            }
            Expression::InterpolatedFunctionCall { name, args, span } => {
                let fname = self.evaluate_interpolation(name, *span)?;
                let rendered = self.render_plain_call(&fname, args, *span)?;
                Ok(Value::unquoted_string(rendered))
            }
            Expression::If { args, span } => self.evaluate_if_function(args, *span),
            Expression::Selector(span) => {
                let s = self.current_selector().to_string();
                let _ = span;
                Ok(Value::unquoted_string(s))
            }
            Expression::Supports(cond, span) => {
                let text = self.render_supports_condition(cond, *span)?;
                Ok(Value::unquoted_string(text))
            }
            Expression::Interpolation(interp, span) => {
                let s = self.evaluate_interpolation(interp, *span)?;
                Ok(Value::unquoted_string(s))
            }
            Expression::ValueLiteral(s, _) => Ok(Value::unquoted_string(s.clone())),
        }
    }

    fn lookup_variable(&mut self, namespace: Option<&str>, name: &str, span: Span) -> SassResult<Value> {
        let qualified = match namespace {
            Some(ns) => format!("{}.{}", ns, name),
            None => name.to_string(),
        };
        self.env
            .get_variable(&qualified)
            .ok_or_else(|| SassError::undefined_variable(name, span))
    }

    fn evaluate_unary(&mut self, op: UnaryOp, operand: &Expression, span: Span) -> SassResult<Value> {
        let v = self.evaluate_expr(operand)?;
        match op {
            UnaryOp::Not => Ok(Value::Boolean(!v.is_truthy())),
            UnaryOp::Minus => match v {
                Value::Number(n) => Ok(Value::Number(n.neg())),
                other => Ok(Value::unquoted_string(format!(
                    "-{}",
                    other.to_css_string(span, self.options.is_compressed())?
                ))),
            },
            UnaryOp::Plus => match v {
                Value::Number(n) => Ok(Value::Number(n)),
                other => Ok(Value::unquoted_string(format!(
                    "+{}",
                    other.to_css_string(span, self.options.is_compressed())?
                ))),
            },
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expression,
        op: BinaryOp,
        right: &Expression,
        allows_slash: bool,
        span: Span,
    ) -> SassResult<Value> {
        if op == BinaryOp::Or {
            let l = self.evaluate_expr(left)?;
            return if l.is_truthy() { Ok(l) } else { self.evaluate_expr(right) };
        }
        if op == BinaryOp::And {
            let l = self.evaluate_expr(left)?;
            return if !l.is_truthy() { Ok(l) } else { self.evaluate_expr(right) };
        }
        let l = self.evaluate_expr(left)?;
        let r = self.evaluate_expr(right)?;
        match op {
            BinaryOp::Equal => Ok(Value::Boolean(l.fuzzy_eq(&r))),
            BinaryOp::NotEqual => Ok(Value::Boolean(!l.fuzzy_eq(&r))),
            BinaryOp::LessThan
            | BinaryOp::LessThanOrEqual
            | BinaryOp::GreaterThan
            | BinaryOp::GreaterThanOrEqual => {
                let ln = l.assert_number(span)?;
                let rn = r.assert_number(span)?;
                let ord = ln
                    .fuzzy_cmp(rn)
                    .ok_or_else(|| incompatible_units(ln, rn, span))?;
                use std::cmp::Ordering::*;
                let result = match op {
                    BinaryOp::LessThan => ord == Less,
                    BinaryOp::LessThanOrEqual => ord != Greater,
                    BinaryOp::GreaterThan => ord == Greater,
                    BinaryOp::GreaterThanOrEqual => ord != Less,
                    _ => unreachable!(),
                };
                Ok(Value::Boolean(result))
            }
            BinaryOp::Plus => self.add_values(l, r, span),
            BinaryOp::Minus => self.sub_values(l, r, span),
            BinaryOp::Mul => match (&l, &r) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.mul(b))),
                _ => Err(SassError::ty(
                    format!("Undefined operation \"{} * {}\".", l.inspect(), r.inspect()),
                    span,
                )),
            },
            BinaryOp::Div => match (&l, &r) {
                (Value::Number(a), Value::Number(b)) => {
                    let mut result = a.div(b);
                    if allows_slash {
                        result.as_slash = Some((Box::new(a.clone()), Box::new(b.clone())));
                    }
                    Ok(Value::Number(result))
                }
                _ => {
                    let ls = l.to_css_string(span, self.options.is_compressed())?;
                    let rs = r.to_css_string(span, self.options.is_compressed())?;
                    Ok(Value::unquoted_string(format!("{}/{}", ls, rs)))
                }
            },
            BinaryOp::Rem => {
                let a = l.assert_number(span)?;
                let b = r.assert_number(span)?;
                Ok(Value::Number(a.rem(b)))
            }
            BinaryOp::And | BinaryOp::Or => unreachable!(),
        }
    }

    fn add_values(&mut self, l: Value, r: Value, span: Span) -> SassResult<Value> {
        match (&l, &r) {
            (Value::Number(a), Value::Number(b)) => a
                .add(b)
                .map(Value::Number)
                .ok_or_else(|| incompatible_units(a, b, span)),
            (Value::Color(a), Value::Color(b)) => Ok(Value::Color(a.channel_op(b, |x, y| x + y))),
            (Value::String(a, qa), _) => {
                let rs = r.to_css_string(span, self.options.is_compressed())?;
                Ok(Value::String(format!("{}{}", a, rs), *qa))
            }
            (Value::List(..), _) | (Value::Map(..), _) => {
                let ls = l.to_css_string(span, self.options.is_compressed())?;
                let rs = r.to_css_string(span, self.options.is_compressed())?;
                Ok(Value::unquoted_string(format!("{}{}", ls, rs)))
            }
            (Value::Null, _) => {
                let rs = r.to_css_string(span, self.options.is_compressed()).unwrap_or_default();
                Ok(Value::unquoted_string(rs))
            }
            _ => {
                let ls = l.to_css_string(span, self.options.is_compressed())?;
                let rs = r.to_css_string(span, self.options.is_compressed())?;
                Ok(Value::unquoted_string(format!("{}{}", ls, rs)))
            }
        }
    }

    fn sub_values(&mut self, l: Value, r: Value, span: Span) -> SassResult<Value> {
        match (&l, &r) {
            (Value::Number(a), Value::Number(b)) => a
                .sub(b)
                .map(Value::Number)
                .ok_or_else(|| incompatible_units(a, b, span)),
            (Value::Color(a), Value::Color(b)) => Ok(Value::Color(a.channel_op(b, |x, y| x - y))),
            _ => {
                let ls = l.to_css_string(span, self.options.is_compressed())?;
                let rs = r.to_css_string(span, self.options.is_compressed())?;
                Ok(Value::unquoted_string(format!("{}-{}", ls, rs)))
            }
        }
    }

    fn evaluate_if_function(&mut self, args: &ArgumentInvocation, span: Span) -> SassResult<Value> {
        let decl = ArgumentDeclaration {
            parameters: vec![
                crate::ast::args::Parameter { name: "condition".into(), default: None },
                crate::ast::args::Parameter { name: "if-true".into(), default: None },
                crate::ast::args::Parameter { name: "if-false".into(), default: None },
            ],
            rest: None,
        };
        let bound = self.bind_arguments(&decl, args, &self.env.clone(), span)?;
        let map: HashMap<_, _> = bound.into_iter().collect();
        let cond = map.get("condition").cloned().unwrap_or(Value::Null);
        if cond.is_truthy() {
            Ok(map.get("if-true").cloned().unwrap_or(Value::Null))
        } else {
            Ok(map.get("if-false").cloned().unwrap_or(Value::Null))
        }
    }

    fn render_plain_call(&mut self, name: &str, args: &ArgumentInvocation, span: Span) -> SassResult<String> {
        let mut rendered = Vec::new();
        for arg in &args.positional {
            rendered.push(self.evaluate_expr(arg)?.to_css_string(span, self.options.is_compressed())?);
        }
        for (n, arg) in &args.named {
            rendered.push(format!(
                "{}: {}",
                n,
                self.evaluate_expr(arg)?.to_css_string(span, self.options.is_compressed())?
            ));
        }
        Ok(format!("{}({})", name, rendered.join(", ")))
    }

    fn evaluate_function_call(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        args: &ArgumentInvocation,
        span: Span,
    ) -> SassResult<Value> {
        let qualified = match namespace {
            Some(ns) => format!("{}.{}", ns, name),
            None => name.to_string(),
        };
        if let Some(callable) = self.env.get_function(&qualified) {
            self.call_stack.push(StackFrame { name: qualified.clone(), span });
            self.check_recursion(span)?;
            self.depth += 1;
            let result = self.invoke_function(&callable, args, span);
            self.depth -= 1;
            self.call_stack.pop();
            return result.map_err(|e| e.with_frame(qualified, span));
        }
        if namespace.is_none() {
            // Plain CSS function call left as-is, e.g. `rgb()` handled by a
            // built-in already registered, or an arbitrary CSS function like
            // `translateX(...)`.
            let rendered = self.render_plain_call(name, args, span)?;
            return Ok(Value::unquoted_string(rendered));
        }
        Err(SassError::undefined_function(&qualified, span))
    }

    /// Invokes `callable` against an already-evaluated `ArgList` rather than
    /// an AST `ArgumentInvocation` — used by `meta.call` where the argument
    /// values come from a caller-constructed `ArgList`/arglist value instead
    /// of source syntax.
    pub fn call_with_arglist(&mut self, callable: &Callable, args: ArgList, span: Span) -> SassResult<Value> {
        match callable {
            Callable::UserFunction { decl, captured_env } => {
                let bound = self.bind_values(&decl.arguments, args, captured_env, span)?;
                let saved_env = std::mem::replace(&mut self.env, captured_env.clone());
                self.env.push_scope();
                for (name, value) in bound {
                    self.env.set_variable_local(&name, value);
                }
                let flow = self.visit_statements(&decl.body);
                self.env.pop_scope();
                self.env = saved_env;
                match flow? {
                    Flow::Return(v) => Ok(v),
                    Flow::Normal => Err(SassError::new(
                        SassErrorKind::InternalError,
                        format!("Function {} finished without @return.", decl.name),
                        span,
                    )),
                }
            }
            Callable::BuiltIn { func, .. } => func(self, args, span),
            Callable::PlainCss { name } => Ok(Value::unquoted_string(format!(
                "{}({})",
                name,
                args.positional
                    .iter()
                    .map(|v| v.to_css_string(span, self.options.is_compressed()))
                    .collect::<SassResult<Vec<_>>>()?
                    .join(", ")
            ))),
            Callable::UserMixin { .. } => Err(SassError::ty(
                format!("{} is a mixin, not a function.", callable.name()),
                span,
            )),
        }
    }

    fn invoke_function(&mut self, callable: &Callable, args: &ArgumentInvocation, span: Span) -> SassResult<Value> {
        match callable {
            Callable::UserFunction { decl, captured_env } => {
                let bound = self.bind_arguments(&decl.arguments, args, captured_env, span)?;
                let saved_env = std::mem::replace(&mut self.env, captured_env.clone());
                self.env.push_scope();
                for (name, value) in bound {
                    self.env.set_variable_local(&name, value);
                }
                let flow = self.visit_statements(&decl.body);
                self.env.pop_scope();
                self.env = saved_env;
                match flow? {
                    Flow::Return(v) => Ok(v),
                    Flow::Normal => Err(SassError::new(
                        SassErrorKind::InternalError,
                        format!("Function {} finished without @return.", decl.name),
                        span,
                    )),
                }
            }
            Callable::BuiltIn { arguments, func, .. } => {
                let arg_list = self.bind_arg_list(arguments, args, span)?;
                func(self, arg_list, span)
            }
            Callable::PlainCss { name } => {
                let rendered = self.render_plain_call(name, args, span)?;
                Ok(Value::unquoted_string(rendered))
            }
            Callable::UserMixin { .. } => Err(SassError::ty(
                format!("{} is a mixin, not a function.", callable.name()),
                span,
            )),
        }
    }

    /// Binds a call's arguments against a declaration, per spec.md §4.2:
    /// positional fill positional params, then named fill remaining, then
    /// excess positionals and unmatched named go into the rest `ArgList`.
    /// Default expressions are evaluated lazily in the declaring
    /// environment extended with already-bound parameters.
    fn bind_arguments(
        &mut self,
        decl: &ArgumentDeclaration,
        invocation: &ArgumentInvocation,
        declaring_env: &Environment,
        span: Span,
    ) -> SassResult<Vec<(String, Value)>> {
        let arg_list = self.bind_arg_list(decl, invocation, span)?;
        self.bind_values(decl, arg_list, declaring_env, span)
    }

    /// Matches an already-evaluated `ArgList` against a parameter
    /// declaration: positional fill positional params, then named fill
    /// remaining, then defaults, then excess goes to the rest parameter.
    fn bind_values(
        &mut self,
        decl: &ArgumentDeclaration,
        arg_list: ArgList,
        declaring_env: &Environment,
        span: Span,
    ) -> SassResult<Vec<(String, Value)>> {
        let mut out = Vec::new();
        let mut positional_iter = arg_list.positional.into_iter();
        let eval_env = declaring_env.snapshot();
        eval_env.push_scope();
        for param in &decl.parameters {
            let value = if let Some(v) = positional_iter.next() {
                v
            } else if let Some(named) = arg_list.named.iter().find(|(n, _)| n == &param.name) {
                named.1.clone()
            } else if let Some(default) = &param.default {
                let saved = std::mem::replace(&mut self.env, eval_env.clone());
                let v = self.evaluate_expr(default);
                self.env = saved;
                v?
            } else {
                return Err(SassError::arity(
                    format!("Missing argument ${}.", param.name),
                    span,
                ));
            };
            eval_env.set_variable_local(&param.name, value.clone());
            out.push((param.name.clone(), value));
        }
        if let Some(rest_name) = &decl.rest {
            let remaining_positional: Vec<Value> = positional_iter.collect();
            let remaining_named: Vec<(String, Value)> = arg_list
                .named
                .into_iter()
                .filter(|(n, _)| !decl.parameters.iter().any(|p| &p.name == n))
                .collect();
            out.push((
                rest_name.clone(),
                Value::ArgList(Rc::new(ArgList::new(
                    remaining_positional,
                    remaining_named,
                    arg_list.separator,
                ))),
            ));
        } else if positional_iter.next().is_some()
            || arg_list
                .named
                .iter()
                .any(|(n, _)| !decl.parameters.iter().any(|p| &p.name == n))
        {
            return Err(SassError::arity("Too many arguments.".to_string(), span));
        }
        Ok(out)
    }

    fn bind_arg_list(
        &mut self,
        decl: &ArgumentDeclaration,
        invocation: &ArgumentInvocation,
        span: Span,
    ) -> SassResult<ArgList> {
        let _ = decl;
        let mut positional = Vec::new();
        for expr in &invocation.positional {
            positional.push(self.evaluate_expr(expr)?);
        }
        let mut named = Vec::new();
        for (name, expr) in &invocation.named {
            named.push((name.clone(), self.evaluate_expr(expr)?));
        }
        let mut separator = ListSeparator::Comma;
        if let Some(rest_expr) = &invocation.rest {
            let rest_value = self.evaluate_expr(rest_expr)?;
            match rest_value {
                Value::ArgList(a) => {
                    positional.extend(a.positional.clone());
                    named.extend(a.named.clone());
                    separator = a.separator;
                }
                Value::Map(m) => {
                    for (k, v) in m.iter() {
                        if let Value::String(s, _) = k {
                            named.push((s.clone(), v.clone()));
                        }
                    }
                }
                other => {
                    separator = other.separator();
                    positional.extend(other.as_list());
                }
            }
        }
        let _ = span;
        Ok(ArgList::new(positional, named, separator))
    }
}

fn incompatible_units(a: &SassNumber, b: &SassNumber, span: Span) -> SassError {
    SassError::ty(
        format!(
            "{} and {} are incompatible.",
            a, b
        ),
        span,
    )
}

fn default_namespace(url: &str) -> String {
    if let Some(builtin_name) = url.strip_prefix("sass:") {
        return builtin_name.to_string();
    }
    let base = url.rsplit('/').next().unwrap_or(url);
    let base = base.strip_prefix('_').unwrap_or(base);
    let base = base
        .strip_suffix(".scss")
        .or_else(|| base.strip_suffix(".sass"))
        .or_else(|| base.strip_suffix(".css"))
        .unwrap_or(base);
    base.to_string()
}

fn register_builtins(visitor: &mut Visitor) {
    crate::builtin::register_all(visitor);
    for func in visitor.options.functions.clone() {
        visitor.env.set_function_local(&func.name(), func);
    }
}
