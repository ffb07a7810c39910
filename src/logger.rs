//! The `Logger` seam used for `@debug`, `@warn`, and deprecation reporting.
//!
//! The teacher's original parser printed these directly with `eprintln!`;
//! here that behavior is generalized behind a trait so hosts (and tests) can
//! redirect or silence it, while `StdLogger` keeps the same stderr-based
//! default behavior, optionally colorized.

use std::io::Write;

use codemap::Span;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Stable identifiers for deprecated behaviors, checked against
/// `Options::fatal_deprecations` / `silence_deprecations` / `future_deprecations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeprecationId {
    SlashDiv,
    ColorFunctionLegacy,
    GlobalBuiltin,
    DuplicateVariableFlags,
    StrictUnary,
}

pub trait Logger: std::fmt::Debug {
    fn debug(&self, span: Span, message: &str);
    fn warn(&self, message: &str);
    fn warn_with_span(&self, span: Span, message: &str);
    fn deprecation(&self, id: DeprecationId, span: Span, message: &str);
}

/// Default logger: writes to stderr, colorized when `color` is true.
#[derive(Debug, Clone)]
pub struct StdLogger {
    color: bool,
}

impl StdLogger {
    pub fn new(color: bool) -> Self {
        StdLogger { color }
    }

    fn stream(&self) -> StandardStream {
        StandardStream::stderr(if self.color {
            ColorChoice::Always
        } else {
            ColorChoice::Never
        })
    }

    fn write_colored(&self, color: Color, bold: bool, text: &str) {
        let mut stream = self.stream();
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(color)).set_bold(bold);
        let _ = stream.set_color(&spec);
        let _ = writeln!(stream, "{}", text);
        let _ = stream.reset();
    }
}

impl Default for StdLogger {
    fn default() -> Self {
        StdLogger::new(false)
    }
}

impl Logger for StdLogger {
    fn debug(&self, span: Span, message: &str) {
        self.write_colored(
            Color::Blue,
            true,
            &format!("{}:{} Debug: {}", span.low().0, span.len(), message),
        );
    }

    fn warn(&self, message: &str) {
        self.write_colored(Color::Yellow, true, &format!("Warning: {}", message));
    }

    fn warn_with_span(&self, span: Span, message: &str) {
        self.write_colored(
            Color::Yellow,
            true,
            &format!("Warning: {}\n    {}:{}", message, span.low().0, span.len()),
        );
    }

    fn deprecation(&self, id: DeprecationId, span: Span, message: &str) {
        self.write_colored(
            Color::Yellow,
            true,
            &format!(
                "Deprecation Warning [{}]: {}\n    {}:{}",
                deprecation_name(id),
                message,
                span.low().0,
                span.len()
            ),
        );
    }
}

fn deprecation_name(id: DeprecationId) -> &'static str {
    match id {
        DeprecationId::SlashDiv => "slash-div",
        DeprecationId::ColorFunctionLegacy => "color-functions",
        DeprecationId::GlobalBuiltin => "global-builtin",
        DeprecationId::DuplicateVariableFlags => "duplicate-var-flags",
        DeprecationId::StrictUnary => "strict-unary",
    }
}

/// Discards all `@debug`/`@warn`/deprecation traffic. Useful for embedding
/// and for tests that want to assert on compiled CSS without stderr noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentLogger;

impl Logger for SilentLogger {
    fn debug(&self, _span: Span, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn warn_with_span(&self, _span: Span, _message: &str) {}
    fn deprecation(&self, _id: DeprecationId, _span: Span, _message: &str) {}
}
