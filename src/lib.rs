//! # sassy
//! A pure-Rust implementation of a Sass-to-CSS compiler core.
//!
//! All functionality is exposed through [`compile_path`] and
//! [`compile_string`], which return a [`CompileResult`] holding the emitted
//! CSS, the canonical URLs of every file loaded along the way, and
//! (optionally) a source map.
//!
//! ## Use as a library
//! ```no_run
//! use sassy::{compile_path, Options};
//! use std::path::Path;
//!
//! fn main() -> sassy::SassResult<()> {
//!     let result = compile_path(Path::new("input.scss"), &Options::default())?;
//!     print!("{}", result.css);
//!     Ok(())
//! }
//! ```
//!
//! ## Use as a binary
//! ```bash
//! cargo install sassy
//! sassy input.scss
//! ```

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![deny(missing_debug_implementations)]
#![allow(
    // explicit return makes some things look ugly
    clippy::implicit_return,
    // Self { .. } is less explicit than Foo { .. }
    clippy::use_self,
    // this is too pedantic -- some things don't need docs!
    clippy::missing_docs_in_private_items,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::multiple_inherent_impl,
    clippy::too_many_lines,
    clippy::cast_possible_truncation,
    clippy::must_use_candidate
)]

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use codemap::CodeMap;

pub mod ast;
pub mod builtin;
pub mod common;
pub mod css_tree;
pub mod error;
pub mod evaluate;
pub mod importer;
pub mod lexer;
pub mod logger;
pub mod options;
pub mod parse;
pub mod selector;
pub mod serializer;
pub mod token;
pub mod value;

pub use common::{OutputStyle, Syntax};
pub use error::{SassError, SassErrorKind, SassResult};
pub use importer::{FilesystemImporter, Importer};
pub use logger::{DeprecationId, Logger, SilentLogger, StdLogger};
pub use options::{Options, OptionsBuilder};
pub use value::{Callable, Value};

/// The outcome of a successful compile, per spec.md §6.1.
#[derive(Debug, Clone)]
pub struct CompileResult {
    pub css: String,
    /// Canonical URLs of the entry stylesheet and every file it pulled in
    /// via `@import`/`@use`/`@forward`, in load order.
    pub loaded_urls: Vec<String>,
    /// A Source Map v3 JSON document, present when `Options::source_map` was
    /// set.
    pub source_map: Option<String>,
}

/// Compile the stylesheet at `path`, resolving its `@import`/`@use`/
/// `@forward`s relative to its containing directory (plus `options.load_paths`
/// and `options.importers`).
pub fn compile_path(path: &Path, options: &Options) -> SassResult<CompileResult> {
    let source = fs::read_to_string(path).map_err(|e| {
        SassError::new(
            SassErrorKind::ModuleLoadFailure,
            format!("Error reading {}: {}", path.display(), e),
            dummy_span(),
        )
    })?;
    let syntax = if options.syntax == Syntax::Scss {
        Syntax::from_path(path)
    } else {
        options.syntax
    };
    let url = path.to_string_lossy().into_owned();
    compile_inner(&source, syntax, url, options, path.parent())
}

/// Compile `source` directly, with no backing file. `options.url`, if set,
/// names the stylesheet for diagnostics and relative-import resolution;
/// otherwise `"stdin"` is used, matching spec.md §6.1.
pub fn compile_string(source: &str, options: &Options) -> SassResult<CompileResult> {
    let url = options.url.clone().unwrap_or_else(|| "stdin".to_string());
    compile_inner(source, options.syntax, url, options, None)
}

fn compile_inner(
    source: &str,
    syntax: Syntax,
    url: String,
    options: &Options,
    containing_dir: Option<&Path>,
) -> SassResult<CompileResult> {
    let mut options = options.clone();
    if let Some(dir) = containing_dir {
        options.load_paths.insert(0, dir.to_path_buf());
    }
    let options = build_importers(options);

    let codemap = Rc::new(RefCell::new(CodeMap::new()));
    let stylesheet = parse::parse_source(source, syntax, url, &mut codemap.borrow_mut())?;
    let output = evaluate::evaluate(&stylesheet, &options, codemap.clone())?;
    let result = serializer::serialize(&output.css, &options, &codemap.borrow());
    Ok(CompileResult {
        css: result.css,
        loaded_urls: output.loaded_urls,
        source_map: result.source_map,
    })
}

/// Append a `FilesystemImporter` for every configured load path, ahead of
/// any importers the host already supplied, so relative `@import`/`@use`
/// resolution searches the entry file's directory first.
fn build_importers(mut options: Options) -> Options {
    let mut importers: Vec<Rc<dyn Importer>> = options
        .load_paths
        .iter()
        .map(|p| Rc::new(FilesystemImporter::new(p.clone())) as Rc<dyn Importer>)
        .collect();
    importers.extend(options.importers.drain(..));
    options.importers = importers;
    options
}

/// A placeholder span for errors raised before any `CodeMap` exists (e.g. a
/// file that can't be read at all).
fn dummy_span() -> codemap::Span {
    thread_local! {
        static MAP: (CodeMap, codemap::Span) = {
            let mut map = CodeMap::new();
            let file = map.add_file("<internal>".to_string(), String::new());
            let span = file.span;
            (map, span)
        };
    }
    MAP.with(|(_, span)| *span)
}
