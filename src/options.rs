//! Compiler configuration, per spec.md §6.1.

use std::path::PathBuf;
use std::rc::Rc;

use crate::common::{OutputStyle, Syntax};
use crate::importer::Importer;
use crate::logger::{DeprecationId, Logger, StdLogger};
use crate::value::Callable;

#[derive(Clone)]
pub struct Options {
    pub syntax: Syntax,
    pub url: Option<String>,
    pub style: OutputStyle,
    pub source_map: bool,
    pub source_map_include_sources: bool,
    pub quiet_deps: bool,
    pub verbose: bool,
    pub charset: bool,
    pub importers: Vec<Rc<dyn Importer>>,
    pub load_paths: Vec<PathBuf>,
    pub functions: Vec<Rc<Callable>>,
    pub logger: Rc<dyn Logger>,
    pub alert_color: bool,
    pub alert_ascii: bool,
    pub fatal_deprecations: Vec<DeprecationId>,
    pub silence_deprecations: Vec<DeprecationId>,
    pub future_deprecations: Vec<DeprecationId>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            syntax: Syntax::Scss,
            url: None,
            style: OutputStyle::Expanded,
            source_map: false,
            source_map_include_sources: false,
            quiet_deps: false,
            verbose: false,
            charset: true,
            importers: Vec::new(),
            load_paths: Vec::new(),
            functions: Vec::new(),
            logger: Rc::new(StdLogger::default()),
            alert_color: false,
            alert_ascii: false,
            fatal_deprecations: Vec::new(),
            silence_deprecations: Vec::new(),
            future_deprecations: Vec::new(),
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("syntax", &self.syntax)
            .field("style", &self.style)
            .field("source_map", &self.source_map)
            .field("quiet_deps", &self.quiet_deps)
            .field("load_paths", &self.load_paths)
            .finish()
    }
}

/// Fluent builder mirroring the field list in spec.md §6.1.
#[derive(Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        OptionsBuilder {
            options: Options::default(),
        }
    }

    pub fn syntax(mut self, syntax: Syntax) -> Self {
        self.options.syntax = syntax;
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.options.url = Some(url.into());
        self
    }

    pub fn style(mut self, style: OutputStyle) -> Self {
        self.options.style = style;
        self
    }

    pub fn source_map(mut self, enabled: bool) -> Self {
        self.options.source_map = enabled;
        self
    }

    pub fn source_map_include_sources(mut self, enabled: bool) -> Self {
        self.options.source_map_include_sources = enabled;
        self
    }

    pub fn quiet_deps(mut self, enabled: bool) -> Self {
        self.options.quiet_deps = enabled;
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.options.verbose = enabled;
        self
    }

    pub fn charset(mut self, enabled: bool) -> Self {
        self.options.charset = enabled;
        self
    }

    pub fn add_importer(mut self, importer: Rc<dyn Importer>) -> Self {
        self.options.importers.push(importer);
        self
    }

    pub fn add_load_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.load_paths.push(path.into());
        self
    }

    pub fn add_function(mut self, func: Callable) -> Self {
        self.options.functions.push(Rc::new(func));
        self
    }

    pub fn logger(mut self, logger: Rc<dyn Logger>) -> Self {
        self.options.logger = logger;
        self
    }

    pub fn alert_color(mut self, enabled: bool) -> Self {
        self.options.alert_color = enabled;
        self
    }

    pub fn alert_ascii(mut self, enabled: bool) -> Self {
        self.options.alert_ascii = enabled;
        self
    }

    pub fn fatal_deprecation(mut self, id: DeprecationId) -> Self {
        self.options.fatal_deprecations.push(id);
        self
    }

    pub fn silence_deprecation(mut self, id: DeprecationId) -> Self {
        self.options.silence_deprecations.push(id);
        self
    }

    pub fn future_deprecation(mut self, id: DeprecationId) -> Self {
        self.options.future_deprecations.push(id);
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}

impl Options {
    pub fn is_compressed(&self) -> bool {
        matches!(self.style, OutputStyle::Compressed)
    }
}
