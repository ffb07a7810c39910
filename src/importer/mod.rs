//! The pluggable importer interface, per spec.md §4.5. Grounded in the
//! teacher's `imports::import` free function, generalized into a trait with
//! a filesystem implementation carrying the same extension/partial/index
//! fallback search order.

use std::fs;
use std::path::{Path, PathBuf};

use crate::common::Syntax;

#[derive(Debug, Clone, Default)]
pub struct CanonicalizeContext {
    pub from_import: bool,
    pub containing_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImporterResult {
    pub contents: String,
    pub syntax: Syntax,
    pub source_map_url: Option<String>,
}

pub trait Importer: std::fmt::Debug {
    fn canonicalize(&self, url: &str, ctx: &CanonicalizeContext) -> Option<String>;
    fn load(&self, canonical_url: &str) -> Option<ImporterResult>;
}

/// Resolves `file:` URLs relative to a root directory, trying `.scss`,
/// `.sass`, `.css`, the `_`-prefixed partial variants, and `index.*`
/// fallback in directories — spec.md §4.5.
#[derive(Debug, Clone)]
pub struct FilesystemImporter {
    root: PathBuf,
}

impl FilesystemImporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FilesystemImporter { root: root.into() }
    }

    fn candidates(base: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let file_name = base
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let parent = base.parent().unwrap_or_else(|| Path::new(""));
        let has_known_ext = matches!(
            base.extension().and_then(|e| e.to_str()),
            Some("scss") | Some("sass") | Some("css")
        );
        let stems: Vec<String> = if has_known_ext {
            vec![file_name.clone()]
        } else {
            vec![
                format!("{}.scss", file_name),
                format!("{}.sass", file_name),
                format!("{}.css", file_name),
            ]
        };
        for stem in &stems {
            out.push(parent.join(stem));
            out.push(parent.join(format!("_{}", stem)));
        }
        if !has_known_ext {
            for ext in ["scss", "sass", "css"] {
                out.push(base.join(format!("index.{}", ext)));
                out.push(base.join(format!("_index.{}", ext)));
            }
        }
        out
    }

    fn resolve(&self, url: &str) -> Option<PathBuf> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        let base = if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.root.join(path)
        };
        for candidate in Self::candidates(&base) {
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        if base.is_file() {
            return Some(base);
        }
        None
    }
}

impl Importer for FilesystemImporter {
    fn canonicalize(&self, url: &str, _ctx: &CanonicalizeContext) -> Option<String> {
        let path = self.resolve(url)?;
        let canonical = fs::canonicalize(&path).unwrap_or(path);
        Some(format!("file://{}", canonical.to_string_lossy()))
    }

    fn load(&self, canonical_url: &str) -> Option<ImporterResult> {
        let path = canonical_url.strip_prefix("file://").unwrap_or(canonical_url);
        let contents = fs::read_to_string(path).ok()?;
        let syntax = Syntax::from_path(Path::new(path));
        Some(ImporterResult {
            contents,
            syntax,
            source_map_url: None,
        })
    }
}
