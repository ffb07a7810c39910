//! Import cache, per spec.md §4.2: "Keyed by canonical URL → parsed
//! stylesheet. The cache also memoizes the importer that canonicalized each
//! non-canonical URL and, for import-mode, the previous URL context."

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::stmt::Stylesheet;

#[derive(Debug, Default)]
pub struct ImportCache {
    stylesheets: HashMap<String, Rc<Stylesheet>>,
    /// Non-canonical URL -> (canonical URL, index of the importer that
    /// resolved it within the configured importer chain).
    canonicalizations: HashMap<String, (String, usize)>,
}

impl ImportCache {
    pub fn new() -> Self {
        ImportCache::default()
    }

    pub fn get_stylesheet(&self, canonical_url: &str) -> Option<Rc<Stylesheet>> {
        self.stylesheets.get(canonical_url).cloned()
    }

    pub fn insert_stylesheet(&mut self, canonical_url: String, stylesheet: Rc<Stylesheet>) {
        self.stylesheets.insert(canonical_url, stylesheet);
    }

    pub fn get_canonicalization(&self, url: &str) -> Option<&(String, usize)> {
        self.canonicalizations.get(url)
    }

    pub fn remember_canonicalization(&mut self, url: String, canonical: String, importer_index: usize) {
        self.canonicalizations.insert(url, (canonical, importer_index));
    }
}
