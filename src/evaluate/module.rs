//! `@use`/`@forward` module semantics, per spec.md §3.4.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::stmt::ForwardVisibility;
use crate::css_tree::CssNodeId;
use crate::selector::extend::ExtensionStore;
use crate::value::{Callable, Value};

/// The result of evaluating one stylesheet in isolation under `@use`.
/// Module identity is by canonical URL (spec.md §8's "Module identity"
/// property): two `@use`s of the same URL from different points in the
/// graph resolve to the same `Module`.
#[derive(Debug)]
pub struct Module {
    pub url: String,
    pub upstream: Vec<Rc<Module>>,
    pub variables: HashMap<String, Value>,
    pub functions: HashMap<String, Rc<Callable>>,
    pub mixins: HashMap<String, Rc<Callable>>,
    pub css_root: Option<CssNodeId>,
    pub extension_store: ExtensionStore,
}

impl Module {
    pub fn new(url: String) -> Self {
        Module {
            url,
            upstream: Vec::new(),
            variables: HashMap::new(),
            functions: HashMap::new(),
            mixins: HashMap::new(),
            css_root: None,
            extension_store: ExtensionStore::new(),
        }
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

/// Applies a `@forward` rule's `hide`/`show`/`as prefix` filters over an
/// upstream module. Idempotent: wrapping an already-forwarded view just
/// composes the prefix and narrows visibility further.
#[derive(Debug)]
pub struct ForwardedView {
    pub module: Rc<Module>,
    pub prefix: Option<String>,
    pub visibility: ForwardVisibility,
}

impl ForwardedView {
    fn exposed_name(&self, name: &str) -> Option<String> {
        let bare = name.strip_prefix(self.prefix.as_deref().unwrap_or("")).unwrap_or(name);
        if self.visibility.is_visible(bare) {
            Some(format!("{}{}", self.prefix.clone().unwrap_or_default(), bare))
        } else {
            None
        }
    }

    pub fn variables(&self) -> HashMap<String, Value> {
        self.module
            .variables
            .iter()
            .filter_map(|(k, v)| {
                self.visibility
                    .is_visible(k)
                    .then(|| (format!("{}{}", self.prefix.clone().unwrap_or_default(), k), v.clone()))
            })
            .collect()
    }

    pub fn functions(&self) -> HashMap<String, Rc<Callable>> {
        self.module
            .functions
            .iter()
            .filter_map(|(k, v)| {
                self.exposed_name(k).map(|name| (name, v.clone()))
            })
            .collect()
    }

    pub fn mixins(&self) -> HashMap<String, Rc<Callable>> {
        self.module
            .mixins
            .iter()
            .filter_map(|(k, v)| {
                self.exposed_name(k).map(|name| (name, v.clone()))
            })
            .collect()
    }
}

/// Suppresses members of an upstream module that are shadowed by a local
/// definition of the same name in the importing module.
#[derive(Debug)]
pub struct ShadowedView<'a> {
    pub module: &'a Module,
    pub local_variables: &'a HashMap<String, Value>,
    pub local_functions: &'a HashMap<String, Rc<Callable>>,
    pub local_mixins: &'a HashMap<String, Rc<Callable>>,
}

impl<'a> ShadowedView<'a> {
    pub fn get_variable(&self, name: &str) -> Option<Value> {
        if self.local_variables.contains_key(name) {
            return None;
        }
        self.module.variables.get(name).cloned()
    }

    pub fn get_function(&self, name: &str) -> Option<Rc<Callable>> {
        if self.local_functions.contains_key(name) {
            return None;
        }
        self.module.functions.get(name).cloned()
    }

    pub fn get_mixin(&self, name: &str) -> Option<Rc<Callable>> {
        if self.local_mixins.contains_key(name) {
            return None;
        }
        self.module.mixins.get(name).cloned()
    }
}

/// Registry of evaluated modules keyed by canonical URL: at most one module
/// per URL is ever evaluated; subsequent `@use`/`@forward` requests return
/// the cached module (spec.md §4.2).
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Rc<Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        ModuleRegistry::default()
    }

    pub fn get(&self, url: &str) -> Option<Rc<Module>> {
        self.modules.get(url).cloned()
    }

    pub fn insert(&mut self, url: String, module: Rc<Module>) {
        self.modules.insert(url, module);
    }

    pub fn contains(&self, url: &str) -> bool {
        self.modules.contains_key(url)
    }
}
