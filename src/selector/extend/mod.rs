//! The `@extend` resolution engine, per spec.md §4.3.
//!
//! State:
//! - `selectors`: every compound appearing in a live rule, mapped to the
//!   `CssNodeId`s of rules containing it.
//! - `extensions`: simple selector -> the set of extensions targeting it.
//! - `source_specificity`: the maximum specificity of any complex selector
//!   that ever produced a given simple selector.

use std::collections::{HashMap, HashSet};

use codemap::Span;

use crate::css_tree::{CssNodeId, CssNodeKind, CssTree};
use crate::error::{SassError, SassResult};
use crate::selector::{
    is_superselector, Combinator, ComplexComponent, ComplexSelector, CompoundSelector,
    SelectorList, SimpleSelector,
};

/// Above this many complex selectors, the quadratic trimming pass is
/// skipped entirely (spec.md §4.3: "Trimming is quadratic and guarded by a
/// 100-list cutoff above which trimming is skipped").
const TRIM_CUTOFF: usize = 100;

#[derive(Debug, Clone)]
pub struct ExtensionSource {
    pub extender: ComplexSelector,
    pub span: Span,
    pub is_optional: bool,
    pub used: bool,
}

#[derive(Debug, Default)]
pub struct ExtensionStore {
    selectors: HashMap<SimpleSelector, HashSet<CssNodeId>>,
    extensions: HashMap<SimpleSelector, Vec<ExtensionSource>>,
    source_specificity: HashMap<SimpleSelector, u32>,
}

impl ExtensionStore {
    pub fn new() -> Self {
        ExtensionStore::default()
    }

    /// Register every simple selector of a newly emitted rule, and return
    /// the rule's selector rewritten in case any already-registered
    /// extension targets one of its simple selectors.
    pub fn add_selector(
        &mut self,
        node: CssNodeId,
        selector: &SelectorList,
        span: Span,
    ) -> SassResult<SelectorList> {
        for complex in &selector.complexes {
            for compound in complex.compounds() {
                for simple in &compound.components {
                    let entry = self.source_specificity.entry(simple.clone()).or_insert(0);
                    *entry = (*entry).max(complex.specificity());
                    self.selectors
                        .entry(simple.clone())
                        .or_default()
                        .insert(node);
                }
            }
        }
        self.extend_list_against_store(selector, span)
    }

    /// Register a new extension and rewrite every currently-live rule that
    /// contains the target, per spec.md §4.3 `addExtension`.
    ///
    /// A rule may have been emitted — and its selector recorded in
    /// `self.selectors` — before this extension existed, so registering the
    /// extension alone would leave that rule's on-tree selector stale.
    /// After recording the extension, every live `StyleRule` node indexed
    /// under `target` has its selector list re-derived against the now
    /// up-to-date store and written back in place.
    pub fn add_extension(
        &mut self,
        extender: ComplexSelector,
        target: SimpleSelector,
        is_optional: bool,
        span: Span,
        css: &mut CssTree,
    ) -> SassResult<()> {
        self.extensions.entry(target.clone()).or_default().push(ExtensionSource {
            extender,
            span,
            is_optional,
            used: false,
        });

        let nodes: Vec<CssNodeId> = match self.selectors.get(&target) {
            Some(set) => set.iter().copied().collect(),
            None => return Ok(()),
        };
        for node in nodes {
            if css.is_removed(node) {
                continue;
            }
            let selector_cell = match &css.node(node).kind {
                CssNodeKind::StyleRule { selector } => selector.clone(),
                _ => continue,
            };
            let current = selector_cell.borrow().clone();
            let rewritten = self.extend_list_against_store(&current, span)?;
            *selector_cell.borrow_mut() = rewritten;
        }
        Ok(())
    }

    /// Given the current set of registered extensions, compute the
    /// rewritten selector list for an incoming rule selector; used both by
    /// `add_selector` for newly-added rules and by the evaluator's
    /// finalization pass to re-derive already-emitted rules after later
    /// extensions register.
    fn extend_list_against_store(
        &mut self,
        list: &SelectorList,
        span: Span,
    ) -> SassResult<SelectorList> {
        let mut result_complexes = Vec::new();
        for complex in &list.complexes {
            let extended = self.extend_complex(complex, span)?;
            result_complexes.extend(extended);
        }
        let mut out = SelectorList {
            complexes: result_complexes,
        };
        if out.complexes.len() <= TRIM_CUTOFF {
            out.complexes = trim(out.complexes);
        }
        Ok(out)
    }

    /// Public re-derivation entry point used when a new `@extend` is
    /// registered after a rule has already been emitted.
    pub fn reextend(&mut self, list: &SelectorList, span: Span) -> SassResult<SelectorList> {
        self.extend_list_against_store(list, span)
    }

    fn extend_complex(&mut self, complex: &ComplexSelector, span: Span) -> SassResult<Vec<ComplexSelector>> {
        // For each compound in the chain, compute every way it could be
        // rewritten by a registered extension (including "rewritten to
        // itself", i.e. not extended at all), then weave the combinations
        // together respecting combinator placement.
        let mut options: Vec<Vec<Vec<ComplexComponent>>> = Vec::new();
        for component in &complex.components {
            match component {
                ComplexComponent::Combinator(c) => {
                    options.push(vec![vec![ComplexComponent::Combinator(*c)]]);
                }
                ComplexComponent::Compound(compound) => {
                    let mut choices = vec![vec![ComplexComponent::Compound(compound.clone())]];
                    for extended in self.extend_compound(compound, span)? {
                        choices.push(extended);
                    }
                    options.push(choices);
                }
            }
        }
        let paths = cartesian_product(&options);
        let mut out = Vec::new();
        for path in paths {
            let components: Vec<ComplexComponent> = path.into_iter().flatten().collect();
            out.push(ComplexSelector {
                components,
                line_break: complex.line_break,
            });
        }
        if out.is_empty() {
            out.push(complex.clone());
        }
        Ok(out)
    }

    /// Attempt to unify `compound`'s residue (the compound minus a matched
    /// simple selector) with each registered extender targeting that simple
    /// selector, per spec.md §4.3 `extendCompound`.
    fn extend_compound(
        &mut self,
        compound: &CompoundSelector,
        span: Span,
    ) -> SassResult<Vec<Vec<ComplexComponent>>> {
        let mut out = Vec::new();
        for simple in &compound.components {
            let sources = match self.extensions.get(simple) {
                Some(s) => s.clone(),
                None => continue,
            };
            let residue: Vec<SimpleSelector> = compound
                .components
                .iter()
                .filter(|s| *s != simple)
                .cloned()
                .collect();
            for mut source in sources {
                if let Some(unified) = unify_extender(&source.extender, &residue) {
                    source.used = true;
                    if let Some(entry) = self
                        .extensions
                        .get_mut(simple)
                        .and_then(|v| v.iter_mut().find(|s| s.extender == source.extender))
                    {
                        entry.used = true;
                    }
                    out.push(unified.components);
                }
            }
        }
        Ok(out)
    }

    /// `finalize()`: raise `ExtendTargetNotFound` for any non-optional
    /// extension whose target never matched a live rule.
    pub fn finalize(&self) -> SassResult<()> {
        for (target, sources) in &self.extensions {
            if !self.selectors.contains_key(target) {
                for source in sources {
                    if !source.is_optional {
                        return Err(SassError::new(
                            crate::error::SassErrorKind::ExtendTargetNotFound,
                            format!(
                                "\"{}\" failed to @extend \"{}\".\nThe selector \"{}\" was not found.",
                                source.extender, target, target
                            ),
                            source.span,
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

fn unify_extender(extender: &ComplexSelector, residue: &[SimpleSelector]) -> Option<ComplexSelector> {
    let last = extender.last_compound()?;
    let mut unified = last.components.clone();
    for simple in residue {
        if !unified.contains(simple) {
            if conflicts(&unified, simple) {
                return None;
            }
            unified.push(simple.clone());
        }
    }
    let mut components = extender.components.clone();
    if let Some(ComplexComponent::Compound(last_mut)) = components.last_mut() {
        last_mut.components = unified;
    }
    Some(ComplexSelector {
        components,
        line_break: extender.line_break,
    })
}

/// Two simple selectors conflict (cannot coexist on one compound) when they
/// are both `Id` with different values, or both `Type` with different
/// names.
fn conflicts(existing: &[SimpleSelector], incoming: &SimpleSelector) -> bool {
    match incoming {
        SimpleSelector::Id(id) => existing
            .iter()
            .any(|s| matches!(s, SimpleSelector::Id(other) if other != id)),
        SimpleSelector::Type(name) => existing
            .iter()
            .any(|s| matches!(s, SimpleSelector::Type(other) if other != name)),
        _ => false,
    }
}

/// Trim any complex selector that is a superselector of another with equal
/// or greater source specificity — the "second law of extend" (spec.md §4.3
/// / §8).
fn trim(list: Vec<ComplexSelector>) -> Vec<ComplexSelector> {
    let mut result: Vec<ComplexSelector> = Vec::new();
    'outer: for (i, candidate) in list.iter().enumerate() {
        for (j, other) in list.iter().enumerate() {
            if i == j {
                continue;
            }
            if is_superselector(other, candidate)
                && other.specificity() >= candidate.specificity()
                && !(is_superselector(candidate, other) && i < j)
            {
                continue 'outer;
            }
        }
        if !result.iter().any(|r| r == candidate) {
            result.push(candidate.clone());
        }
    }
    if result.is_empty() {
        list
    } else {
        result
    }
}

fn cartesian_product<T: Clone>(options: &[Vec<T>]) -> Vec<Vec<T>> {
    let mut result: Vec<Vec<T>> = vec![Vec::new()];
    for choices in options {
        let mut next = Vec::new();
        for prefix in &result {
            for choice in choices {
                let mut p = prefix.clone();
                p.push(choice.clone());
                next.push(p);
            }
        }
        result = next;
    }
    result
}

#[allow(dead_code)]
fn combinator_compatible(_a: Combinator, _b: Combinator) -> bool {
    true
}
