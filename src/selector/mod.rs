//! Selector types and algorithms, per spec.md §3.3 and §4.3.

pub mod extend;
mod parser;

use std::fmt;

pub use parser::parse_selector_list;

/// A CSS combinator preceding or following a compound selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    NextSibling,
    LaterSibling,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Combinator::Descendant => " ",
            Combinator::Child => ">",
            Combinator::NextSibling => "+",
            Combinator::LaterSibling => "~",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    Type(String),
    Universal,
    Class(String),
    Id(String),
    Attribute {
        name: String,
        op: Option<String>,
        value: Option<String>,
        case_insensitive: bool,
    },
    Placeholder(String),
    Pseudo {
        name: String,
        is_class: bool,
        argument: Option<String>,
        selector: Option<Box<SelectorList>>,
    },
    Parent,
}

impl SimpleSelector {
    /// Intrinsic specificity contribution, per spec.md §3.3 and the
    /// standard CSS weighting (id=10000, class/attr/pseudo-class=100,
    /// type/pseudo-element=1).
    pub fn specificity(&self) -> u32 {
        match self {
            SimpleSelector::Id(..) => 1_000_000,
            SimpleSelector::Class(..)
            | SimpleSelector::Attribute { .. }
            | SimpleSelector::Placeholder(..) => 1_000,
            SimpleSelector::Pseudo { is_class, selector, .. } => {
                if *is_class {
                    if let Some(sel) = selector {
                        sel.max_specificity().max(1_000)
                    } else {
                        1_000
                    }
                } else {
                    1
                }
            }
            SimpleSelector::Type(..) => 1,
            SimpleSelector::Universal | SimpleSelector::Parent => 0,
        }
    }

    pub fn is_invisible(&self) -> bool {
        matches!(self, SimpleSelector::Placeholder(..))
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimpleSelector::Type(s) => write!(f, "{}", s),
            SimpleSelector::Universal => write!(f, "*"),
            SimpleSelector::Class(s) => write!(f, ".{}", s),
            SimpleSelector::Id(s) => write!(f, "#{}", s),
            SimpleSelector::Attribute {
                name,
                op,
                value,
                case_insensitive,
            } => {
                write!(f, "[{}", name)?;
                if let (Some(op), Some(value)) = (op, value) {
                    write!(f, "{}\"{}\"", op, value)?;
                    if *case_insensitive {
                        write!(f, " i")?;
                    }
                }
                write!(f, "]")
            }
            SimpleSelector::Placeholder(s) => write!(f, "%{}", s),
            SimpleSelector::Pseudo {
                name,
                is_class,
                argument,
                selector,
            } => {
                write!(f, "{}{}", if *is_class { ":" } else { "::" }, name)?;
                if argument.is_some() || selector.is_some() {
                    write!(f, "(")?;
                    if let Some(arg) = argument {
                        write!(f, "{}", arg)?;
                    }
                    if let Some(sel) = selector {
                        write!(f, "{}", sel)?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            SimpleSelector::Parent => write!(f, "&"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CompoundSelector {
    pub components: Vec<SimpleSelector>,
}

impl CompoundSelector {
    pub fn specificity(&self) -> u32 {
        self.components.iter().map(SimpleSelector::specificity).sum()
    }

    pub fn is_invisible(&self) -> bool {
        self.components.iter().any(SimpleSelector::is_invisible)
    }

    /// True if every simple selector in `other` is also present here
    /// (ignoring order) — the compound-level building block of
    /// superselector checks.
    pub fn is_superselector_of(&self, other: &CompoundSelector) -> bool {
        self.components.iter().all(|c| other.components.contains(c))
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "*");
        }
        for c in &self.components {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComplexComponent {
    Compound(CompoundSelector),
    Combinator(Combinator),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ComplexSelector {
    pub components: Vec<ComplexComponent>,
    /// Leading `&`-derived source specificity floor recorded by the
    /// extender (spec.md §3.3's "source specificity" invariant).
    pub line_break: bool,
}

impl ComplexSelector {
    pub fn specificity(&self) -> u32 {
        self.components
            .iter()
            .map(|c| match c {
                ComplexComponent::Compound(cs) => cs.specificity(),
                ComplexComponent::Combinator(_) => 0,
            })
            .sum()
    }

    pub fn compounds(&self) -> impl Iterator<Item = &CompoundSelector> {
        self.components.iter().filter_map(|c| match c {
            ComplexComponent::Compound(cs) => Some(cs),
            ComplexComponent::Combinator(_) => None,
        })
    }

    pub fn is_invisible(&self) -> bool {
        self.compounds().any(CompoundSelector::is_invisible)
    }

    /// Last compound in the chain, the "terminal compound" extension
    /// operates on.
    pub fn last_compound(&self) -> Option<&CompoundSelector> {
        self.compounds().last()
    }

    /// Resolve `&` by substituting `parents` (cross-product with this
    /// selector's non-parent components), per spec.md §4.2 `visitStyleRule`.
    pub fn resolve_parent(&self, parents: &SelectorList) -> Vec<ComplexSelector> {
        let has_parent_ref = self.components.iter().any(|c| {
            matches!(c, ComplexComponent::Compound(cs) if cs.components.contains(&SimpleSelector::Parent))
        });
        if !has_parent_ref {
            // Implicit nesting: append this selector as a descendant of
            // each parent complex selector.
            return parents
                .complexes
                .iter()
                .map(|parent| {
                    let mut components = parent.components.clone();
                    components.push(ComplexComponent::Combinator(Combinator::Descendant));
                    components.extend(self.components.clone());
                    ComplexSelector {
                        components,
                        line_break: self.line_break,
                    }
                })
                .collect();
        }
        parents
            .complexes
            .iter()
            .map(|parent| {
                let mut components = Vec::new();
                for c in &self.components {
                    match c {
                        ComplexComponent::Compound(cs) if cs.components.contains(&SimpleSelector::Parent) => {
                            // Splice the parent's compound(s) in place of `&`,
                            // keeping any trailing simple selectors fused
                            // onto the parent's terminal compound (`&.foo`).
                            let mut parent_components = parent.components.clone();
                            let extra: Vec<SimpleSelector> = cs
                                .components
                                .iter()
                                .filter(|s| **s != SimpleSelector::Parent)
                                .cloned()
                                .collect();
                            if !extra.is_empty() {
                                if let Some(ComplexComponent::Compound(last)) =
                                    parent_components.last_mut()
                                {
                                    last.components.extend(extra);
                                } else {
                                    parent_components.push(ComplexComponent::Compound(
                                        CompoundSelector { components: extra },
                                    ));
                                }
                            }
                            components.extend(parent_components);
                        }
                        other => components.push(other.clone()),
                    }
                }
                ComplexSelector {
                    components,
                    line_break: self.line_break,
                }
            })
            .collect()
    }

    pub fn contains_parent_ref(&self) -> bool {
        self.compounds()
            .any(|cs| cs.components.contains(&SimpleSelector::Parent))
    }
}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.components {
            match c {
                ComplexComponent::Compound(cs) => {
                    write!(f, "{}", cs)?;
                }
                ComplexComponent::Combinator(comb) => {
                    if matches!(comb, Combinator::Descendant) {
                        write!(f, " ")?;
                    } else {
                        write!(f, " {} ", comb)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SelectorList {
    pub complexes: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn max_specificity(&self) -> u32 {
        self.complexes.iter().map(ComplexSelector::specificity).max().unwrap_or(0)
    }

    pub fn min_specificity(&self) -> u32 {
        self.complexes.iter().map(ComplexSelector::specificity).min().unwrap_or(0)
    }

    pub fn resolve_parent(&self, parents: &SelectorList) -> SelectorList {
        let mut complexes = Vec::new();
        for c in &self.complexes {
            complexes.extend(c.resolve_parent(parents));
        }
        SelectorList { complexes }
    }

    pub fn is_invisible(&self) -> bool {
        !self.complexes.is_empty() && self.complexes.iter().all(ComplexSelector::is_invisible)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.complexes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Superselector check: `self` is a superselector of `other` when every
/// element matched by `other` is also matched by `self` (spec.md glossary).
/// This conservative implementation treats two complex selectors as related
/// by the superselector relation only when `self`'s compounds are each a
/// subset of the corresponding (by position, ignoring combinators) compound
/// in `other` — sufficient for the trimming pass in the extension engine,
/// which only needs a sound (not necessarily complete) approximation.
pub fn is_superselector(candidate: &ComplexSelector, other: &ComplexSelector) -> bool {
    if candidate == other {
        return true;
    }
    let cand: Vec<&CompoundSelector> = candidate.compounds().collect();
    let oth: Vec<&CompoundSelector> = other.compounds().collect();
    if cand.len() > oth.len() {
        return false;
    }
    // Try to find cand as a (order-preserving) subsequence of oth where each
    // matched compound in oth is a superset of the corresponding cand
    // compound.
    let mut oi = 0;
    for cc in &cand {
        let mut found = false;
        while oi < oth.len() {
            if cc.is_superselector_of(oth[oi]) {
                found = true;
                oi += 1;
                break;
            }
            oi += 1;
        }
        if !found {
            return false;
        }
    }
    true
}
