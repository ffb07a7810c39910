//! The semantic CSS AST, implemented as an arena per spec.md §9's "cyclic
//! parent pointers → arena" design note: parents hold a vector of
//! `CssNodeId`s, children hold their parent's id, and removal is
//! swap-and-reindex to stay O(1) amortized.

use std::cell::RefCell;
use std::rc::Rc;

use codemap::Span;

use crate::selector::SelectorList;

pub type CssNodeId = usize;

#[derive(Debug, Clone)]
pub enum CssNodeKind {
    Root,
    StyleRule {
        /// Shared with the `ExtensionStore` so the extender may replace the
        /// selector in place after later `@extend`s register (spec.md §3.5).
        selector: Rc<RefCell<SelectorList>>,
    },
    AtRule {
        name: String,
        params: String,
    },
    Declaration {
        name: String,
        value: String,
    },
    Media {
        query: String,
    },
    Supports {
        condition: String,
    },
    Keyframes {
        name: String,
    },
    KeyframeBlock {
        selector: String,
    },
    Import {
        url: String,
        modifiers: Option<String>,
    },
    Comment(String),
}

#[derive(Debug)]
pub struct CssNode {
    pub kind: CssNodeKind,
    pub parent: Option<CssNodeId>,
    pub children: Vec<CssNodeId>,
    pub span: Span,
}

/// An arena-backed CSS tree. Node 0 is always the root.
#[derive(Debug)]
pub struct CssTree {
    nodes: Vec<Option<CssNode>>,
}

impl CssTree {
    pub fn new(root_span: Span) -> Self {
        let root = CssNode {
            kind: CssNodeKind::Root,
            parent: None,
            children: Vec::new(),
            span: root_span,
        };
        CssTree {
            nodes: vec![Some(root)],
        }
    }

    pub fn root(&self) -> CssNodeId {
        0
    }

    pub fn node(&self, id: CssNodeId) -> &CssNode {
        self.nodes[id].as_ref().expect("node removed")
    }

    pub fn node_mut(&mut self, id: CssNodeId) -> &mut CssNode {
        self.nodes[id].as_mut().expect("node removed")
    }

    pub fn add_child(&mut self, parent: CssNodeId, kind: CssNodeKind, span: Span) -> CssNodeId {
        let id = self.nodes.len();
        self.nodes.push(Some(CssNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            span,
        }));
        self.nodes[parent]
            .as_mut()
            .expect("parent removed")
            .children
            .push(id);
        id
    }

    /// Remove a node (and recursively its children) from the tree,
    /// swap-and-reindex within the parent's child vector.
    pub fn remove(&mut self, id: CssNodeId) {
        let children = self.nodes[id].as_ref().map(|n| n.children.clone());
        if let Some(children) = children {
            for child in children {
                self.remove(child);
            }
        }
        let parent = self.nodes[id].as_ref().and_then(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(p) = self.nodes[parent].as_mut() {
                if let Some(pos) = p.children.iter().position(|c| *c == id) {
                    p.children.swap_remove(pos);
                }
            }
        }
        self.nodes[id] = None;
    }

    pub fn is_removed(&self, id: CssNodeId) -> bool {
        self.nodes[id].is_none()
    }

    pub fn children(&self, id: CssNodeId) -> &[CssNodeId] {
        &self.node(id).children
    }

    /// Copy `source`'s subtree rooted at `source_node` (typically another
    /// tree's root) in as children of `dest_parent`, preserving order. Used
    /// to splice a `@use`d module's own top-level CSS into the importing
    /// stylesheet the first time that module is evaluated (spec.md §4.2).
    pub fn graft(&mut self, dest_parent: CssNodeId, source: &CssTree, source_node: CssNodeId) {
        for &child in source.children(source_node) {
            if source.is_removed(child) {
                continue;
            }
            let node = source.node(child);
            let new_id = self.add_child(dest_parent, node.kind.clone(), node.span);
            self.graft(new_id, source, child);
        }
    }

    /// Prune empty style rules / at-rules recursively: a rule with no
    /// declarations and no nested rules that themselves survive is dropped
    /// from the output.
    pub fn prune_empty(&mut self, id: CssNodeId) -> bool {
        let children: Vec<CssNodeId> = self.children(id).to_vec();
        let mut any_kept = false;
        for child in children {
            if self.is_removed(child) {
                continue;
            }
            let keep = match &self.node(child).kind {
                CssNodeKind::Declaration { .. } | CssNodeKind::Comment(..) | CssNodeKind::Import { .. } => {
                    true
                }
                _ => {
                    let has_children = self.prune_empty(child);
                    has_children
                }
            };
            if keep {
                any_kept = true;
            } else {
                self.remove(child);
            }
        }
        any_kept || matches!(self.node(id).kind, CssNodeKind::Root)
    }
}
