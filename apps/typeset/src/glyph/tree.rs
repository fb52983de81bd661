//! Arena-backed glyph tree.
//!
//! Nodes live in a single `Vec` and refer to each other by [`NodeId`]. Each node keeps
//! its parent explicitly, so script attachment can re-parent a token without touching
//! any other node.
//!
//! # Text ownership
//! Every node covers a byte span of the source. A compound node's span also contains
//! text no child covers: a command name, brace delimiters, `_`/`^` markers. Those
//! *own segments* are emitted in source order between the children, which makes the
//! pre-order walk reproduce the input exactly (see [`GlyphTree::reconstruct`]).

#![allow(dead_code)]

use std::ops::Range;

use serde::Serialize;

use crate::glyph::style::StyleOverrides;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a compound node groups together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompoundForm {
    /// A command with brace arguments, e.g. `\frac{a}{b}`.
    Command,
    /// A bare `{…}` group or a command argument.
    Group,
    /// A token with attached sub/superscripts, e.g. `c^2`.
    Scripted,
}

/// Role of a node inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Body,
    Argument,
    Base,
    Subscript,
    Superscript,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Leaf {
        /// Occupies screen space and needs measuring.
        rendered: bool,
        /// A spacing directive such as `\quad`.
        spacer: bool,
    },
    Compound {
        form: CompoundForm,
        children: Vec<NodeId>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphNode {
    pub span: Range<usize>,
    pub kind: NodeKind,
    pub slot: Slot,
    pub parent: Option<NodeId>,
    /// Sequential glyph index; only rendered leaves get one.
    pub index: Option<usize>,
    pub style: StyleOverrides,
}

impl GlyphNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { rendered: true, .. })
    }

    pub fn is_spacer(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { spacer: true, .. })
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Leaf { .. } => &[],
            NodeKind::Compound { children, .. } => children,
        }
    }
}

/// Per-glyph record kept in index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphEntry {
    pub node: NodeId,
    /// A spacer leaf follows this glyph before the next rendered glyph.
    pub spacer_after: bool,
}

/// One piece of the pre-order text walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub node: NodeId,
    pub text: &'a str,
    /// Text owned by a compound node rather than a leaf.
    pub own: bool,
}

#[derive(Debug, Clone)]
pub struct GlyphTree {
    source: String,
    nodes: Vec<GlyphNode>,
    roots: Vec<NodeId>,
    pub(crate) glyphs: Vec<GlyphEntry>,
}

impl GlyphTree {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &GlyphNode {
        &self.nodes[id.0]
    }

    /// Checks a raw node number from outside the tree.
    pub fn node_id(&self, raw: usize) -> Option<NodeId> {
        (raw < self.nodes.len()).then_some(NodeId(raw))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut GlyphNode {
        &mut self.nodes[id.0]
    }

    pub fn text(&self, id: NodeId) -> &str {
        &self.source[self.node(id).span.clone()]
    }

    /// All node ids in pre-order, left to right.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children().iter().rev().copied());
        }
        order
    }

    /// Pre-order walk restricted to `id` and its descendants.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children().iter().rev().copied());
        }
        order
    }

    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| self.node(id).is_leaf())
            .collect()
    }

    /// Leaf texts and compound own segments, in source order.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let mut out = Vec::new();
        for &root in &self.roots {
            self.collect_segments(root, &mut out);
        }
        out
    }

    fn collect_segments<'a>(&'a self, id: NodeId, out: &mut Vec<Segment<'a>>) {
        let node = self.node(id);
        if node.is_leaf() {
            out.push(Segment {
                node: id,
                text: self.text(id),
                own: false,
            });
            return;
        }

        let mut cursor = node.span.start;
        for &child in node.children() {
            let child_span = &self.node(child).span;
            if cursor < child_span.start {
                out.push(Segment {
                    node: id,
                    text: &self.source[cursor..child_span.start],
                    own: true,
                });
            }
            self.collect_segments(child, out);
            cursor = child_span.end;
        }
        if cursor < node.span.end {
            out.push(Segment {
                node: id,
                text: &self.source[cursor..node.span.end],
                own: true,
            });
        }
    }

    /// Concatenates the pre-order segments; equals [`source`](Self::source) for any parsed input.
    pub fn reconstruct(&self) -> String {
        self.segments().into_iter().map(|s| s.text).collect()
    }

    /// Number of rendered leaves (glyphs the backend must measure).
    pub fn rendered_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn glyphs(&self) -> &[GlyphEntry] {
        &self.glyphs
    }

    pub fn glyph_node(&self, index: usize) -> Option<NodeId> {
        self.glyphs.get(index).map(|g| g.node)
    }

    /// Flat, serializable view of the tree in pre-order.
    pub fn view(&self) -> Vec<NodeView> {
        self.preorder()
            .into_iter()
            .map(|id| {
                let node = self.node(id);
                let (kind, form, rendered) = match &node.kind {
                    NodeKind::Leaf { rendered, spacer } => {
                        (if *spacer { "spacer" } else { "leaf" }, None, *rendered)
                    }
                    NodeKind::Compound { form, .. } => ("compound", Some(*form), false),
                };
                NodeView {
                    id,
                    parent: node.parent,
                    text: self.text(id).to_string(),
                    kind,
                    form,
                    slot: node.slot,
                    rendered,
                    index: node.index,
                    children: node.children().to_vec(),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub text: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<CompoundForm>,
    pub slot: Slot,
    pub rendered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub children: Vec<NodeId>,
}

// ────────────────────────────────────────────────────────────────────────────
// Construction (used by the parser)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    nodes: Vec<GlyphNode>,
}

impl TreeBuilder {
    pub(crate) fn leaf(&mut self, span: Range<usize>, rendered: bool, spacer: bool) -> NodeId {
        self.push(span, NodeKind::Leaf { rendered, spacer })
    }

    /// Adds a compound node and re-parents `children` under it.
    pub(crate) fn compound(
        &mut self,
        span: Range<usize>,
        form: CompoundForm,
        children: Vec<NodeId>,
    ) -> NodeId {
        let id = self.push(
            span,
            NodeKind::Compound {
                form,
                children: Vec::new(),
            },
        );
        self.append(id, children);
        id
    }

    /// Appends children to a compound node and widens its span to cover them.
    pub(crate) fn append(&mut self, parent: NodeId, children: Vec<NodeId>) {
        let mut end = self.nodes[parent.0].span.end;
        for &child in &children {
            let node = &mut self.nodes[child.0];
            node.parent = Some(parent);
            end = end.max(node.span.end);
        }
        let node = &mut self.nodes[parent.0];
        node.span.end = end;
        if let NodeKind::Compound { children: existing, .. } = &mut node.kind {
            existing.extend(children);
        }
    }

    pub(crate) fn set_slot(&mut self, id: NodeId, slot: Slot) {
        self.nodes[id.0].slot = slot;
    }

    pub(crate) fn node(&self, id: NodeId) -> &GlyphNode {
        &self.nodes[id.0]
    }

    fn push(&mut self, span: Range<usize>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(GlyphNode {
            span,
            kind,
            slot: Slot::Body,
            parent: None,
            index: None,
            style: StyleOverrides::default(),
        });
        id
    }

    pub(crate) fn finish(self, source: &str, roots: Vec<NodeId>) -> GlyphTree {
        GlyphTree {
            source: source.to_string(),
            nodes: self.nodes,
            roots,
            glyphs: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `ab^c` built by hand: leaf `a`, then `b^c` as a scripted compound.
    fn sample_tree() -> GlyphTree {
        let source = "ab^c";
        let mut b = TreeBuilder::default();
        let a = b.leaf(0..1, true, false);
        let base = b.leaf(1..2, true, false);
        let sup = b.leaf(3..4, true, false);
        b.set_slot(base, Slot::Base);
        b.set_slot(sup, Slot::Superscript);
        let scripted = b.compound(1..2, CompoundForm::Scripted, vec![base, sup]);
        b.finish(source, vec![a, scripted])
    }

    #[test]
    fn test_compound_span_grows_to_cover_children() {
        let tree = sample_tree();
        let scripted = tree.roots()[1];
        assert_eq!(tree.text(scripted), "b^c");
    }

    #[test]
    fn test_children_know_their_parent() {
        let tree = sample_tree();
        let scripted = tree.roots()[1];
        for &child in tree.node(scripted).children() {
            assert_eq!(tree.node(child).parent, Some(scripted));
        }
        assert_eq!(tree.node(tree.roots()[0]).parent, None);
    }

    #[test]
    fn test_segments_interleave_own_text() {
        let tree = sample_tree();
        let texts: Vec<(&str, bool)> = tree.segments().iter().map(|s| (s.text, s.own)).collect();
        assert_eq!(
            texts,
            vec![("a", false), ("b", false), ("^", true), ("c", false)]
        );
        assert_eq!(tree.reconstruct(), "ab^c");
    }

    #[test]
    fn test_preorder_visits_parent_before_children() {
        let tree = sample_tree();
        let order: Vec<&str> = tree.preorder().into_iter().map(|id| tree.text(id)).collect();
        assert_eq!(order, vec!["a", "b^c", "b", "c"]);
        assert_eq!(tree.leaves().len(), 3);
    }

    #[test]
    fn test_view_reports_kinds() {
        let tree = sample_tree();
        let view = tree.view();
        assert_eq!(view[1].kind, "compound");
        assert_eq!(view[1].form, Some(CompoundForm::Scripted));
        assert_eq!(view[3].slot, Slot::Superscript);
    }
}
