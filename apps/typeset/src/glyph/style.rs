//! Style overrides on glyph nodes.
//!
//! Overrides are stored only on the node they were set on. Consumers resolve a node's
//! effective style by walking up to the nearest ancestor that sets each property;
//! nothing is copied down the tree.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};

use crate::glyph::tree::{GlyphTree, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Colour {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleOverrides {
    pub colour: Option<Colour>,
    pub italic: Option<bool>,
    pub bold: Option<bool>,
}

/// Fully resolved style; properties no ancestor sets fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedStyle {
    pub colour: Colour,
    pub italic: bool,
    pub bold: bool,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            colour: Colour::WHITE,
            italic: false,
            bold: false,
        }
    }
}

impl GlyphTree {
    pub fn set_colour(&mut self, id: NodeId, colour: Colour) {
        self.node_mut(id).style.colour = Some(colour);
    }

    pub fn set_italic(&mut self, id: NodeId, italic: bool) {
        self.node_mut(id).style.italic = Some(italic);
    }

    pub fn set_bold(&mut self, id: NodeId, bold: bool) {
        self.node_mut(id).style.bold = Some(bold);
    }

    /// Removes every override set on `id` itself.
    pub fn clear_style(&mut self, id: NodeId) {
        self.node_mut(id).style = StyleOverrides::default();
    }

    /// Resolves the effective style of `id` against its ancestors.
    pub fn resolved_style(&self, id: NodeId) -> ResolvedStyle {
        let mut colour = None;
        let mut italic = None;
        let mut bold = None;

        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            colour = colour.or(node.style.colour);
            italic = italic.or(node.style.italic);
            bold = bold.or(node.style.bold);
            if colour.is_some() && italic.is_some() && bold.is_some() {
                break;
            }
            current = node.parent;
        }

        let defaults = ResolvedStyle::default();
        ResolvedStyle {
            colour: colour.unwrap_or(defaults.colour),
            italic: italic.unwrap_or(defaults.italic),
            bold: bold.unwrap_or(defaults.bold),
        }
    }

    /// Glyph indices of the rendered leaves under `id`, i.e. the glyphs a style change
    /// on `id` affects.
    pub fn rendered_leaves_under(&self, id: NodeId) -> Vec<usize> {
        self.subtree(id)
            .into_iter()
            .filter_map(|n| self.node(n).index)
            .collect()
    }
}
