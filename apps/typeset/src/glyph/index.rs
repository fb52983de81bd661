//! Glyph index assignment.
//!
//! The backend returns metrics keyed only by position, so the numbering here must follow
//! exactly the order in which rendered text appears in the request document: a single
//! pre-order walk, counting rendered leaves only.

use crate::glyph::tree::{GlyphEntry, GlyphTree};

/// Numbers every rendered leaf from 0 in pre-order and records, per glyph, whether a
/// spacer leaf sits between it and the next glyph. Returns the glyph count.
pub(crate) fn assign_indices(tree: &mut GlyphTree) -> usize {
    let mut glyphs: Vec<GlyphEntry> = Vec::new();

    for id in tree.preorder() {
        let node = tree.node(id);
        if node.is_rendered() {
            let index = glyphs.len();
            tree.node_mut(id).index = Some(index);
            glyphs.push(GlyphEntry {
                node: id,
                spacer_after: false,
            });
        } else if node.is_spacer() {
            if let Some(last) = glyphs.last_mut() {
                last.spacer_after = true;
            }
        }
    }

    tree.glyphs = glyphs;
    tree.glyphs.len()
}
