//! Request document sent to the typesetting backend.
//!
//! The input string is embedded verbatim; the backend numbers glyphs in the order it
//! writes them, which is the order indices were assigned in.

use serde::Serialize;

use crate::glyph::GlyphTree;

// ────────────────────────────────────────────────────────────────────────────
// Standalone document wrapper
// ────────────────────────────────────────────────────────────────────────────

pub const DOCUMENT_TEMPLATE: &str = "\
\\documentclass[preview]{standalone}\n\
\\usepackage{amsmath}\n\
\\usepackage{amssymb}\n\
\\begin{document}\n\
{body}\n\
\\end{document}\n";

pub fn render_document(body: &str) -> String {
    DOCUMENT_TEMPLATE.replace("{body}", body)
}

/// Everything a [`SheetSource`](crate::sheet::SheetSource) needs to produce metrics
/// for one text box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRequest {
    pub id: String,
    pub document: String,
    /// Records the backend must return in each metrics resource.
    pub rendered_count: usize,
}

impl SheetRequest {
    pub fn new(id: impl Into<String>, tree: &GlyphTree) -> Self {
        Self {
            id: id.into(),
            document: render_document(tree.source()),
            rendered_count: tree.rendered_count(),
        }
    }
}
