//! Recursive-descent parser from markup text to a [`GlyphTree`].
//!
//! # Grammar
//! ```text
//! string  := (math | object)*            -- text mode
//! math    := '$' mstring '$' | '$$' mstring '$$'
//! mstring := (object scripts? | scripts)*  -- math mode
//! object  := command | group | char
//! command := '\' nonletter | '\' letters ('{' string '}')* | '\' letters prefix
//! group   := '{' string '}'
//! scripts := ('_' arg)? ('^' arg)? in either order
//! ```
//! Every range handed to a sub-parse is a byte range of the one source string, so every
//! node's span indexes the original input directly.

use std::ops::Range;

use tracing::debug;

use crate::errors::GlyphError;
use crate::glyph::index::assign_indices;
use crate::glyph::tree::{CompoundForm, GlyphTree, NodeId, Slot, TreeBuilder};
use crate::markup::brackets::{locate_enclosure, Enclosure};
use crate::markup::command::{command_extent, command_info, SpacingTable};

/// Parses `text` into a glyph tree and numbers its rendered leaves.
pub fn parse_tex(text: &str, spacing: &SpacingTable) -> Result<GlyphTree, GlyphError> {
    if text.is_empty() {
        return Err(GlyphError::EmptyInput);
    }

    let mut parser = Parser::new(text, spacing);
    let roots = parser.parse_tex_string(0..text.len(), false)?;
    let mut tree = parser.builder.finish(text, roots);
    let glyphs = assign_indices(&mut tree);

    debug!(
        bytes = text.len(),
        nodes = tree.len(),
        glyphs,
        "Parsed markup into glyph tree"
    );
    Ok(tree)
}

/// True when `text` is exactly one token with nothing left over.
///
/// `"a"`, `"\%"` and `"\pi"` qualify; `"ab"` and `"\pi "` do not.
pub fn is_glyph_string(text: &str, spacing: &SpacingTable) -> bool {
    if text.is_empty() {
        return false;
    }
    let mut parser = Parser::new(text, spacing);
    matches!(parser.parse_tex_object(0, text.len(), false), Ok((_, end)) if end == text.len())
}

pub(crate) struct Parser<'a> {
    pub(crate) source: &'a str,
    spacing: &'a SpacingTable,
    pub(crate) builder: TreeBuilder,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(source: &'a str, spacing: &'a SpacingTable) -> Self {
        Self {
            source,
            spacing,
            builder: TreeBuilder::default(),
        }
    }

    pub(crate) fn char_at(&self, pos: usize, end: usize) -> Option<char> {
        if pos >= end {
            return None;
        }
        self.source[pos..end].chars().next()
    }

    /// Parses a whole range into a flat node sequence.
    ///
    /// Text mode hands `$` to [`parse_math`](Self::parse_math); math mode attaches
    /// scripts to the token they follow.
    pub(crate) fn parse_tex_string(
        &mut self,
        range: Range<usize>,
        math: bool,
    ) -> Result<Vec<NodeId>, GlyphError> {
        let end = range.end;
        let mut pos = range.start;
        let mut nodes = Vec::new();

        while let Some(c) = self.char_at(pos, end) {
            if !math && c == '$' {
                let (math_nodes, next) = self.parse_math(pos, end)?;
                nodes.extend(math_nodes);
                pos = next;
                continue;
            }

            if math && (c == '_' || c == '^') {
                // Script with nothing to attach to.
                let (scripts, next) = self.parse_all_script_text(pos, end)?;
                nodes.push(
                    self.builder
                        .compound(pos..pos, CompoundForm::Scripted, scripts),
                );
                pos = next;
                continue;
            }

            let (node, next) = self.parse_tex_object(pos, end, math)?;
            let (node, next) = if math && self.accepts_scripts(node) {
                self.attach_scripts(node, next, end)?
            } else {
                (node, next)
            };
            nodes.push(node);
            pos = next;
        }

        Ok(nodes)
    }

    /// Parses the single token at `pos`: a command, a group, or one character.
    pub(crate) fn parse_tex_object(
        &mut self,
        pos: usize,
        end: usize,
        math: bool,
    ) -> Result<(NodeId, usize), GlyphError> {
        match self.char_at(pos, end) {
            Some('\\') => self.parse_command(pos, end, math),
            Some('{') => self.parse_group(pos, end, math),
            Some('}') => Err(GlyphError::UnexpectedCloser {
                close: '}',
                position: pos,
            }),
            Some(_) => Ok(self.parse_char(pos)),
            None => Err(GlyphError::EmptyInput),
        }
    }

    fn parse_char(&mut self, pos: usize) -> (NodeId, usize) {
        let c = self.source[pos..].chars().next().unwrap_or_default();
        let next = pos + c.len_utf8();
        let rendered = !(c.is_whitespace() || c == '$');
        (self.builder.leaf(pos..next, rendered, false), next)
    }

    pub(crate) fn parse_command(
        &mut self,
        pos: usize,
        end: usize,
        math: bool,
    ) -> Result<(NodeId, usize), GlyphError> {
        let text = &self.source[..end];
        let info = command_info(text, pos, self.spacing)?;
        let extent = command_extent(text, pos, &info)?;
        let next = extent.span.end;

        if extent.arguments.is_empty() {
            let leaf = self
                .builder
                .leaf(extent.span, info.not_spacing, !info.not_spacing);
            return Ok((leaf, next));
        }

        let mut arguments = Vec::with_capacity(extent.arguments.len());
        for enclosure in &extent.arguments {
            let argument = self.build_group(enclosure, math)?;
            self.builder.set_slot(argument, Slot::Argument);
            arguments.push(argument);
        }
        let node = self
            .builder
            .compound(extent.span, CompoundForm::Command, arguments);
        Ok((node, next))
    }

    fn parse_group(
        &mut self,
        pos: usize,
        end: usize,
        math: bool,
    ) -> Result<(NodeId, usize), GlyphError> {
        let enclosure = locate_enclosure(&self.source[..end], pos, '{', '}')?.ok_or(
            GlyphError::UnterminatedEnclosure {
                open: '{',
                position: pos,
            },
        )?;
        let node = self.build_group(&enclosure, math)?;
        Ok((node, enclosure.end))
    }

    /// A brace group becomes a compound over its parsed interior; `{}` is a bare leaf.
    fn build_group(&mut self, enclosure: &Enclosure, math: bool) -> Result<NodeId, GlyphError> {
        let children = self.parse_tex_string(enclosure.inner(), math)?;
        if children.is_empty() {
            return Ok(self.builder.leaf(enclosure.outer(), false, false));
        }
        Ok(self
            .builder
            .compound(enclosure.outer(), CompoundForm::Group, children))
    }

    /// Parses `$…$` or `$$…$$` at `pos`. Delimiters become non-rendered leaves placed
    /// around the interior nodes.
    fn parse_math(&mut self, pos: usize, end: usize) -> Result<(Vec<NodeId>, usize), GlyphError> {
        let enclosure = match locate_enclosure(&self.source[..end], pos, '$', '$') {
            Ok(Some(enclosure)) => enclosure,
            Ok(None) | Err(GlyphError::UnterminatedEnclosure { .. }) => {
                return Err(GlyphError::UnterminatedMathMode { position: pos });
            }
            Err(e) => return Err(e),
        };

        let inner = enclosure.inner();
        let open = self
            .builder
            .leaf(enclosure.start..inner.start, false, false);
        let body = self.parse_tex_string(inner.clone(), true)?;
        let close = self.builder.leaf(inner.end..enclosure.end, false, false);

        let mut nodes = Vec::with_capacity(body.len() + 2);
        nodes.push(open);
        nodes.extend(body);
        nodes.push(close);
        Ok((nodes, enclosure.end))
    }

    /// Whitespace never carries scripts; `x ^2` leaves the `^2` without a base.
    fn accepts_scripts(&self, id: NodeId) -> bool {
        let node = self.builder.node(id);
        !(node.is_leaf() && self.source[node.span.clone()].chars().all(char::is_whitespace))
    }
}
