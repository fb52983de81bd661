//! Subscript / superscript attachment in math mode.

use crate::errors::GlyphError;
use crate::glyph::tree::{CompoundForm, NodeId, NodeKind, Slot};
use crate::markup::parser::Parser;

fn script_slot(marker: char) -> Option<Slot> {
    match marker {
        '_' => Some(Slot::Subscript),
        '^' => Some(Slot::Superscript),
        _ => None,
    }
}

impl Parser<'_> {
    /// Attaches any scripts following `base` (which ended at `pos`).
    ///
    /// A command compound takes the scripts as extra children; every other base is
    /// wrapped in a `Scripted` compound. Returns the node that replaces `base` in the
    /// enclosing sequence.
    pub(crate) fn attach_scripts(
        &mut self,
        base: NodeId,
        pos: usize,
        end: usize,
    ) -> Result<(NodeId, usize), GlyphError> {
        let (scripts, next) = self.parse_all_script_text(pos, end)?;
        if scripts.is_empty() {
            return Ok((base, pos));
        }

        let is_command = matches!(
            self.builder.node(base).kind,
            NodeKind::Compound {
                form: CompoundForm::Command,
                ..
            }
        );
        if is_command {
            self.builder.append(base, scripts);
            return Ok((base, next));
        }

        self.builder.set_slot(base, Slot::Base);
        let span = self.builder.node(base).span.clone();
        let mut children = Vec::with_capacity(scripts.len() + 1);
        children.push(base);
        children.extend(scripts);
        let scripted = self
            .builder
            .compound(span, CompoundForm::Scripted, children);
        Ok((scripted, next))
    }

    /// Parses up to one subscript and one superscript, in either order.
    pub(crate) fn parse_all_script_text(
        &mut self,
        pos: usize,
        end: usize,
    ) -> Result<(Vec<NodeId>, usize), GlyphError> {
        let mut scripts = Vec::with_capacity(2);
        let mut seen: Vec<char> = Vec::with_capacity(2);
        let mut cursor = pos;

        while let Some(marker) = self.char_at(cursor, end) {
            if script_slot(marker).is_none() || seen.contains(&marker) {
                break;
            }
            let (script, next) = self.parse_script_text(cursor, end)?;
            seen.push(marker);
            scripts.push(script);
            cursor = next;
        }

        Ok((scripts, cursor))
    }

    /// Parses one `_arg` or `^arg`. The argument is a brace group, a command or a
    /// single character.
    pub(crate) fn parse_script_text(
        &mut self,
        pos: usize,
        end: usize,
    ) -> Result<(NodeId, usize), GlyphError> {
        let Some(slot) = self.char_at(pos, end).and_then(script_slot) else {
            return Err(GlyphError::MissingScriptArgument { position: pos });
        };
        let arg_start = pos + 1;
        match self.char_at(arg_start, end) {
            None => return Err(GlyphError::MissingScriptArgument { position: pos }),
            Some(c) if c.is_whitespace() || script_slot(c).is_some() || c == '}' => {
                return Err(GlyphError::MissingScriptArgument { position: pos });
            }
            Some(_) => {}
        }

        let (argument, next) = self.parse_tex_object(arg_start, end, true)?;
        self.builder.set_slot(argument, slot);
        Ok((argument, next))
    }
}
