//! Backslash command classification.
//!
//! Two command shapes exist:
//! - char commands: `\` followed by one non-letter (`\%`, `\,`, `\\`), always two characters
//! - word commands: `\` followed by a run of ASCII letters (`\pi`, `\frac`)
//!
//! Whether a command occupies screen space cannot be derived from syntax; spacing
//! directives come from a configurable [`SpacingTable`].

#![allow(dead_code)]

use std::collections::HashSet;
use std::ops::Range;

use crate::errors::GlyphError;
use crate::markup::brackets::{locate_chained_enclosures, Enclosure};

/// Spacing commands recognised when no override is configured.
pub const DEFAULT_SPACING_COMMANDS: &[&str] = &[
    r"\ ",
    r"\!",
    r"\,",
    r"\:",
    r"\;",
    r"\>",
    r"\quad",
    r"\qquad",
    r"\enspace",
    r"\enskip",
    r"\thinspace",
    r"\negthinspace",
    r"\medspace",
    r"\negmedspace",
    r"\thickspace",
    r"\negthickspace",
];

/// Set of commands that inject horizontal space instead of drawing a glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpacingTable {
    commands: HashSet<String>,
}

impl Default for SpacingTable {
    fn default() -> Self {
        Self::from_commands(DEFAULT_SPACING_COMMANDS.iter().copied())
    }
}

impl SpacingTable {
    /// Builds a table from command spellings. A missing leading backslash is added.
    pub fn from_commands<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let commands = commands
            .into_iter()
            .filter(|c| !c.as_ref().is_empty())
            .map(|c| {
                let c = c.as_ref();
                if c.starts_with('\\') {
                    c.to_string()
                } else {
                    format!("\\{c}")
                }
            })
            .collect();
        Self { commands }
    }

    pub fn contains(&self, command: &str) -> bool {
        self.commands.contains(command)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Classification of the command starting at a backslash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    /// Byte offset one past the command name.
    pub prefix_end: usize,
    /// The name is immediately followed by a `{…}` argument.
    pub has_trailing_args: bool,
    /// The command draws something (not in the spacing table).
    pub not_spacing: bool,
}

/// Extent of a command token: the whole span plus its argument groups, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandExtent {
    pub span: Range<usize>,
    pub arguments: Vec<Enclosure>,
}

fn char_after(text: &str, pos: usize) -> Option<char> {
    text.get(pos..)?.chars().nth(1)
}

fn at_backslash(text: &str, pos: usize) -> bool {
    text.get(pos..).is_some_and(|rest| rest.starts_with('\\'))
}

pub fn is_char_command(text: &str, pos: usize) -> bool {
    at_backslash(text, pos) && char_after(text, pos).is_some_and(|c| !c.is_ascii_alphabetic())
}

pub fn is_word_command(text: &str, pos: usize) -> bool {
    at_backslash(text, pos) && char_after(text, pos).is_some_and(|c| c.is_ascii_alphabetic())
}

/// Characters that end a command written without brace arguments.
///
/// Space, comma, period, semicolon, colon and open-parenthesis delimit the command's
/// trailing prefix. The structural characters are included so that a following command,
/// group, math shift or script marker is never absorbed into the token.
pub fn is_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '.' | ';' | ':' | '(' | '\\' | '{' | '}' | '$' | '_' | '^')
}

/// Classifies the command at `pos`.
pub fn command_info(
    text: &str,
    pos: usize,
    spacing: &SpacingTable,
) -> Result<CommandInfo, GlyphError> {
    let (prefix_end, is_word) = if is_char_command(text, pos) {
        let next = char_after(text, pos).map_or(0, char::len_utf8);
        (pos + 1 + next, false)
    } else if is_word_command(text, pos) {
        let name_len = text[pos + 1..]
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(text.len() - pos - 1);
        (pos + 1 + name_len, true)
    } else {
        return Err(GlyphError::UnrecognisedCommand { position: pos });
    };

    Ok(CommandInfo {
        prefix_end,
        has_trailing_args: is_word && text[prefix_end..].starts_with('{'),
        not_spacing: !spacing.contains(&text[pos..prefix_end]),
    })
}

/// Returns the full extent of the command at `pos`.
///
/// Char commands are always two characters. Word commands with trailing arguments span
/// their chained brace groups; otherwise they run up to the next boundary character.
pub fn command_extent(
    text: &str,
    pos: usize,
    info: &CommandInfo,
) -> Result<CommandExtent, GlyphError> {
    if info.has_trailing_args {
        let arguments = locate_chained_enclosures(text, info.prefix_end, '{', '}')?;
        let end = arguments.last().map_or(info.prefix_end, |e| e.end);
        return Ok(CommandExtent {
            span: pos..end,
            arguments,
        });
    }

    if is_char_command(text, pos) {
        return Ok(CommandExtent {
            span: pos..info.prefix_end,
            arguments: Vec::new(),
        });
    }

    let end = text[info.prefix_end..]
        .find(is_boundary)
        .map_or(text.len(), |offset| info.prefix_end + offset);
    Ok(CommandExtent {
        span: pos..end,
        arguments: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(text: &str) -> CommandInfo {
        command_info(text, 0, &SpacingTable::default()).unwrap()
    }

    #[test]
    fn test_char_command_is_two_wide() {
        assert!(is_char_command(r"\%", 0));
        assert!(!is_word_command(r"\%", 0));
        assert_eq!(info(r"\% rest").prefix_end, 2);
    }

    #[test]
    fn test_double_backslash_is_char_command() {
        assert!(is_char_command(r"\\", 0));
        assert_eq!(info(r"\\x").prefix_end, 2);
    }

    #[test]
    fn test_word_command_name_ends_at_non_letter() {
        let i = info(r"\alpha_1");
        assert_eq!(i.prefix_end, 6);
        assert!(!i.has_trailing_args);
        assert!(i.not_spacing);
    }

    #[test]
    fn test_char_command_never_takes_arguments() {
        let text = r"\{{a}";
        let i = info(text);
        assert!(!i.has_trailing_args);
        let extent = command_extent(text, 0, &i).unwrap();
        assert_eq!(&text[extent.span], r"\{");
    }

    #[test]
    fn test_trailing_args_detected() {
        let i = info(r"\frac{a}{b}");
        assert_eq!(i.prefix_end, 5);
        assert!(i.has_trailing_args);
    }

    #[test]
    fn test_spacing_commands_flagged() {
        assert!(!info(r"\quad x").not_spacing);
        assert!(!info(r"\,x").not_spacing);
        assert!(!info(r"\ x").not_spacing);
        assert!(info(r"\pi").not_spacing);
    }

    #[test]
    fn test_not_at_backslash_is_unrecognised() {
        let err = command_info("abc", 1, &SpacingTable::default()).unwrap_err();
        assert_eq!(err, GlyphError::UnrecognisedCommand { position: 1 });
    }

    #[test]
    fn test_trailing_backslash_is_unrecognised() {
        let err = command_info(r"a\", 1, &SpacingTable::default()).unwrap_err();
        assert_eq!(err, GlyphError::UnrecognisedCommand { position: 1 });
    }

    #[test]
    fn test_extent_runs_to_boundary() {
        let text = r"\pi, next";
        let extent = command_extent(text, 0, &info(text)).unwrap();
        assert_eq!(&text[extent.span], r"\pi");

        let text = r"\cdot(x)";
        let extent = command_extent(text, 0, &info(text)).unwrap();
        assert_eq!(&text[extent.span], r"\cdot");
    }

    #[test]
    fn test_extent_keeps_trailing_prefix() {
        let text = r"\alpha+\beta";
        let extent = command_extent(text, 0, &info(text)).unwrap();
        assert_eq!(&text[extent.span], r"\alpha+");
    }

    #[test]
    fn test_extent_stops_before_script_marker() {
        let text = r"\pi^2";
        let extent = command_extent(text, 0, &info(text)).unwrap();
        assert_eq!(&text[extent.span], r"\pi");
    }

    #[test]
    fn test_extent_with_chained_arguments() {
        let text = r"\frac{x^{2} - 1}{x + 1} =";
        let extent = command_extent(text, 0, &info(text)).unwrap();
        assert_eq!(&text[extent.span.clone()], r"\frac{x^{2} - 1}{x + 1}");
        assert_eq!(extent.arguments.len(), 2);
    }

    #[test]
    fn test_table_normalises_missing_backslash() {
        let table = SpacingTable::from_commands(["quad", r"\hfill", ""]);
        assert_eq!(table.len(), 2);
        assert!(table.contains(r"\quad"));
        assert!(table.contains(r"\hfill"));
    }
}
