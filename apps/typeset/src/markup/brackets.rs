//! Enclosure scanning: matched `{…}` groups and `$…$` / `$$…$$` math spans.
//!
//! Distinct open/close symbols are balanced with a nesting counter. When both symbols
//! are the same character (math shift), nesting is impossible, so the scanner instead
//! matches the *width* of the opening run: `$` closes `$`, `$$` closes `$$`.
//!
//! A delimiter right after a backslash is a char command (`\$`, `\{`, `\}`) and is
//! skipped by every scan.

#![allow(dead_code)]

use std::ops::Range;

use crate::errors::GlyphError;

/// Same-symbol delimiters never run wider than this (`$$`).
const MAX_DELIMITER_WIDTH: usize = 2;

/// Starts a char command; the character after it is never a delimiter.
const ESCAPE: char = '\\';

/// A located enclosure. `start..end` covers both delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enclosure {
    pub start: usize,
    pub end: usize,
    pub open_len: usize,
    pub close_len: usize,
}

impl Enclosure {
    /// Span including the delimiters.
    pub fn outer(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Span between the delimiters.
    pub fn inner(&self) -> Range<usize> {
        self.start + self.open_len..self.end - self.close_len
    }

    pub fn span(&self, include_braces: bool) -> Range<usize> {
        if include_braces {
            self.outer()
        } else {
            self.inner()
        }
    }
}

/// Locates the first enclosure whose opener lies at or after `start`.
///
/// Returns `Ok(None)` when no opener exists in `text[start..]`.
pub fn locate_enclosure(
    text: &str,
    start: usize,
    open: char,
    close: char,
) -> Result<Option<Enclosure>, GlyphError> {
    let Some(open_at) = find_unescaped(text, start, open) else {
        return Ok(None);
    };

    if open == close {
        locate_same_symbol(text, open_at, open).map(Some)
    } else {
        locate_nested(text, open_at, open, close).map(Some)
    }
}

/// First `target` at or after `start` that is not the second half of a `\x` char command.
fn find_unescaped(text: &str, start: usize, target: char) -> Option<usize> {
    let mut chars = text.get(start..)?.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == ESCAPE {
            chars.next();
        } else if c == target {
            return Some(start + i);
        }
    }
    None
}

fn locate_nested(
    text: &str,
    open_at: usize,
    open: char,
    close: char,
) -> Result<Enclosure, GlyphError> {
    let mut depth = 0i32;
    let mut chars = text[open_at..].char_indices();
    while let Some((i, c)) = chars.next() {
        if c == ESCAPE {
            chars.next();
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                let close_at = open_at + i;
                return Ok(Enclosure {
                    start: open_at,
                    end: close_at + close.len_utf8(),
                    open_len: open.len_utf8(),
                    close_len: close.len_utf8(),
                });
            }
        }
    }
    Err(GlyphError::UnterminatedEnclosure {
        open,
        position: open_at,
    })
}

fn locate_same_symbol(text: &str, open_at: usize, delim: char) -> Result<Enclosure, GlyphError> {
    let symbol_len = delim.len_utf8();
    let width = text[open_at..]
        .chars()
        .take_while(|&c| c == delim)
        .take(MAX_DELIMITER_WIDTH)
        .count();
    let body_start = open_at + width * symbol_len;

    let mut count = 0usize;
    let mut chars = text[body_start..].char_indices();
    while let Some((i, c)) = chars.next() {
        if c == ESCAPE {
            chars.next();
            count = 0;
            continue;
        }
        if c != delim {
            count = 0;
            continue;
        }
        count += 1;
        if count == width {
            let close_end = body_start + i + symbol_len;
            let close_start = close_end - width * symbol_len;
            if close_start == body_start {
                return Err(GlyphError::EmptyEnclosure { position: open_at });
            }
            return Ok(Enclosure {
                start: open_at,
                end: close_end,
                open_len: width * symbol_len,
                close_len: width * symbol_len,
            });
        }
    }
    Err(GlyphError::UnterminatedEnclosure {
        open: delim,
        position: open_at,
    })
}

/// Finds the first enclosure at or after `start` and returns its span.
///
/// `Ok(None)` means no opener was found; an opener without a closer is an error.
pub fn find_first_enclosure(
    text: &str,
    start: usize,
    open: char,
    close: char,
    include_braces: bool,
) -> Result<Option<Range<usize>>, GlyphError> {
    Ok(locate_enclosure(text, start, open, close)?.map(|e| e.span(include_braces)))
}

/// Finds every top-level enclosure in `text[start..]`, left to right.
pub fn find_all_enclosures(
    text: &str,
    start: usize,
    open: char,
    close: char,
    include_braces: bool,
) -> Result<Vec<Range<usize>>, GlyphError> {
    let mut spans = Vec::new();
    let mut cursor = start;
    while let Some(enclosure) = locate_enclosure(text, cursor, open, close)? {
        spans.push(enclosure.span(include_braces));
        cursor = enclosure.end;
    }
    Ok(spans)
}

/// Locates back-to-back enclosures starting exactly at `start`, as in `\frac{a}{b}`.
///
/// The chain stops at the first closer not immediately followed by another opener.
/// Returns an empty list when `text[start..]` does not begin with `open`.
pub fn locate_chained_enclosures(
    text: &str,
    start: usize,
    open: char,
    close: char,
) -> Result<Vec<Enclosure>, GlyphError> {
    let mut chain = Vec::new();
    let mut cursor = start;
    while text.get(cursor..).is_some_and(|rest| rest.starts_with(open)) {
        match locate_enclosure(text, cursor, open, close)? {
            Some(enclosure) => {
                cursor = enclosure.end;
                chain.push(enclosure);
            }
            None => break,
        }
    }
    Ok(chain)
}

/// Span form of [`locate_chained_enclosures`].
pub fn find_chained_enclosures(
    text: &str,
    start: usize,
    open: char,
    close: char,
    include_braces: bool,
) -> Result<Vec<Range<usize>>, GlyphError> {
    Ok(locate_chained_enclosures(text, start, open, close)?
        .iter()
        .map(|e| e.span(include_braces))
        .collect())
}
