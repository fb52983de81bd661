//! Glyph metrics returned by the typesetting backend.
//!
//! Two parallel resources describe the measured glyphs, one record per rendered-leaf
//! index in ascending order:
//! - position table: `x, y` (`x == -1` means "treat x as 0")
//! - attribute table: `character, width, height, depth`
//!
//! Records carry no index of their own; row `i` belongs to glyph `i`.

#![allow(dead_code)]

use serde::Serialize;

use crate::errors::GlyphError;

/// Sentinel the backend writes when a glyph has no horizontal position.
const NO_X_SENTINEL: f32 = -1.0;

/// One measured glyph, in points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlyphMetricsRow {
    pub character: String,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub x: f32,
    pub y: f32,
}

/// Tight bounding box over every row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SheetBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlyphMetricsTable {
    rows: Vec<GlyphMetricsRow>,
    bounds: SheetBounds,
}

/// Parsed `x, y` record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionRecord {
    pub x: f32,
    pub y: f32,
}

/// Parsed `character, width, height, depth` record.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRecord {
    pub character: String,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl GlyphMetricsTable {
    /// Joins the two resources row by row.
    ///
    /// Fails with `MetricsCountMismatch` unless both resources hold exactly
    /// `rendered_count` records.
    pub fn from_tables(
        positions: &[PositionRecord],
        attributes: &[AttributeRecord],
        rendered_count: usize,
    ) -> Result<Self, GlyphError> {
        if positions.len() != attributes.len() || positions.len() != rendered_count {
            return Err(GlyphError::MetricsCountMismatch {
                positions: positions.len(),
                attributes: attributes.len(),
                rendered: rendered_count,
            });
        }

        let rows: Vec<GlyphMetricsRow> = positions
            .iter()
            .zip(attributes)
            .map(|(pos, attr)| GlyphMetricsRow {
                character: attr.character.clone(),
                width: attr.width,
                height: attr.height,
                depth: attr.depth,
                x: if pos.x == NO_X_SENTINEL { 0.0 } else { pos.x },
                y: pos.y,
            })
            .collect();
        let bounds = compute_sheet_bounds(&rows);

        Ok(Self { rows, bounds })
    }

    /// Parses both text resources and joins them.
    pub fn parse(
        positions: &str,
        attributes: &str,
        rendered_count: usize,
    ) -> Result<Self, GlyphError> {
        let positions = parse_position_table(positions)?;
        let attributes = parse_attribute_table(attributes)?;
        Self::from_tables(&positions, &attributes, rendered_count)
    }

    pub fn rows(&self) -> &[GlyphMetricsRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&GlyphMetricsRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn bounds(&self) -> SheetBounds {
        self.bounds
    }
}

/// Bottom-left is `min(x, y - depth)`, top-right is `max(x + width, y + height)`.
/// An empty table has zero bounds.
pub fn compute_sheet_bounds(rows: &[GlyphMetricsRow]) -> SheetBounds {
    if rows.is_empty() {
        return SheetBounds::default();
    }

    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for row in rows {
        min_x = min_x.min(row.x);
        min_y = min_y.min(row.y - row.depth);
        max_x = max_x.max(row.x + row.width);
        max_y = max_y.max(row.y + row.height);
    }

    SheetBounds {
        min_x,
        min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}

/// Parses a position table: one `x,y` (or whitespace separated) record per line.
pub fn parse_position_table(text: &str) -> Result<Vec<PositionRecord>, GlyphError> {
    records(text)
        .map(|(line, record)| {
            let fields: Vec<&str> = record
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|f| !f.is_empty())
                .collect();
            let [x, y] = fields.as_slice() else {
                return Err(malformed(
                    "position",
                    line,
                    format!("expected 2 fields, found {}", fields.len()),
                ));
            };
            Ok(PositionRecord {
                x: parse_number(x, "position", line)?,
                y: parse_number(y, "position", line)?,
            })
        })
        .collect()
}

/// Parses an attribute table: one `character,width,height,depth` record per line.
///
/// The character may itself be a comma, so the numeric fields are split off from the
/// right.
pub fn parse_attribute_table(text: &str) -> Result<Vec<AttributeRecord>, GlyphError> {
    records(text)
        .map(|(line, record)| {
            let fields: Vec<&str> = record.rsplitn(4, ',').collect();
            let [depth, height, width, character] = fields.as_slice() else {
                return Err(malformed(
                    "attribute",
                    line,
                    format!("expected 4 fields, found {}", fields.len()),
                ));
            };
            if character.is_empty() {
                return Err(malformed("attribute", line, "missing character".to_string()));
            }
            Ok(AttributeRecord {
                character: (*character).to_string(),
                width: parse_number(width, "attribute", line)?,
                height: parse_number(height, "attribute", line)?,
                depth: parse_number(depth, "attribute", line)?,
            })
        })
        .collect()
}

/// Non-blank lines with their 1-based line numbers. Only the line terminator is
/// stripped so a space character in the first attribute field survives.
fn records(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
}

fn parse_number(field: &str, resource: &'static str, line: usize) -> Result<f32, GlyphError> {
    let field = field.trim();
    let digits = field.strip_suffix("pt").unwrap_or(field);
    digits
        .parse::<f32>()
        .map_err(|_| malformed(resource, line, format!("'{field}' is not a number")))
}

fn malformed(resource: &'static str, line: usize, reason: String) -> GlyphError {
    GlyphError::MalformedMetrics {
        resource,
        line,
        reason,
    }
}
