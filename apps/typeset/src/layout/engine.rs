//! Glyph placement.
//!
//! # Coordinates
//! Metrics are in sheet points. A box is laid out at `font_size`, so every metric is
//! scaled by `font_size / sheet_font_size_pt`. `world_rect.x/y` is the glyph's centre
//! (geometry is centred on its own origin); UVs address the glyph's region on the
//! rasterized sheet and lie in `[0, 1]`.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::GlyphError;
use crate::glyph::GlyphTree;
use crate::layout::spacing::{SpacingConfig, SpacingTracker};
use crate::sheet::GlyphMetricsTable;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub font_size: f32,
    /// Font size the sheet was typeset at.
    pub sheet_font_size_pt: f32,
    pub spacing: SpacingConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            sheet_font_size_pt: 10.0,
            spacing: SpacingConfig::default(),
        }
    }
}

impl LayoutConfig {
    pub fn scale(&self) -> f32 {
        self.font_size / self.sheet_font_size_pt
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UvRect {
    pub u: f32,
    pub v: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacedGlyph {
    pub index: usize,
    pub world_rect: Rect,
    pub uv_rect: UvRect,
}

fn ratio(value: f32, extent: f32) -> f32 {
    if extent == 0.0 {
        0.0
    } else {
        value / extent
    }
}

/// Places every rendered leaf of `tree`, in index order.
///
/// A pure function of its inputs; a fresh [`SpacingTracker`] is used per call.
pub fn layout_glyphs(
    tree: &GlyphTree,
    metrics: &GlyphMetricsTable,
    anchor: Point,
    config: &LayoutConfig,
) -> Result<Vec<PlacedGlyph>, GlyphError> {
    if metrics.len() != tree.rendered_count() {
        return Err(GlyphError::MetricsCountMismatch {
            positions: metrics.len(),
            attributes: metrics.len(),
            rendered: tree.rendered_count(),
        });
    }

    let scale = config.scale();
    let sheet = metrics.bounds();
    let mut tracker = SpacingTracker::new(config.spacing);

    let placed = tree
        .glyphs()
        .iter()
        .zip(metrics.rows())
        .enumerate()
        .map(|(index, (glyph, row))| {
            let offset = tracker.offset(row.x, glyph.spacer_after);
            let full_height = row.height + row.depth;
            let bottom = row.y - row.depth;

            let w = scale * row.width;
            let h = scale * full_height;
            let local_x = scale * row.x + scale * offset;
            let local_y = scale * bottom;

            PlacedGlyph {
                index,
                world_rect: Rect {
                    x: anchor.x + local_x + w / 2.0,
                    y: anchor.y + local_y + h / 2.0,
                    w,
                    h,
                },
                uv_rect: UvRect {
                    u: ratio(row.x - sheet.min_x, sheet.width),
                    v: ratio(bottom - sheet.min_y, sheet.height),
                    w: ratio(row.width, sheet.width),
                    h: ratio(full_height, sheet.height),
                },
            }
        })
        .collect();

    Ok(placed)
}

// ────────────────────────────────────────────────────────────────────────────
// TextBox
// ────────────────────────────────────────────────────────────────────────────

/// A parsed, measured and laid-out box of text.
///
/// Any change to font size or anchor recomputes the whole layout.
#[derive(Debug, Clone)]
pub struct TextBox {
    tree: GlyphTree,
    metrics: GlyphMetricsTable,
    anchor: Point,
    config: LayoutConfig,
    glyphs: Vec<PlacedGlyph>,
}

impl TextBox {
    pub fn new(
        tree: GlyphTree,
        metrics: GlyphMetricsTable,
        anchor: Point,
        config: LayoutConfig,
    ) -> Result<Self, GlyphError> {
        let glyphs = layout_glyphs(&tree, &metrics, anchor, &config)?;
        debug!(
            glyphs = glyphs.len(),
            font_size = config.font_size,
            "Laid out text box"
        );
        Ok(Self {
            tree,
            metrics,
            anchor,
            config,
            glyphs,
        })
    }

    pub fn set_font_size(&mut self, font_size: f32) -> Result<(), GlyphError> {
        self.config.font_size = font_size;
        self.relayout()
    }

    pub fn set_anchor(&mut self, anchor: Point) -> Result<(), GlyphError> {
        self.anchor = anchor;
        self.relayout()
    }

    fn relayout(&mut self) -> Result<(), GlyphError> {
        self.glyphs = layout_glyphs(&self.tree, &self.metrics, self.anchor, &self.config)?;
        Ok(())
    }

    pub fn glyphs(&self) -> &[PlacedGlyph] {
        &self.glyphs
    }

    pub fn tree(&self) -> &GlyphTree {
        &self.tree
    }

    /// Style changes do not move glyphs, so no relayout is needed.
    pub fn tree_mut(&mut self) -> &mut GlyphTree {
        &mut self.tree
    }

    pub fn metrics(&self) -> &GlyphMetricsTable {
        &self.metrics
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{parse_tex, SpacingTable};

    // `$a\,b$` typeset on a sheet: a at x=0, b at x=7 (5 wide + thin space).
    const POSITIONS: &str = "0,0\n7,0\n";
    const ATTRIBUTES: &str = "a,5,5,0\nb,5,8,2\n";

    fn text_box(config: LayoutConfig) -> TextBox {
        let tree = parse_tex(r"$a\,b$", &SpacingTable::default()).unwrap();
        let metrics = GlyphMetricsTable::parse(POSITIONS, ATTRIBUTES, 2).unwrap();
        TextBox::new(tree, metrics, Point::default(), config).unwrap()
    }

    fn config(font_size: f32, enabled: bool) -> LayoutConfig {
        LayoutConfig {
            font_size,
            sheet_font_size_pt: 10.0,
            spacing: SpacingConfig {
                enabled,
                unit_pt: 2.0,
            },
        }
    }

    #[test]
    fn test_world_rect_is_centred_and_scaled() {
        let tb = text_box(config(20.0, false));
        let a = tb.glyphs()[0].world_rect;
        assert_eq!(a, Rect { x: 5.0, y: 5.0, w: 10.0, h: 10.0 });

        let b = tb.glyphs()[1].world_rect;
        // scale 2: x = 2 * 7 + 10 / 2, y = 2 * (0 - 2) + 20 / 2
        assert_eq!(b, Rect { x: 19.0, y: 6.0, w: 10.0, h: 20.0 });
    }

    #[test]
    fn test_spacing_offset_shifts_following_glyph() {
        let tb = text_box(config(10.0, true));
        assert_eq!(tb.glyphs()[0].world_rect.x, 2.5);
        assert_eq!(tb.glyphs()[1].world_rect.x, 7.0 - 2.0 + 2.5);
    }

    #[test]
    fn test_uv_rect_addresses_sheet_region() {
        let tb = text_box(config(10.0, true));
        // sheet bounds: x 0..12, y -2..8
        let a = tb.glyphs()[0].uv_rect;
        assert_eq!(a, UvRect { u: 0.0, v: 0.2, w: 5.0 / 12.0, h: 0.5 });
        let b = tb.glyphs()[1].uv_rect;
        assert_eq!(b, UvRect { u: 7.0 / 12.0, v: 0.0, w: 5.0 / 12.0, h: 1.0 });
    }

    #[test]
    fn test_uv_is_independent_of_font_size() {
        let small = text_box(config(8.0, true));
        let large = text_box(config(30.0, true));
        for (s, l) in small.glyphs().iter().zip(large.glyphs()) {
            assert_eq!(s.uv_rect, l.uv_rect);
        }
    }

    #[test]
    fn test_layout_is_idempotent() {
        let tb = text_box(config(12.0, true));
        let again = layout_glyphs(tb.tree(), tb.metrics(), tb.anchor(), tb.config()).unwrap();
        assert_eq!(tb.glyphs(), again.as_slice());
    }

    #[test]
    fn test_font_size_change_relayouts_in_full() {
        let mut tb = text_box(config(10.0, true));
        let before = tb.glyphs().to_vec();
        tb.set_font_size(20.0).unwrap();
        assert_eq!(tb.glyphs()[1].world_rect.w, 2.0 * before[1].world_rect.w);
        tb.set_font_size(10.0).unwrap();
        assert_eq!(tb.glyphs(), before.as_slice());
    }

    #[test]
    fn test_anchor_translates_every_glyph() {
        let mut tb = text_box(config(10.0, true));
        let before = tb.glyphs().to_vec();
        tb.set_anchor(Point { x: 100.0, y: -50.0 }).unwrap();
        for (b, a) in before.iter().zip(tb.glyphs()) {
            assert_eq!(a.world_rect.x, b.world_rect.x + 100.0);
            assert_eq!(a.world_rect.y, b.world_rect.y - 50.0);
        }
    }

    #[test]
    fn test_zero_sheet_dimension_gives_zero_uv() {
        let tree = parse_tex("$.$", &SpacingTable::default()).unwrap();
        let metrics = GlyphMetricsTable::parse("3,1\n", ".,0,0,0\n", 1).unwrap();
        let placed = layout_glyphs(&tree, &metrics, Point::default(), &LayoutConfig::default())
            .unwrap();
        assert_eq!(placed[0].uv_rect, UvRect::default());
    }

    #[test]
    fn test_metrics_must_cover_every_glyph() {
        let tree = parse_tex("$ab$", &SpacingTable::default()).unwrap();
        let metrics = GlyphMetricsTable::parse("0,0\n", "a,1,1,0\n", 1).unwrap();
        let err = layout_glyphs(&tree, &metrics, Point::default(), &LayoutConfig::default())
            .unwrap_err();
        assert!(matches!(err, GlyphError::MetricsCountMismatch { rendered: 2, .. }));
    }
}
