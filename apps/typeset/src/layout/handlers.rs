use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::glyph::{Colour, GlyphTree, NodeView, ResolvedStyle};
use crate::layout::engine::{PlacedGlyph, Point};
use crate::layout::pipeline::{
    parse_and_classify_blocking, typeset_box, typeset_boxes, BoxOutcome, BoxRequest,
};
use crate::sheet::{InlineSheetSource, RawSheet, SheetBounds, SheetRequest};
use crate::state::AppState;

const INLINE_SHEET_ID: &str = "inline";

#[derive(Deserialize)]
pub struct ParseRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct ParseResponse {
    pub rendered_count: usize,
    /// The whole text is one token.
    pub single_glyph: bool,
    pub nodes: Vec<NodeView>,
    /// Document to hand to the typesetting backend.
    pub document: String,
}

#[derive(Deserialize)]
pub struct LayoutRequest {
    pub text: String,
    pub font_size: Option<f32>,
    pub anchor: Option<Point>,
    pub positions: String,
    pub attributes: String,
    #[serde(default)]
    pub styles: Vec<StyleRequest>,
}

/// Override applied to one node (by its `id` in the parse view) before styles resolve.
#[derive(Deserialize)]
pub struct StyleRequest {
    pub node: usize,
    pub colour: Option<Colour>,
    pub italic: Option<bool>,
    pub bold: Option<bool>,
}

#[derive(Serialize)]
pub struct LayoutResponse {
    pub rendered_count: usize,
    pub sheet: SheetBounds,
    pub glyphs: Vec<PlacedGlyph>,
    /// Resolved style per glyph index.
    pub styles: Vec<ResolvedStyle>,
}

#[derive(Deserialize)]
pub struct TypesetRequest {
    pub boxes: Vec<BoxRequest>,
}

#[derive(Serialize)]
pub struct TypesetResponse {
    pub results: Vec<BoxOutcome>,
}

/// POST /api/v1/parse
pub async fn handle_parse(
    State(state): State<AppState>,
    Json(req): Json<ParseRequest>,
) -> Result<Json<ParseResponse>, AppError> {
    let (tree, single_glyph) =
        parse_and_classify_blocking(req.text, state.settings.clone()).await?;
    let request = SheetRequest::new(INLINE_SHEET_ID, &tree);
    Ok(Json(ParseResponse {
        rendered_count: request.rendered_count,
        single_glyph,
        nodes: tree.view(),
        document: request.document,
    }))
}

/// POST /api/v1/layout
/// Metrics are supplied in the request body instead of fetched from the sheet source.
pub async fn handle_layout(
    State(state): State<AppState>,
    Json(req): Json<LayoutRequest>,
) -> Result<Json<LayoutResponse>, AppError> {
    let source = InlineSheetSource::new().with_sheet(
        INLINE_SHEET_ID,
        RawSheet {
            positions: req.positions,
            attributes: req.attributes,
        },
    );
    let request = BoxRequest {
        id: INLINE_SHEET_ID.to_string(),
        text: req.text,
        font_size: req.font_size,
        anchor: req.anchor,
    };

    let mut text_box = typeset_box(request, &source, state.settings.clone()).await?;
    apply_styles(text_box.tree_mut(), &req.styles)?;

    let tree = text_box.tree();
    let styles = tree
        .glyphs()
        .iter()
        .map(|g| tree.resolved_style(g.node))
        .collect();
    Ok(Json(LayoutResponse {
        rendered_count: tree.rendered_count(),
        sheet: text_box.metrics().bounds(),
        glyphs: text_box.glyphs().to_vec(),
        styles,
    }))
}

fn apply_styles(tree: &mut GlyphTree, styles: &[StyleRequest]) -> Result<(), AppError> {
    for style in styles {
        let id = tree.node_id(style.node).ok_or_else(|| {
            AppError::Validation(format!("style targets unknown node {}", style.node))
        })?;
        if let Some(colour) = style.colour {
            tree.set_colour(id, colour);
        }
        if let Some(italic) = style.italic {
            tree.set_italic(id, italic);
        }
        if let Some(bold) = style.bold {
            tree.set_bold(id, bold);
        }
    }
    Ok(())
}

/// POST /api/v1/typeset
pub async fn handle_typeset(
    State(state): State<AppState>,
    Json(req): Json<TypesetRequest>,
) -> Result<Json<TypesetResponse>, AppError> {
    if req.boxes.is_empty() {
        return Err(AppError::Validation("boxes must not be empty".to_string()));
    }
    let results = typeset_boxes(req.boxes, state.sheet_source.clone(), state.settings.clone()).await;
    Ok(Json(TypesetResponse { results }))
}
