//! Per-box typesetting pipeline and the parallel multi-box dispatcher.
//!
//! # Sequence (per box)
//! 1. parse + index (`spawn_blocking`, CPU-bound)
//! 2. fetch the measured sheet from the [`SheetSource`] (async, the only suspension point)
//! 3. build the metrics table + lay out (`spawn_blocking`)
//!
//! Boxes share no mutable state. [`typeset_boxes`] runs each on its own task; one box
//! failing never affects the others.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::errors::{AppError, GlyphError};
use crate::glyph::GlyphTree;
use crate::layout::engine::{LayoutConfig, PlacedGlyph, Point, TextBox};
use crate::markup::{is_glyph_string, parse_tex, SpacingTable};
use crate::sheet::{SheetBounds, SheetRequest, SheetSource};

/// Engine settings shared by every box, built once at startup.
#[derive(Debug, Clone)]
pub struct TypesetSettings {
    pub spacing_table: SpacingTable,
    /// `font_size` here is the default for boxes that don't set one.
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoxRequest {
    pub id: String,
    pub text: String,
    pub font_size: Option<f32>,
    pub anchor: Option<Point>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoxLayout {
    pub id: String,
    pub rendered_count: usize,
    pub sheet: SheetBounds,
    pub glyphs: Vec<PlacedGlyph>,
}

impl BoxLayout {
    pub fn from_text_box(id: impl Into<String>, text_box: &TextBox) -> Self {
        Self {
            id: id.into(),
            rendered_count: text_box.tree().rendered_count(),
            sheet: text_box.metrics().bounds(),
            glyphs: text_box.glyphs().to_vec(),
        }
    }
}

/// Result of one box in a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BoxOutcome {
    Ok {
        #[serde(flatten)]
        layout: BoxLayout,
    },
    Error {
        id: String,
        code: &'static str,
        message: String,
    },
}

impl BoxOutcome {
    fn failed(id: String, error: &AppError) -> Self {
        let code = match error {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Glyph(e) => e.code(),
            AppError::Internal(_) => "INTERNAL_ERROR",
        };
        BoxOutcome::Error {
            id,
            code,
            message: error.to_string(),
        }
    }
}

pub fn validate_font_size(font_size: f32) -> Result<f32, AppError> {
    if font_size.is_finite() && font_size > 0.0 {
        Ok(font_size)
    } else {
        Err(AppError::Validation(format!(
            "font_size must be a positive number, got {font_size}"
        )))
    }
}

/// Parses on the blocking pool.
pub async fn parse_blocking(
    text: String,
    settings: Arc<TypesetSettings>,
) -> Result<GlyphTree, AppError> {
    let tree = tokio::task::spawn_blocking(move || parse_tex(&text, &settings.spacing_table))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in parse: {e}")))??;
    Ok(tree)
}

/// Parses and checks whether the whole text is a single token, both on the blocking pool.
pub async fn parse_and_classify_blocking(
    text: String,
    settings: Arc<TypesetSettings>,
) -> Result<(GlyphTree, bool), AppError> {
    let (tree, single_glyph) = tokio::task::spawn_blocking(move || {
        let single_glyph = is_glyph_string(&text, &settings.spacing_table);
        parse_tex(&text, &settings.spacing_table).map(|tree| (tree, single_glyph))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in parse: {e}")))??;
    Ok((tree, single_glyph))
}

/// Runs the full pipeline for one box.
pub async fn typeset_box(
    request: BoxRequest,
    source: &dyn SheetSource,
    settings: Arc<TypesetSettings>,
) -> Result<TextBox, AppError> {
    let mut config = settings.layout;
    config.font_size = validate_font_size(request.font_size.unwrap_or(config.font_size))?;
    let anchor = request.anchor.unwrap_or_default();

    let tree = parse_blocking(request.text, settings).await?;
    let sheet_request = SheetRequest::new(request.id, &tree);
    let raw = source.fetch(&sheet_request).await?;

    let rendered_count = sheet_request.rendered_count;
    let text_box = tokio::task::spawn_blocking(move || -> Result<TextBox, GlyphError> {
        let metrics = raw.into_table(rendered_count)?;
        TextBox::new(tree, metrics, anchor, config)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in layout: {e}")))??;

    Ok(text_box)
}

/// Typesets every box concurrently and returns one outcome per box, in request order.
pub async fn typeset_boxes(
    boxes: Vec<BoxRequest>,
    source: Arc<dyn SheetSource>,
    settings: Arc<TypesetSettings>,
) -> Vec<BoxOutcome> {
    let ids: Vec<String> = boxes.iter().map(|b| b.id.clone()).collect();
    let mut outcomes: Vec<Option<BoxOutcome>> = vec![None; boxes.len()];
    let mut tasks = JoinSet::new();

    for (slot, request) in boxes.into_iter().enumerate() {
        let source = Arc::clone(&source);
        let settings = Arc::clone(&settings);
        tasks.spawn(async move {
            let id = request.id.clone();
            let outcome = match typeset_box(request, source.as_ref(), settings).await {
                Ok(text_box) => BoxOutcome::Ok {
                    layout: BoxLayout::from_text_box(id, &text_box),
                },
                Err(e) => {
                    warn!(id = %id, error = %e, "Box failed to typeset");
                    BoxOutcome::failed(id, &e)
                }
            };
            (slot, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((slot, outcome)) => outcomes[slot] = Some(outcome),
            Err(e) => warn!(error = %e, "Typeset task did not complete"),
        }
    }

    let outcomes: Vec<BoxOutcome> = outcomes
        .into_iter()
        .zip(ids)
        .map(|(outcome, id)| {
            outcome.unwrap_or_else(|| {
                BoxOutcome::failed(id, &AppError::Internal(anyhow::anyhow!("task aborted")))
            })
        })
        .collect();

    let failed = outcomes
        .iter()
        .filter(|o| matches!(o, BoxOutcome::Error { .. }))
        .count();
    info!(boxes = outcomes.len(), failed, "Typeset batch complete");
    outcomes
}
