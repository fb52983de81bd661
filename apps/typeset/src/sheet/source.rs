//! Sources of measured glyph sheets.
//!
//! The external compile step is out of process. A [`SheetSource`] hands back the two
//! metrics resources it produced for a [`SheetRequest`]; swapping implementations
//! never touches the pipeline or the handlers.
//!
//! `AppState` holds an `Arc<dyn SheetSource>`.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::errors::GlyphError;
use crate::sheet::metrics::GlyphMetricsTable;
use crate::sheet::template::SheetRequest;

/// The two metrics resources, as text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSheet {
    pub positions: String,
    pub attributes: String,
}

impl RawSheet {
    pub fn into_table(self, rendered_count: usize) -> Result<GlyphMetricsTable, GlyphError> {
        GlyphMetricsTable::parse(&self.positions, &self.attributes, rendered_count)
    }
}

#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch(&self, request: &SheetRequest) -> Result<RawSheet, GlyphError>;
}

// ────────────────────────────────────────────────────────────────────────────
// DirectorySheetSource
// ────────────────────────────────────────────────────────────────────────────

/// Reads `<dir>/<id>.pos` and `<dir>/<id>.attr`, written ahead of time by the
/// compile step.
#[derive(Debug, Clone)]
pub struct DirectorySheetSource {
    dir: PathBuf,
}

impl DirectorySheetSource {
    pub const POSITION_EXT: &'static str = "pos";
    pub const ATTRIBUTE_EXT: &'static str = "attr";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn resource_path(&self, id: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{id}.{ext}"))
    }
}

/// Ids become file names; anything that could leave the sheet directory is refused.
fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
}

async fn read_resource(path: &Path, id: &str) -> Result<String, GlyphError> {
    tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => {
            GlyphError::SheetUnavailable(format!("no sheet '{id}' ({} missing)", path.display()))
        }
        _ => GlyphError::SheetUnavailable(format!("reading {}: {e}", path.display())),
    })
}

#[async_trait]
impl SheetSource for DirectorySheetSource {
    async fn fetch(&self, request: &SheetRequest) -> Result<RawSheet, GlyphError> {
        if !is_safe_id(&request.id) {
            return Err(GlyphError::SheetUnavailable(format!(
                "invalid sheet id '{}'",
                request.id
            )));
        }

        let positions_path = self.resource_path(&request.id, Self::POSITION_EXT);
        let attributes_path = self.resource_path(&request.id, Self::ATTRIBUTE_EXT);
        let (positions, attributes) = tokio::try_join!(
            read_resource(&positions_path, &request.id),
            read_resource(&attributes_path, &request.id),
        )?;

        debug!(id = %request.id, dir = %self.dir.display(), "Loaded glyph sheet from directory");
        Ok(RawSheet {
            positions,
            attributes,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// InlineSheetSource
// ────────────────────────────────────────────────────────────────────────────

/// Sheets supplied in memory, keyed by box id.
#[derive(Debug, Clone, Default)]
pub struct InlineSheetSource {
    sheets: HashMap<String, RawSheet>,
}

impl InlineSheetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, id: impl Into<String>, sheet: RawSheet) -> Self {
        self.sheets.insert(id.into(), sheet);
        self
    }
}

#[async_trait]
impl SheetSource for InlineSheetSource {
    async fn fetch(&self, request: &SheetRequest) -> Result<RawSheet, GlyphError> {
        self.sheets
            .get(&request.id)
            .cloned()
            .ok_or_else(|| GlyphError::SheetUnavailable(format!("no sheet '{}'", request.id)))
    }
}
