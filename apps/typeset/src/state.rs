use std::sync::Arc;

use crate::layout::TypesetSettings;
use crate::sheet::SheetSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Where measured sheets come from. Default: `DirectorySheetSource` over `SHEET_DIR`.
    pub sheet_source: Arc<dyn SheetSource>,
    pub settings: Arc<TypesetSettings>,
}
