pub mod metrics;
pub mod source;
pub mod template;

pub use metrics::{GlyphMetricsTable, SheetBounds};
pub use source::{DirectorySheetSource, InlineSheetSource, RawSheet, SheetSource};
pub use template::SheetRequest;
