// Glyph placement: spacing offsets, the layout engine, and the per-box pipeline.
// Parse and layout are CPU-bound and run inside tokio::task::spawn_blocking.

pub mod engine;
pub mod handlers;
pub mod pipeline;
pub mod spacing;

pub use engine::LayoutConfig;
pub use pipeline::TypesetSettings;
pub use spacing::SpacingConfig;
