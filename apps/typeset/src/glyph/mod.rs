pub mod index;
pub mod style;
pub mod tree;

pub use style::{Colour, ResolvedStyle};
pub use tree::{GlyphTree, NodeView};
