pub mod brackets;
pub mod command;
pub mod parser;
mod script;

pub use command::SpacingTable;
pub use parser::{is_glyph_string, parse_tex};
