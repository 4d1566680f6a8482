//! PDF output: card drawing, fonts and document assembly.

mod card;
mod content;
mod document;
mod fonts;
mod metrics;
mod resources;

pub use document::render;
pub use fonts::{FontData, load_font_file};
