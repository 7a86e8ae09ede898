//! Source format converters.

mod text;

pub use text::TextParser;
