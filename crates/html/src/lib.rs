//! HTML fragment to slide converter.
//!
//! Parses a small, well-behaved subset of HTML and CSS and lays the content
//! out top-to-bottom on a slide canvas.

pub mod converter;
pub mod dom;
pub mod style;

pub use converter::HtmlConverter;
