//! PPTX (Office Open XML) backend for slide deck assembly.
//!
//! Writes decks as ZIP archives of XML parts, and reads them back for
//! verification.

mod package;
pub mod reader;
mod slide;
pub mod writer;

pub use reader::{PptxReader, PptxSummary, SlideSummary};
pub use writer::PptxWriter;
