//! Core domain types, configuration, and build orchestration for assembling
//! a slide deck from an ordered list of HTML fragments.

pub mod build;
pub mod config;
pub mod error;
pub mod types;

pub use build::{BuildObserver, BuildPhase, BuildReport, DeckWriter, Orchestrator, SlideRenderer};
pub use config::{BuildConfig, SlideManifest};
pub use error::{Error, Result};
pub use types::{
    Bullet, Deck, Frame, ImageFormat, Layout, Paragraph, Picture, PresentationMetadata, Slide,
    SlideElement, TextAlign, TextBox, TextRun,
};
