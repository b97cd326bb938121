//! Ordered, fail-fast batch conversion of slide sources into one presentation.
//!
//! The [`Orchestrator`] threads a [`Deck`] through the manifest as an
//! accumulator: each conversion step takes the deck by value and hands it
//! back with one slide appended. The first failure short-circuits the fold,
//! so nothing is written unless every step succeeded.

use crate::config::BuildConfig;
use crate::error::{Error, Result};
use crate::types::Deck;
use std::path::{Path, PathBuf};

/// Renders one slide source into one appended slide.
pub trait SlideRenderer {
    /// Append exactly one slide rendered from `source` to `deck`.
    fn render(&self, source: &Path, deck: Deck) -> Result<Deck>;
}

/// Serializes a finished deck to a file.
pub trait DeckWriter {
    fn write(&self, deck: &Deck, output: &Path) -> Result<()>;
}

/// Receives progress notifications during a build.
pub trait BuildObserver {
    /// Called before slide `index` (0-based) of `total` is converted.
    fn slide_started(&mut self, _index: usize, _total: usize, _name: &str) {}

    /// Called once the output file has been written.
    fn finished(&mut self, _report: &BuildReport) {}
}

/// Observer that ignores every notification.
impl BuildObserver for () {}

/// Where a build currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Idle,
    Initializing,
    Converting(usize),
    Writing,
    Done,
    Failed,
}

/// Outcome of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub output: PathBuf,
    pub slide_count: usize,
}

/// Drives a build from a fixed configuration.
pub struct Orchestrator<R, W> {
    config: BuildConfig,
    renderer: R,
    writer: W,
    phase: BuildPhase,
}

impl<R: SlideRenderer, W: DeckWriter> Orchestrator<R, W> {
    pub fn new(config: BuildConfig, renderer: R, writer: W) -> Self {
        Self {
            config,
            renderer,
            writer,
            phase: BuildPhase::Idle,
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Phase reached by the last (or current) run.
    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// Convert every manifest entry in order, then write the output file.
    pub fn run(&mut self, observer: &mut dyn BuildObserver) -> Result<BuildReport> {
        match self.run_phases(observer) {
            Ok(report) => {
                self.enter(BuildPhase::Done);
                observer.finished(&report);
                Ok(report)
            }
            Err(e) => {
                log::error!("Build failed during {:?}: {}", self.phase, e);
                self.enter(BuildPhase::Failed);
                Err(e)
            }
        }
    }

    fn run_phases(&mut self, observer: &mut dyn BuildObserver) -> Result<BuildReport> {
        self.enter(BuildPhase::Initializing);

        if !self.config.slides_dir.is_dir() {
            return Err(Error::SourceNotFound(self.config.slides_dir.clone()));
        }

        let deck = Deck::new(self.config.metadata.clone());
        let total = self.config.slides.len();
        let slides_dir = self.config.slides_dir.clone();
        let manifest = self.config.slides.clone();

        let deck = manifest
            .resolve(&slides_dir)
            .enumerate()
            .try_fold(deck, |deck, (index, (name, path))| {
                self.enter(BuildPhase::Converting(index));
                observer.slide_started(index, total, name);
                self.convert(name, &path, deck)
            })?;

        self.enter(BuildPhase::Writing);
        self.writer.write(&deck, &self.config.output)?;

        Ok(BuildReport {
            output: self.config.output.clone(),
            slide_count: deck.slide_count(),
        })
    }

    /// Run one conversion step and check that it appended exactly one slide.
    fn convert(&self, name: &str, path: &Path, deck: Deck) -> Result<Deck> {
        let before = deck.slide_count();
        let deck = self.renderer.render(path, deck)?;
        let added = deck.slide_count() as isize - before as isize;
        if added != 1 {
            return Err(Error::conversion(
                name,
                format!("converter produced {} slides, expected exactly 1", added),
            ));
        }
        log::debug!("Converted {} into slide {}", name, deck.slide_count());
        Ok(deck)
    }

    fn enter(&mut self, phase: BuildPhase) {
        log::debug!("Build phase: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}
