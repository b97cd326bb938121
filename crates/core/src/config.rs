//! Build configuration: presentation metadata, slide manifest, and paths.

use crate::error::{Error, Result};
use crate::types::{Layout, PresentationMetadata};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when no config is given.
pub const DEFAULT_CONFIG_FILE: &str = "deck.json";

/// Slides of the built-in deck, in presentation order.
const DEFAULT_SLIDES: &[&str] = &[
    "slide01-title.html",
    "slide02-revit.html",
    "slide03-bim-vs-cad.html",
    "slide04-bim.html",
    "slide05-parametric.html",
    "slide02-problem.html",
    "slide03-solution.html",
    "slide07-mcp.html",
    "slide06-architecture.html",
    "slide08-commands.html",
    "slide11-examples.html",
    "slide09-demo.html",
    "slide13-digital-twins.html",
    "slide14-setup.html",
    "slide15-thanks.html",
];

/// Ordered list of slide source file names.
///
/// Order is the output slide order. Entries are never discovered by listing
/// a directory, and duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct SlideManifest(Vec<String>);

impl SlideManifest {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(entries.into_iter().map(Into::into).collect())
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve every entry against the slides directory, keeping order.
    pub fn resolve<'a>(&'a self, dir: &'a Path) -> impl Iterator<Item = (&'a str, PathBuf)> + 'a {
        self.0.iter().map(move |name| (name.as_str(), dir.join(name)))
    }

    fn validate(&self) -> Result<()> {
        if let Some(idx) = self.0.iter().position(|name| name.trim().is_empty()) {
            return Err(Error::ConfigError(format!(
                "slide entry {} has an empty file name",
                idx + 1
            )));
        }
        Ok(())
    }
}

/// Everything a build needs, fixed before the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub metadata: PresentationMetadata,
    /// Base directory for resolving manifest entries.
    pub slides_dir: PathBuf,
    /// Destination of the presentation file.
    pub output: PathBuf,
    pub slides: SlideManifest,
}

/// On-disk JSON form of [`BuildConfig`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    layout: Layout,
    #[serde(default)]
    author: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    subject: String,
    #[serde(default = "default_slides_dir")]
    slides_dir: PathBuf,
    output: PathBuf,
    slides: SlideManifest,
}

fn default_slides_dir() -> PathBuf {
    PathBuf::from("slides")
}

impl BuildConfig {
    /// The built-in deck, with paths resolved against `base_dir`.
    pub fn builtin(base_dir: &Path) -> Self {
        Self {
            metadata: PresentationMetadata {
                layout: Layout::Layout16x9,
                author: "Talal Ahmed".to_string(),
                title: "Design Buildings Using Natural Language - Revit MCP".to_string(),
                subject: "Connecting Claude Code AI to Autodesk Revit 2026 via MCP".to_string(),
            },
            slides_dir: base_dir.join("slides"),
            output: base_dir.join("Revit-MCP-Presentation.pptx"),
            slides: SlideManifest::new(DEFAULT_SLIDES.iter().copied()),
        }
    }

    /// Parse a JSON configuration, resolving relative paths against `base_dir`.
    pub fn from_json(json: &str, base_dir: &Path) -> Result<Self> {
        let file: ConfigFile =
            serde_json::from_str(json).map_err(|e| Error::ConfigError(e.to_string()))?;
        file.slides.validate()?;

        Ok(Self {
            metadata: PresentationMetadata {
                layout: file.layout,
                author: file.author,
                title: file.title,
                subject: file.subject,
            },
            slides_dir: base_dir.join(file.slides_dir),
            output: base_dir.join(file.output),
            slides: file.slides,
        })
    }

    /// Load a JSON configuration file; relative paths resolve against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        log::debug!("Loaded configuration from {}", path.display());
        Self::from_json(&json, base_dir)
    }

    /// Replace the output path.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_config() {
        let config = BuildConfig::builtin(Path::new("/work"));
        assert_eq!(config.slides.len(), 15);
        assert_eq!(config.slides.entries()[0], "slide01-title.html");
        assert_eq!(config.slides.entries()[14], "slide15-thanks.html");
        assert_eq!(config.metadata.layout, Layout::Layout16x9);
        assert_eq!(config.slides_dir, Path::new("/work/slides"));
        assert_eq!(
            config.output,
            Path::new("/work/Revit-MCP-Presentation.pptx")
        );
    }

    #[test]
    fn test_from_json_resolves_relative_paths() {
        let json = r#"{
            "layout": "LAYOUT_4x3",
            "author": "A. Author",
            "title": "Deck",
            "slides_dir": "html",
            "output": "out/deck.pptx",
            "slides": ["b.html", "a.html", "b.html"]
        }"#;
        let config = BuildConfig::from_json(json, Path::new("/proj")).unwrap();

        assert_eq!(config.metadata.layout, Layout::Layout4x3);
        assert_eq!(config.metadata.subject, "");
        assert_eq!(config.slides_dir, Path::new("/proj/html"));
        assert_eq!(config.output, Path::new("/proj/out/deck.pptx"));
        // Order and duplicates are preserved.
        assert_eq!(config.slides.entries(), &["b.html", "a.html", "b.html"]);
    }

    #[test]
    fn test_from_json_defaults_slides_dir() {
        let json = r#"{"output": "deck.pptx", "slides": []}"#;
        let config = BuildConfig::from_json(json, Path::new("/p")).unwrap();
        assert_eq!(config.slides_dir, Path::new("/p/slides"));
        assert!(config.slides.is_empty());
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        let unknown = r#"{"output": "d.pptx", "slides": [], "theme": "dark"}"#;
        assert!(matches!(
            BuildConfig::from_json(unknown, Path::new("")),
            Err(Error::ConfigError(_))
        ));

        let empty_name = r#"{"output": "d.pptx", "slides": ["a.html", " "]}"#;
        let err = BuildConfig::from_json(empty_name, Path::new("")).unwrap_err();
        assert!(err.to_string().contains("slide entry 2"));
    }

    #[test]
    fn test_manifest_resolve_keeps_order() {
        let manifest = SlideManifest::new(["z.html", "a.html"]);
        let resolved: Vec<_> = manifest.resolve(Path::new("/s")).collect();
        assert_eq!(resolved[0], ("z.html", PathBuf::from("/s/z.html")));
        assert_eq!(resolved[1], ("a.html", PathBuf::from("/s/a.html")));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.json");
        std::fs::write(&path, r#"{"output": "x.pptx", "slides": ["a.html"]}"#).unwrap();

        let config = BuildConfig::load(&path).unwrap();
        assert_eq!(config.output, dir.path().join("x.pptx"));
        assert_eq!(config.slides_dir, dir.path().join("slides"));

        let missing = BuildConfig::load(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(Error::ConfigError(_))));
    }
}
