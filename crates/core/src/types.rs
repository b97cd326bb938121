//! Domain types for representing a presentation being assembled.

use serde::{Deserialize, Serialize};

/// EMUs (English Metric Units) per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// EMUs per typographic point.
pub const EMU_PER_POINT: i64 = 12_700;

/// Slide canvas aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Layout {
    /// 10 x 5.625 inches.
    #[default]
    #[serde(rename = "LAYOUT_16x9")]
    Layout16x9,
    /// 10 x 6.25 inches.
    #[serde(rename = "LAYOUT_16x10")]
    Layout16x10,
    /// 10 x 7.5 inches.
    #[serde(rename = "LAYOUT_4x3")]
    Layout4x3,
    /// 13.333 x 7.5 inches.
    #[serde(rename = "LAYOUT_WIDE")]
    LayoutWide,
}

impl Layout {
    /// Canvas width in EMUs.
    pub fn width_emu(self) -> i64 {
        match self {
            Self::Layout16x9 | Self::Layout16x10 | Self::Layout4x3 => 9_144_000,
            Self::LayoutWide => 12_192_000,
        }
    }

    /// Canvas height in EMUs.
    pub fn height_emu(self) -> i64 {
        match self {
            Self::Layout16x9 => 5_143_500,
            Self::Layout16x10 => 5_715_000,
            Self::Layout4x3 | Self::LayoutWide => 6_858_000,
        }
    }

    /// Canvas width in inches.
    pub fn width_in(self) -> f64 {
        self.width_emu() as f64 / EMU_PER_INCH as f64
    }

    /// Canvas height in inches.
    pub fn height_in(self) -> f64 {
        self.height_emu() as f64 / EMU_PER_INCH as f64
    }

    /// The name used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            Self::Layout16x9 => "LAYOUT_16x9",
            Self::Layout16x10 => "LAYOUT_16x10",
            Self::Layout4x3 => "LAYOUT_4x3",
            Self::LayoutWide => "LAYOUT_WIDE",
        }
    }
}

/// Descriptive metadata embedded in the output presentation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PresentationMetadata {
    /// Canvas aspect ratio of every slide.
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subject: String,
}

/// The document object: metadata plus an append-only list of slides.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    metadata: PresentationMetadata,
    slides: Vec<Slide>,
}

impl Deck {
    /// Create an empty deck with the given metadata.
    pub fn new(metadata: PresentationMetadata) -> Self {
        Self {
            metadata,
            slides: Vec::new(),
        }
    }

    pub fn metadata(&self) -> &PresentationMetadata {
        &self.metadata
    }

    pub fn layout(&self) -> Layout {
        self.metadata.layout
    }

    /// Append a rendered slide.
    pub fn push_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Slides in presentation order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }
}

/// A single rendered slide.
#[derive(Debug, Clone, Default)]
pub struct Slide {
    /// Name of the source this slide was rendered from.
    pub source: String,

    /// Solid background colour as `RRGGBB`, if any.
    pub background: Option<String>,

    /// Positioned elements in z-order (first is at the back).
    pub elements: Vec<SlideElement>,
}

impl Slide {
    /// Create an empty slide for the named source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            background: None,
            elements: Vec::new(),
        }
    }

    /// Concatenated text of every paragraph, one line per paragraph.
    pub fn text_lines(&self) -> Vec<String> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                SlideElement::Text(text_box) => Some(text_box),
                SlideElement::Picture(_) => None,
            })
            .flat_map(|tb| tb.paragraphs.iter().map(Paragraph::text))
            .collect()
    }
}

/// Position and size of an element, in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Frame {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bottom edge in EMUs.
    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }
}

/// Something placed on a slide.
#[derive(Debug, Clone)]
pub enum SlideElement {
    Text(TextBox),
    Picture(Picture),
}

impl SlideElement {
    pub fn frame(&self) -> Frame {
        match self {
            Self::Text(t) => t.frame,
            Self::Picture(p) => p.frame,
        }
    }
}

/// A text box holding one or more paragraphs.
#[derive(Debug, Clone, Default)]
pub struct TextBox {
    pub frame: Frame,
    pub paragraphs: Vec<Paragraph>,
    /// Fill colour as `RRGGBB`, if any.
    pub fill: Option<String>,
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// List marker of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bullet {
    Disc,
    /// Arabic numbering starting at the given value.
    Numbered(u32),
}

/// A paragraph of styled runs.
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub runs: Vec<TextRun>,
    pub align: TextAlign,
    pub bullet: Option<Bullet>,
}

impl Paragraph {
    /// Plain text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Largest font size among the runs, in points.
    pub fn max_font_size(&self) -> f64 {
        self.runs
            .iter()
            .map(|r| r.size_pt)
            .fold(0.0_f64, f64::max)
    }
}

/// A run of text with uniform formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub size_pt: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Colour as `RRGGBB`, if any.
    pub color: Option<String>,
    pub font: Option<String>,
    /// Forced line break after this run.
    pub line_break: bool,
}

impl TextRun {
    /// Create an unformatted run.
    pub fn new(text: impl Into<String>, size_pt: f64) -> Self {
        Self {
            text: text.into(),
            size_pt,
            bold: false,
            italic: false,
            underline: false,
            color: None,
            font: None,
            line_break: false,
        }
    }
}

/// Image formats that can be embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF8") {
            Some(Self::Gif)
        } else {
            None
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
        }
    }
}

/// An embedded image.
#[derive(Debug, Clone)]
pub struct Picture {
    pub frame: Frame,
    pub data: Vec<u8>,
    pub format: ImageFormat,
    /// Alternative text.
    pub description: String,
}
