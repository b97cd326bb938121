//! Renders one HTML fragment into one slide.
//!
//! Content is laid out as a single column of blocks inside fixed margins:
//! headings, paragraphs and lists become text boxes, images become pictures.
//! Text height is estimated from font size, so layout is deterministic.

use crate::dom::{self, Element, Node};
use crate::style::{ComputedStyle, Stylesheet};
use deck_core::types::EMU_PER_INCH;
use deck_core::{
    Bullet, Deck, Error, Frame, ImageFormat, Layout, Paragraph, Picture, Result, Slide,
    SlideElement, SlideRenderer, TextAlign, TextBox, TextRun,
};
use image::ImageReader;
use std::io::Cursor;
use std::path::Path;

/// Body size may differ from the layout by this much (inches).
const DIMENSION_TOLERANCE_IN: f64 = 0.1;

/// Gap between consecutive blocks (inches).
const BLOCK_SPACING_IN: f64 = 0.1;

/// Line height as a multiple of font size.
const LINE_HEIGHT: f64 = 1.2;

/// Average glyph width as a fraction of font size.
const GLYPH_WIDTH: f64 = 0.5;

/// Default text box insets: left/right and top/bottom (inches).
const INSET_X_IN: f64 = 0.1;
const INSET_Y_IN: f64 = 0.05;

/// Extra indent for list paragraphs (inches).
const LIST_INDENT_IN: f64 = 0.375;

/// Picture size when neither markup nor the file gives one (inches).
const DEFAULT_IMAGE_SIZE_IN: (f64, f64) = (4.0, 3.0);

/// Elements whose content is never shown.
const SKIPPED_ELEMENTS: &[&str] = &[
    "head", "script", "style", "title", "meta", "link", "noscript", "template", "svg", "canvas",
    "iframe", "object", "video", "audio",
];

/// Elements whose content is a single paragraph.
const TEXT_BLOCKS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "blockquote", "pre", "figcaption", "caption", "dt",
    "dd", "address", "summary", "label", "button",
];

/// Elements that flow inline inside a paragraph.
const INLINE_ELEMENTS: &[&str] = &[
    "span", "b", "strong", "i", "em", "u", "ins", "a", "code", "small", "sub", "sup", "mark",
    "kbd", "samp", "var", "cite", "abbr", "q", "s", "del", "time", "font", "br", "wbr",
];

/// Converter from HTML fragments to slides.
#[derive(Debug, Clone)]
pub struct HtmlConverter {
    margin_in: f64,
}

impl Default for HtmlConverter {
    fn default() -> Self {
        Self { margin_in: 0.5 }
    }
}

impl SlideRenderer for HtmlConverter {
    fn render(&self, source: &Path, mut deck: Deck) -> Result<Deck> {
        if !source.is_file() {
            return Err(Error::SourceNotFound(source.to_path_buf()));
        }
        let name = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        let html = std::fs::read_to_string(source).map_err(|e| {
            Error::conversion(name, format!("cannot read {}: {}", source.display(), e))
        })?;
        let base_dir = source.parent().unwrap_or_else(|| Path::new(""));

        let slide = self.convert(&html, name, base_dir, deck.layout())?;
        deck.push_slide(slide);
        Ok(deck)
    }
}

/// A laid-out unit of content, not yet positioned vertically.
enum Block {
    Text {
        paragraphs: Vec<Paragraph>,
        fill: Option<String>,
        indent_in: f64,
    },
    Image {
        data: Vec<u8>,
        format: ImageFormat,
        size_in: (f64, f64),
        align: TextAlign,
        description: String,
    },
}

/// State shared while walking one document.
struct Walker<'a> {
    name: &'a str,
    base_dir: &'a Path,
    sheet: Stylesheet,
    blocks: Vec<Block>,
}

impl HtmlConverter {
    /// Create a converter with the default 0.5 in margins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slide margin in inches.
    pub fn with_margin(mut self, margin_in: f64) -> Self {
        self.margin_in = margin_in.max(0.0);
        self
    }

    /// Convert HTML text into a slide for the given layout. Relative image
    /// paths resolve against `base_dir`.
    pub fn convert(&self, html: &str, name: &str, base_dir: &Path, layout: Layout) -> Result<Slide> {
        let doc = dom::parse(html).map_err(|e| Error::conversion(name, e.to_string()))?;

        let mut styles = Vec::new();
        doc.find_all("style", &mut styles);
        let mut sheet = Stylesheet::default();
        for style in styles {
            sheet.extend(Stylesheet::parse(&style.text_content()));
        }
        log::debug!("{}: {} style rules", name, sheet.rule_count());

        let root_style = ComputedStyle::default();
        let html_style = doc
            .find("html")
            .map(|el| ComputedStyle::for_element(&root_style, el, &sheet))
            .unwrap_or_default();
        let body = doc.find("body").unwrap_or(&doc);
        let body_style = ComputedStyle::for_element(&html_style, body, &sheet);

        check_dimensions(name, &body_style, layout)?;

        let mut slide = Slide::new(name);
        slide.background = body_style.background.clone().or(html_style.background);

        let mut walker = Walker {
            name,
            base_dir,
            sheet,
            blocks: Vec::new(),
        };
        walker.walk_container(body, &body_style)?;

        slide.elements = self.layout_blocks(name, walker.blocks, layout)?;
        log::debug!("{}: {} elements", name, slide.elements.len());
        Ok(slide)
    }

    /// Stack blocks top to bottom inside the margins.
    fn layout_blocks(&self, name: &str, blocks: Vec<Block>, layout: Layout) -> Result<Vec<SlideElement>> {
        let margin = self.margin_in;
        let content_width = layout.width_in() - 2.0 * margin;
        let bottom_limit = layout.height_in() - margin;
        let mut y = margin;
        let mut elements = Vec::with_capacity(blocks.len());

        for block in blocks {
            let element = match block {
                Block::Text {
                    paragraphs,
                    fill,
                    indent_in,
                } => {
                    let width = content_width;
                    let height = text_height_in(&paragraphs, width - indent_in);
                    SlideElement::Text(TextBox {
                        frame: frame_in(margin, y, width, height),
                        paragraphs,
                        fill,
                    })
                }
                Block::Image {
                    data,
                    format,
                    size_in: (w, h),
                    align,
                    description,
                } => {
                    let scale = if w > content_width { content_width / w } else { 1.0 };
                    let (w, h) = (w * scale, h * scale);
                    let x = match align {
                        TextAlign::Center => margin + (content_width - w) / 2.0,
                        TextAlign::Right => margin + content_width - w,
                        TextAlign::Left | TextAlign::Justify => margin,
                    };
                    SlideElement::Picture(Picture {
                        frame: frame_in(x, y, w, h),
                        data,
                        format,
                        description,
                    })
                }
            };

            let bottom = element.frame().bottom() as f64 / EMU_PER_INCH as f64;
            if bottom > bottom_limit + 0.01 {
                return Err(Error::conversion(
                    name,
                    format!(
                        "content overflows the slide by {:.2} in (bottom edge at {:.2} in, limit {:.2} in)",
                        bottom - bottom_limit,
                        bottom,
                        bottom_limit
                    ),
                ));
            }
            y = bottom + BLOCK_SPACING_IN;
            elements.push(element);
        }

        Ok(elements)
    }
}

impl<'a> Walker<'a> {
    /// Walk a container element, turning children into blocks. Loose inline
    /// content between blocks becomes its own paragraph.
    fn walk_container(&mut self, element: &Element, style: &ComputedStyle) -> Result<()> {
        let mut pending: Vec<TextRun> = Vec::new();

        for child in &element.children {
            match child {
                Node::Text(_) => self.collect_runs(child, style, &mut pending),
                Node::Element(el) if INLINE_ELEMENTS.contains(&el.tag.as_str()) => {
                    self.collect_runs(child, style, &mut pending)
                }
                Node::Element(el) => {
                    self.flush_loose(&mut pending, style);
                    self.walk_block(el, style)?;
                }
            }
        }
        self.flush_loose(&mut pending, style);
        Ok(())
    }

    fn walk_block(&mut self, el: &Element, parent: &ComputedStyle) -> Result<()> {
        if SKIPPED_ELEMENTS.contains(&el.tag.as_str()) {
            return Ok(());
        }
        let style = ComputedStyle::for_element(parent, el, &self.sheet);
        if style.hidden {
            return Ok(());
        }

        match el.tag.as_str() {
            tag if TEXT_BLOCKS.contains(&tag) => {
                let mut runs = Vec::new();
                let preformatted = tag == "pre";
                for child in &el.children {
                    self.collect_runs_with(child, &style, &mut runs, preformatted);
                }
                if let Some(paragraph) = make_paragraph(runs, style.align, None) {
                    self.blocks.push(Block::Text {
                        paragraphs: vec![paragraph],
                        fill: style.background.clone(),
                        indent_in: 0.0,
                    });
                }
            }
            "ul" | "ol" => self.walk_list(el, &style),
            "img" => self.walk_image(el, &style, parent.align)?,
            "hr" => {}
            _ => self.walk_container(el, &style)?,
        }
        Ok(())
    }

    fn walk_list(&mut self, list: &Element, style: &ComputedStyle) {
        let numbered = list.tag == "ol";
        let mut number = list
            .attr("start")
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(1);
        let mut paragraphs = Vec::new();

        for item in list.child_elements().filter(|e| e.tag == "li") {
            let item_style = ComputedStyle::for_element(style, item, &self.sheet);
            if item_style.hidden {
                continue;
            }
            let mut runs = Vec::new();
            for child in &item.children {
                self.collect_runs(child, &item_style, &mut runs);
            }
            let bullet = if numbered {
                Bullet::Numbered(number)
            } else {
                Bullet::Disc
            };
            if let Some(paragraph) = make_paragraph(runs, item_style.align, Some(bullet)) {
                paragraphs.push(paragraph);
                number += 1;
            }
        }

        if !paragraphs.is_empty() {
            self.blocks.push(Block::Text {
                paragraphs,
                fill: style.background.clone(),
                indent_in: LIST_INDENT_IN,
            });
        }
    }

    fn walk_image(&mut self, img: &Element, style: &ComputedStyle, align: TextAlign) -> Result<()> {
        let src = img
            .attr("src")
            .ok_or_else(|| Error::conversion(self.name, "<img> without src"))?;
        if src.starts_with("http://") || src.starts_with("https://") || src.starts_with("data:") {
            return Err(Error::conversion(
                self.name,
                format!("only local image files are supported: {}", src),
            ));
        }

        let path = self.base_dir.join(src);
        let data = std::fs::read(&path).map_err(|e| {
            Error::conversion(self.name, format!("cannot read image {}: {}", path.display(), e))
        })?;
        let format = ImageFormat::from_magic(&data)
            .or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .and_then(ImageFormat::from_extension)
            })
            .ok_or_else(|| {
                Error::conversion(self.name, format!("unsupported image type: {}", src))
            })?;

        let attr_pt = |name: &str| {
            img.attr(name)
                .and_then(|v| crate::style::parse_length(v, style.font_size_pt))
        };
        let width_pt = style.width_pt.or_else(|| attr_pt("width"));
        let height_pt = style.height_pt.or_else(|| attr_pt("height"));
        let intrinsic = image_size_px(&data).map(|(w, h)| (w as f64 * 0.75, h as f64 * 0.75));

        let size_pt = match (width_pt, height_pt, intrinsic) {
            (Some(w), Some(h), _) => (w, h),
            (Some(w), None, Some((iw, ih))) if iw > 0.0 => (w, w * ih / iw),
            (None, Some(h), Some((iw, ih))) if ih > 0.0 => (h * iw / ih, h),
            (None, None, Some(size)) => size,
            _ => (DEFAULT_IMAGE_SIZE_IN.0 * 72.0, DEFAULT_IMAGE_SIZE_IN.1 * 72.0),
        };

        self.blocks.push(Block::Image {
            data,
            format,
            size_in: (size_pt.0 / 72.0, size_pt.1 / 72.0),
            align,
            description: img.attr("alt").unwrap_or_default().to_string(),
        });
        Ok(())
    }

    fn flush_loose(&mut self, pending: &mut Vec<TextRun>, style: &ComputedStyle) {
        let runs = std::mem::take(pending);
        if let Some(paragraph) = make_paragraph(runs, style.align, None) {
            self.blocks.push(Block::Text {
                paragraphs: vec![paragraph],
                fill: None,
                indent_in: 0.0,
            });
        }
    }

    fn collect_runs(&self, node: &Node, style: &ComputedStyle, runs: &mut Vec<TextRun>) {
        self.collect_runs_with(node, style, runs, false);
    }

    /// Flatten inline content into styled runs.
    fn collect_runs_with(
        &self,
        node: &Node,
        style: &ComputedStyle,
        runs: &mut Vec<TextRun>,
        preformatted: bool,
    ) {
        match node {
            Node::Text(text) => {
                if preformatted {
                    for (i, line) in text.split('\n').enumerate() {
                        if i > 0 {
                            push_break(runs, style);
                        }
                        if !line.is_empty() {
                            runs.push(styled_run(line.to_string(), style));
                        }
                    }
                } else {
                    let collapsed = collapse_whitespace(text);
                    if !collapsed.is_empty() {
                        runs.push(styled_run(collapsed, style));
                    }
                }
            }
            Node::Element(el) => {
                if el.tag == "br" {
                    push_break(runs, style);
                    return;
                }
                if el.tag == "img" {
                    log::warn!("{}: inline <img> inside text is ignored", self.name);
                    return;
                }
                if SKIPPED_ELEMENTS.contains(&el.tag.as_str()) {
                    return;
                }
                let child_style = ComputedStyle::for_element(style, el, &self.sheet);
                if child_style.hidden {
                    return;
                }
                for child in &el.children {
                    self.collect_runs_with(child, &child_style, runs, preformatted || el.tag == "pre");
                }
            }
        }
    }
}

fn styled_run(text: String, style: &ComputedStyle) -> TextRun {
    TextRun {
        text,
        size_pt: style.font_size_pt,
        bold: style.bold,
        italic: style.italic,
        underline: style.underline,
        color: style.color.clone(),
        font: style.font_family.clone(),
        line_break: false,
    }
}

fn push_break(runs: &mut Vec<TextRun>, style: &ComputedStyle) {
    match runs.last_mut() {
        Some(last) if !last.line_break => last.line_break = true,
        _ => {
            let mut run = styled_run(String::new(), style);
            run.line_break = true;
            runs.push(run);
        }
    }
}

/// Collapse runs of HTML whitespace to one space. Non-breaking spaces are kept.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() && c != '\u{00A0}' {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Trim whitespace at paragraph and line edges, merge doubled spaces between
/// runs, and drop empty runs. Returns `None` when no visible text remains.
fn make_paragraph(mut runs: Vec<TextRun>, align: TextAlign, bullet: Option<Bullet>) -> Option<Paragraph> {
    let mut at_line_start = true;
    for run in runs.iter_mut() {
        if at_line_start {
            run.text = run.text.trim_start().to_string();
        }
        if !run.text.is_empty() {
            at_line_start = false;
        }
        if run.line_break {
            run.text = run.text.trim_end().to_string();
            at_line_start = true;
        }
    }
    for i in 1..runs.len() {
        if runs[i - 1].text.ends_with(' ') && runs[i].text.starts_with(' ') {
            runs[i].text = runs[i].text.trim_start().to_string();
        }
    }
    if let Some(last) = runs.last_mut() {
        last.text = last.text.trim_end().to_string();
        last.line_break = false;
    }
    runs.retain(|r| !r.text.is_empty() || r.line_break);

    if runs.iter().all(|r| r.text.trim().is_empty()) {
        return None;
    }
    Some(Paragraph {
        runs,
        align,
        bullet,
    })
}

/// Estimated height of a text box holding `paragraphs`, in inches.
fn text_height_in(paragraphs: &[Paragraph], width_in: f64) -> f64 {
    let usable_pt = ((width_in - 2.0 * INSET_X_IN) * 72.0).max(1.0);
    let mut height_pt = 0.0;

    for paragraph in paragraphs {
        let size = paragraph.max_font_size().max(1.0);
        let chars_per_line = (usable_pt / (size * GLYPH_WIDTH)).floor().max(1.0);

        let mut lines = 0.0;
        let mut line_len = 0usize;
        for run in &paragraph.runs {
            line_len += run.text.chars().count();
            if run.line_break {
                lines += (line_len as f64 / chars_per_line).ceil().max(1.0);
                line_len = 0;
            }
        }
        lines += (line_len as f64 / chars_per_line).ceil().max(1.0);
        height_pt += lines * size * LINE_HEIGHT;
    }

    height_pt / 72.0 + 2.0 * INSET_Y_IN
}

fn frame_in(x: f64, y: f64, width: f64, height: f64) -> Frame {
    let emu = |inches: f64| (inches * EMU_PER_INCH as f64).round() as i64;
    Frame::new(emu(x), emu(y), emu(width), emu(height))
}

/// Reject bodies whose declared size does not match the layout.
fn check_dimensions(name: &str, body: &ComputedStyle, layout: Layout) -> Result<()> {
    let expected = (layout.width_in(), layout.height_in());
    let width = body.width_pt.map(|w| w / 72.0);
    let height = body.height_pt.map(|h| h / 72.0);

    let off = |actual: Option<f64>, expected: f64| {
        actual.is_some_and(|a| (a - expected).abs() > DIMENSION_TOLERANCE_IN)
    };
    if off(width, expected.0) || off(height, expected.1) {
        return Err(Error::conversion(
            name,
            format!(
                "HTML dimensions ({} x {}) don't match presentation layout {} ({:.3}in x {:.3}in)",
                describe_in(width),
                describe_in(height),
                layout.name(),
                expected.0,
                expected.1
            ),
        ));
    }
    Ok(())
}

fn describe_in(value: Option<f64>) -> String {
    value.map_or_else(|| "auto".to_string(), |v| format!("{:.3}in", v))
}

/// Pixel size read from the image header.
fn image_size_px(data: &[u8]) -> Option<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format().ok()?;
    match reader.into_dimensions() {
        Ok(size) => Some(size),
        Err(e) => {
            log::debug!("Cannot read image size: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::PresentationMetadata;

    fn convert(html: &str) -> Result<Slide> {
        HtmlConverter::new().convert(html, "test.html", Path::new("."), Layout::Layout16x9)
    }

    fn text_boxes(slide: &Slide) -> Vec<&TextBox> {
        slide
            .elements
            .iter()
            .filter_map(|e| match e {
                SlideElement::Text(t) => Some(t),
                SlideElement::Picture(_) => None,
            })
            .collect()
    }

    fn encode(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
        let mut data = Cursor::new(Vec::new());
        image::RgbImage::new(width, height)
            .write_to(&mut data, format)
            .unwrap();
        data.into_inner()
    }

    fn tiny_png() -> Vec<u8> {
        encode(200, 100, image::ImageFormat::Png)
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let slide = convert(
            r#"<html><head><style>h1 { color: #336699; font-size: 36pt }</style></head>
               <body style="width: 720pt; height: 405pt; background: #ffffff">
                 <h1>Design Buildings</h1>
                 <p>Using <b>natural</b> language</p>
               </body></html>"#,
        )
        .unwrap();

        assert_eq!(slide.source, "test.html");
        assert_eq!(slide.background.as_deref(), Some("FFFFFF"));
        assert_eq!(slide.text_lines(), vec!["Design Buildings", "Using natural language"]);

        let boxes = text_boxes(&slide);
        let title = &boxes[0].paragraphs[0].runs[0];
        assert_eq!(title.size_pt, 36.0);
        assert!(title.bold);
        assert_eq!(title.color.as_deref(), Some("336699"));

        let runs = &boxes[1].paragraphs[0].runs;
        assert_eq!(runs.len(), 3);
        assert!(runs[1].bold && !runs[0].bold);

        // Blocks stack downwards without overlapping.
        assert!(boxes[1].frame.y >= boxes[0].frame.bottom());
    }

    #[test]
    fn test_lists_get_bullets() {
        let slide = convert("<body><ul><li>One</li><li>Two</li></ul><ol start=3><li>Three</li></ol></body>")
            .unwrap();
        let boxes = text_boxes(&slide);
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].paragraphs.len(), 2);
        assert_eq!(boxes[0].paragraphs[1].bullet, Some(Bullet::Disc));
        assert_eq!(boxes[1].paragraphs[0].bullet, Some(Bullet::Numbered(3)));
    }

    #[test]
    fn test_loose_text_in_containers() {
        let slide = convert("<body><div class=card>Loose <em>text</em><p>Block</p>tail</div></body>")
            .unwrap();
        assert_eq!(slide.text_lines(), vec!["Loose text", "Block", "tail"]);
    }

    #[test]
    fn test_line_breaks_and_whitespace() {
        let slide = convert("<p>  first   line<br>\n  second </p>").unwrap();
        let boxes = text_boxes(&slide);
        let runs = &boxes[0].paragraphs[0].runs;
        assert_eq!(runs[0].text, "first line");
        assert!(runs[0].line_break);
        assert_eq!(runs[1].text, "second");
        assert!(!runs[1].line_break);
    }

    #[test]
    fn test_hidden_and_skipped_content() {
        let slide = convert(
            r#"<head><title>Ignored</title></head>
               <body><script>var x = 1;</script><p style="display:none">gone</p><p>shown</p></body>"#,
        )
        .unwrap();
        assert_eq!(slide.text_lines(), vec!["shown"]);
    }

    #[test]
    fn test_empty_body_gives_blank_slide() {
        let slide = convert("<html><body>   </body></html>").unwrap();
        assert!(slide.elements.is_empty());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let err = convert(r#"<body style="width: 960px; height: 720px"><p>x</p></body>"#).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("test.html"));
        assert!(message.contains("don't match presentation layout LAYOUT_16x9"));

        // 16:9 at 96 dpi: 960 x 540 px is exactly 10 x 5.625 in.
        assert!(convert(r#"<body style="width: 960px; height: 540px"></body>"#).is_ok());
    }

    #[test]
    fn test_overflow_rejected() {
        let many: String = (0..40).map(|i| format!("<p>Line {}</p>", i)).collect();
        let err = convert(&format!("<body>{}</body>", many)).unwrap_err();
        assert!(err.to_string().contains("overflows the slide"));
    }

    #[test]
    fn test_malformed_html_rejected() {
        let err = convert("<body><p>unterminated <!-- comment").unwrap_err();
        assert!(matches!(err, Error::ConversionError { .. }));
    }

    #[test]
    fn test_image_embedded_with_intrinsic_size() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("logo.png"), tiny_png()).unwrap();

        let slide = HtmlConverter::new()
            .convert(
                r#"<body style="text-align:center"><img src="logo.png" alt="Logo"></body>"#,
                "img.html",
                dir.path(),
                Layout::Layout16x9,
            )
            .unwrap();

        let SlideElement::Picture(picture) = &slide.elements[0] else {
            panic!("expected a picture");
        };
        assert_eq!(picture.format, ImageFormat::Png);
        assert_eq!(picture.description, "Logo");
        // 200 x 100 px -> 150 x 75 pt -> 2.083 x 1.042 in, centred.
        assert_eq!(picture.frame.width, (150.0 / 72.0 * 914_400.0_f64).round() as i64);
        assert_eq!(picture.frame.height, (75.0 / 72.0 * 914_400.0_f64).round() as i64);
        assert!(picture.frame.x > 914_400);
    }

    #[test]
    fn test_missing_image_fails() {
        let err = convert(r#"<body><img src="nope.png"></body>"#).unwrap_err();
        assert!(err.to_string().contains("cannot read image"));
    }

    #[test]
    fn test_render_appends_one_slide() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.html");
        std::fs::write(&path, "<body><h1>A</h1></body>").unwrap();

        let deck = Deck::new(PresentationMetadata::default());
        let deck = HtmlConverter::new().render(&path, deck).unwrap();
        assert_eq!(deck.slide_count(), 1);
        assert_eq!(deck.slides()[0].source, "a.html");

        let missing = HtmlConverter::new().render(&dir.path().join("missing.html"), deck);
        assert!(matches!(missing, Err(Error::SourceNotFound(_))));
    }

    #[test]
    fn test_image_size_from_header() {
        assert_eq!(image_size_px(&tiny_png()), Some((200, 100)));
        assert_eq!(image_size_px(&encode(40, 30, image::ImageFormat::Jpeg)), Some((40, 30)));
        assert_eq!(image_size_px(&encode(7, 5, image::ImageFormat::Gif)), Some((7, 5)));
        assert_eq!(image_size_px(&[0xFF, 0xD8, 0x00]), None);
        assert_eq!(image_size_px(b"not an image"), None);
    }

    #[test]
    fn test_unreadable_image_header_uses_default_size() {
        let dir = tempfile::tempdir().unwrap();
        // PNG signature followed by garbage.
        let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(b"garbage");
        std::fs::write(dir.path().join("broken.png"), data).unwrap();

        let slide = HtmlConverter::new()
            .convert(r#"<body><img src="broken.png"></body>"#, "img.html", dir.path(), Layout::Layout16x9)
            .unwrap();
        let SlideElement::Picture(picture) = &slide.elements[0] else {
            panic!("expected a picture");
        };
        assert_eq!(picture.frame.width, 4 * 914_400);
        assert_eq!(picture.frame.height, 3 * 914_400);
    }

    #[test]
    fn test_script_with_markup_characters_does_not_hide_content() {
        let slide = convert(
            "<body><script>if (a < b) { x(); }</script><style>p > b { color: red }</style><p>shown</p></body>",
        )
        .unwrap();
        assert_eq!(slide.text_lines(), vec!["shown"]);
    }

    #[test]
    fn test_implicitly_closed_paragraphs_and_items() {
        let slide = convert("<body><p>one<p>two</body>").unwrap();
        assert_eq!(slide.text_lines(), vec!["one", "two"]);

        let slide = convert("<body><ul><li>alpha<li>beta</ul></body>").unwrap();
        let boxes = text_boxes(&slide);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].paragraphs.len(), 2);
        assert!(boxes[0]
            .paragraphs
            .iter()
            .all(|p| p.bullet == Some(Bullet::Disc)));
        assert_eq!(slide.text_lines(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_bare_ampersand_keeps_other_entities() {
        let slide = convert("<body><p>Q&A &mdash; done</p></body>").unwrap();
        assert_eq!(slide.text_lines(), vec!["Q&A \u{2014} done"]);
    }

    #[test]
    fn test_print_media_rules_ignored() {
        let slide = convert(
            "<head><style>
               body { width: 720pt; height: 405pt }
               @media print { body { width: 8.5in; height: 11in } }
             </style></head><body><p>x</p></body>",
        )
        .unwrap();
        assert_eq!(slide.text_lines(), vec!["x"]);
    }

    #[test]
    fn test_non_utf8_source_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.html");
        std::fs::write(&path, b"<p>caf\xE9</p>").unwrap();

        let err = HtmlConverter::new()
            .render(&path, Deck::new(PresentationMetadata::default()))
            .unwrap_err();
        match err {
            Error::ConversionError { file, message } => {
                assert_eq!(file, "latin1.html");
                assert!(message.contains("latin1.html"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
