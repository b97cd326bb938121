//! PPTX reader used to verify written presentations.

use deck_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// What a presentation package contains, as read back from disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PptxSummary {
    pub title: String,
    pub author: String,
    pub subject: String,
    /// Slide size in EMUs.
    pub slide_size: (i64, i64),
    /// Slides in presentation order.
    pub slides: Vec<SlideSummary>,
}

/// Content of one slide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideSummary {
    /// 1-based slide number.
    pub number: usize,
    /// Zip path of the slide part.
    pub path: String,
    /// Paragraph text, top-to-bottom then left-to-right.
    pub lines: Vec<String>,
    pub picture_count: usize,
}

/// Reader for PPTX (Office Open XML) files.
pub struct PptxReader;

impl PptxReader {
    /// Create a new PPTX reader.
    pub fn new() -> Self {
        Self
    }

    /// Read a PPTX package.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<PptxSummary> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut summary = PptxSummary::default();
        self.read_core_props(&mut archive, &mut summary)?;

        let (slide_ids, slide_size) = self.read_presentation(&mut archive)?;
        summary.slide_size = slide_size;
        let targets = self.read_presentation_rels(&mut archive)?;

        for (idx, rel_id) in slide_ids.iter().enumerate() {
            let target = targets.get(rel_id).ok_or_else(|| {
                Error::XmlError(format!("Slide relationship '{}' not found", rel_id))
            })?;
            let path = if let Some(stripped) = target.strip_prefix('/') {
                stripped.to_string()
            } else {
                format!("ppt/{}", target)
            };
            summary.slides.push(self.read_slide(&mut archive, &path, idx + 1)?);
        }

        Ok(summary)
    }

    /// Slide relationship ids in `sldIdLst` order, and the slide size.
    fn read_presentation<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Result<(Vec<String>, (i64, i64))> {
        let content = read_file_from_archive(archive, "ppt/presentation.xml")?;
        let mut reader = Reader::from_str(&content);
        reader.trim_text(true);

        let mut ids = Vec::new();
        let mut size = (0, 0);
        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    match local_name(e.name().as_ref()) {
                        b"sldId" => {
                            if let Some(id) = attr_value(e, b"r:id") {
                                ids.push(id);
                            }
                        }
                        b"sldSz" => {
                            let parse = |key: &[u8]| {
                                attr_value(e, key).and_then(|v| v.parse::<i64>().ok())
                            };
                            size = (parse(b"cx").unwrap_or(0), parse(b"cy").unwrap_or(0));
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing presentation.xml: {}",
                        e
                    )));
                }
                _ => {}
            }
        }
        Ok((ids, size))
    }

    /// Map of relationship id to target for the presentation part.
    fn read_presentation_rels<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Result<HashMap<String, String>> {
        let content = read_file_from_archive(archive, "ppt/_rels/presentation.xml.rels")?;
        let mut reader = Reader::from_str(&content);
        reader.trim_text(true);

        let mut targets = HashMap::new();
        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    if let (Some(id), Some(target)) = (attr_value(e, b"Id"), attr_value(e, b"Target")) {
                        targets.insert(id, target);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }
        Ok(targets)
    }

    /// Title, creator and subject from the core properties, when present.
    fn read_core_props<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        summary: &mut PptxSummary,
    ) -> Result<()> {
        let Ok(content) = read_file_from_archive(archive, "docProps/core.xml") else {
            log::debug!("No core properties in package");
            return Ok(());
        };
        let mut reader = Reader::from_str(&content);
        reader.trim_text(true);

        let mut current: Option<Vec<u8>> = None;
        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => current = Some(local_name(e.name().as_ref()).to_vec()),
                Ok(Event::Text(ref e)) => {
                    let text = e.unescape().unwrap_or_default().to_string();
                    match current.as_deref() {
                        Some(b"title") => summary.title = text,
                        Some(b"creator") => summary.author = text,
                        Some(b"subject") => summary.subject = text,
                        _ => {}
                    }
                }
                Ok(Event::End(_)) => current = None,
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing core.xml: {}", e)));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Parse a single slide from the archive.
    fn read_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<SlideSummary> {
        let content = read_file_from_archive(archive, slide_path)?;
        let (mut shapes, picture_count) = self.extract_shapes_from_xml(&content)?;

        // Sort by position (top-to-bottom, left-to-right)
        shapes.sort_by(|a, b| {
            a.y.partial_cmp(&b.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        Ok(SlideSummary {
            number: slide_number,
            path: slide_path.to_string(),
            lines: shapes.into_iter().flat_map(|s| s.paragraphs).collect(),
            picture_count,
        })
    }

    /// Extract text shapes with their position, and count pictures.
    fn extract_shapes_from_xml(&self, xml_content: &str) -> Result<(Vec<ShapeInfo>, usize)> {
        let mut shapes = Vec::new();
        let mut pictures = 0;
        let mut reader = Reader::from_str(xml_content);
        reader.trim_text(false);

        let mut current_shape: Option<ShapeInfo> = None;
        let mut in_text = false;
        let mut current_paragraph: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                    b"sp" => current_shape = Some(ShapeInfo::default()),
                    b"pic" => pictures += 1,
                    b"off" => read_offset(e, current_shape.as_mut()),
                    b"p" if current_shape.is_some() => current_paragraph = Some(String::new()),
                    b"t" => in_text = true,
                    b"br" => push_line_break(current_paragraph.as_mut()),
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                    b"off" => read_offset(e, current_shape.as_mut()),
                    b"br" => push_line_break(current_paragraph.as_mut()),
                    _ => {}
                },
                Ok(Event::Text(ref e)) if in_text => {
                    if let Some(paragraph) = current_paragraph.as_mut() {
                        let text = e
                            .unescape()
                            .map_err(|err| Error::XmlError(format!("Bad text in slide: {}", err)))?;
                        paragraph.push_str(&text);
                    }
                }
                Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                    b"t" => in_text = false,
                    b"p" => {
                        if let (Some(shape), Some(paragraph)) =
                            (current_shape.as_mut(), current_paragraph.take())
                        {
                            if !paragraph.trim().is_empty() {
                                shape.paragraphs.push(paragraph);
                            }
                        }
                    }
                    b"sp" => {
                        if let Some(shape) = current_shape.take() {
                            if !shape.paragraphs.is_empty() {
                                shapes.push(shape);
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing slide: {}", e)));
                }
                _ => {}
            }
        }

        Ok((shapes, pictures))
    }
}

impl Default for PptxReader {
    fn default() -> Self {
        Self::new()
    }
}

/// A text shape extracted from slide XML.
#[derive(Debug, Default)]
struct ShapeInfo {
    paragraphs: Vec<String>,
    x: f64,
    y: f64,
}

fn read_offset(e: &BytesStart<'_>, shape: Option<&mut ShapeInfo>) {
    let Some(shape) = shape else {
        return;
    };
    if let Some(x) = attr_value(e, b"x").and_then(|v| v.parse::<f64>().ok()) {
        shape.x = x;
    }
    if let Some(y) = attr_value(e, b"y").and_then(|v| v.parse::<f64>().ok()) {
        shape.y = y;
    }
}

fn push_line_break(paragraph: Option<&mut String>) {
    if let Some(paragraph) = paragraph {
        paragraph.push('\n');
    }
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// Read a file from the ZIP archive.
fn read_file_from_archive<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PptxWriter;
    use deck_core::{
        Deck, Frame, ImageFormat, Layout, Paragraph, Picture, PresentationMetadata, Slide,
        SlideElement, TextBox, TextRun,
    };
    use std::io::Cursor;

    fn text_slide(name: &str, lines: &[(&str, i64)]) -> Slide {
        let mut slide = Slide::new(name);
        for (text, y) in lines {
            slide.elements.push(SlideElement::Text(TextBox {
                frame: Frame::new(457_200, *y, 8_229_600, 457_200),
                paragraphs: vec![Paragraph {
                    runs: vec![TextRun::new(*text, 18.0)],
                    ..Default::default()
                }],
                fill: None,
            }));
        }
        slide
    }

    fn round_trip(deck: &Deck) -> PptxSummary {
        let cursor = PptxWriter::new()
            .write_to(deck, Cursor::new(Vec::new()))
            .unwrap();
        PptxReader::new()
            .read(Cursor::new(cursor.into_inner()))
            .unwrap()
    }

    #[test]
    fn test_reads_slides_in_presentation_order() {
        let mut deck = Deck::new(PresentationMetadata {
            layout: Layout::LayoutWide,
            author: "Talal".to_string(),
            title: "Revit & MCP".to_string(),
            subject: "BIM".to_string(),
        });
        for i in 1..=12 {
            let label = format!("Slide {}", i);
            deck.push_slide(text_slide(&format!("s{}.html", i), &[(label.as_str(), 0)]));
        }

        let summary = round_trip(&deck);

        assert_eq!(summary.title, "Revit & MCP");
        assert_eq!(summary.author, "Talal");
        assert_eq!(summary.subject, "BIM");
        assert_eq!(summary.slide_size, (12_192_000, 6_858_000));
        assert_eq!(summary.slides.len(), 12);
        // Numeric, not lexical, order: slide10 follows slide9.
        assert_eq!(summary.slides[9].lines, vec!["Slide 10"]);
        assert_eq!(summary.slides[11].number, 12);
        assert_eq!(summary.slides[11].path, "ppt/slides/slide12.xml");
    }

    #[test]
    fn test_lines_sorted_by_position() {
        let mut deck = Deck::new(PresentationMetadata::default());
        deck.push_slide(text_slide("a.html", &[("Bottom", 3_000_000), ("Top", 100_000)]));

        let summary = round_trip(&deck);
        assert_eq!(summary.slides[0].lines, vec!["Top", "Bottom"]);
    }

    #[test]
    fn test_counts_pictures_and_breaks() {
        let mut slide = Slide::new("p.html");
        let mut first = TextRun::new("one", 12.0);
        first.line_break = true;
        slide.elements.push(SlideElement::Text(TextBox {
            paragraphs: vec![Paragraph {
                runs: vec![first, TextRun::new("two", 12.0)],
                ..Default::default()
            }],
            ..Default::default()
        }));
        slide.elements.push(SlideElement::Picture(Picture {
            frame: Frame::new(0, 0, 100, 100),
            data: vec![0x89, b'P', b'N', b'G'],
            format: ImageFormat::Png,
            description: String::new(),
        }));
        let mut deck = Deck::new(PresentationMetadata::default());
        deck.push_slide(slide);

        let summary = round_trip(&deck);
        assert_eq!(summary.slides[0].lines, vec!["one\ntwo"]);
        assert_eq!(summary.slides[0].picture_count, 1);
    }

    #[test]
    fn test_empty_deck_reads_back() {
        let summary = round_trip(&Deck::new(PresentationMetadata::default()));
        assert!(summary.slides.is_empty());
        assert_eq!(summary.slide_size, (9_144_000, 5_143_500));
    }

    #[test]
    fn test_not_a_zip() {
        let result = PptxReader::new().read(Cursor::new(b"not a zip".to_vec()));
        assert!(matches!(result, Err(Error::ZipError(_))));
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }
}
