//! Slide part generation.

use deck_core::{Bullet, Paragraph, Picture, Slide, SlideElement, TextAlign, TextBox, TextRun};
use std::fmt::Write as FmtWrite;

use crate::package::{escape_text, NS_A, NS_P, NS_R};

/// Relationship id of the slide layout in every slide's rels part.
pub(crate) const LAYOUT_REL_ID: &str = "rId1";

/// Hanging indent for bulleted paragraphs (EMU).
const BULLET_INDENT: i64 = 342_900;

/// Slide XML plus the media it references, in relationship order.
pub(crate) struct SlidePart<'a> {
    pub xml: String,
    /// Pictures in the order of their relationship ids (`rId2`, `rId3`, ...).
    pub pictures: Vec<&'a Picture>,
}

/// Build the XML for one slide.
pub(crate) fn slide_xml(slide: &Slide) -> SlidePart<'_> {
    let mut xml = String::with_capacity(4096);
    let mut pictures = Vec::new();

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    let _ = write!(
        xml,
        r#"<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:cSld>"#,
        NS_A, NS_R, NS_P
    );

    if let Some(color) = &slide.background {
        let _ = write!(
            xml,
            r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
            color
        );
    }

    xml.push_str("<p:spTree>");
    xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
    xml.push_str(r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#);

    for (index, element) in slide.elements.iter().enumerate() {
        // Id 1 belongs to the group shape.
        let shape_id = index + 2;
        match element {
            SlideElement::Text(text_box) => write_text_box(&mut xml, shape_id, text_box),
            SlideElement::Picture(picture) => {
                pictures.push(picture);
                let rel_id = format!("rId{}", pictures.len() + 1);
                write_picture(&mut xml, shape_id, picture, &rel_id);
            }
        }
    }

    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sld>");

    SlidePart { xml, pictures }
}

fn write_xfrm(xml: &mut String, frame: &deck_core::Frame) {
    let _ = write!(
        xml,
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        frame.x, frame.y, frame.width, frame.height
    );
}

fn write_text_box(xml: &mut String, shape_id: usize, text_box: &TextBox) {
    let _ = write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{0}" name="TextBox {0}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>"#,
        shape_id
    );
    write_xfrm(xml, &text_box.frame);
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
    match &text_box.fill {
        Some(color) => {
            let _ = write!(xml, r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#, color);
        }
        None => xml.push_str("<a:noFill/>"),
    }
    xml.push_str("</p:spPr>");

    xml.push_str(r#"<p:txBody><a:bodyPr wrap="square" lIns="91440" tIns="45720" rIns="91440" bIns="45720" rtlCol="0"><a:noAutofit/></a:bodyPr><a:lstStyle/>"#);

    let mut sequence_start = None;
    for paragraph in &text_box.paragraphs {
        // Consecutive numbered paragraphs share one auto-number sequence.
        sequence_start = match (paragraph.bullet, sequence_start) {
            (Some(Bullet::Numbered(_)), Some(start)) => Some(start),
            (Some(Bullet::Numbered(n)), None) => Some(n),
            _ => None,
        };
        write_paragraph(xml, paragraph, sequence_start);
    }

    xml.push_str("</p:txBody></p:sp>");
}

fn write_paragraph(xml: &mut String, paragraph: &Paragraph, sequence_start: Option<u32>) {
    xml.push_str("<a:p><a:pPr");
    if paragraph.bullet.is_some() {
        let _ = write!(xml, r#" marL="{}" indent="-{}""#, BULLET_INDENT, BULLET_INDENT);
    }
    let align = match paragraph.align {
        TextAlign::Left => "l",
        TextAlign::Center => "ctr",
        TextAlign::Right => "r",
        TextAlign::Justify => "just",
    };
    let _ = write!(xml, r#" algn="{}">"#, align);

    match (paragraph.bullet, sequence_start) {
        (Some(Bullet::Disc), _) => {
            xml.push_str(r#"<a:buFont typeface="Arial"/><a:buChar char="&#8226;"/>"#);
        }
        (Some(Bullet::Numbered(_)), Some(start)) if start != 1 => {
            let _ = write!(xml, r#"<a:buAutoNum type="arabicPeriod" startAt="{}"/>"#, start);
        }
        (Some(Bullet::Numbered(_)), _) => xml.push_str(r#"<a:buAutoNum type="arabicPeriod"/>"#),
        (None, _) => xml.push_str("<a:buNone/>"),
    }
    xml.push_str("</a:pPr>");

    for run in &paragraph.runs {
        if !run.text.is_empty() {
            xml.push_str("<a:r>");
            write_run_properties(xml, run, "a:rPr");
            let _ = write!(xml, "<a:t>{}</a:t></a:r>", escape_text(&run.text));
        }
        if run.line_break {
            xml.push_str("<a:br>");
            write_run_properties(xml, run, "a:rPr");
            xml.push_str("</a:br>");
        }
    }

    let size = paragraph.max_font_size();
    if size > 0.0 {
        let _ = write!(
            xml,
            r#"<a:endParaRPr lang="en-US" sz="{}" dirty="0"/>"#,
            hundredths(size)
        );
    }
    xml.push_str("</a:p>");
}

fn write_run_properties(xml: &mut String, run: &TextRun, tag: &str) {
    let _ = write!(xml, r#"<{} lang="en-US" sz="{}""#, tag, hundredths(run.size_pt));
    if run.bold {
        xml.push_str(r#" b="1""#);
    }
    if run.italic {
        xml.push_str(r#" i="1""#);
    }
    if run.underline {
        xml.push_str(r#" u="sng""#);
    }
    xml.push_str(r#" dirty="0""#);

    if run.color.is_none() && run.font.is_none() {
        xml.push_str("/>");
        return;
    }
    xml.push('>');
    if let Some(color) = &run.color {
        let _ = write!(xml, r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#, color);
    }
    if let Some(font) = &run.font {
        let font = escape_text(font);
        let _ = write!(xml, r#"<a:latin typeface="{0}"/><a:cs typeface="{0}"/>"#, font);
    }
    let _ = write!(xml, "</{}>", tag);
}

fn write_picture(xml: &mut String, shape_id: usize, picture: &Picture, rel_id: &str) {
    let _ = write!(
        xml,
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{0}" name="Picture {0}" descr="{1}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
        shape_id,
        escape_text(&picture.description)
    );
    let _ = write!(
        xml,
        r#"<p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>"#,
        rel_id
    );
    write_xfrm(xml, &picture.frame);
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
}

/// Font size in the hundredths of a point OOXML expects.
fn hundredths(size_pt: f64) -> i64 {
    (size_pt * 100.0).round() as i64
}
