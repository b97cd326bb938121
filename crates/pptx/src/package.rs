//! Fixed package parts: content types, relationships, document properties,
//! presentation, slide master, slide layout and theme.

use deck_core::{Deck, ImageFormat, Layout};
use std::borrow::Cow;
use std::fmt::Write as FmtWrite;

pub(crate) const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE_PROPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_EXTENDED_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
pub(crate) const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
const REL_PRES_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_SLIDE_MASTER: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_SLIDE_LAYOUT: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
const CT_PRES_PROPS: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
const CT_CORE_PROPS: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const CT_EXTENDED_PROPS: &str =
    "application/vnd.openxmlformats-officedocument.extended-properties+xml";

/// Relationship ids of `presentation.xml` before the first slide.
const FIXED_PRESENTATION_RELS: usize = 3;

/// First id in the slide id list; lower values are reserved.
const FIRST_SLIDE_ID: usize = 256;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Escape text for element content and attribute values, dropping
/// characters XML 1.0 cannot carry.
pub(crate) fn escape_text(text: &str) -> Cow<'_, str> {
    let valid = |c: char| !c.is_control() || matches!(c, '\t' | '\n' | '\r');
    if text.chars().all(valid) {
        quick_xml::escape::escape(text)
    } else {
        let cleaned: String = text.chars().filter(|&c| valid(c)).collect();
        Cow::Owned(quick_xml::escape::escape(&cleaned).into_owned())
    }
}

/// Relationship id of slide `index` (0-based) in `presentation.xml.rels`.
pub(crate) fn slide_rel_id(index: usize) -> String {
    format!("rId{}", FIXED_PRESENTATION_RELS + 1 + index)
}

/// Zip path of slide `index` (0-based).
pub(crate) fn slide_path(index: usize) -> String {
    format!("ppt/slides/slide{}.xml", index + 1)
}

fn relationships(rels: &[(String, &str, String)]) -> String {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(XML_DECL);
    let _ = write!(xml, r#"<Relationships xmlns="{}">"#, NS_PKG_RELS);
    for (id, rel_type, target) in rels {
        let _ = write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            id,
            rel_type,
            escape_text(target)
        );
    }
    xml.push_str("</Relationships>");
    xml
}

pub(crate) fn content_types(slide_count: usize) -> String {
    let mut xml = String::with_capacity(2048 + slide_count * 160);
    xml.push_str(XML_DECL);
    let _ = write!(xml, r#"<Types xmlns="{}">"#, NS_CONTENT_TYPES);
    xml.push_str(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for format in [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Gif] {
        let _ = write!(
            xml,
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            format.extension(),
            format.mime_type()
        );
    }

    let overrides = [
        ("/ppt/presentation.xml", CT_PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml", CT_SLIDE_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml", CT_SLIDE_LAYOUT),
        ("/ppt/theme/theme1.xml", CT_THEME),
        ("/ppt/presProps.xml", CT_PRES_PROPS),
        ("/docProps/core.xml", CT_CORE_PROPS),
        ("/docProps/app.xml", CT_EXTENDED_PROPS),
    ];
    for (part, content_type) in overrides {
        let _ = write!(
            xml,
            r#"<Override PartName="{}" ContentType="{}"/>"#,
            part, content_type
        );
    }
    for index in 0..slide_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/{}" ContentType="{}"/>"#,
            slide_path(index),
            CT_SLIDE
        );
    }
    xml.push_str("</Types>");
    xml
}

pub(crate) fn package_rels() -> String {
    relationships(&[
        ("rId1".into(), REL_OFFICE_DOCUMENT, "ppt/presentation.xml".into()),
        ("rId2".into(), REL_CORE_PROPS, "docProps/core.xml".into()),
        ("rId3".into(), REL_EXTENDED_PROPS, "docProps/app.xml".into()),
    ])
}

/// Core properties. No timestamps are written so output is reproducible.
pub(crate) fn core_props(deck: &Deck) -> String {
    let meta = deck.metadata();
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#);
    let _ = write!(xml, "<dc:title>{}</dc:title>", escape_text(&meta.title));
    let _ = write!(xml, "<dc:subject>{}</dc:subject>", escape_text(&meta.subject));
    let _ = write!(xml, "<dc:creator>{}</dc:creator>", escape_text(&meta.author));
    let _ = write!(
        xml,
        "<cp:lastModifiedBy>{}</cp:lastModifiedBy>",
        escape_text(&meta.author)
    );
    xml.push_str("<cp:revision>1</cp:revision></cp:coreProperties>");
    xml
}

pub(crate) fn app_props(deck: &Deck) -> String {
    let format_name = match deck.layout() {
        Layout::Layout16x9 => "On-screen Show (16:9)",
        Layout::Layout16x10 => "On-screen Show (16:10)",
        Layout::Layout4x3 => "On-screen Show (4:3)",
        Layout::LayoutWide => "Widescreen",
    };
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#);
    let _ = write!(
        xml,
        "<Application>{}</Application><PresentationFormat>{}</PresentationFormat><Slides>{}</Slides>",
        env!("CARGO_PKG_NAME"),
        format_name,
        deck.slide_count()
    );
    xml.push_str("</Properties>");
    xml
}

pub(crate) fn presentation(deck: &Deck) -> String {
    let layout = deck.layout();
    let mut xml = String::with_capacity(1024 + deck.slide_count() * 48);
    xml.push_str(XML_DECL);
    let _ = write!(
        xml,
        r#"<p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" saveSubsetFonts="1">"#,
        NS_A, NS_R, NS_P
    );
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
    if deck.slide_count() > 0 {
        xml.push_str("<p:sldIdLst>");
        for index in 0..deck.slide_count() {
            let _ = write!(
                xml,
                r#"<p:sldId id="{}" r:id="{}"/>"#,
                FIRST_SLIDE_ID + index,
                slide_rel_id(index)
            );
        }
        xml.push_str("</p:sldIdLst>");
    }
    let _ = write!(
        xml,
        r#"<p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/>"#,
        layout.width_emu(),
        layout.height_emu()
    );
    xml.push_str("</p:presentation>");
    xml
}

pub(crate) fn presentation_rels(slide_count: usize) -> String {
    let mut rels = vec![
        ("rId1".to_string(), REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml".to_string()),
        ("rId2".to_string(), REL_PRES_PROPS, "presProps.xml".to_string()),
        ("rId3".to_string(), REL_THEME, "theme/theme1.xml".to_string()),
    ];
    for index in 0..slide_count {
        rels.push((
            slide_rel_id(index),
            REL_SLIDE,
            format!("slides/slide{}.xml", index + 1),
        ));
    }
    relationships(&rels)
}

/// Relationships of one slide: its layout, then its images in order.
pub(crate) fn slide_rels(media_targets: &[String]) -> String {
    let mut rels = vec![(
        crate::slide::LAYOUT_REL_ID.to_string(),
        REL_SLIDE_LAYOUT,
        "../slideLayouts/slideLayout1.xml".to_string(),
    )];
    for (index, target) in media_targets.iter().enumerate() {
        rels.push((format!("rId{}", index + 2), REL_IMAGE, format!("../media/{}", target)));
    }
    relationships(&rels)
}

pub(crate) fn pres_props() -> String {
    format!(
        r#"{}<p:presentationPr xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"/>"#,
        XML_DECL, NS_A, NS_R, NS_P
    )
}

const EMPTY_SP_TREE: &str = r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree>"#;

pub(crate) fn slide_master() -> String {
    format!(
        concat!(
            r#"{decl}<p:sldMaster xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}">"#,
            r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>{tree}</p:cSld>"#,
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            r#"</p:sldMaster>"#
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        tree = EMPTY_SP_TREE
    )
}

pub(crate) fn slide_master_rels() -> String {
    relationships(&[
        ("rId1".into(), REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml".into()),
        ("rId2".into(), REL_THEME, "../theme/theme1.xml".into()),
    ])
}

pub(crate) fn slide_layout() -> String {
    format!(
        concat!(
            r#"{decl}<p:sldLayout xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}" type="blank" preserve="1">"#,
            r#"<p:cSld name="Blank">{tree}</p:cSld>"#,
            r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        tree = EMPTY_SP_TREE
    )
}

pub(crate) fn slide_layout_rels() -> String {
    relationships(&[(
        "rId1".into(),
        REL_SLIDE_MASTER,
        "../slideMasters/slideMaster1.xml".into(),
    )])
}

pub(crate) fn theme() -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    let _ = write!(xml, r#"<a:theme xmlns:a="{}" name="Office Theme"><a:themeElements>"#, NS_A);

    xml.push_str(r#"<a:clrScheme name="Office">"#);
    xml.push_str(r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#);
    xml.push_str(r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#);
    let scheme = [
        ("dk2", "44546A"),
        ("lt2", "E7E6E6"),
        ("accent1", "4472C4"),
        ("accent2", "ED7D31"),
        ("accent3", "A5A5A5"),
        ("accent4", "FFC000"),
        ("accent5", "5B9BD5"),
        ("accent6", "70AD47"),
        ("hlink", "0563C1"),
        ("folHlink", "954F72"),
    ];
    for (name, color) in scheme {
        let _ = write!(xml, r#"<a:{0}><a:srgbClr val="{1}"/></a:{0}>"#, name, color);
    }
    xml.push_str("</a:clrScheme>");

    xml.push_str(r#"<a:fontScheme name="Office">"#);
    for kind in ["majorFont", "minorFont"] {
        let latin = if kind == "majorFont" { "Calibri Light" } else { "Calibri" };
        let _ = write!(
            xml,
            r#"<a:{0}><a:latin typeface="{1}"/><a:ea typeface=""/><a:cs typeface=""/></a:{0}>"#,
            kind, latin
        );
    }
    xml.push_str("</a:fontScheme>");

    let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    xml.push_str(r#"<a:fmtScheme name="Office"><a:fillStyleLst>"#);
    for _ in 0..3 {
        xml.push_str(solid);
    }
    xml.push_str("</a:fillStyleLst><a:lnStyleLst>");
    for width in [6350, 12700, 19050] {
        let _ = write!(xml, r#"<a:ln w="{}">{}</a:ln>"#, width, solid);
    }
    xml.push_str("</a:lnStyleLst><a:effectStyleLst>");
    for _ in 0..3 {
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    xml.push_str("</a:effectStyleLst><a:bgFillStyleLst>");
    for _ in 0..3 {
        xml.push_str(solid);
    }
    xml.push_str("</a:bgFillStyleLst></a:fmtScheme>");

    xml.push_str("</a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{PresentationMetadata, Slide};

    fn deck(slides: usize) -> Deck {
        let mut deck = Deck::new(PresentationMetadata {
            layout: Layout::Layout16x9,
            author: "Ada & Co".to_string(),
            title: "Design <Buildings>".to_string(),
            subject: "Revit".to_string(),
        });
        for i in 0..slides {
            deck.push_slide(Slide::new(format!("s{}.html", i)));
        }
        deck
    }

    #[test]
    fn test_presentation_lists_slides_in_order() {
        let xml = presentation(&deck(3));
        assert!(xml.contains(r#"<p:sldId id="256" r:id="rId4"/>"#));
        assert!(xml.contains(r#"<p:sldId id="258" r:id="rId6"/>"#));
        assert!(xml.contains(r#"<p:sldSz cx="9144000" cy="5143500"/>"#));

        let rels = presentation_rels(3);
        assert!(rels.contains(r#"Id="rId6" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide3.xml""#));
    }

    #[test]
    fn test_empty_presentation_has_no_slide_list() {
        let xml = presentation(&deck(0));
        assert!(!xml.contains("sldIdLst"));
        assert!(!content_types(0).contains("/ppt/slides/"));
    }

    #[test]
    fn test_core_props_escape_metadata() {
        let xml = core_props(&deck(0));
        assert!(xml.contains("<dc:title>Design &lt;Buildings&gt;</dc:title>"));
        assert!(xml.contains("<dc:creator>Ada &amp; Co</dc:creator>"));
        assert!(!xml.contains("dcterms:created"));
    }

    #[test]
    fn test_app_props_count_slides() {
        let xml = app_props(&deck(2));
        assert!(xml.contains("<Slides>2</Slides>"));
        assert!(xml.contains("On-screen Show (16:9)"));
    }

    #[test]
    fn test_slide_rels_reference_media() {
        let rels = slide_rels(&["image1.png".to_string()]);
        assert!(rels.contains(r#"Target="../slideLayouts/slideLayout1.xml""#));
        assert!(rels.contains(r#"Id="rId2""#));
        assert!(rels.contains(r#"Target="../media/image1.png""#));
    }

    #[test]
    fn test_escape_text_drops_control_characters() {
        assert_eq!(escape_text("a\u{0007}b & c"), "ab &amp; c");
        assert_eq!(escape_text("tab\there"), "tab\there");
    }

    #[test]
    fn test_static_parts_are_well_formed() {
        for xml in [slide_master(), slide_layout(), theme(), pres_props(), package_rels()] {
            let mut reader = quick_xml::Reader::from_str(&xml);
            loop {
                match reader.read_event() {
                    Ok(quick_xml::events::Event::Eof) => break,
                    Ok(_) => {}
                    Err(e) => panic!("malformed part: {}", e),
                }
            }
        }
    }
}
