//! PPTX writer: serializes a deck into an Office Open XML package.

use crate::package;
use crate::reader::PptxReader;
use crate::slide::slide_xml;
use deck_core::{Deck, DeckWriter, Error, Result};
use std::io::{Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Writer for PPTX (Office Open XML) files.
///
/// Files are written atomically: the package goes to a temporary file next
/// to the destination, is read back and checked, and is renamed into place
/// only once it verifies.
pub struct PptxWriter;

impl PptxWriter {
    /// Create a new PPTX writer.
    pub fn new() -> Self {
        Self
    }

    /// Write a deck as a PPTX package to any seekable writer.
    pub fn write_to<W: Write + Seek>(&self, deck: &Deck, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        // Fixed entry times keep the archive byte-for-byte reproducible.
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        let slide_count = deck.slide_count();
        add_part(&mut zip, options, "[Content_Types].xml", package::content_types(slide_count).as_bytes())?;
        add_part(&mut zip, options, "_rels/.rels", package::package_rels().as_bytes())?;
        add_part(&mut zip, options, "docProps/core.xml", package::core_props(deck).as_bytes())?;
        add_part(&mut zip, options, "docProps/app.xml", package::app_props(deck).as_bytes())?;
        add_part(&mut zip, options, "ppt/presentation.xml", package::presentation(deck).as_bytes())?;
        add_part(
            &mut zip,
            options,
            "ppt/_rels/presentation.xml.rels",
            package::presentation_rels(slide_count).as_bytes(),
        )?;
        add_part(&mut zip, options, "ppt/presProps.xml", package::pres_props().as_bytes())?;
        add_part(
            &mut zip,
            options,
            "ppt/slideMasters/slideMaster1.xml",
            package::slide_master().as_bytes(),
        )?;
        add_part(
            &mut zip,
            options,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            package::slide_master_rels().as_bytes(),
        )?;
        add_part(
            &mut zip,
            options,
            "ppt/slideLayouts/slideLayout1.xml",
            package::slide_layout().as_bytes(),
        )?;
        add_part(
            &mut zip,
            options,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            package::slide_layout_rels().as_bytes(),
        )?;
        add_part(&mut zip, options, "ppt/theme/theme1.xml", package::theme().as_bytes())?;

        // Media is already compressed; store it as-is.
        let media_options = options.compression_method(CompressionMethod::Stored);
        let mut media_count = 0;

        for (index, slide) in deck.slides().iter().enumerate() {
            let part = slide_xml(slide);

            let mut targets = Vec::with_capacity(part.pictures.len());
            for picture in &part.pictures {
                media_count += 1;
                let target = format!("image{}.{}", media_count, picture.format.extension());
                add_part(&mut zip, media_options, &format!("ppt/media/{}", target), &picture.data)?;
                targets.push(target);
            }

            add_part(&mut zip, options, &package::slide_path(index), part.xml.as_bytes())?;
            add_part(
                &mut zip,
                options,
                &format!("ppt/slides/_rels/slide{}.xml.rels", index + 1),
                package::slide_rels(&targets).as_bytes(),
            )?;
            log::debug!(
                "Wrote slide {} ({}) with {} images",
                index + 1,
                slide.source,
                targets.len()
            );
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))
    }

    /// Read a written package back and check it holds the deck's slides in order.
    pub fn verify<R: Read + Seek>(&self, deck: &Deck, package: R) -> Result<()> {
        let summary = PptxReader::new().read(package)?;
        if summary.slides.len() != deck.slide_count() {
            return Err(Error::WriteError(format!(
                "package contains {} slides, expected {}",
                summary.slides.len(),
                deck.slide_count()
            )));
        }
        log::debug!("Verified {} slides", summary.slides.len());
        Ok(())
    }
}

impl Default for PptxWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckWriter for PptxWriter {
    fn write(&self, deck: &Deck, output: &Path) -> Result<()> {
        let dir = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::WriteError(format!("Failed to create directory {}: {}", dir.display(), e))
        })?;

        let mut temp = tempfile::Builder::new()
            .prefix(".deck-")
            .suffix(".pptx.tmp")
            .tempfile_in(dir)
            .map_err(|e| Error::WriteError(format!("Failed to create temporary file in {}: {}", dir.display(), e)))?;

        self.write_to(deck, temp.as_file_mut())?;
        temp.as_file_mut()
            .flush()
            .and_then(|_| temp.as_file_mut().rewind())
            .map_err(|e| Error::WriteError(e.to_string()))?;
        self.verify(deck, temp.as_file_mut())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))
                .map_err(|e| Error::WriteError(e.to_string()))?;
        }

        // Dropping an unpersisted temp file removes it, so failures above
        // leave nothing behind.
        temp.persist(output).map_err(|e| {
            Error::WriteError(format!("Failed to move output into {}: {}", output.display(), e.error))
        })?;

        log::debug!(
            "Wrote {} slides to {}",
            deck.slide_count(),
            output.display()
        );
        Ok(())
    }
}

fn add_part<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    options: FileOptions,
    path: &str,
    data: &[u8],
) -> Result<()> {
    zip.start_file(path, options)
        .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", path, e)))?;
    zip.write_all(data)
        .map_err(|e| Error::ZipError(format!("Failed to write '{}': {}", path, e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{Layout, PresentationMetadata, Slide};
    use std::io::Cursor;

    fn deck(names: &[&str]) -> Deck {
        let mut deck = Deck::new(PresentationMetadata {
            layout: Layout::Layout4x3,
            author: "Author".to_string(),
            title: "Title".to_string(),
            subject: "Subject".to_string(),
        });
        for name in names {
            deck.push_slide(Slide::new(*name));
        }
        deck
    }

    #[test]
    fn test_package_contains_expected_parts() {
        let cursor = PptxWriter::new()
            .write_to(&deck(&["a.html", "b.html"]), Cursor::new(Vec::new()))
            .unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();

        let names: Vec<String> = archive.file_names().map(String::from).collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/slides/_rels/slide2.xml.rels",
            "ppt/theme/theme1.xml",
        ] {
            assert!(names.iter().any(|n| n == part), "missing {}", part);
        }
        assert!(!names.iter().any(|n| n == "ppt/slides/slide3.xml"));
        assert_eq!(archive.by_index(0).unwrap().name(), "[Content_Types].xml");
    }

    #[test]
    fn test_output_is_reproducible() {
        let first = PptxWriter::new()
            .write_to(&deck(&["a.html"]), Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();
        let second = PptxWriter::new()
            .write_to(&deck(&["a.html"]), Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();
        assert_eq!(first, second);
    }

    #[test]
    fn test_write_creates_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("deck.pptx");

        PptxWriter::new().write(&deck(&["a.html"]), &output).unwrap();

        assert!(output.is_file());
        let entries: Vec<_> = std::fs::read_dir(output.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_verify_rejects_slide_count_mismatch() {
        let writer = PptxWriter::new();
        let package = writer
            .write_to(&deck(&["a.html", "b.html"]), Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();

        writer
            .verify(&deck(&["a.html", "b.html"]), Cursor::new(&package))
            .unwrap();
        let err = writer
            .verify(&deck(&["a.html", "b.html", "c.html"]), Cursor::new(&package))
            .unwrap_err();
        assert!(err.to_string().contains("contains 2 slides, expected 3"));

        let err = writer
            .verify(&deck(&[]), Cursor::new(b"not a zip".to_vec()))
            .unwrap_err();
        assert!(matches!(err, Error::ZipError(_)));
    }

    #[test]
    fn test_write_to_directory_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = PptxWriter::new().write(&deck(&[]), dir.path()).unwrap_err();
        assert!(matches!(err, Error::WriteError(_)));
        // The temporary file is cleaned up.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
