//! Shared helpers for Office Open XML containers (`.docx`, `.pptx`).

use super::ExtractionError;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;
use zip::result::ZipError;

pub(super) type OfficeArchive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Open the zip container behind an office document.
pub(super) fn open_archive(bytes: &[u8]) -> Result<OfficeArchive<'_>, ExtractionError> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

/// Read a named part as UTF-8, failing with [`ExtractionError::MissingPart`] when absent.
pub(super) fn read_part(
    archive: &mut OfficeArchive<'_>,
    name: &str,
) -> Result<String, ExtractionError> {
    let mut part = match archive.by_name(name) {
        Ok(part) => part,
        Err(ZipError::FileNotFound) => return Err(ExtractionError::MissingPart(name.to_string())),
        Err(error) => return Err(error.into()),
    };
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

/// XML reader that keeps whitespace inside text runs intact.
pub(super) fn xml_reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    reader
}

/// Resolve a relationship target against the directory of its source part.
///
/// Targets are either package-absolute (`/ppt/slides/slide1.xml`) or relative to the source
/// part's folder (`slides/slide1.xml` from `ppt/presentation.xml`).
pub(super) fn resolve_target(source_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = source_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_and_absolute_targets() {
        assert_eq!(
            resolve_target("ppt", "slides/slide1.xml"),
            "ppt/slides/slide1.xml"
        );
        assert_eq!(
            resolve_target("ppt", "/ppt/slides/slide2.xml"),
            "ppt/slides/slide2.xml"
        );
        assert_eq!(
            resolve_target("ppt/slides", "../media/image1.png"),
            "ppt/media/image1.png"
        );
    }

    #[test]
    fn missing_part_is_reported_by_name() {
        let bytes = crate::extraction::fixtures::office_archive(&[("other.xml", "<a/>")]);
        let mut archive = open_archive(&bytes).expect("archive");
        let error = read_part(&mut archive, "word/document.xml").expect_err("missing part");
        assert!(matches!(error, ExtractionError::MissingPart(name) if name == "word/document.xml"));
    }
}
