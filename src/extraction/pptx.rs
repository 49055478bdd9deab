use super::ExtractionError;
use super::ooxml::{OfficeArchive, open_archive, read_part, resolve_target, xml_reader};
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";
const PRESENTATION_DIR: &str = "ppt";

/// Text of every top-level shape on every slide, in slide order then shape order, one shape per
/// line.
pub(super) fn extract_pptx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = open_archive(bytes)?;
    let slides = slide_parts(&mut archive)?;

    let mut shapes = Vec::new();
    for slide in slides {
        let xml = read_part(&mut archive, &slide)?;
        shapes.extend(shape_texts(&xml)?);
    }
    Ok(shapes.join("\n"))
}

/// Slide part names in presentation order.
fn slide_parts(archive: &mut OfficeArchive<'_>) -> Result<Vec<String>, ExtractionError> {
    let targets = relationship_targets(&read_part(archive, PRESENTATION_RELS_PART)?)?;
    let presentation = read_part(archive, PRESENTATION_PART)?;

    let mut reader = xml_reader(&presentation);
    let mut buf = Vec::new();
    let mut parts = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) | Event::Empty(element)
                if element.local_name().as_ref() == b"sldId" =>
            {
                let relationship = relationship_id(&element)?.ok_or_else(|| {
                    ExtractionError::Xml("slide entry without relationship id".into())
                })?;
                let target = targets.get(&relationship).ok_or_else(|| {
                    ExtractionError::MissingPart(format!("slide relationship {relationship}"))
                })?;
                parts.push(resolve_target(PRESENTATION_DIR, target));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(parts)
}

/// The namespaced `r:id` attribute of a `p:sldId` element; the bare `id` is a numeric slide id.
fn relationship_id(element: &BytesStart<'_>) -> Result<Option<String>, ExtractionError> {
    for attribute in element.attributes() {
        let attribute = attribute?;
        if attribute.key.prefix().is_some() && attribute.key.local_name().as_ref() == b"id" {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn relationship_targets(xml: &str) -> Result<HashMap<String, String>, ExtractionError> {
    let mut reader = xml_reader(xml);
    let mut buf = Vec::new();
    let mut targets = HashMap::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) | Event::Empty(element)
                if element.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for attribute in element.attributes() {
                    let attribute = attribute?;
                    match attribute.key.as_ref() {
                        b"Id" => id = Some(attribute.unescape_value()?.into_owned()),
                        b"Target" => target = Some(attribute.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

/// Non-empty texts of the slide's top-level shapes in tree order. Shapes inside a group shape
/// are not top-level and contribute nothing.
fn shape_texts(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = xml_reader(xml);
    let mut buf = Vec::new();
    let mut texts = Vec::new();
    let mut shape: Option<Vec<String>> = None;
    let mut group_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) => match element.local_name().as_ref() {
                b"grpSp" => group_depth += 1,
                b"sp" if group_depth == 0 => shape = Some(Vec::new()),
                b"p" => {
                    if let Some(paragraphs) = shape.as_mut() {
                        paragraphs.push(String::new());
                    }
                }
                b"t" if shape.is_some() => in_text = true,
                _ => {}
            },
            Event::Empty(element) => {
                if let Some(paragraphs) = shape.as_mut() {
                    match element.local_name().as_ref() {
                        b"p" => paragraphs.push(String::new()),
                        b"br" => {
                            if let Some(text) = paragraphs.last_mut() {
                                text.push('\n');
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::Text(raw) if in_text => {
                let paragraph = shape.as_mut().and_then(|paragraphs| paragraphs.last_mut());
                if let Some(text) = paragraph {
                    text.push_str(&raw.unescape()?);
                }
            }
            Event::End(element) => match element.local_name().as_ref() {
                b"grpSp" => group_depth = group_depth.saturating_sub(1),
                b"t" => in_text = false,
                b"sp" => {
                    if let Some(paragraphs) = shape.take() {
                        let text = paragraphs.join("\n");
                        if !text.is_empty() {
                            texts.push(text);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(texts)
}
