use super::ExtractionError;
use super::ooxml::{open_archive, read_part, xml_reader};
use quick_xml::events::Event;

const DOCUMENT_PART: &str = "word/document.xml";

/// Body paragraphs of a `.docx`, one per line, in document order.
///
/// Only direct `w:body/w:p` children count. Paragraphs in tables or content controls are not
/// body paragraphs, and text boxes anchored inside a paragraph do not add to its text.
pub(super) fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = open_archive(bytes)?;
    let xml = read_part(&mut archive, DOCUMENT_PART)?;
    let paragraphs = body_paragraphs(&xml)?;
    Ok(paragraphs.join("\n"))
}

fn body_paragraphs(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = xml_reader(xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();

    // Element depth; the document root sits at 1.
    let mut depth = 0usize;
    let mut body_depth: Option<usize> = None;
    let mut paragraph_depth = 0usize;
    let mut text_box_depth: Option<usize> = None;
    let mut current: Option<String> = None;
    let mut in_run = false;
    let mut in_text = false;

    loop {
        let collecting = current.is_some() && text_box_depth.is_none();
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) => {
                depth += 1;
                match element.local_name().as_ref() {
                    b"body" if body_depth.is_none() => body_depth = Some(depth),
                    b"p" if current.is_none() && body_depth == Some(depth - 1) => {
                        paragraph_depth = depth;
                        current = Some(String::new());
                    }
                    b"txbxContent" if collecting => text_box_depth = Some(depth),
                    b"r" if collecting => in_run = true,
                    b"t" if collecting => in_text = true,
                    _ => {}
                }
            }
            Event::Empty(element) => {
                let name = element.local_name();
                match (name.as_ref(), current.as_mut()) {
                    (b"p", None) if body_depth == Some(depth) => paragraphs.push(String::new()),
                    (b"tab", Some(text)) if collecting && in_run => text.push('\t'),
                    (b"br" | b"cr", Some(text)) if collecting && in_run => text.push('\n'),
                    _ => {}
                }
            }
            Event::Text(raw) if collecting && in_text => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&raw.unescape()?);
                }
            }
            Event::CData(raw) if collecting && in_text => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&raw));
                }
            }
            Event::End(element) => {
                match element.local_name().as_ref() {
                    b"txbxContent" if text_box_depth == Some(depth) => text_box_depth = None,
                    b"r" if collecting => in_run = false,
                    b"t" if collecting => in_text = false,
                    b"p" if paragraph_depth == depth => paragraphs.extend(current.take()),
                    b"body" if body_depth == Some(depth) => body_depth = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::fixtures;

    fn wrap(body: &str) -> String {
        format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        )
    }

    #[test]
    fn joins_paragraphs_one_per_line() {
        let bytes = fixtures::docx(&["Quarterly report", "Revenue grew.", "Costs fell."]);
        let text = extract_docx(&bytes).expect("docx text");
        assert_eq!(text, "Quarterly report\nRevenue grew.\nCosts fell.");
    }

    #[test]
    fn concatenates_runs_and_keeps_empty_paragraphs() {
        let xml = wrap(
            r#"<w:p><w:r><w:t>Hello, </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>world</w:t></w:r></w:p><w:p/><w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p>"#,
        );
        let paragraphs = body_paragraphs(&xml).expect("paragraphs");
        assert_eq!(paragraphs, vec!["Hello, world", "", "a\tb\nc"]);
    }

    #[test]
    fn skips_table_paragraphs() {
        let xml = wrap(
            r#"<w:p><w:r><w:t>Before</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p><w:r><w:t>After</w:t></w:r></w:p>"#,
        );
        let paragraphs = body_paragraphs(&xml).expect("paragraphs");
        assert_eq!(paragraphs, vec!["Before", "After"]);
    }

    #[test]
    fn skips_content_control_paragraphs() {
        let xml = wrap(
            r#"<w:p><w:r><w:t>Intro</w:t></w:r></w:p><w:sdt><w:sdtPr/><w:sdtContent><w:p><w:r><w:t>Table of contents</w:t></w:r></w:p></w:sdtContent></w:sdt><w:p><w:r><w:t>Body</w:t></w:r></w:p>"#,
        );
        let paragraphs = body_paragraphs(&xml).expect("paragraphs");
        assert_eq!(paragraphs, vec!["Intro", "Body"]);
    }

    #[test]
    fn text_box_content_stays_out_of_its_anchor_paragraph() {
        let xml = wrap(
            r#"<w:p><w:r><w:t>A</w:t></w:r><w:r><w:drawing><w:txbxContent><w:p><w:r><w:t>B</w:t><w:br/></w:r></w:p></w:txbxContent></w:drawing></w:r><w:r><w:t>!</w:t></w:r></w:p><w:sdt><w:sdtContent><w:p><w:r><w:t>C</w:t></w:r></w:p></w:sdtContent></w:sdt>"#,
        );
        let paragraphs = body_paragraphs(&xml).expect("paragraphs");
        assert_eq!(paragraphs, vec!["A!"]);
    }

    #[test]
    fn tab_stop_definitions_are_not_text() {
        let xml = wrap(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>Heading</w:t></w:r></w:p>"#,
        );
        let paragraphs = body_paragraphs(&xml).expect("paragraphs");
        assert_eq!(paragraphs, vec!["Heading"]);
    }

    #[test]
    fn unescapes_entities() {
        let xml = wrap(r#"<w:p><w:r><w:t>R&amp;D &lt;2024&gt;</w:t></w:r></w:p>"#);
        let paragraphs = body_paragraphs(&xml).expect("paragraphs");
        assert_eq!(paragraphs, vec!["R&D <2024>"]);
    }

    #[test]
    fn missing_document_part_fails() {
        let bytes = fixtures::office_archive(&[("word/styles.xml", "<w:styles/>")]);
        let error = extract_docx(&bytes).expect_err("no document part");
        assert!(matches!(error, ExtractionError::MissingPart(_)));
    }
}
