use lopdf::Document;

use crate::error::IngestError;

/// Extracts the full text of a PDF held in memory, page by page.
///
/// Pages whose text cannot be decoded contribute nothing. Only a byte
/// stream that fails to load as a PDF at all is an error; a well-formed PDF
/// with no extractable text yields an empty string, which the ingestion
/// flow turns into the zero-chunk report rather than a failure.
pub fn extract_text(bytes: &[u8]) -> Result<String, IngestError> {
    let document =
        Document::load_mem(bytes).map_err(|error| IngestError::PdfParse(error.to_string()))?;

    let mut text = String::new();
    for (page_no, _page_id) in document.get_pages() {
        if let Ok(page_text) = document.extract_text(&[page_no]) {
            text.push_str(&page_text);
        }
    }

    Ok(text)
}

/// Builds a minimal in-memory PDF with one page per entry; an empty entry
/// becomes a page without text operations. Shared by pipeline tests.
#[cfg(test)]
pub(crate) fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = document.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content should encode"),
        ));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .expect("pdf should serialize to memory");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_text_from_a_generated_pdf() {
        let bytes = pdf_with_pages(&["Office hours: Mon 3-5pm."]);
        let text = extract_text(&bytes).expect("pdf should parse");
        assert!(text.contains("Office hours"));
    }

    #[test]
    fn pages_concatenate_in_order() {
        let bytes = pdf_with_pages(&["Alpha page.", "Beta page."]);
        let text = extract_text(&bytes).expect("pdf should parse");
        let alpha = text.find("Alpha").expect("first page text present");
        let beta = text.find("Beta").expect("second page text present");
        assert!(alpha < beta);
    }

    #[test]
    fn pdf_without_text_yields_an_empty_string() {
        let bytes = pdf_with_pages(&[""]);
        let text = extract_text(&bytes).expect("pdf should parse");
        assert!(text.trim().is_empty());
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let result = extract_text(b"this is not a pdf");
        assert!(matches!(result, Err(IngestError::PdfParse(_))));
    }
}
