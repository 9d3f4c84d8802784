use anyhow::{Context, Result};
use std::panic;

/// Extract text from PDF bytes, one entry per page joined with newlines.
///
/// Pages without extractable text (scanned images, empty content streams)
/// contribute an empty line rather than an error.
pub fn extract(bytes: &[u8]) -> Result<String> {
    match extract_pages(bytes) {
        Ok(pages) => Ok(join_pages(pages, || extract_with_pdf_extract(bytes))),
        Err(e) => {
            // lopdf could not load the document, try pdf_extract on the whole file
            tracing::warn!("lopdf failed to load PDF, trying fallback: {:#}", e);
            extract_with_pdf_extract(bytes)
        }
    }
}

/// Join per-page text, asking the fallback when no page produced any text
fn join_pages(pages: Vec<String>, fallback: impl FnOnce() -> Result<String>) -> String {
    let joined = pages.join("\n");
    if pages.is_empty() || pages.iter().any(|page| !page.trim().is_empty()) {
        return joined;
    }

    match fallback() {
        Ok(text) if !text.trim().is_empty() => {
            tracing::debug!(pages = pages.len(), "lopdf found no text, using pdf_extract output");
            text
        }
        Ok(_) => joined,
        Err(e) => {
            tracing::debug!("pdf_extract fallback found nothing either: {:#}", e);
            joined
        }
    }
}

/// Per-page text extraction using lopdf, in page order
fn extract_pages(bytes: &[u8]) -> Result<Vec<String>> {
    use lopdf::Document;

    let doc = Document::load_mem(bytes).context("Failed to load PDF with lopdf")?;

    // get_pages is keyed by page number, so iteration is already in page order
    let pages = doc.get_pages();
    let mut texts = Vec::with_capacity(pages.len());

    for page_num in pages.keys() {
        let text = match doc.extract_text(&[*page_num]) {
            Ok(text) => text.trim_end().to_string(),
            Err(e) => {
                tracing::debug!(page = *page_num, "No text on PDF page: {}", e);
                String::new()
            }
        };
        texts.push(text);
    }

    Ok(texts)
}

/// Fallback extraction using pdf_extract.
/// It can panic on unusual PDFs, so the call is isolated with catch_unwind.
fn extract_with_pdf_extract(bytes: &[u8]) -> Result<String> {
    let extract_result = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));

    match extract_result {
        Ok(Ok(text)) => Ok(text.trim_end().to_string()),
        Ok(Err(e)) => anyhow::bail!("pdf_extract failed: {}", e),
        Err(_) => anyhow::bail!("pdf_extract crashed while reading the PDF"),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    /// Build a PDF whose pages each show one line of text.
    /// An empty string produces a page with no text operators.
    pub(crate) fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids = Vec::new();
        for page_text in pages {
            let operations = if page_text.is_empty() {
                vec![]
            } else {
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*page_text)]),
                    Operation::new("ET", vec![]),
                ]
            };
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_zero_pages() {
        let bytes = build_pdf(&[]);
        assert_eq!(extract(&bytes).unwrap(), "");
    }

    #[test]
    fn test_single_page() {
        let bytes = build_pdf(&["Hello PDF"]);
        assert_eq!(extract(&bytes).unwrap(), "Hello PDF");
    }

    #[test]
    fn test_pages_joined_in_order() {
        let bytes = build_pdf(&["Alpha", "Beta", "Gamma"]);
        assert_eq!(extract(&bytes).unwrap(), "Alpha\nBeta\nGamma");
    }

    #[test]
    fn test_page_without_text_is_empty() {
        let bytes = build_pdf(&["First", "", "Third"]);
        assert_eq!(extract(&bytes).unwrap(), "First\n\nThird");
    }

    #[test]
    fn test_textless_pages_stay_blank() {
        let bytes = build_pdf(&["", ""]);
        assert_eq!(extract(&bytes).unwrap(), "\n");
    }

    #[test]
    fn test_fallback_used_when_no_page_has_text() {
        let pages = vec![String::new(), String::new()];
        assert_eq!(join_pages(pages, || Ok("Recovered text".into())), "Recovered text");
    }

    #[test]
    fn test_fallback_skipped_when_pages_have_text() {
        let pages = vec!["One".to_string(), String::new()];
        let joined = join_pages(pages, || panic!("fallback should not run"));
        assert_eq!(joined, "One\n");
    }

    #[test]
    fn test_fallback_failure_keeps_blank_pages() {
        let pages = vec![String::new(), String::new(), String::new()];
        let joined = join_pages(pages, || anyhow::bail!("no text"));
        assert_eq!(joined, "\n\n");
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(extract(b"definitely not a pdf").is_err());
    }
}
