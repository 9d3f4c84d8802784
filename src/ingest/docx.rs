use anyhow::{Context, Result};

/// Extract paragraph text from a DOCX file, one paragraph per line in document order.
///
/// Tables, headers and footers are not part of the paragraph stream and are skipped.
pub fn extract(bytes: &[u8]) -> Result<String> {
    let doc = docx_rs::read_docx(bytes).context("Failed to parse DOCX")?;

    let paragraphs: Vec<String> = doc
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            docx_rs::DocumentChild::Paragraph(p) => Some(paragraph_text(p)),
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let docx_rs::ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    docx_rs::RunChild::Text(t) => text.push_str(&t.text),
                    docx_rs::RunChild::Tab(_) => text.push('\t'),
                    _ => {}
                }
            }
        }
    }
    text
}
