pub mod docx;
pub mod html;
pub mod pdf;
pub mod text;

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic;

/// Supported content types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Text,
    Pdf,
    Docx,
    Html,
    Unknown,
}

impl ContentType {
    /// Pick a content type from the lower-cased file name suffix
    pub fn from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        match name.rsplit_once('.').map(|(_, ext)| ext) {
            Some("txt") => ContentType::Text,
            Some("pdf") => ContentType::Pdf,
            Some("docx") => ContentType::Docx,
            Some("html" | "htm") => ContentType::Html,
            _ => ContentType::Unknown,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ContentType::Unknown)
    }
}

/// What to do with files whose extension is not recognised
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UnsupportedPolicy {
    /// Decode the bytes as UTF-8 text anyway
    DecodeAsText,
    /// Insert a short marker naming the file instead of its content
    #[default]
    PlaceholderText,
}

impl std::fmt::Display for UnsupportedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnsupportedPolicy::DecodeAsText => write!(f, "decode-as-text"),
            UnsupportedPolicy::PlaceholderText => write!(f, "placeholder-text"),
        }
    }
}

/// Extract best-effort plain text from an uploaded file.
///
/// This never fails: a file that cannot be parsed yields an inline
/// placeholder so the question can still be asked with the other files.
pub fn extract(name: &str, bytes: &[u8], policy: UnsupportedPolicy) -> String {
    let content_type = ContentType::from_name(name);

    if content_type == ContentType::Unknown && policy == UnsupportedPolicy::PlaceholderText {
        return format!("[Unsupported file type for {}]", name);
    }

    // The PDF and DOCX parsers can panic on damaged input, so the dispatch is isolated
    let result = panic::catch_unwind(|| match content_type {
        ContentType::Pdf => pdf::extract(bytes),
        ContentType::Docx => docx::extract(bytes),
        ContentType::Html => Ok(html::extract(bytes)),
        ContentType::Text | ContentType::Unknown => Ok(text::extract(bytes)),
    })
    .unwrap_or_else(|payload| {
        Err(anyhow::anyhow!(
            "parser crashed ({})",
            panic_message(payload.as_ref())
        ))
    });

    match result {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(file = name, ?content_type, "Text extraction failed: {:#}", e);
            format!("[Could not extract text from {}: {}]", name, e)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
