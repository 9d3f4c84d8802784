use crate::ingest::{self, UnsupportedPolicy};

/// A file handed over by the user, read fully into memory
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Options controlling how the context string is assembled
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextOptions {
    pub unsupported: UnsupportedPolicy,
    /// Upper bound on the context length in characters. `None` means unbounded.
    pub max_chars: Option<usize>,
}

/// Build the prompt context from the uploaded files, in the order given.
///
/// Each file contributes a `--- <name> ---` header followed by its text.
pub fn build_context(files: &[UploadedFile], options: &ContextOptions) -> String {
    let segments: Vec<String> = files
        .iter()
        .map(|file| {
            let text = ingest::extract(&file.name, &file.bytes, options.unsupported);
            format_segment(&file.name, &text)
        })
        .collect();

    match options.max_chars {
        Some(max_chars) => truncate_segments(segments, max_chars),
        None => segments.concat(),
    }
}

fn format_segment(name: &str, text: &str) -> String {
    format!("\n\n--- {} ---\n{}", name, text)
}

/// Drop whole segments from the front (oldest appended first) until the rest
/// fits. A single segment that is still too long is cut at `max_chars`.
fn truncate_segments(segments: Vec<String>, max_chars: usize) -> String {
    let mut lengths: Vec<usize> = segments.iter().map(|s| s.chars().count()).collect();
    let mut total: usize = lengths.iter().sum();
    let mut start = 0;

    while total > max_chars && segments.len() - start > 1 {
        tracing::warn!(
            dropped_chars = lengths[start],
            max_chars,
            "Context too long, dropping the earliest file segment"
        );
        total -= lengths[start];
        lengths[start] = 0;
        start += 1;
    }

    let context = segments[start..].concat();
    if total > max_chars {
        tracing::warn!(max_chars, "Context too long, cutting the remaining segment");
        return context.chars().take(max_chars).collect();
    }
    context
}
