/// Decode bytes as UTF-8, dropping any byte sequences that are not valid UTF-8.
///
/// Valid input is returned unchanged, so a `.txt` upload round-trips exactly.
pub fn extract(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    let mut text = String::with_capacity(bytes.len());
    let mut dropped = 0usize;
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        dropped += chunk.invalid().len();
    }

    tracing::debug!(dropped, "Dropped undecodable bytes while decoding text");
    text
}
