use scraper::{Html, Node};

use super::text;

/// Elements whose text content is never shown to a reader
const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Extract visible text from HTML bytes.
///
/// Every non-empty text node becomes its own line, so block-level content
/// such as `<p>A</p><p>B</p>` comes out as `"A\nB"`.
pub fn extract(bytes: &[u8]) -> String {
    let raw = text::extract(bytes);
    let document = Html::parse_document(&raw);

    let mut lines: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(t) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|elem| SKIP_TAGS.contains(&elem.name()))
        });
        if hidden {
            continue;
        }

        let content = t.trim();
        if !content.is_empty() {
            lines.push(content);
        }
    }

    lines.join("\n")
}
