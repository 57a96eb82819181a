use html_scraper::{ElementRef, Html};

/// Convert HTML to a single normalized plain-text string.
///
/// Notes:
/// - Text nodes are collected in document order and joined by single spaces;
///   all whitespace runs collapse to one space and the ends are trimmed.
/// - html5ever's error recovery means malformed or partial HTML never fails:
///   unparseable fragments degrade to their literal text content.
pub fn extract_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut parts: Vec<String> = Vec::new();
    collect_text(doc.root_element(), &mut parts);
    norm_ws(&parts.join(" "))
}

/// Subtrees whose text content is code or markup, not readable prose.
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

fn collect_text(el: ElementRef<'_>, out: &mut Vec<String>) {
    if SKIPPED_ELEMENTS.contains(&el.value().name()) {
        return;
    }
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push(text.to_string());
        } else if let Some(child_el) = ElementRef::wrap(child) {
            collect_text(child_el, out);
        }
    }
}

pub fn norm_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
