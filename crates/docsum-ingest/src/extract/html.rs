//! HTML text extraction.

use super::{clean_text, ExtractedText, Extractor};
use crate::error::{IngestError, IngestResult};
use docsum_core::{Document, DocumentFormat};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

/// Elements whose contents are never prose.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head", "svg"];

/// Block-level elements that end a line of text.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
    "header", "footer", "blockquote", "pre", "table", "ul", "ol", "title", "main", "nav",
];

/// Extractor for HTML pages.
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for HtmlExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Html
    }

    fn extract(&self, document: &Document) -> IngestResult<ExtractedText> {
        let source = std::str::from_utf8(&document.bytes).map_err(|e| IngestError::Parse {
            path: document.path.clone(),
            message: format!("HTML is not valid UTF-8: {}", e),
        })?;

        let html = Html::parse_document(source);
        let title = page_title(&html);

        let mut raw = String::new();
        if let Some(t) = &title {
            raw.push_str(t);
            raw.push('\n');
        }
        collect_text(html.root_element(), &mut raw);

        let content = clean_text(&raw);
        let length = content.chars().count();
        debug!(
            "Extracted {} characters from {}",
            length,
            document.display_name()
        );

        let metadata = serde_json::json!({
            "format": "html",
            "title": title,
            "length": length,
        });

        let mut text = ExtractedText::new(content).with_metadata(metadata);
        if let Some(t) = title {
            text = text.with_title(t);
        }
        Ok(text)
    }
}

fn page_title(html: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    html.select(&selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text: &str = text;
                let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !collapsed.is_empty() {
                    if !out.is_empty() && !out.ends_with(['\n', ' ']) {
                        out.push(' ');
                    }
                    out.push_str(&collapsed);
                }
            }
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    let block = BLOCK_ELEMENTS.contains(&name);
                    if block {
                        out.push('\n');
                    }
                    collect_text(child_el, out);
                    if block {
                        out.push('\n');
                    }
                }
            }
            _ => {}
        }
    }
}
