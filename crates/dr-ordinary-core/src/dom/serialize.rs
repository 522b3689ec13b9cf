//! Markup serialization and rendered-text extraction.

use super::parser::{RAW_TEXT_ELEMENTS, VOID_ELEMENTS};
use super::{Document, NodeData, NodeId};

/// Elements whose text never reaches the rendered page.
const HIDDEN_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that break the flow of rendered text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Serialize the children of `node` as HTML.
pub fn inner_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    for child in doc.children(node) {
        write_node(doc, *child, &mut out);
    }
    out
}

/// Serialize `node` and its subtree as HTML.
pub fn outer_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.data(node) {
        Some(NodeData::Document) => {
            for child in doc.children(node) {
                write_node(doc, *child, out);
            }
        }
        Some(NodeData::Text(text)) => {
            let raw_parent = doc
                .parent(node)
                .and_then(|p| doc.tag_name(p))
                .map(|tag| RAW_TEXT_ELEMENTS.contains(&tag) && tag != "textarea" && tag != "title")
                .unwrap_or(false);
            if raw_parent {
                out.push_str(text);
            } else {
                escape_into(text, false, out);
            }
        }
        Some(NodeData::Comment(text)) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Some(NodeData::Element(element)) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(value, true, out);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                return;
            }
            for child in doc.children(node) {
                write_node(doc, *child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
        None => {}
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

/// Rendered text of `node`: hidden elements skipped, whitespace collapsed.
pub fn inner_text(doc: &Document, node: NodeId) -> String {
    let mut raw = String::new();
    collect_rendered_text(doc, node, &mut raw);
    collapse_whitespace(&raw)
}

fn collect_rendered_text(doc: &Document, node: NodeId, out: &mut String) {
    if let Some(text) = doc.text(node) {
        out.push_str(text);
        return;
    }

    let tag = doc.tag_name(node);
    if tag.map(|t| HIDDEN_TEXT_ELEMENTS.contains(&t)).unwrap_or(false) {
        return;
    }
    let block = tag.map(|t| BLOCK_ELEMENTS.contains(&t)).unwrap_or(false);

    if block {
        out.push(' ');
    }
    for child in doc.children(node) {
        collect_rendered_text(doc, *child, out);
    }
    if block {
        out.push(' ');
    }
}

/// Collapse whitespace runs into single spaces and trim.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
