//! Text-node selection for a scan pass.

use crate::dom::{Document, NodeId};

use super::{IGNORE_ATTR, MARKER_ATTR};

/// Containers whose text is never highlighted.
pub const NON_CONTENT_ELEMENTS: &[&str] = &["script", "style", "noscript", "textarea"];

/// Qualifying text nodes under `scope`, in document order.
///
/// A node qualifies when its parent is a content element that is not a marker,
/// it has non-whitespace content, and it is not inside an ignored region.
pub fn collect_text_nodes(doc: &Document, scope: NodeId) -> Vec<NodeId> {
    doc.descendants(scope)
        .into_iter()
        .filter(|node| accepts(doc, *node))
        .collect()
}

fn accepts(doc: &Document, node: NodeId) -> bool {
    let Some(text) = doc.text(node) else {
        return false;
    };

    let Some(parent) = doc.parent(node).and_then(|p| doc.element(p)) else {
        return false;
    };

    if parent.attr(MARKER_ATTR).is_some() {
        return false;
    }

    if NON_CONTENT_ELEMENTS.contains(&parent.tag.as_str()) {
        return false;
    }

    if text.trim().is_empty() {
        return false;
    }

    doc.closest(node, |e| e.attr(IGNORE_ATTR).is_some()).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(doc: &Document, nodes: &[NodeId]) -> Vec<String> {
        nodes
            .iter()
            .filter_map(|n| doc.text(*n).map(str::to_owned))
            .collect()
    }

    #[test]
    fn test_skips_non_content_and_whitespace() {
        let doc = Document::parse(
            "<body><p>aspirin</p>  <script>aspirin()</script><style>.aspirin{}</style>\
             <noscript>aspirin</noscript><textarea>aspirin</textarea><div>   </div></body>",
        );
        let nodes = collect_text_nodes(&doc, doc.body());
        assert_eq!(texts(&doc, &nodes), vec!["aspirin"]);
    }

    #[test]
    fn test_skips_text_inside_markers() {
        let doc = Document::parse(
            r#"<body><span data-dr-ordinary-marker="aspirin">aspirin</span> and more</body>"#,
        );
        let nodes = collect_text_nodes(&doc, doc.body());
        assert_eq!(texts(&doc, &nodes), vec![" and more"]);
    }

    #[test]
    fn test_skips_ignored_regions_at_any_depth() {
        let doc = Document::parse(
            r#"<body><div data-dr-ordinary-ignore><h3>aspirin</h3></div><p>warfarin</p></body>"#,
        );
        let nodes = collect_text_nodes(&doc, doc.body());
        assert_eq!(texts(&doc, &nodes), vec!["warfarin"]);
    }

    #[test]
    fn test_skips_text_without_element_parent() {
        let doc = Document::parse("bare aspirin");
        assert!(collect_text_nodes(&doc, doc.root()).is_empty());
    }
}
