//! Drug-name highlighting over a document.
//!
//! Pipeline: WordSet → MatchPattern → text-node walk → reverse-order wrapping
//!
//! Each match is wrapped in a marker span that carries the matched text in
//! [`MARKER_ATTR`]. That attribute doubles as the "already processed" mark, so
//! a second pass over the same document never re-wraps marker content.

mod pattern;
mod walker;

pub use pattern::*;
pub use walker::*;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dom::{Document, DomError, DomResult, NodeId};

/// CSS class carried by every marker.
pub const MARKER_CLASS: &str = "dr-ordinary-highlight";

/// Attribute holding a marker's identity key.
pub const MARKER_ATTR: &str = "data-dr-ordinary-marker";

/// Attribute excluding a subtree from scanning.
pub const IGNORE_ATTR: &str = "data-dr-ordinary-ignore";

/// Highlighter errors.
#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("Word set is empty")]
    EmptyWordSet,

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

pub type HighlightResult<T> = Result<T, HighlightError>;

/// A marker created during a scan pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// The marker span
    pub node: NodeId,
    /// Matched text in its original casing
    pub word: String,
}

/// Result of a best-effort scan pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightOutcome {
    /// Matches wrapped in a marker
    pub applied: usize,
    /// Matches that could not be wrapped
    pub skipped: usize,
    /// Markers in creation order
    pub markers: Vec<Marker>,
}

impl HighlightOutcome {
    fn merge(&mut self, other: HighlightOutcome) {
        self.applied += other.applied;
        self.skipped += other.skipped;
        self.markers.extend(other.markers);
    }
}

/// Wraps word matches found in a document's text nodes.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: MatchPattern,
}

impl Highlighter {
    pub fn new(words: &WordSet) -> HighlightResult<Self> {
        let pattern = MatchPattern::new(words)?;
        debug!(pattern = pattern.as_str(), "Built highlight pattern");
        Ok(Self { pattern })
    }

    pub fn pattern(&self) -> &MatchPattern {
        &self.pattern
    }

    /// Run one scan pass over the document body.
    pub fn scan(&self, doc: &mut Document) -> HighlightOutcome {
        let nodes = collect_text_nodes(doc, doc.body());
        debug!(count = nodes.len(), "Collected text nodes");

        let outcome = self.highlight_nodes(doc, &nodes);
        info!(
            applied = outcome.applied,
            skipped = outcome.skipped,
            "Highlighting complete"
        );
        outcome
    }

    /// Highlight the given text nodes, continuing past per-match failures.
    pub fn highlight_nodes(&self, doc: &mut Document, nodes: &[NodeId]) -> HighlightOutcome {
        let mut outcome = HighlightOutcome::default();
        for node in nodes {
            outcome.merge(self.highlight_node(doc, *node));
        }
        outcome
    }

    fn highlight_node(&self, doc: &mut Document, node: NodeId) -> HighlightOutcome {
        let mut outcome = HighlightOutcome::default();
        let Some(text) = doc.text(node) else {
            return outcome;
        };

        let matches = self.pattern.find_all(text);
        if matches.is_empty() {
            return outcome;
        }

        // Rightmost first: splitting at an offset leaves every offset to its left valid.
        let mut created = Vec::with_capacity(matches.len());
        for found in matches.iter().rev() {
            match wrap_match(doc, node, found) {
                Ok(marker) => {
                    outcome.applied += 1;
                    created.push(Marker {
                        node: marker,
                        word: found.text.clone(),
                    });
                }
                Err(error) => {
                    outcome.skipped += 1;
                    warn!(word = %found.text, %error, "Failed to highlight match");
                }
            }
        }
        created.reverse();
        outcome.markers = created;
        outcome
    }
}

/// Split `node` around one match and put a marker in the middle.
fn wrap_match(doc: &mut Document, node: NodeId, found: &Match) -> DomResult<NodeId> {
    let text = doc.text(node).ok_or(DomError::NotText(node))?;
    let valid = found.start <= found.end
        && found.end <= text.len()
        && text.is_char_boundary(found.start)
        && text.is_char_boundary(found.end)
        && text.get(found.start..found.end) == Some(found.text.as_str());
    if !valid {
        return Err(DomError::InvalidOffset {
            node,
            offset: found.start,
        });
    }
    if doc.parent(node).is_none() {
        return Err(DomError::Detached(node));
    }

    doc.split_text(node, found.end)?;
    let matched = doc.split_text(node, found.start)?;

    let marker = doc.create_element("span");
    doc.set_attr(marker, "class", MARKER_CLASS);
    doc.set_attr(marker, MARKER_ATTR, &found.text);
    doc.replace(matched, marker)?;
    doc.append_child(marker, matched)?;
    Ok(marker)
}

/// The marker enclosing `node`, if any.
pub fn marker_for(doc: &Document, node: NodeId) -> Option<(NodeId, String)> {
    let marker = doc.closest(node, |e| e.attr(MARKER_ATTR).is_some())?;
    let word = doc.attr(marker, MARKER_ATTR)?.to_owned();
    Some((marker, word))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::inner_html;

    fn highlighter(words: &[&str]) -> Highlighter {
        Highlighter::new(&WordSet::new(words.iter().copied())).unwrap()
    }

    #[test]
    fn test_wraps_single_match_and_keeps_surroundings() {
        let mut doc = Document::parse("<body><p>Take ibuprofen with food.</p></body>");
        let outcome = highlighter(&["ibuprofen"]).scan(&mut doc);

        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.markers[0].word, "ibuprofen");

        let p = doc.find_element("p").unwrap();
        assert_eq!(
            inner_html(&doc, p),
            r#"Take <span class="dr-ordinary-highlight" data-dr-ordinary-marker="ibuprofen">ibuprofen</span> with food."#
        );
    }

    #[test]
    fn test_multiple_matches_in_one_node_in_document_order() {
        let mut doc = Document::parse("<p>Aspirin, then ASPIRIN, not aspirins.</p>");
        let outcome = highlighter(&["aspirin"]).scan(&mut doc);

        assert_eq!(outcome.applied, 2);
        let words: Vec<&str> = outcome.markers.iter().map(|m| m.word.as_str()).collect();
        assert_eq!(words, vec!["Aspirin", "ASPIRIN"]);

        let p = doc.find_element("p").unwrap();
        assert_eq!(doc.text_content(p), "Aspirin, then ASPIRIN, not aspirins.");
    }

    #[test]
    fn test_second_pass_creates_no_markers() {
        let mut doc = Document::parse("<p>warfarin and aspirin</p>");
        let h = highlighter(&["warfarin", "aspirin"]);

        assert_eq!(h.scan(&mut doc).applied, 2);
        let html = inner_html(&doc, doc.root());

        let second = h.scan(&mut doc);
        assert_eq!(second.applied, 0);
        assert_eq!(inner_html(&doc, doc.root()), html);
    }

    #[test]
    fn test_detached_node_is_skipped_without_aborting() {
        let mut doc = Document::parse("<p>aspirin</p>");
        let attached = doc
            .descendants(doc.root())
            .into_iter()
            .find(|n| doc.text(*n).is_some())
            .unwrap();
        let detached = doc.create_text("aspirin twice aspirin");

        let outcome = highlighter(&["aspirin"]).highlight_nodes(&mut doc, &[detached, attached]);

        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(doc.text(detached), Some("aspirin twice aspirin"));
    }

    #[test]
    fn test_stale_match_offsets_are_rejected() {
        let mut doc = Document::parse("<p>aspirin</p>");
        let node = doc
            .descendants(doc.root())
            .into_iter()
            .find(|n| doc.text(*n).is_some())
            .unwrap();
        let stale = Match {
            start: 3,
            end: 20,
            text: "aspirin".into(),
        };

        assert!(wrap_match(&mut doc, node, &stale).is_err());
        assert_eq!(doc.text(node), Some("aspirin"));
    }

    #[test]
    fn test_marker_for_finds_enclosing_marker() {
        let mut doc = Document::parse("<p>on Warfarin</p>");
        let outcome = highlighter(&["warfarin"]).scan(&mut doc);
        let marker = outcome.markers[0].node;
        let inner = doc.children(marker)[0];

        assert_eq!(marker_for(&doc, inner), Some((marker, "Warfarin".to_string())));
        let p = doc.find_element("p").unwrap();
        assert_eq!(marker_for(&doc, p), None);
    }
}
